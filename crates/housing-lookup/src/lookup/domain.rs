use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a candidate, unique within its lookup scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<u32> for CandidateId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

/// A single suggestion returned by a remote search.
///
/// `parent` is display-only (a city's department, an institution's city) and never drives
/// any decision in the lookup flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<CandidateId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Opaque filter narrowing a lookup, e.g. the city an institution search is limited to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeFilter(pub String);

impl ScopeFilter {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&CandidateId> for ScopeFilter {
    fn from(value: &CandidateId) -> Self {
        Self(value.0.clone())
    }
}

/// What a [`CandidateSource`](super::CandidateSource) is asked to search for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupQuery {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Idle,
    Debouncing,
    Loading,
    Settled,
    Errored,
}

impl LookupStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Debouncing => "Debouncing",
            Self::Loading => "Loading",
            Self::Settled => "Settled",
            Self::Errored => "Errored",
        }
    }

    /// True while a lookup is armed or in flight.
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Debouncing | Self::Loading)
    }
}

/// Monotonically increasing identifier minted per scheduled lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RequestToken(pub(crate) u64);

impl RequestToken {
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
