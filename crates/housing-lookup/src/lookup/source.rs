use async_trait::async_trait;

use super::domain::{Candidate, LookupQuery};

/// Read-only remote search backing an autocomplete field.
///
/// Ordering of the returned candidates is owned by the source and preserved as-is; an empty
/// vector is a valid answer, not an error.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn search(&self, query: &LookupQuery) -> Result<Vec<Candidate>, SourceError>;
}

/// Failure of a remote search. Only ever surfaced through the suggestion list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("lookup transport failed: {0}")]
    Transport(String),
    #[error("lookup timed out")]
    Timeout,
    #[error("lookup service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed lookup response: {0}")]
    Decode(String),
    #[error("lookup requires a scope")]
    MissingScope,
}
