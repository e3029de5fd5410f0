use serde::Serialize;

use super::domain::{Candidate, CandidateId, LookupStatus};
use super::session::LookupSession;

pub const EMPTY_MESSAGE: &str = "No matches found";
pub const RETRY_MESSAGE: &str = "Suggestions are unavailable right now, try again";

/// One selectable row of a populated suggestion list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultEntry {
    pub id: CandidateId,
    pub primary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl From<&Candidate> for ResultEntry {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.clone(),
            primary: candidate.name.clone(),
            secondary: candidate.parent.clone(),
        }
    }
}

/// Mutually exclusive visual states of a lookup field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    Idle {
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
    Loading,
    Empty {
        message: String,
    },
    Populated {
        entries: Vec<ResultEntry>,
    },
    /// Neutral retry affordance; lookup failures never block the form.
    Failed {
        message: String,
    },
    Selected {
        candidate: Candidate,
    },
}

impl ViewState {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle { .. } => "idle",
            Self::Loading => "loading",
            Self::Empty { .. } => "empty",
            Self::Populated { .. } => "populated",
            Self::Failed { .. } => "failed",
            Self::Selected { .. } => "selected",
        }
    }
}

/// Pure mapping from session state to what the field should show.
pub fn render(session: &LookupSession) -> ViewState {
    if let Some(candidate) = session.selection() {
        return ViewState::Selected {
            candidate: candidate.clone(),
        };
    }

    if !session.precondition_met() {
        return ViewState::Idle {
            hint: session.rules().scope_hint.clone(),
        };
    }

    match session.status() {
        LookupStatus::Debouncing | LookupStatus::Loading => ViewState::Loading,
        LookupStatus::Errored => ViewState::Failed {
            message: RETRY_MESSAGE.to_string(),
        },
        LookupStatus::Settled if !session.results().is_empty() => ViewState::Populated {
            entries: session.results().iter().map(ResultEntry::from).collect(),
        },
        LookupStatus::Settled if session.meets_min_len(session.query_text()) => {
            ViewState::Empty {
                message: EMPTY_MESSAGE.to_string(),
            }
        }
        LookupStatus::Settled | LookupStatus::Idle => ViewState::Idle { hint: None },
    }
}
