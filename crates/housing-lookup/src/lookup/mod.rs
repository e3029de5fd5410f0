//! Debounced remote lookup used by every autocomplete-style field.
//!
//! Keystrokes land in a [`LookupSession`], the [`DebounceGate`] holds them back until input
//! goes quiet, the [`RequestSequencer`] issues the search and applies only the newest
//! response, and [`render`] maps the session to a [`ViewState`]. [`LookupController`] wires
//! the four together for a single field.

mod controller;
pub mod debounce;
pub mod domain;
pub mod presenter;
pub mod sequencer;
pub mod session;
pub mod source;

#[cfg(test)]
mod tests;

pub use controller::{LookupController, LookupError, LookupOptions};
pub use debounce::DebounceGate;
pub use domain::{Candidate, CandidateId, LookupQuery, LookupStatus, RequestToken, ScopeFilter};
pub use presenter::{render, ResultEntry, ViewState};
pub use sequencer::{IssueOutcome, RequestSequencer};
pub use session::{ApplyOutcome, InputOutcome, LookupSession, LookupSnapshot, SessionRules};
pub use source::{CandidateSource, SourceError};
