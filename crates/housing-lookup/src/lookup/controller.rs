use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use super::debounce::{DebounceGate, DEFAULT_DEBOUNCE};
use super::domain::{Candidate, CandidateId, ScopeFilter};
use super::presenter::{render, ViewState};
use super::sequencer::RequestSequencer;
use super::session::{InputOutcome, LookupSession, LookupSnapshot, SessionRules, SharedSession};
use super::source::CandidateSource;
use crate::config::LookupConfig;

/// Tuning for one lookup field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOptions {
    pub debounce: Duration,
    pub rules: SessionRules,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            rules: SessionRules::default(),
        }
    }
}

impl LookupOptions {
    pub fn from_config(config: &LookupConfig) -> Self {
        Self {
            debounce: config.debounce(),
            rules: SessionRules::default().with_min_query_len(config.min_query_len),
        }
    }

    pub fn scoped(mut self, hint: impl Into<String>) -> Self {
        self.rules.scope_hint = Some(hint.into());
        self
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("candidate {0} is not among the visible results")]
    UnknownCandidate(CandidateId),
}

/// Handle owned by exactly one autocomplete field.
///
/// Wires keystrokes through the debounce gate into the request sequencer and publishes a
/// [`LookupSnapshot`] after every transition. Dropping the controller cancels the armed timer
/// and closes the session, so nothing reaches it afterwards.
pub struct LookupController<S: ?Sized> {
    session: SharedSession,
    gate: DebounceGate,
    sequencer: Arc<RequestSequencer<S>>,
}

impl<S> LookupController<S>
where
    S: CandidateSource + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, options: LookupOptions) -> Self {
        let (session, _) = SharedSession::new(LookupSession::new(options.rules));
        let sequencer = Arc::new(RequestSequencer::new(source, session.clone()));

        Self {
            session,
            gate: DebounceGate::new(options.debounce),
            sequencer,
        }
    }

    /// Feed the field's full current text. Must be called within a tokio runtime.
    pub fn on_input(&mut self, text: &str) {
        match self.session.update(|session| session.input(text)) {
            InputOutcome::Suppressed => {
                if self.gate.cancel() {
                    debug!(query = %text, "cancelled pending lookup for suppressed query");
                }
            }
            InputOutcome::Schedule(query) => {
                let sequencer = Arc::clone(&self.sequencer);
                self.gate.schedule(async move {
                    sequencer.issue(query).await;
                });
            }
        }
    }

    /// Commit one of the visible results.
    pub fn select(&mut self, id: &CandidateId) -> Result<Candidate, LookupError> {
        let candidate = self
            .session
            .update(|session| session.select_by_id(id))
            .ok_or_else(|| LookupError::UnknownCandidate(id.clone()))?;
        self.gate.cancel();
        Ok(candidate)
    }

    /// Commit a candidate obtained elsewhere, e.g. a value restored into the form.
    pub fn preselect(&mut self, candidate: Candidate) {
        self.gate.cancel();
        self.session.update(|session| session.select(candidate));
    }

    pub fn clear_selection(&mut self) {
        self.gate.cancel();
        self.session.update(LookupSession::clear_selection);
    }

    /// Provide or withdraw the dependent scope (e.g. the selected city).
    pub fn set_scope(&mut self, scope: Option<ScopeFilter>) {
        if self.session.update(|session| session.set_scope(scope)) {
            self.gate.cancel();
        }
    }

    pub fn view(&self) -> ViewState {
        self.session.read(render)
    }

    pub fn snapshot(&self) -> LookupSnapshot {
        self.session.read(LookupSession::snapshot)
    }

    pub fn selection(&self) -> Option<Candidate> {
        self.session.read(|session| session.selection().cloned())
    }

    pub fn subscribe(&self) -> watch::Receiver<LookupSnapshot> {
        self.session.subscribe()
    }

    /// Wait until no lookup is armed or in flight and return the resulting snapshot.
    pub async fn settled(&self) -> LookupSnapshot {
        let mut updates = self.session.subscribe();
        loop {
            {
                let snapshot = updates.borrow_and_update();
                if !snapshot.status.is_pending() {
                    return snapshot.clone();
                }
            }
            if updates.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    /// Tear the field down explicitly; equivalent to dropping it.
    pub fn dispose(self) {}
}

impl<S: ?Sized> Drop for LookupController<S> {
    fn drop(&mut self) {
        self.gate.cancel();
        self.session.update(LookupSession::close);
    }
}
