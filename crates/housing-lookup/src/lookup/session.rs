use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

use super::domain::{Candidate, CandidateId, LookupQuery, LookupStatus, RequestToken, ScopeFilter};
use super::source::SourceError;

pub const DEFAULT_MIN_QUERY_LEN: usize = 2;

/// Per-field rules a session enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRules {
    pub min_query_len: usize,
    /// When set, lookups are suppressed until a scope is provided and the hint is shown instead.
    pub scope_hint: Option<String>,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            scope_hint: None,
        }
    }
}

impl SessionRules {
    pub fn scoped(hint: impl Into<String>) -> Self {
        Self {
            scope_hint: Some(hint.into()),
            ..Self::default()
        }
    }

    pub fn with_min_query_len(mut self, min_query_len: usize) -> Self {
        self.min_query_len = min_query_len.max(1);
        self
    }
}

/// What the controller must do after a keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Query too short or precondition unmet: results were cleared, nothing to schedule.
    Suppressed,
    /// Arm the debounce timer for this query.
    Schedule(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale,
}

/// Transient state of one autocomplete field.
#[derive(Debug)]
pub struct LookupSession {
    rules: SessionRules,
    query_text: String,
    scope: Option<ScopeFilter>,
    last_minted: u64,
    current: RequestToken,
    results: Vec<Candidate>,
    status: LookupStatus,
    selection: Option<Candidate>,
    last_error: Option<String>,
    closed: bool,
}

impl LookupSession {
    pub fn new(rules: SessionRules) -> Self {
        Self {
            rules,
            query_text: String::new(),
            scope: None,
            last_minted: 0,
            current: RequestToken::default(),
            results: Vec::new(),
            status: LookupStatus::Idle,
            selection: None,
            last_error: None,
            closed: false,
        }
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn results(&self) -> &[Candidate] {
        &self.results
    }

    pub fn status(&self) -> LookupStatus {
        self.status
    }

    pub fn selection(&self) -> Option<&Candidate> {
        self.selection.as_ref()
    }

    pub fn scope(&self) -> Option<&ScopeFilter> {
        self.scope.as_ref()
    }

    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    pub fn current_token(&self) -> RequestToken {
        self.current
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the field's dependent precondition (a scope) is satisfied.
    pub fn precondition_met(&self) -> bool {
        self.rules.scope_hint.is_none() || self.scope.is_some()
    }

    pub fn meets_min_len(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.rules.min_query_len
    }

    /// Record a keystroke.
    ///
    /// Every keystroke retires the in-flight token, so no response for older text can land
    /// once the field has changed. A scheduled keystroke owns the freshly minted token until
    /// its timer fires. Typing also drops any committed selection and the visible results.
    pub fn input(&mut self, text: &str) -> InputOutcome {
        if self.closed {
            return InputOutcome::Suppressed;
        }

        self.query_text = text.to_owned();
        self.selection = None;
        self.retire();
        self.results.clear();
        self.last_error = None;

        if !self.meets_min_len(text) || !self.precondition_met() {
            self.status = LookupStatus::Idle;
            return InputOutcome::Suppressed;
        }

        self.status = LookupStatus::Debouncing;
        InputOutcome::Schedule(text.trim().to_owned())
    }

    /// Hand out the token minted for the scheduled keystroke as its lookup hits the source.
    ///
    /// Refused unless the session is still debouncing exactly this text, so a timer that
    /// fired concurrently with a newer keystroke or a selection cannot start a lookup.
    pub fn begin_request(&mut self, text: &str) -> Option<(RequestToken, LookupQuery)> {
        if self.closed
            || self.status != LookupStatus::Debouncing
            || self.query_text.trim() != text.trim()
            || !self.meets_min_len(text)
            || !self.precondition_met()
        {
            return None;
        }

        self.status = LookupStatus::Loading;

        Some((
            self.current,
            LookupQuery {
                text: text.trim().to_owned(),
                scope: self.scope.clone(),
            },
        ))
    }

    /// Apply a completed lookup if, and only if, its token is still current.
    pub fn apply(
        &mut self,
        token: RequestToken,
        outcome: Result<Vec<Candidate>, SourceError>,
    ) -> ApplyOutcome {
        if self.closed || token != self.current {
            return ApplyOutcome::Stale;
        }

        match outcome {
            Ok(results) => {
                self.results = results;
                self.last_error = None;
                self.status = LookupStatus::Settled;
            }
            Err(err) => {
                self.results.clear();
                self.last_error = Some(err.to_string());
                self.status = LookupStatus::Errored;
            }
        }

        ApplyOutcome::Applied
    }

    /// Commit a selection and collapse the session back to idle.
    pub fn select(&mut self, candidate: Candidate) {
        self.retire();
        self.selection = Some(candidate);
        self.query_text.clear();
        self.results.clear();
        self.last_error = None;
        self.status = LookupStatus::Idle;
    }

    /// Select one of the settled results by id. Nothing is selectable while a newer
    /// keystroke is debouncing or its lookup is loading.
    pub fn select_by_id(&mut self, id: &CandidateId) -> Option<Candidate> {
        if self.status != LookupStatus::Settled {
            return None;
        }
        let candidate = self.results.iter().find(|c| &c.id == id).cloned()?;
        self.select(candidate.clone());
        Some(candidate)
    }

    pub fn clear_selection(&mut self) {
        self.retire();
        self.selection = None;
        self.query_text.clear();
        self.results.clear();
        self.last_error = None;
        self.status = LookupStatus::Idle;
    }

    /// Change the dependent scope. Anything typed or selected under the old scope is dropped.
    pub fn set_scope(&mut self, scope: Option<ScopeFilter>) -> bool {
        if self.scope == scope {
            return false;
        }
        self.scope = scope;
        self.clear_selection();
        true
    }

    /// Stop accepting responses and input; used when the owning field goes away.
    pub fn close(&mut self) {
        self.retire();
        self.closed = true;
        if self.status.is_pending() {
            self.status = LookupStatus::Idle;
        }
    }

    pub fn snapshot(&self) -> LookupSnapshot {
        LookupSnapshot {
            query_text: self.query_text.clone(),
            token: self.current,
            results: self.results.clone(),
            status: self.status,
            selection: self.selection.clone(),
            last_error: self.last_error.clone(),
        }
    }

    // Moves the current token past every minted one so in-flight responses become stale.
    fn retire(&mut self) {
        self.last_minted += 1;
        self.current = RequestToken(self.last_minted);
    }
}

/// Point-in-time copy of a session, published to subscribers after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupSnapshot {
    pub query_text: String,
    pub token: RequestToken,
    pub results: Vec<Candidate>,
    pub status: LookupStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Session shared between a controller and its background lookups.
#[derive(Clone)]
pub(crate) struct SharedSession {
    inner: Arc<Mutex<LookupSession>>,
    updates: Arc<watch::Sender<LookupSnapshot>>,
}

impl SharedSession {
    pub(crate) fn new(session: LookupSession) -> (Self, watch::Receiver<LookupSnapshot>) {
        let (sender, receiver) = watch::channel(session.snapshot());
        let shared = Self {
            inner: Arc::new(Mutex::new(session)),
            updates: Arc::new(sender),
        };
        (shared, receiver)
    }

    /// Mutate the session and publish the resulting snapshot.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut LookupSession) -> R) -> R {
        let mut guard = self.lock();
        let result = f(&mut guard);
        self.updates.send_replace(guard.snapshot());
        result
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&LookupSession) -> R) -> R {
        f(&self.lock())
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<LookupSnapshot> {
        self.updates.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, LookupSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
