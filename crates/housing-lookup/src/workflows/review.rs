//! Confirm-then-execute review flow for moderation actions.
//!
//! Every action an admin takes on a listing, user, or payment goes through the same table:
//! `pending -> confirming -> processing -> done | failed`. The table lives in [`transition`]
//! so that no screen can invent its own shortcut.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Listing,
    User,
    Payment,
}

impl SubjectKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Listing => "Listing",
            Self::User => "User",
            Self::Payment => "Payment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReviewSubject {
    pub kind: SubjectKind,
    pub id: String,
}

impl ReviewSubject {
    pub fn new(kind: SubjectKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject { reason: String },
    Delete,
}

impl ReviewAction {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject { .. } => "reject",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReviewState {
    Pending,
    Confirming { action: ReviewAction },
    Processing { action: ReviewAction },
    Done { action: ReviewAction },
    Failed { action: ReviewAction, reason: String },
}

impl ReviewState {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirming { .. } => "confirming",
            Self::Processing { .. } => "processing",
            Self::Done { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn action(&self) -> Option<&ReviewAction> {
        match self {
            Self::Pending => None,
            Self::Confirming { action }
            | Self::Processing { action }
            | Self::Done { action }
            | Self::Failed { action, .. } => Some(action),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReviewEvent {
    Request { action: ReviewAction },
    Cancel,
    Confirm,
    Succeed,
    Fail { reason: String },
    Retry,
    Reset,
}

impl ReviewEvent {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Request { .. } => "request",
            Self::Cancel => "cancel",
            Self::Confirm => "confirm",
            Self::Succeed => "succeed",
            Self::Fail { .. } => "fail",
            Self::Retry => "retry",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {event} while {state}")]
    Invalid {
        state: &'static str,
        event: &'static str,
    },
    #[error("a rejection needs a reason")]
    MissingReason,
    #[error("sub-units still awaiting approval: {}", .0.join(", "))]
    UnitsPending(Vec<String>),
    #[error("unit {0} is not part of this listing")]
    UnknownUnit(String),
}

/// The transition table. Pure: the caller decides whether to commit the new state.
pub fn transition(
    state: &ReviewState,
    event: &ReviewEvent,
) -> Result<ReviewState, TransitionError> {
    use ReviewEvent as E;
    use ReviewState as S;

    match (state, event) {
        (S::Pending, E::Request { action }) => {
            if let ReviewAction::Reject { reason } = action {
                if reason.trim().is_empty() {
                    return Err(TransitionError::MissingReason);
                }
            }
            Ok(S::Confirming {
                action: action.clone(),
            })
        }
        (S::Confirming { .. }, E::Cancel) => Ok(S::Pending),
        (S::Confirming { action }, E::Confirm) => Ok(S::Processing {
            action: action.clone(),
        }),
        (S::Processing { action }, E::Succeed) => Ok(S::Done {
            action: action.clone(),
        }),
        (S::Processing { action }, E::Fail { reason }) => Ok(S::Failed {
            action: action.clone(),
            reason: reason.clone(),
        }),
        (S::Failed { action, .. }, E::Retry) => Ok(S::Processing {
            action: action.clone(),
        }),
        (S::Failed { .. } | S::Done { .. }, E::Reset) => Ok(S::Pending),
        (state, event) => Err(TransitionError::Invalid {
            state: state.label(),
            event: event.label(),
        }),
    }
}

/// Audit row for one committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewTransition {
    pub from: &'static str,
    pub event: &'static str,
    pub to: &'static str,
    pub at: DateTime<Utc>,
}

/// Performs the side effect of a confirmed action against the system of record.
#[async_trait]
pub trait ReviewGateway: Send + Sync {
    async fn execute(&self, subject: &ReviewSubject, action: &ReviewAction) -> Result<(), String>;
}

#[derive(Debug, Clone)]
pub struct ReviewWorkflow {
    subject: ReviewSubject,
    state: ReviewState,
    history: Vec<ReviewTransition>,
}

impl ReviewWorkflow {
    pub fn new(subject: ReviewSubject) -> Self {
        Self {
            subject,
            state: ReviewState::Pending,
            history: Vec::new(),
        }
    }

    pub fn subject(&self) -> &ReviewSubject {
        &self.subject
    }

    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    pub fn history(&self) -> &[ReviewTransition] {
        &self.history
    }

    /// Apply one event; on error the state is left untouched.
    pub fn apply(
        &mut self,
        event: ReviewEvent,
        at: DateTime<Utc>,
    ) -> Result<&ReviewState, TransitionError> {
        let next = transition(&self.state, &event)?;
        self.history.push(ReviewTransition {
            from: self.state.label(),
            event: event.label(),
            to: next.label(),
            at,
        });
        self.state = next;
        Ok(&self.state)
    }

    pub fn request(
        &mut self,
        action: ReviewAction,
        at: DateTime<Utc>,
    ) -> Result<&ReviewState, TransitionError> {
        self.apply(ReviewEvent::Request { action }, at)
    }

    /// Confirm the pending request (or retry a failed one) and run it through `gateway`.
    ///
    /// Gateway failures land in `failed` rather than surfacing as errors; only an invalid
    /// starting state is an `Err`.
    pub async fn confirm_and_execute<G>(
        &mut self,
        gateway: &G,
        at: DateTime<Utc>,
    ) -> Result<&ReviewState, TransitionError>
    where
        G: ReviewGateway + ?Sized,
    {
        let start = match self.state {
            ReviewState::Failed { .. } => ReviewEvent::Retry,
            _ => ReviewEvent::Confirm,
        };
        self.apply(start, at)?;

        let Some(action) = self.state.action().cloned() else {
            return Ok(&self.state);
        };

        match gateway.execute(&self.subject, &action).await {
            Ok(()) => {
                info!(
                    kind = self.subject.kind.label(),
                    id = %self.subject.id,
                    action = action.label(),
                    "review action applied"
                );
                self.apply(ReviewEvent::Succeed, at)
            }
            Err(reason) => {
                warn!(
                    kind = self.subject.kind.label(),
                    id = %self.subject.id,
                    action = action.label(),
                    %reason,
                    "review action failed"
                );
                self.apply(ReviewEvent::Fail { reason }, at)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum UnitDecision {
    Pending,
    Approved,
    Rejected { reason: String },
}

/// Review of a container listing (a boarding house) whose rooms are reviewed one by one.
#[derive(Debug, Clone)]
pub struct ContainerReview {
    workflow: ReviewWorkflow,
    units: BTreeMap<String, UnitDecision>,
}

impl ContainerReview {
    pub fn new<I, U>(listing_id: impl Into<String>, units: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        Self {
            workflow: ReviewWorkflow::new(ReviewSubject::new(SubjectKind::Listing, listing_id)),
            units: units
                .into_iter()
                .map(|unit| (unit.into(), UnitDecision::Pending))
                .collect(),
        }
    }

    pub fn workflow(&self) -> &ReviewWorkflow {
        &self.workflow
    }

    pub fn workflow_mut(&mut self) -> &mut ReviewWorkflow {
        &mut self.workflow
    }

    pub fn units(&self) -> &BTreeMap<String, UnitDecision> {
        &self.units
    }

    pub fn decide_unit(
        &mut self,
        unit: &str,
        decision: UnitDecision,
    ) -> Result<(), TransitionError> {
        if let UnitDecision::Rejected { reason } = &decision {
            if reason.trim().is_empty() {
                return Err(TransitionError::MissingReason);
            }
        }
        let slot = self
            .units
            .get_mut(unit)
            .ok_or_else(|| TransitionError::UnknownUnit(unit.to_string()))?;
        *slot = decision;
        Ok(())
    }

    /// Units not yet approved, in id order.
    pub fn outstanding_units(&self) -> Vec<String> {
        self.units
            .iter()
            .filter(|(_, decision)| **decision != UnitDecision::Approved)
            .map(|(unit, _)| unit.clone())
            .collect()
    }

    /// Request an action on the whole listing. Approval is gated on every unit.
    pub fn request(
        &mut self,
        action: ReviewAction,
        at: DateTime<Utc>,
    ) -> Result<&ReviewState, TransitionError> {
        if action == ReviewAction::Approve {
            let outstanding = self.outstanding_units();
            if !outstanding.is_empty() {
                return Err(TransitionError::UnitsPending(outstanding));
            }
        }
        self.workflow.request(action, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).expect("valid timestamp")
    }

    fn listing() -> ReviewWorkflow {
        ReviewWorkflow::new(ReviewSubject::new(SubjectKind::Listing, "listing-17"))
    }

    #[derive(Default)]
    struct RecordingGateway {
        fail_with: Option<String>,
        executed: Mutex<Vec<(String, &'static str)>>,
    }

    #[async_trait]
    impl ReviewGateway for RecordingGateway {
        async fn execute(
            &self,
            subject: &ReviewSubject,
            action: &ReviewAction,
        ) -> Result<(), String> {
            self.executed
                .lock()
                .expect("gateway mutex poisoned")
                .push((subject.id.clone(), action.label()));
            match &self.fail_with {
                Some(reason) => Err(reason.clone()),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn table_walks_the_happy_path() {
        let confirming = transition(
            &ReviewState::Pending,
            &ReviewEvent::Request {
                action: ReviewAction::Delete,
            },
        )
        .expect("request is allowed");
        let processing = transition(&confirming, &ReviewEvent::Confirm).expect("confirm");
        let done = transition(&processing, &ReviewEvent::Succeed).expect("succeed");

        assert_eq!(
            done,
            ReviewState::Done {
                action: ReviewAction::Delete
            }
        );
        assert_eq!(transition(&done, &ReviewEvent::Reset), Ok(ReviewState::Pending));
    }

    #[test]
    fn cancel_returns_to_pending_without_side_effects() {
        let mut workflow = listing();
        workflow
            .request(ReviewAction::Approve, now())
            .expect("request");
        workflow.apply(ReviewEvent::Cancel, now()).expect("cancel");

        assert_eq!(workflow.state(), &ReviewState::Pending);
        let steps: Vec<_> = workflow.history().iter().map(|t| (t.from, t.to)).collect();
        assert_eq!(steps, vec![("pending", "confirming"), ("confirming", "pending")]);
    }

    #[test]
    fn invalid_events_leave_state_unchanged() {
        let mut workflow = listing();
        let err = workflow
            .apply(ReviewEvent::Succeed, now())
            .expect_err("cannot succeed from pending");

        assert_eq!(
            err,
            TransitionError::Invalid {
                state: "pending",
                event: "succeed"
            }
        );
        assert_eq!(err.to_string(), "cannot succeed while pending");
        assert_eq!(workflow.state(), &ReviewState::Pending);
        assert!(workflow.history().is_empty());
    }

    #[test]
    fn rejection_requires_reason() {
        let mut workflow = listing();
        let err = workflow
            .request(
                ReviewAction::Reject {
                    reason: "   ".to_string(),
                },
                now(),
            )
            .expect_err("blank reason");
        assert_eq!(err, TransitionError::MissingReason);

        workflow
            .request(
                ReviewAction::Reject {
                    reason: "photos do not match the address".to_string(),
                },
                now(),
            )
            .expect("reason supplied");
        assert_eq!(workflow.state().label(), "confirming");
    }

    #[tokio::test]
    async fn confirm_and_execute_runs_gateway_once() {
        let gateway = RecordingGateway::default();
        let mut workflow = listing();
        workflow
            .request(ReviewAction::Approve, now())
            .expect("request");

        let state = workflow
            .confirm_and_execute(&gateway, now())
            .await
            .expect("confirmed");

        assert_eq!(
            state,
            &ReviewState::Done {
                action: ReviewAction::Approve
            }
        );
        assert_eq!(
            *gateway.executed.lock().expect("gateway mutex poisoned"),
            vec![("listing-17".to_string(), "approve")]
        );
    }

    #[tokio::test]
    async fn gateway_failure_lands_in_failed_and_can_retry() {
        let failing = RecordingGateway {
            fail_with: Some("payment processor unavailable".to_string()),
            ..RecordingGateway::default()
        };
        let mut workflow =
            ReviewWorkflow::new(ReviewSubject::new(SubjectKind::Payment, "pay-301"));
        workflow.request(ReviewAction::Delete, now()).expect("request");

        let state = workflow
            .confirm_and_execute(&failing, now())
            .await
            .expect("failure is a state, not an error");
        assert_eq!(state.label(), "failed");

        let state = workflow
            .confirm_and_execute(&RecordingGateway::default(), now())
            .await
            .expect("retry");
        assert_eq!(state.label(), "done");
        let events: Vec<_> = workflow.history().iter().map(|t| t.event).collect();
        assert_eq!(
            events,
            vec!["request", "confirm", "fail", "retry", "succeed"]
        );
    }

    #[tokio::test]
    async fn confirm_without_request_is_rejected() {
        let mut workflow = listing();
        let err = workflow
            .confirm_and_execute(&RecordingGateway::default(), now())
            .await
            .expect_err("nothing to confirm");
        assert_eq!(
            err,
            TransitionError::Invalid {
                state: "pending",
                event: "confirm"
            }
        );
    }

    #[test]
    fn container_approval_waits_for_every_unit() {
        let mut review = ContainerReview::new("casa-estudiantil-9", ["room-a", "room-b", "room-c"]);
        review
            .decide_unit("room-a", UnitDecision::Approved)
            .expect("known unit");
        review
            .decide_unit(
                "room-c",
                UnitDecision::Rejected {
                    reason: "no window".to_string(),
                },
            )
            .expect("known unit");

        let err = review
            .request(ReviewAction::Approve, now())
            .expect_err("units outstanding");
        assert_eq!(
            err,
            TransitionError::UnitsPending(vec!["room-b".to_string(), "room-c".to_string()])
        );
        assert_eq!(review.workflow().state(), &ReviewState::Pending);

        review
            .decide_unit("room-b", UnitDecision::Approved)
            .expect("known unit");
        review
            .decide_unit("room-c", UnitDecision::Approved)
            .expect("known unit");
        review
            .request(ReviewAction::Approve, now())
            .expect("all units approved");
        assert_eq!(review.workflow().state().label(), "confirming");
    }

    #[test]
    fn container_rejection_is_not_gated_on_units() {
        let mut review = ContainerReview::new("casa-estudiantil-9", ["room-a"]);
        assert_eq!(
            review.decide_unit("room-z", UnitDecision::Approved),
            Err(TransitionError::UnknownUnit("room-z".to_string()))
        );
        review
            .request(
                ReviewAction::Reject {
                    reason: "duplicate listing".to_string(),
                },
                now(),
            )
            .expect("reject does not wait for units");
    }
}
