use std::sync::Arc;

use tracing::{debug, warn};

use super::domain::RequestToken;
use super::session::{ApplyOutcome, SharedSession};
use super::source::CandidateSource;

/// Result of one `issue` call, mostly useful to tests and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    /// The session refused to start a lookup (closed, short query, precondition unmet).
    Skipped,
    Applied(RequestToken),
    /// A newer lookup superseded this one before it completed.
    Dropped(RequestToken),
}

/// Issues lookups against a source and applies only the most recent one.
///
/// In-flight calls are never aborted. A response whose token no longer matches the session's
/// current token is dropped without touching state, whether it succeeded or failed.
pub struct RequestSequencer<S: ?Sized> {
    source: Arc<S>,
    session: SharedSession,
}

impl<S> RequestSequencer<S>
where
    S: CandidateSource + ?Sized,
{
    pub(crate) fn new(source: Arc<S>, session: SharedSession) -> Self {
        Self { source, session }
    }

    pub async fn issue(&self, text: String) -> IssueOutcome {
        let Some((token, query)) = self.session.update(|session| session.begin_request(&text))
        else {
            return IssueOutcome::Skipped;
        };

        debug!(%token, query = %query.text, "issuing lookup");
        let outcome = self.source.search(&query).await;
        let failure = outcome.as_ref().err().map(ToString::to_string);

        match self.session.update(|session| session.apply(token, outcome)) {
            ApplyOutcome::Applied => {
                if let Some(error) = failure {
                    warn!(%token, query = %query.text, %error, "lookup failed");
                }
                IssueOutcome::Applied(token)
            }
            ApplyOutcome::Stale => {
                debug!(%token, query = %query.text, "dropping superseded lookup response");
                IssueOutcome::Dropped(token)
            }
        }
    }
}
