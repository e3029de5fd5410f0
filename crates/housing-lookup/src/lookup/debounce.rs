use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Cancellable single-slot timer.
///
/// The gate owns at most one armed timer. Scheduling cancels the previous one before arming a
/// new one; dropping or disposing the gate cancels whatever is armed. Work that already fired
/// is left to finish, staleness of its outcome is the sequencer's concern.
#[derive(Debug)]
pub struct DebounceGate {
    delay: Duration,
    armed: Option<CancellationToken>,
}

impl DebounceGate {
    pub fn new(delay: Duration) -> Self {
        Self { delay, armed: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the timer; `action` runs once the delay elapses without another `schedule` or
    /// `cancel`. Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let token = CancellationToken::new();
        let armed = token.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = armed.cancelled() => {}
                _ = tokio::time::sleep(delay) => action.await,
            }
        });

        self.armed = Some(token);
    }

    /// Cancel the armed timer, if any. Returns whether something was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn dispose(mut self) {
        self.cancel();
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Drop for DebounceGate {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_action(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_quiet_period() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut gate = DebounceGate::new(Duration::from_millis(300));

        gate.schedule(counting_action(&fired));
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_supersedes_armed_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut gate = DebounceGate::new(Duration::from_millis(300));

        for _ in 0..5 {
            gate.schedule(counting_action(&fired));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_gate_cancels_armed_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut gate = DebounceGate::new(Duration::from_millis(300));
        gate.schedule(counting_action(&fired));

        drop(gate);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_reports_whether_timer_was_armed() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut gate = DebounceGate::default();
        assert!(!gate.cancel());

        gate.schedule(counting_action(&fired));
        assert!(gate.cancel());
        assert!(!gate.cancel());
    }
}
