//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cloneable cancellation signal shared by the analyzer's threads.
///
/// A token is cancelled either explicitly through [`cancel`](Self::cancel)
/// or implicitly once its deadline passes. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// Creates a token that is only cancelled explicitly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token sharing this one's state that also expires at `deadline`.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = self.deadline.map_or(deadline, |d| d.min(deadline));
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(deadline),
        }
    }

    /// Returns a token sharing this one's state that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancelled or past the deadline.
    ///
    /// An expired deadline only affects this token and tokens derived from
    /// it; the shared flag is left untouched.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn expired_deadline_cancels() {
        let token = CancellationToken::new().with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());
    }

    #[test]
    fn earlier_deadline_wins() {
        let now = Instant::now();
        let token = CancellationToken::new()
            .with_deadline(now + Duration::from_secs(10))
            .with_deadline(now + Duration::from_secs(60));
        assert_eq!(token.deadline(), Some(now + Duration::from_secs(10)));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn expired_deadline_leaves_parent_untouched() {
        let token = CancellationToken::new();
        let bounded = token.with_timeout(Duration::ZERO);
        assert!(bounded.is_cancelled());
        assert!(!token.is_cancelled());
        assert!(!token.with_timeout(Duration::from_secs(3600)).is_cancelled());
    }

    #[test]
    fn deadline_token_shares_explicit_cancel() {
        let token = CancellationToken::new();
        let bounded = token.with_timeout(Duration::from_secs(3600));
        token.cancel();
        assert!(bounded.is_cancelled());
    }
}
