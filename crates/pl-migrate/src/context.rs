//! Caller-supplied cancellation and deadline for a run.

use crate::error::{MigrateError, MigrateResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Execution context carrying an optional deadline and a cancellation flag.
///
/// Individual statements are never interrupted; the executor checks the
/// context before each step, so an expired deadline aborts the run at the
/// next step boundary.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl RunContext {
    /// A context with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancelled: Arc::default(),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    /// Shared flag; storing `true` cancels every run using this context.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Cancel runs using this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Fail with [`MigrateError::Cancelled`] if cancelled or past the deadline.
    pub fn check(&self) -> MigrateResult<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(MigrateError::Cancelled {
                reason: "cancelled by caller".to_string(),
            });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(MigrateError::Cancelled {
                    reason: "deadline exceeded".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_never_expires() {
        assert!(RunContext::new().check().is_ok());
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = RunContext::with_deadline(Instant::now() - Duration::from_millis(1));
        let err = ctx.check().unwrap_err();
        assert!(err.to_string().contains("deadline exceeded"));
    }

    #[test]
    fn test_cancel_is_shared_across_clones() {
        let ctx = RunContext::with_timeout(Duration::from_secs(60));
        let clone = ctx.clone();
        assert!(clone.check().is_ok());
        ctx.cancel_handle().store(true, Ordering::SeqCst);
        assert!(matches!(
            clone.check(),
            Err(MigrateError::Cancelled { .. })
        ));
    }
}
