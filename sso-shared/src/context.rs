/// Per-call cancellation and deadline propagation
///
/// Every authentication operation receives a [`CallContext`] from its caller.
/// The service runs each directory/registry call through [`CallContext::run`],
/// which races the call against the context's cancellation token and
/// deadline. When either fires first, the in-flight future is dropped (which
/// cancels the underlying I/O) and the call fails with
/// [`StorageError::Cancelled`] or [`StorageError::DeadlineExceeded`].
///
/// # Example
///
/// ```
/// use sso_shared::context::CallContext;
/// use std::time::Duration;
///
/// # async fn example() {
/// let ctx = CallContext::with_timeout(Duration::from_secs(5));
///
/// // Cancelling the parent cancels every child
/// let child = ctx.child();
/// ctx.cancel();
/// assert!(child.is_cancelled());
/// # }
/// ```

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::storage::{StorageError, StorageResult};

/// Cancellation signal plus optional deadline for one caller request
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires after `timeout`
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// A context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Uses an existing cancellation token
    pub fn from_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Derives a context cancelled together with this one
    ///
    /// The child keeps the parent's deadline.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derives a child whose deadline is at most `timeout` from now
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now().checked_add(timeout);
        let deadline = match (self.deadline, candidate) {
            (Some(existing), Some(candidate)) => Some(existing.min(candidate)),
            (existing, candidate) => existing.or(candidate),
        };

        Self {
            cancel: self.cancel.child_token(),
            deadline,
        }
    }

    /// Cancels this context and all of its children
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancellation token backing this context
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs a storage call under this context
    ///
    /// Cancellation wins over a simultaneously ready result, so a call made
    /// with an already-cancelled context never reaches the store.
    pub async fn run<T, F>(&self, fut: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        if self.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        match self.deadline {
            Some(deadline) => {
                if deadline <= Instant::now() {
                    return Err(StorageError::DeadlineExceeded);
                }
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(StorageError::Cancelled),
                    _ = sleep_until(deadline) => Err(StorageError::DeadlineExceeded),
                    result = fut => result,
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(StorageError::Cancelled),
                    result = fut => result,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_passes_result_through() {
        let ctx = CallContext::background();

        let ok = ctx.run(async { Ok::<_, StorageError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = ctx.run(async { Err::<i32, _>(StorageError::UserNotFound) }).await;
        assert!(matches!(err, Err(StorageError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_cancelled_context_short_circuits() {
        let ctx = CallContext::background();
        ctx.cancel();

        let result = ctx.run(async { Ok::<_, StorageError>(1) }).await;
        assert!(matches!(result, Err(StorageError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_during_call() {
        let ctx = CallContext::background();
        let canceller = ctx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, StorageError>(())
            })
            .await;
        assert!(matches!(result, Err(StorageError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let ctx = CallContext::with_timeout(Duration::from_millis(100));

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, StorageError>(())
            })
            .await;
        assert!(matches!(result, Err(StorageError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_short_circuits() {
        let ctx = CallContext::with_deadline(Instant::now());

        let result = ctx.run(async { Ok::<_, StorageError>(()) }).await;
        assert!(matches!(result, Err(StorageError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_child_follows_parent() {
        let parent = CallContext::background();
        let child = parent.child();

        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_shared_token_cancels_context() {
        let shutdown = CancellationToken::new();
        let ctx = CallContext::from_token(shutdown.child_token());
        assert_eq!(ctx.deadline(), None);

        shutdown.cancel();
        assert!(ctx.token().is_cancelled());

        let result = ctx.run(async { Ok::<_, StorageError>(()) }).await;
        assert!(matches!(result, Err(StorageError::Cancelled)));
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_has_no_deadline() {
        let ctx = CallContext::with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);

        let child = CallContext::background().child_with_timeout(Duration::MAX);
        assert_eq!(child.deadline(), None);

        let bounded = CallContext::with_timeout(Duration::from_secs(1));
        assert_eq!(bounded.child_with_timeout(Duration::MAX).deadline(), bounded.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_deadline_never_extends_parent() {
        let parent = CallContext::with_timeout(Duration::from_secs(1));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.child_with_timeout(Duration::from_millis(10));
        assert!(tighter.deadline() < parent.deadline());
    }
}
