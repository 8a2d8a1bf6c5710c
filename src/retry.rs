//! Retry with linear backoff
//!
//! Retry number `n` (1-based) waits `base_delay * n` before running, so the
//! default policy sleeps 1s, 2s, 3s between four attempts in total. A shared
//! [`RetryHandle`] lets the owner abandon the loop at any point: an attempt
//! in flight or a backoff sleep is dropped as soon as the handle is
//! cancelled, and results that arrive after cancellation are discarded.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// Errors that know whether trying again can help
pub trait Transient {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Never retry
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Cancellation signal shared between a retry loop and its owner
#[derive(Debug, Clone, Default)]
pub struct RetryHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug, Default)]
struct HandleInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl RetryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel and wake every loop waiting on this handle
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`Self::cancel`] has been called
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not lost
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("operation cancelled")]
    Cancelled,

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// Failed with an error retrying cannot fix
    #[error("{0}")]
    Fatal(E),
}

/// Run `op` until it succeeds, fails permanently, runs out of retries or
/// `handle` is cancelled.
///
/// `op` receives the 1-based attempt number. `on_retry` runs before each
/// backoff sleep with the 1-based retry number and the error that caused it.
pub async fn retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    handle: &RetryHandle,
    mut op: F,
    mut on_retry: R,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(u32, &E),
    E: Transient + std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        if handle.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        attempt += 1;
        let result = tokio::select! {
            _ = handle.cancelled() => return Err(RetryError::Cancelled),
            result = op(attempt) => result,
        };

        if handle.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        match result {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(RetryError::Fatal(e)),
            Err(e) => {
                if attempt > policy.max_retries {
                    return Err(RetryError::Exhausted { attempts: attempt, last: e });
                }

                tracing::warn!(
                    "Attempt {}/{} failed: {}",
                    attempt,
                    policy.max_attempts(),
                    e
                );
                on_retry(attempt, &e);
                tokio::select! {
                    _ = handle.cancelled() => return Err(RetryError::Cancelled),
                    _ = tokio::time::sleep(policy.delay_for(attempt)) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (transient: {})", self.transient)
        }
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    const INSTANT: RetryPolicy = RetryPolicy::new(3, Duration::ZERO);

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(3000));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let mut retries = Vec::new();

        let result = retry(
            &INSTANT,
            &RetryHandle::new(),
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(TestError { transient: true })
                    } else {
                        Ok(attempt)
                    }
                }
            },
            |n, _| retries.push(n),
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(retries, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_exhausts_after_max_retries() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry(
            &INSTANT,
            &RetryHandle::new(),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: true }) }
            },
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 4, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry(
            &INSTANT,
            &RetryHandle::new(),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: false }) }
            },
            |_, _| panic!("fatal errors must not schedule a retry"),
        )
        .await;

        assert!(matches!(result, Err(RetryError::Fatal(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_between_attempts() {
        let handle = RetryHandle::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry(
            &INSTANT,
            &handle,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: true }) }
            },
            |_, _| handle.cancel(),
        )
        .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_backoff() {
        let handle = RetryHandle::new();
        let slow = RetryPolicy::new(3, Duration::from_secs(30));

        let canceller = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let result: Result<(), _> = retry(
            &slow,
            &handle,
            |_| async { Err(TestError { transient: true }) },
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_attempt_in_flight() {
        let handle = RetryHandle::new();

        let canceller = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result: Result<(), RetryError<TestError>> = retry(
            &INSTANT,
            &handle,
            |_| std::future::pending(),
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let handle = RetryHandle::new();
        handle.cancel();
        handle.cancelled().await;
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_handle_never_runs() {
        let handle = RetryHandle::new();
        handle.cancel();

        let result: Result<(), RetryError<TestError>> =
            retry(&INSTANT, &handle, |_| async { Ok(()) }, |_, _| {}).await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
    }
}
