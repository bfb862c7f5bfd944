use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Control side of a cancellation signal. Dropping it does not cancel.
#[derive(Debug, Default)]
pub struct CancellationSource {
    inner: Arc<CancellationInner>,
}

/// Observer side handed to long-running remote operations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancellationInner>,
}

#[derive(Debug, Default)]
struct CancellationInner {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl CancellationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        let _guard = self
            .inner
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.inner.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }
}

impl CancellationToken {
    /// A token whose source has been dropped; it never fires.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Sleeps for `duration` unless cancelled first. Returns `true` if cancelled.
    ///
    /// A duration too large to represent as a deadline waits for cancellation only.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        let mut guard = self
            .inner
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        loop {
            if self.is_cancelled() {
                return true;
            }
            guard = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    self.inner
                        .wake
                        .wait_timeout(guard, deadline - now)
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .0
                }
                None => self
                    .inner
                    .wake
                    .wait(guard)
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn cancel_reaches_every_token_clone() {
        let source = CancellationSource::new();
        let first = source.token();
        let second = first.clone();
        assert!(!first.is_cancelled());

        source.cancel();
        assert!(first.is_cancelled());
        assert!(second.is_cancelled());
        assert!(source.is_cancelled());
    }

    #[test]
    fn dropping_the_source_does_not_cancel() {
        let source = CancellationSource::new();
        let token = source.token();
        drop(source);
        assert!(!token.is_cancelled());
        assert!(!CancellationToken::never().is_cancelled());
    }

    #[test]
    fn wait_timeout_elapses_without_cancel() {
        let token = CancellationToken::never();
        assert!(!token.wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn wait_timeout_wakes_early_on_cancel() {
        let source = CancellationSource::new();
        let token = source.token();
        let waiter = thread::spawn(move || {
            let started = Instant::now();
            let cancelled = token.wait_timeout(Duration::from_secs(30));
            (cancelled, started.elapsed())
        });
        thread::sleep(Duration::from_millis(20));
        source.cancel();

        let (cancelled, elapsed) = waiter.join().unwrap();
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(10));
    }

    #[test]
    fn unrepresentable_timeout_waits_for_cancel_without_panicking() {
        let source = CancellationSource::new();
        let token = source.token();
        let waiter = thread::spawn(move || token.wait_timeout(Duration::MAX));
        thread::sleep(Duration::from_millis(20));
        source.cancel();
        assert!(waiter.join().unwrap());
    }
}
