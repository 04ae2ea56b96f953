//! Cooperative stop signal shared by workers and the escalation loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// One-shot stop flag with interruptible sleeps.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    /// Create an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the signal and wake every sleeper.
    pub fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock() = true;
        cvar.notify_all();
    }

    /// Whether `trigger` was called.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Sleep for `duration` unless the signal fires first.
    ///
    /// Returns `true` when the full duration elapsed and `false` when the
    /// signal interrupted (or preceded) the sleep.
    pub fn wait(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock();
        if *stopped {
            return false;
        }
        if duration.is_zero() {
            return true;
        }
        let deadline = Instant::now() + duration;
        while !*stopped {
            if cvar.wait_until(&mut stopped, deadline).timed_out() {
                return !*stopped;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_elapses_without_trigger() {
        let stop = StopSignal::new();
        assert!(stop.wait(Duration::from_millis(5)));
        assert!(stop.wait(Duration::ZERO));
    }

    #[test]
    fn test_trigger_interrupts_wait() {
        let stop = StopSignal::new();
        let remote = stop.clone();
        let handle = thread::spawn(move || remote.wait(Duration::from_secs(30)));
        thread::sleep(Duration::from_millis(20));
        stop.trigger();
        assert!(!handle.join().unwrap());
        assert!(stop.is_triggered());
        assert!(!stop.wait(Duration::ZERO));
    }
}
