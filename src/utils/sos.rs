//! Shared stop signal for coordinated pipeline shutdown
//!
//! A cheap, clonable one-shot flag: any holder can trigger it, every holder
//! can poll it, and a dedicated thread can sleep on it until it fires. The
//! sink stage triggers it on a stop request, `main` triggers it on SIGINT,
//! and the coordinator's shutdown listener waits on it to close the queues.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

#[derive(Debug)]
struct SharedState {
    triggered: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
}

/// One-shot cancellation signal shared between pipeline threads.
///
/// Cloning produces another handle to the same signal. Once triggered it
/// stays triggered for the lifetime of the pipeline.
#[derive(Debug, Clone)]
pub struct StopSignal {
    shared: Arc<SharedState>,
}

impl StopSignal {
    pub fn new() -> StopSignal {
        StopSignal {
            shared: Arc::new(SharedState {
                triggered: AtomicBool::new(false),
                mutex: Mutex::new(()),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Trigger the signal and wake every thread blocked in [`wait`](Self::wait).
    pub fn trigger(&self) {
        self.shared.triggered.store(true, Ordering::Relaxed);

        // Lock briefly so the store cannot race a waiter between its check
        // and its wait.
        let _guard = self.shared.mutex.lock().unwrap();
        self.shared.condvar.notify_all();
    }

    /// Whether the signal has been triggered.
    pub fn is_triggered(&self) -> bool {
        self.shared.triggered.load(Ordering::Relaxed)
    }

    /// Block until the signal is triggered.
    pub fn wait(&self) {
        let mut guard = self.shared.mutex.lock().unwrap();
        while !self.is_triggered() {
            guard = self.shared.condvar.wait(guard).unwrap();
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_trigger_visible_to_clones() {
        let signal = StopSignal::new();
        let other = signal.clone();
        assert!(!other.is_triggered());

        signal.trigger();
        assert!(other.is_triggered());
    }

    #[test]
    fn test_wait_releases_on_trigger() {
        let signal = StopSignal::new();
        let waiter = {
            let signal = signal.clone();
            thread::spawn(move || signal.wait())
        };

        thread::sleep(Duration::from_millis(50));
        signal.trigger();
        waiter.join().unwrap();
        assert!(signal.is_triggered());
    }

    #[test]
    fn test_wait_after_trigger_returns_immediately() {
        let signal = StopSignal::new();
        signal.trigger();
        signal.wait();
    }
}
