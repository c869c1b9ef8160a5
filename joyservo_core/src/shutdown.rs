//! Process-wide shutdown signal
//!
//! Two levels: *stop* ends the controller and update loops and parks the
//! servo outputs; *exit* additionally ends the process. The resting-state
//! hook runs exactly once no matter how many stop paths fire.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// What initiated a stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopSource {
    /// Operating-system interrupt (Ctrl+C / SIGTERM)
    Signal,
    /// Confirmed exit from the game controller
    Controller,
    /// Remote stop request over the API
    Api,
}

#[derive(Debug, Default)]
pub struct ShutdownSignal {
    stopping: AtomicBool,
    exiting: AtomicBool,
    rested: AtomicBool,
    source: Mutex<Option<StopSource>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a stop; returns true for the first caller only
    pub fn request_stop(&self, source: StopSource) -> bool {
        let first = !self.stopping.swap(true, Ordering::SeqCst);
        if first {
            *self.source.lock() = Some(source);
            tracing::info!("Stop requested ({:?})", source);
        }
        first
    }

    /// Flag a stop and ask the process to exit
    pub fn request_exit(&self, source: StopSource) {
        self.request_stop(source);
        self.exiting.store(true, Ordering::SeqCst);
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    pub fn is_exiting(&self) -> bool {
        self.exiting.load(Ordering::SeqCst)
    }

    pub fn source(&self) -> Option<StopSource> {
        *self.source.lock()
    }

    /// Run the resting-state hook if nobody has yet
    pub fn run_resting_once<F: FnOnce()>(&self, rest: F) -> bool {
        if self.rested.swap(true, Ordering::SeqCst) {
            return false;
        }
        rest();
        true
    }

    pub fn has_rested(&self) -> bool {
        self.rested.load(Ordering::SeqCst)
    }

    /// Block until exit is requested or `timeout` elapses
    pub fn wait_for_exit(&self, poll: Duration, timeout: Option<Duration>) -> bool {
        let start = Instant::now();
        while !self.is_exiting() {
            if let Some(limit) = timeout {
                if start.elapsed() >= limit {
                    return false;
                }
            }
            std::thread::sleep(poll);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_first_stop_wins() {
        let signal = ShutdownSignal::new();
        assert!(signal.request_stop(StopSource::Api));
        assert!(!signal.request_stop(StopSource::Signal));
        assert_eq!(signal.source(), Some(StopSource::Api));
        assert!(signal.is_stopping());
        assert!(!signal.is_exiting());
    }

    #[test]
    fn test_exit_implies_stop() {
        let signal = ShutdownSignal::new();
        signal.request_exit(StopSource::Controller);
        assert!(signal.is_stopping());
        assert!(signal.is_exiting());
        assert!(signal.wait_for_exit(Duration::from_millis(1), None));
    }

    #[test]
    fn test_resting_runs_once_across_threads() {
        let signal = Arc::new(ShutdownSignal::new());
        let count = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let signal = signal.clone();
                let count = count.clone();
                std::thread::spawn(move || {
                    signal.run_resting_once(|| {
                        count.fetch_add(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(signal.has_rested());
    }

    #[test]
    fn test_wait_times_out() {
        let signal = ShutdownSignal::new();
        assert!(!signal.wait_for_exit(
            Duration::from_millis(1),
            Some(Duration::from_millis(5))
        ));
    }
}
