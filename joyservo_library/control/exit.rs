//! Double-press exit confirmation
//!
//! `Idle --press--> Armed --press within window--> Exiting`
//! `Armed --window elapses--> Idle`
//!
//! `Exiting` is terminal for a controller session. Time is passed in so the
//! machine can be driven with synthetic instants.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Idle,
    Armed { since: Instant },
    Exiting,
}

/// Coarse view of `ExitState` for status output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPhase {
    Idle,
    Armed,
    Exiting,
}

#[derive(Debug, Clone)]
pub struct ExitConfirm {
    window: Duration,
    state: ExitState,
}

impl ExitConfirm {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: ExitState::Idle,
        }
    }

    pub fn state(&self) -> ExitState {
        self.state
    }

    pub fn phase(&self) -> ExitPhase {
        match self.state {
            ExitState::Idle => ExitPhase::Idle,
            ExitState::Armed { .. } => ExitPhase::Armed,
            ExitState::Exiting => ExitPhase::Exiting,
        }
    }

    /// Phase as of `now`; an armed state whose window has passed reads idle
    pub fn phase_at(&self, now: Instant) -> ExitPhase {
        match self.state {
            ExitState::Armed { since } if now.saturating_duration_since(since) > self.window => {
                ExitPhase::Idle
            }
            _ => self.phase(),
        }
    }

    pub fn is_exiting(&self) -> bool {
        self.state == ExitState::Exiting
    }

    /// Drop back to idle once the window has passed; true if it did
    pub fn expire(&mut self, now: Instant) -> bool {
        if let ExitState::Armed { since } = self.state {
            if now.saturating_duration_since(since) > self.window {
                self.state = ExitState::Idle;
                return true;
            }
        }
        false
    }

    /// Register a qualifying press
    pub fn press(&mut self, now: Instant) -> ExitPhase {
        self.expire(now);
        self.state = match self.state {
            ExitState::Idle => ExitState::Armed { since: now },
            ExitState::Armed { .. } | ExitState::Exiting => ExitState::Exiting,
        };
        self.phase()
    }

    pub fn reset(&mut self) {
        self.state = ExitState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(3);

    #[test]
    fn test_confirm_within_window() {
        let t0 = Instant::now();
        let mut exit = ExitConfirm::new(WINDOW);
        assert_eq!(exit.phase(), ExitPhase::Idle);
        assert_eq!(exit.press(t0), ExitPhase::Armed);
        assert_eq!(exit.press(t0 + Duration::from_secs(2)), ExitPhase::Exiting);
        assert!(exit.is_exiting());
    }

    #[test]
    fn test_timeout_disarms() {
        let t0 = Instant::now();
        let mut exit = ExitConfirm::new(WINDOW);
        exit.press(t0);
        assert!(!exit.expire(t0 + Duration::from_secs(1)));
        assert!(exit.expire(t0 + Duration::from_secs(4)));
        assert_eq!(exit.phase(), ExitPhase::Idle);
    }

    #[test]
    fn test_phase_at_reads_lapsed_window_as_idle() {
        let t0 = Instant::now();
        let mut exit = ExitConfirm::new(WINDOW);
        exit.press(t0);
        assert_eq!(exit.phase_at(t0 + Duration::from_secs(2)), ExitPhase::Armed);
        assert_eq!(exit.phase_at(t0 + Duration::from_secs(4)), ExitPhase::Idle);
        // Reading does not disarm
        assert_eq!(exit.phase(), ExitPhase::Armed);
    }

    #[test]
    fn test_late_second_press_rearms() {
        let t0 = Instant::now();
        let mut exit = ExitConfirm::new(WINDOW);
        exit.press(t0);
        let late = t0 + Duration::from_secs(5);
        assert_eq!(exit.press(late), ExitPhase::Armed);
        assert_eq!(exit.state(), ExitState::Armed { since: late });
    }

    #[test]
    fn test_exiting_is_terminal() {
        let t0 = Instant::now();
        let mut exit = ExitConfirm::new(WINDOW);
        exit.press(t0);
        exit.press(t0);
        assert!(!exit.expire(t0 + Duration::from_secs(60)));
        assert_eq!(exit.press(t0 + Duration::from_secs(61)), ExitPhase::Exiting);
    }
}
