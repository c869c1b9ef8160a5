//! Controller session: which device is attached and what it is doing

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use joyservo_core::ControllerKind;
use serde::{Deserialize, Serialize};

use super::exit::{ExitConfirm, ExitPhase};
use super::names::button_name;

#[derive(Debug, Clone)]
pub struct ControllerSession {
    kind: ControllerKind,
    connected: bool,
    device_name: Option<String>,
    device_path: Option<String>,
    exit: ExitConfirm,
    held: BTreeSet<u16>,
}

/// Serializable view of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub kind: ControllerKind,
    pub connected: bool,
    pub name: Option<String>,
    pub path: Option<String>,
    pub exit: ExitPhase,
    pub held_buttons: Vec<String>,
}

impl ControllerSession {
    /// A session with no controller attached
    pub fn new(exit_window: Duration) -> Self {
        Self {
            kind: ControllerKind::None,
            connected: false,
            device_name: None,
            device_path: None,
            exit: ExitConfirm::new(exit_window),
            held: BTreeSet::new(),
        }
    }

    pub fn connect(&mut self, kind: ControllerKind, name: &str, path: &str) {
        self.kind = kind;
        self.connected = true;
        self.device_name = Some(name.to_string());
        self.device_path = Some(path.to_string());
        self.exit.reset();
        self.held.clear();
    }

    /// Back to the no-controller state
    pub fn disconnect(&mut self) {
        self.kind = ControllerKind::None;
        self.connected = false;
        self.device_name = None;
        self.device_path = None;
        self.exit.reset();
        self.held.clear();
    }

    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn exit(&self) -> &ExitConfirm {
        &self.exit
    }

    pub fn exit_mut(&mut self) -> &mut ExitConfirm {
        &mut self.exit
    }

    pub fn exit_requested(&self) -> bool {
        self.exit.is_exiting()
    }

    pub fn press(&mut self, code: u16) {
        self.held.insert(code);
    }

    /// True if the button was being held
    pub fn release(&mut self, code: u16) -> bool {
        self.held.remove(&code)
    }

    pub fn held(&self) -> impl Iterator<Item = u16> + '_ {
        self.held.iter().copied()
    }

    pub fn status(&self) -> SessionStatus {
        self.status_at(Instant::now())
    }

    pub fn status_at(&self, now: Instant) -> SessionStatus {
        SessionStatus {
            kind: self.kind,
            connected: self.connected,
            name: self.device_name.clone(),
            path: self.device_path.clone(),
            exit: self.exit.phase_at(now),
            held_buttons: self
                .held
                .iter()
                .map(|code| button_name(self.kind, *code).into_owned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_and_disconnect() {
        let mut session = ControllerSession::new(Duration::from_secs(3));
        assert!(!session.is_connected());
        assert_eq!(session.kind(), ControllerKind::None);

        session.connect(
            ControllerKind::Ps3,
            "Sony PLAYSTATION(R)3 Controller",
            "/dev/input/event5",
        );
        session.press(304);
        session.exit_mut().press(Instant::now());
        let status = session.status();
        assert!(status.connected);
        assert_eq!(status.held_buttons, vec!["Cross (✕)".to_string()]);
        assert_eq!(status.exit, ExitPhase::Armed);

        session.disconnect();
        let status = session.status();
        assert!(!status.connected);
        assert_eq!(status.kind, ControllerKind::None);
        assert!(status.held_buttons.is_empty());
        assert_eq!(status.exit, ExitPhase::Idle);
    }

    #[test]
    fn test_release_clears_held() {
        let mut session = ControllerSession::new(Duration::from_secs(3));
        session.connect(
            ControllerKind::Xbox,
            "Xbox Wireless Controller",
            "/dev/input/event2",
        );
        session.press(304);
        session.press(305);
        session.release(304);
        assert_eq!(session.held().collect::<Vec<_>>(), vec![305]);
    }

    #[test]
    fn test_status_after_exit_window_reads_idle() {
        let mut session = ControllerSession::new(Duration::from_secs(3));
        session.connect(ControllerKind::Xbox, "Xbox Wireless Controller", "scripted");
        let t0 = Instant::now();
        session.exit_mut().press(t0);

        assert_eq!(session.status_at(t0 + Duration::from_secs(1)).exit, ExitPhase::Armed);
        assert_eq!(session.status_at(t0 + Duration::from_secs(4)).exit, ExitPhase::Idle);
    }
}
