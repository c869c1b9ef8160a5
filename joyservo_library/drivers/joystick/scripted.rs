//! Scripted input driver
//!
//! Replays a fixed list of events, then either ends the stream or reports
//! the device as lost. Stands in for a real controller in tests and demos.

use std::collections::VecDeque;

use joyservo_core::driver::DriverStatus;
use joyservo_core::error::{JoyservoError, JoyservoResult};

use crate::messages::InputEvent;

pub struct ScriptedInputDriver {
    name: String,
    path: String,
    status: DriverStatus,
    events: VecDeque<InputEvent>,
    lose_at_end: bool,
}

impl ScriptedInputDriver {
    pub fn new(name: impl Into<String>, events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            name: name.into(),
            path: "scripted".to_string(),
            status: DriverStatus::Uninitialized,
            events: events.into_iter().collect(),
            lose_at_end: false,
        }
    }

    /// Fail with a device-lost error once the script runs out
    pub fn lose_at_end(mut self) -> Self {
        self.lose_at_end = true;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn init(&mut self) -> JoyservoResult<()> {
        self.status = DriverStatus::Ready;
        Ok(())
    }

    pub fn shutdown(&mut self) -> JoyservoResult<()> {
        self.events.clear();
        self.status = DriverStatus::Shutdown;
        Ok(())
    }

    pub fn status(&self) -> DriverStatus {
        self.status.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }

    pub fn next_event(&mut self) -> JoyservoResult<Option<InputEvent>> {
        match self.events.pop_front() {
            Some(event) => {
                self.status = DriverStatus::Running;
                Ok(Some(event))
            }
            None if self.lose_at_end => {
                self.status = DriverStatus::Error("disconnected".to_string());
                Err(JoyservoError::device_lost(format!("{} disconnected", self.name)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_then_ends() {
        let mut driver = ScriptedInputDriver::new(
            "Xbox Wireless Controller",
            [InputEvent::press(304), InputEvent::release(304)],
        );
        driver.init().unwrap();

        assert_eq!(driver.next_event().unwrap(), Some(InputEvent::press(304)));
        assert_eq!(driver.next_event().unwrap(), Some(InputEvent::release(304)));
        assert_eq!(driver.next_event().unwrap(), None);
    }

    #[test]
    fn test_lose_at_end() {
        let mut driver = ScriptedInputDriver::new("pad", []).lose_at_end();
        let err = driver.next_event().unwrap_err();
        assert!(err.is_device_lost());
    }
}
