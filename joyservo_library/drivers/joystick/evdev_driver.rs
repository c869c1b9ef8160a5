//! evdev input driver
//!
//! Reads raw (type, code, value) events from a Linux input device node.
//! Requires the `evdev-input` feature.

use std::collections::VecDeque;
use std::path::Path;

use evdev::Device;

use joyservo_core::driver::DriverStatus;
use joyservo_core::error::{JoyservoError, JoyservoResult};

use super::DeviceInfo;
use crate::messages::InputEvent;
use joyservo_core::EventCategory;

pub struct EvdevInputDriver {
    path: String,
    name: String,
    status: DriverStatus,
    device: Device,
    pending: VecDeque<InputEvent>,
}

/// List every readable input device
pub fn enumerate() -> Vec<DeviceInfo> {
    let mut devices: Vec<DeviceInfo> = evdev::enumerate()
        .map(|(path, device)| DeviceInfo {
            path: path.display().to_string(),
            name: device.name().unwrap_or("Unknown device").to_string(),
        })
        .collect();
    devices.sort_by(|a, b| a.path.cmp(&b.path));
    devices
}

impl EvdevInputDriver {
    pub fn open(path: &str) -> JoyservoResult<Self> {
        let device = Device::open(Path::new(path)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                JoyservoError::NotFound(format!("input device {}", path))
            } else {
                JoyservoError::driver(format!("Failed to open {}: {}", path, e))
            }
        })?;
        let name = device.name().unwrap_or("Unknown device").to_string();

        Ok(Self {
            path: path.to_string(),
            name,
            status: DriverStatus::Ready,
            device,
            pending: VecDeque::new(),
        })
    }

    pub fn shutdown(&mut self) -> JoyservoResult<()> {
        self.pending.clear();
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

    /// Block until the next event arrives
    ///
    /// A read error means the device is gone; the caller ends the session.
    pub fn next_event(&mut self) -> JoyservoResult<Option<InputEvent>> {
        while self.pending.is_empty() {
            let fetched: std::io::Result<Vec<InputEvent>> =
                self.device.fetch_events().map(|events| {
                    events
                        .map(|ev| {
                            InputEvent::new(
                                EventCategory::from_raw(ev.event_type().0),
                                ev.code(),
                                ev.value(),
                            )
                        })
                        .collect()
                });
            match fetched {
                Ok(events) => self.pending.extend(events),
                Err(e) => {
                    self.status = DriverStatus::Error(e.to_string());
                    return Err(JoyservoError::device_lost(format!("{}: {}", self.path, e)));
                }
            }
        }
        self.status = DriverStatus::Running;
        Ok(self.pending.pop_front())
    }
}
