//! Game controller input drivers
//!
//! # Available Drivers
//!
//! - `ScriptedInputDriver` - Always available, replays a fixed event list
//! - `EvdevInputDriver` - Linux input devices via evdev (requires `evdev-input` feature)

mod scripted;

#[cfg(feature = "evdev-input")]
mod evdev_driver;

pub use scripted::ScriptedInputDriver;

#[cfg(feature = "evdev-input")]
pub use evdev_driver::EvdevInputDriver;

use joyservo_core::driver::DriverStatus;
use joyservo_core::error::JoyservoResult;
use joyservo_core::ControllerKind;
use serde::Serialize;

use crate::messages::InputEvent;

/// One enumerable input device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
}

impl DeviceInfo {
    /// Known controller layout, if the name identifies one
    pub fn kind(&self) -> Option<ControllerKind> {
        ControllerKind::from_device_name(&self.name)
    }
}

/// Type-erased input driver
pub enum InputDriver {
    Scripted(ScriptedInputDriver),
    #[cfg(feature = "evdev-input")]
    Evdev(EvdevInputDriver),
}

impl InputDriver {
    /// List input devices visible to this build
    pub fn enumerate() -> Vec<DeviceInfo> {
        #[cfg(feature = "evdev-input")]
        {
            evdev_driver::enumerate()
        }
        #[cfg(not(feature = "evdev-input"))]
        {
            Vec::new()
        }
    }

    pub fn open(path: &str) -> JoyservoResult<Self> {
        #[cfg(feature = "evdev-input")]
        {
            EvdevInputDriver::open(path).map(Self::Evdev)
        }
        #[cfg(not(feature = "evdev-input"))]
        {
            Err(joyservo_core::JoyservoError::NotFound(format!(
                "input device {} (built without evdev-input)",
                path
            )))
        }
    }

    /// Open the explicit device if given, else the first known controller
    ///
    /// `Ok(None)` means nothing suitable is attached right now.
    pub fn find_controller(explicit: Option<&str>) -> JoyservoResult<Option<Self>> {
        if let Some(path) = explicit {
            return Self::open(path).map(Some);
        }

        let candidate = Self::enumerate().into_iter().find(|d| d.kind().is_some());
        match candidate {
            Some(info) => {
                tracing::info!("Found controller '{}' at {}", info.name, info.path);
                Self::open(&info.path).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Scripted(d) => d.name(),
            #[cfg(feature = "evdev-input")]
            Self::Evdev(d) => d.name(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Scripted(d) => d.path(),
            #[cfg(feature = "evdev-input")]
            Self::Evdev(d) => d.path(),
        }
    }

    /// Layout to use for this device; unrecognized names get the generic layout
    pub fn controller_kind(&self) -> ControllerKind {
        ControllerKind::from_device_name(self.name()).unwrap_or(ControllerKind::Generic)
    }

    // ========================================================================
    // Lifecycle methods
    // ========================================================================

    pub fn shutdown(&mut self) -> JoyservoResult<()> {
        match self {
            Self::Scripted(d) => d.shutdown(),
            #[cfg(feature = "evdev-input")]
            Self::Evdev(d) => d.shutdown(),
        }
    }

    pub fn status(&self) -> DriverStatus {
        match self {
            Self::Scripted(d) => d.status(),
            #[cfg(feature = "evdev-input")]
            Self::Evdev(d) => d.status(),
        }
    }

    // ========================================================================
    // Input methods
    // ========================================================================

    /// Next event; blocks on real devices, `Ok(None)` at end of stream
    pub fn next_event(&mut self) -> JoyservoResult<Option<InputEvent>> {
        match self {
            Self::Scripted(d) => d.next_event(),
            #[cfg(feature = "evdev-input")]
            Self::Evdev(d) => d.next_event(),
        }
    }
}

impl From<ScriptedInputDriver> for InputDriver {
    fn from(mut driver: ScriptedInputDriver) -> Self {
        let _ = driver.init();
        Self::Scripted(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name() {
        let ps3: InputDriver =
            ScriptedInputDriver::new("Sony PLAYSTATION(R)3 Controller", []).into();
        assert_eq!(ps3.controller_kind(), ControllerKind::Ps3);

        let other: InputDriver = ScriptedInputDriver::new("Logitech Dual Action", []).into();
        assert_eq!(other.controller_kind(), ControllerKind::Generic);
    }

    #[test]
    fn test_device_info_kind() {
        let info = DeviceInfo {
            path: "/dev/input/event3".to_string(),
            name: "USB Keyboard".to_string(),
        };
        assert_eq!(info.kind(), None);
    }
}
