//! Driver utilities for joyservo
//!
//! Drivers are plain structs with direct methods (`init`, `shutdown`,
//! `status`, ...) grouped per category behind an enum that picks the backend
//! at runtime. This module only holds the types they share.

use serde::{Deserialize, Serialize};

/// Driver status for lifecycle tracking
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum DriverStatus {
    /// Driver has not been initialized yet
    #[default]
    Uninitialized,
    /// Driver is ready to operate
    Ready,
    /// Driver is actively running/streaming
    Running,
    /// Driver encountered an error
    Error(String),
    /// Driver has been shut down
    Shutdown,
}

impl DriverStatus {
    /// Ready or Running
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }
}

impl std::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Ready => write!(f, "Ready"),
            Self::Running => write!(f, "Running"),
            Self::Error(msg) => write!(f, "Error: {}", msg),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Path of the Linux I2C character device for a bus number
pub fn i2c_device_path(bus: u8) -> String {
    format!("/dev/i2c-{}", bus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operational_states() {
        assert!(DriverStatus::Ready.is_operational());
        assert!(DriverStatus::Running.is_operational());
        assert!(!DriverStatus::Uninitialized.is_operational());
        assert!(!DriverStatus::Error("x".into()).is_operational());
        assert!(!DriverStatus::Shutdown.is_operational());
    }

    #[test]
    fn test_i2c_path() {
        assert_eq!(i2c_device_path(1), "/dev/i2c-1");
    }
}
