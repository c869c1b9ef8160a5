//! Unified error handling for joyservo
//!
//! Validation errors (`UnknownChannel`, `AngleOutOfRange`) are the only ones
//! that are meant to reach an external caller. Everything else is absorbed by
//! the runtime loops and surfaced through status fields.

use thiserror::Error;

/// Main error type for joyservo operations
#[derive(Debug, Error)]
pub enum JoyservoError {
    /// I/O related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Driver-related errors (PWM write, sensor read, bus access)
    #[error("Driver error: {0}")]
    Driver(String),

    /// A device that was present has gone away
    #[error("Device lost: {0}")]
    DeviceLost(String),

    /// Channel index not in the configured channel list
    #[error("Unknown servo channel: {0}")]
    UnknownChannel(u8),

    /// Explicit angle request outside 0..=180
    #[error("Angle {0} out of range (0-180)")]
    AngleOutOfRange(i64),

    /// The core has been parked by a stop request
    #[error("Servo outputs are stopped")]
    Stopped,

    /// Serialization/Deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Catch-all for other error types
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using JoyservoError
pub type JoyservoResult<T> = Result<T, JoyservoError>;

impl From<serde_json::Error> for JoyservoError {
    fn from(err: serde_json::Error) -> Self {
        JoyservoError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for JoyservoError {
    fn from(err: toml::de::Error) -> Self {
        JoyservoError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for JoyservoError {
    fn from(err: toml::ser::Error) -> Self {
        JoyservoError::Serialization(format!("TOML serialization error: {}", err))
    }
}

impl From<anyhow::Error> for JoyservoError {
    fn from(err: anyhow::Error) -> Self {
        JoyservoError::Other(err.to_string())
    }
}

impl From<String> for JoyservoError {
    fn from(msg: String) -> Self {
        JoyservoError::Other(msg)
    }
}

impl JoyservoError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        JoyservoError::Config(msg.into())
    }

    /// Create a driver error with a custom message
    pub fn driver<S: Into<String>>(msg: S) -> Self {
        JoyservoError::Driver(msg.into())
    }

    /// Create a device-lost error with a custom message
    pub fn device_lost<S: Into<String>>(msg: S) -> Self {
        JoyservoError::DeviceLost(msg.into())
    }

    /// True for errors a remote caller caused and can correct
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            JoyservoError::UnknownChannel(_) | JoyservoError::AngleOutOfRange(_)
        )
    }

    /// True when the underlying device is gone rather than momentarily failing
    pub fn is_device_lost(&self) -> bool {
        match self {
            JoyservoError::DeviceLost(_) => true,
            // ENODEV / ENXIO / ENOENT from a character device mean it was unplugged
            JoyservoError::Io(e) => matches!(e.raw_os_error(), Some(19) | Some(6) | Some(2)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(JoyservoError::UnknownChannel(7).is_validation());
        assert!(JoyservoError::AngleOutOfRange(200).is_validation());
        assert!(!JoyservoError::driver("bus").is_validation());
        assert!(!JoyservoError::Stopped.is_validation());
    }

    #[test]
    fn test_device_lost_from_errno() {
        let enodev = JoyservoError::Io(std::io::Error::from_raw_os_error(19));
        assert!(enodev.is_device_lost());

        let eagain = JoyservoError::Io(std::io::Error::from_raw_os_error(11));
        assert!(!eagain.is_device_lost());

        assert!(JoyservoError::device_lost("unplugged").is_device_lost());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            JoyservoError::UnknownChannel(9).to_string(),
            "Unknown servo channel: 9"
        );
        assert_eq!(
            JoyservoError::AngleOutOfRange(-5).to_string(),
            "Angle -5 out of range (0-180)"
        );
    }
}
