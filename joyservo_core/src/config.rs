//! joyservo configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! or partial file is valid:
//!
//! ```toml
//! [servo]
//! min_pulse = 150
//! max_pulse = 600
//!
//! [[servo.channels]]
//! index = 0
//! orientation = "horizontal"
//! invert = true
//!
//! [[controller.ps3]]
//! category = "key"
//! code = 304
//! action = { type = "toggle_hold", channel = 0 }
//! ```

use crate::error::{JoyservoError, JoyservoResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "joyservo.toml";

// ============================================================================
// Controller mapping types
// ============================================================================

/// Controller layout family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Ps3,
    Xbox,
    Generic,
    #[default]
    None,
}

impl ControllerKind {
    /// Classify a device by its reported name
    ///
    /// Returns `None` for names that are not a known layout; callers decide
    /// whether such a device is acceptable (explicit path) or skipped
    /// (auto-detection).
    pub fn from_device_name(name: &str) -> Option<Self> {
        if name.contains("PLAYSTATION") || name.contains("PlayStation") {
            Some(Self::Ps3)
        } else if name.contains("Xbox") || name.contains("XBOX") {
            Some(Self::Xbox)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ps3 => "PS3",
            Self::Xbox => "Xbox",
            Self::Generic => "Generic",
            Self::None => "None",
        }
    }
}

impl std::fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Input event category (Linux input event type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Sync,
    Key,
    #[serde(rename = "abs")]
    Absolute,
    Other(u16),
}

impl EventCategory {
    pub const EV_SYN: u16 = 0x00;
    pub const EV_KEY: u16 = 0x01;
    pub const EV_ABS: u16 = 0x03;

    pub fn from_raw(raw: u16) -> Self {
        match raw {
            Self::EV_SYN => Self::Sync,
            Self::EV_KEY => Self::Key,
            Self::EV_ABS => Self::Absolute,
            other => Self::Other(other),
        }
    }

    pub fn raw(&self) -> u16 {
        match self {
            Self::Sync => Self::EV_SYN,
            Self::Key => Self::EV_KEY,
            Self::Absolute => Self::EV_ABS,
            Self::Other(raw) => *raw,
        }
    }
}

/// Logical action a controller input is bound to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputAction {
    /// Drive a servo channel from an analog axis
    Axis { channel: u8 },
    ToggleHold { channel: u8 },
    AdjustSpeed { delta: f32 },
    /// Preset: move every non-held channel to an angle
    MoveAll { angle: i32 },
    ToggleLock,
    /// Arm, then confirm, the exit request
    Exit,
    /// Known input with no function
    Ignore,
}

/// One row of a mapping table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub category: EventCategory,
    pub code: u16,
    pub action: InputAction,
}

impl MappingEntry {
    const fn key(code: u16, action: InputAction) -> Self {
        Self {
            category: EventCategory::Key,
            code,
            action,
        }
    }

    const fn axis(code: u16, channel: u8) -> Self {
        Self {
            category: EventCategory::Absolute,
            code,
            action: InputAction::Axis { channel },
        }
    }
}

const SPEED_STEP: f32 = 0.1;

/// Built-in PS3 (sixaxis) layout
pub fn default_ps3_mapping() -> Vec<MappingEntry> {
    use InputAction::*;
    vec![
        MappingEntry::axis(0, 0),
        MappingEntry::axis(1, 1),
        MappingEntry::axis(2, 2),
        MappingEntry::axis(3, 3),
        MappingEntry::key(304, ToggleHold { channel: 0 }), // Cross
        MappingEntry::key(305, ToggleHold { channel: 1 }), // Circle
        MappingEntry::key(308, ToggleHold { channel: 2 }), // Square
        MappingEntry::key(307, ToggleHold { channel: 3 }), // Triangle
        MappingEntry::key(294, AdjustSpeed { delta: -SPEED_STEP }), // L1
        MappingEntry::key(295, AdjustSpeed { delta: SPEED_STEP }),  // R1
        MappingEntry::key(298, MoveAll { angle: 0 }),               // L2
        MappingEntry::key(299, MoveAll { angle: 180 }),             // R2
        MappingEntry::key(288, Ignore),                             // Select
        MappingEntry::key(291, MoveAll { angle: 90 }),              // Start
        MappingEntry::key(300, MoveAll { angle: 90 }),              // D-pad up
        MappingEntry::key(302, ToggleLock),                         // D-pad down
        MappingEntry::key(303, MoveAll { angle: 0 }),               // D-pad left
        MappingEntry::key(301, MoveAll { angle: 180 }),             // D-pad right
        MappingEntry::key(292, Exit),                               // PS
    ]
}

/// Built-in Xbox layout, also used for generic controllers
pub fn default_xbox_mapping() -> Vec<MappingEntry> {
    use InputAction::*;
    vec![
        MappingEntry::axis(0, 0),
        MappingEntry::axis(1, 1),
        MappingEntry::axis(4, 2),
        MappingEntry::axis(5, 3),
        MappingEntry::key(304, ToggleHold { channel: 0 }), // A
        MappingEntry::key(305, ToggleHold { channel: 1 }), // B
        MappingEntry::key(308, ToggleHold { channel: 2 }), // X
        MappingEntry::key(307, ToggleHold { channel: 3 }), // Y
        MappingEntry::key(310, AdjustSpeed { delta: -SPEED_STEP }), // LB
        MappingEntry::key(311, AdjustSpeed { delta: SPEED_STEP }),  // RB
        MappingEntry::key(544, MoveAll { angle: 90 }),              // D-pad up
        MappingEntry::key(545, ToggleLock),                         // D-pad down
        MappingEntry::key(546, MoveAll { angle: 0 }),               // D-pad left
        MappingEntry::key(547, MoveAll { angle: 180 }),             // D-pad right
        MappingEntry::key(316, Exit),                               // Xbox button
        MappingEntry::key(16, Exit),                                // KEY_Q
    ]
}

// ============================================================================
// Sections
// ============================================================================

/// Which way a channel's increasing angle points on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Increasing angle reads as "right"
    Horizontal,
    /// Increasing angle reads as "up"
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub index: u8,
    pub orientation: Orientation,
    /// Negate the raw axis value before the angle transform
    #[serde(default)]
    pub invert: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Pulse length (in 1/4096 ticks) at 0 degrees
    pub min_pulse: u16,
    /// Pulse length at 180 degrees
    pub max_pulse: u16,
    pub frequency_hz: u16,
    /// Scale axis-driven angles around center by the speed factor
    pub speed_scaling: bool,
    pub channels: Vec<ChannelConfig>,
}

impl Default for ServoConfig {
    fn default() -> Self {
        let channel = |index, orientation| ChannelConfig {
            index,
            orientation,
            invert: false,
        };
        Self {
            min_pulse: 150,
            max_pulse: 600,
            frequency_hz: 50,
            speed_scaling: false,
            channels: vec![
                channel(0, Orientation::Horizontal),
                channel(1, Orientation::Vertical),
                channel(2, Orientation::Vertical),
                channel(3, Orientation::Horizontal),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct I2cConfig {
    /// Buses probed in order
    pub buses: Vec<u8>,
    pub pca9685_address: u16,
    pub mpu6050_address: u16,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            buses: vec![0, 1],
            pca9685_address: 0x40,
            mpu6050_address: 0x68,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub hardware_threshold: f64,
    pub simulated_threshold: f64,
    /// Resting z acceleration; z is classified relative to it
    pub gravity: f64,
    pub max_consecutive_failures: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            hardware_threshold: 0.5,
            simulated_threshold: 0.3,
            gravity: 9.8,
            max_consecutive_failures: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tick_ms: u64,
    pub persist_interval_secs: u64,
    pub exit_confirm_secs: u64,
    /// Controller re-scan interval after a disconnect; 0 disables
    pub reconnect_secs: u64,
    /// Print the status line to stdout
    pub console: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            persist_interval_secs: 5,
            exit_confirm_secs: 3,
            reconnect_secs: 5,
            console: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub stop_exits_process: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            stop_exits_process: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
    pub recent_default_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "servo_log.jsonl".to_string(),
            recent_default_limit: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// File receiving the raw controller event log
    pub event_log: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            event_log: Some("debug.log".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Explicit input device path; skips auto-detection
    pub device: Option<String>,
    /// Replaces the built-in PS3 table
    pub ps3: Option<Vec<MappingEntry>>,
    /// Replaces the built-in Xbox/generic table
    pub xbox: Option<Vec<MappingEntry>>,
}

impl ControllerConfig {
    /// Mapping table for a controller kind
    pub fn mapping_for(&self, kind: ControllerKind) -> Vec<MappingEntry> {
        match kind {
            ControllerKind::Ps3 => self.ps3.clone().unwrap_or_else(default_ps3_mapping),
            ControllerKind::Xbox | ControllerKind::Generic => {
                self.xbox.clone().unwrap_or_else(default_xbox_mapping)
            }
            ControllerKind::None => Vec::new(),
        }
    }
}

// ============================================================================
// Root
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoyservoConfig {
    pub servo: ServoConfig,
    pub i2c: I2cConfig,
    pub sensor: SensorConfig,
    pub runtime: RuntimeConfig,
    pub web: WebConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub controller: ControllerConfig,
}

impl JoyservoConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> JoyservoResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    pub fn load(path: &Path) -> JoyservoResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            JoyservoError::config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `path` if given, else `joyservo.toml` if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> JoyservoResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn to_toml_string(&self) -> JoyservoResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> JoyservoResult<()> {
        if self.servo.min_pulse >= self.servo.max_pulse {
            return Err(JoyservoError::config(format!(
                "servo.min_pulse ({}) must be below servo.max_pulse ({})",
                self.servo.min_pulse, self.servo.max_pulse
            )));
        }
        if self.servo.max_pulse > 4095 {
            return Err(JoyservoError::config("servo.max_pulse exceeds 4095 ticks"));
        }
        if self.servo.frequency_hz == 0 {
            return Err(JoyservoError::config("servo.frequency_hz must be positive"));
        }
        if self.servo.channels.is_empty() {
            return Err(JoyservoError::config("servo.channels must not be empty"));
        }

        let mut seen = HashSet::new();
        for ch in &self.servo.channels {
            if ch.index >= 16 {
                return Err(JoyservoError::config(format!(
                    "servo channel {} out of range (0-15)",
                    ch.index
                )));
            }
            if !seen.insert(ch.index) {
                return Err(JoyservoError::config(format!(
                    "servo channel {} listed twice",
                    ch.index
                )));
            }
        }

        if self.sensor.hardware_threshold <= 0.0 || self.sensor.simulated_threshold <= 0.0 {
            return Err(JoyservoError::config("sensor thresholds must be positive"));
        }
        if self.runtime.tick_ms == 0 {
            return Err(JoyservoError::config("runtime.tick_ms must be positive"));
        }
        Ok(())
    }
}
