//! Data model shared by the engine, the status projector, the log store and
//! the web API.

use joyservo_core::EventCategory;
use serde::{Deserialize, Serialize};

/// Coarse movement direction, used for servos and sensor axes alike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    Neutral,
}

impl Direction {
    /// Console glyph
    pub fn arrow(&self) -> char {
        match self {
            Self::Up => '↑',
            Self::Down => '↓',
            Self::Left => '←',
            Self::Right => '→',
            Self::Neutral => '○',
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Neutral => "neutral",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Per-axis direction classification of an acceleration reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisDirections {
    pub x: Direction,
    pub y: Direction,
    pub z: Direction,
}

/// One raw event from an input device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub category: EventCategory,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    pub const fn new(category: EventCategory, code: u16, value: i32) -> Self {
        Self {
            category,
            code,
            value,
        }
    }

    /// Button event (`value` 1 = press, 0 = release, 2 = autorepeat)
    pub const fn key(code: u16, value: i32) -> Self {
        Self::new(EventCategory::Key, code, value)
    }

    pub const fn press(code: u16) -> Self {
        Self::key(code, 1)
    }

    pub const fn release(code: u16) -> Self {
        Self::key(code, 0)
    }

    /// Absolute axis event
    pub const fn axis(code: u16, value: i32) -> Self {
        Self::new(EventCategory::Absolute, code, value)
    }
}

/// Latest inertial reading, overwritten wholesale every tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// m/s²
    pub accel: Vector3,
    /// °/s
    pub gyro: Vector3,
    /// °C
    pub temperature: f64,
    pub direction: AxisDirections,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serializes_lowercase() {
        let json = serde_json::to_string(&Direction::Left).unwrap();
        assert_eq!(json, "\"left\"");
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Neutral.arrow(), '○');
    }

    #[test]
    fn test_input_event_helpers() {
        let press = InputEvent::press(304);
        assert_eq!(press.category, EventCategory::Key);
        assert_eq!(press.value, 1);
        assert_eq!(InputEvent::release(304).value, 0);
        assert_eq!(InputEvent::axis(2, -100).category, EventCategory::Absolute);
    }
}
