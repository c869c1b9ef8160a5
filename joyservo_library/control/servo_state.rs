//! Servo state store
//!
//! Pure bookkeeping of per-channel angle/direction/hold plus the global lock
//! and speed. No I/O happens here; `ServoBank` pairs this with a driver and
//! turns each `AngleUpdate` into a PWM write.

use std::collections::BTreeMap;

use joyservo_core::config::{ChannelConfig, Orientation, ServoConfig};
use joyservo_core::error::{JoyservoError, JoyservoResult};
use serde::{Deserialize, Serialize};

use super::axis::{angle_from_axis, clamp_angle, invert_axis, scale_about_center, ANGLE_CENTER};
use crate::messages::Direction;

pub const SPEED_MIN: f32 = 0.1;
pub const SPEED_MAX: f32 = 2.0;
pub const SPEED_DEFAULT: f32 = 1.0;

/// State of one physical servo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoChannel {
    /// Degrees, always within 0..=180
    pub angle: u8,
    pub direction: Direction,
    pub hold: bool,
}

impl Default for ServoChannel {
    fn default() -> Self {
        Self {
            angle: ANGLE_CENTER,
            direction: Direction::Neutral,
            hold: false,
        }
    }
}

/// Result of one accepted angle change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleUpdate {
    pub channel: u8,
    pub previous: u8,
    pub angle: u8,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
struct Slot {
    orientation: Orientation,
    invert: bool,
    state: ServoChannel,
}

/// Direction of travel from `previous` to `angle` for a channel orientation
pub fn direction_between(orientation: Orientation, previous: u8, angle: u8) -> Direction {
    use std::cmp::Ordering::*;
    match (angle.cmp(&previous), orientation) {
        (Greater, Orientation::Vertical) => Direction::Up,
        (Greater, Orientation::Horizontal) => Direction::Right,
        (Less, Orientation::Vertical) => Direction::Down,
        (Less, Orientation::Horizontal) => Direction::Left,
        (Equal, _) => Direction::Neutral,
    }
}

#[derive(Debug, Clone)]
pub struct ServoState {
    channels: BTreeMap<u8, Slot>,
    lock: bool,
    speed: f32,
    speed_scaling: bool,
}

impl ServoState {
    /// Every channel centered, nothing held, unlocked, speed 1.0
    pub fn new(channels: &[ChannelConfig], speed_scaling: bool) -> Self {
        let channels = channels
            .iter()
            .map(|c| {
                (
                    c.index,
                    Slot {
                        orientation: c.orientation,
                        invert: c.invert,
                        state: ServoChannel::default(),
                    },
                )
            })
            .collect();
        Self {
            channels,
            lock: false,
            speed: SPEED_DEFAULT,
            speed_scaling,
        }
    }

    pub fn from_config(config: &ServoConfig) -> Self {
        Self::new(&config.channels, config.speed_scaling)
    }

    fn slot_mut(&mut self, channel: u8) -> JoyservoResult<&mut Slot> {
        self.channels
            .get_mut(&channel)
            .ok_or(JoyservoError::UnknownChannel(channel))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn channel(&self, channel: u8) -> Option<&ServoChannel> {
        self.channels.get(&channel).map(|s| &s.state)
    }

    pub fn orientation(&self, channel: u8) -> Option<Orientation> {
        self.channels.get(&channel).map(|s| s.orientation)
    }

    /// Channels in index order
    pub fn channels(&self) -> impl Iterator<Item = (u8, &ServoChannel)> + '_ {
        self.channels.iter().map(|(i, s)| (*i, &s.state))
    }

    pub fn channel_indices(&self) -> Vec<u8> {
        self.channels.keys().copied().collect()
    }

    pub fn contains(&self, channel: u8) -> bool {
        self.channels.contains_key(&channel)
    }

    pub fn is_locked(&self) -> bool {
        self.lock
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Store a new angle unconditionally (lock and hold do not apply)
    pub fn set_angle(&mut self, channel: u8, angle: i64) -> JoyservoResult<AngleUpdate> {
        let slot = self.slot_mut(channel)?;
        let previous = slot.state.angle;
        let angle = clamp_angle(angle);
        let direction = direction_between(slot.orientation, previous, angle);
        slot.state.angle = angle;
        slot.state.direction = direction;
        Ok(AngleUpdate {
            channel,
            previous,
            angle,
            direction,
        })
    }

    /// Drive a channel from a stick reading
    ///
    /// `Ok(None)` when the lock or the channel's hold suppresses the move.
    pub fn move_from_axis(
        &mut self,
        channel: u8,
        raw: i32,
    ) -> JoyservoResult<Option<AngleUpdate>> {
        let (hold, invert) = {
            let slot = self.slot_mut(channel)?;
            (slot.state.hold, slot.invert)
        };
        if self.lock || hold {
            return Ok(None);
        }

        let raw = if invert { invert_axis(raw) } else { raw };
        let mut angle = angle_from_axis(raw);
        if self.speed_scaling {
            angle = scale_about_center(angle, self.speed);
        }
        self.set_angle(channel, angle as i64).map(Some)
    }

    /// Move every channel not on hold; nothing moves while locked
    pub fn move_all_to(&mut self, angle: i64) -> Vec<AngleUpdate> {
        if self.lock {
            return Vec::new();
        }
        let targets: Vec<u8> = self
            .channels
            .iter()
            .filter(|(_, s)| !s.state.hold)
            .map(|(i, _)| *i)
            .collect();

        targets
            .into_iter()
            .filter_map(|ch| self.set_angle(ch, angle).ok())
            .collect()
    }

    /// Flip a channel's hold flag, returning the new value
    pub fn toggle_hold(&mut self, channel: u8) -> JoyservoResult<bool> {
        let slot = self.slot_mut(channel)?;
        slot.state.hold = !slot.state.hold;
        Ok(slot.state.hold)
    }

    pub fn set_hold(&mut self, channel: u8, hold: bool) -> JoyservoResult<()> {
        self.slot_mut(channel)?.state.hold = hold;
        Ok(())
    }

    pub fn toggle_lock(&mut self) -> bool {
        self.lock = !self.lock;
        self.lock
    }

    pub fn set_lock(&mut self, lock: bool) {
        self.lock = lock;
    }

    /// Step the speed factor, kept within 0.1..=2.0
    pub fn adjust_speed(&mut self, delta: f32) -> f32 {
        self.speed = (self.speed + delta).clamp(SPEED_MIN, SPEED_MAX);
        self.speed
    }
}
