//! Servo bank: state store plus the PWM driver behind one lock
//!
//! Every accepted angle change is written to the driver while the lock is
//! still held, so the stored angle and the write order always agree. A failed
//! write is logged and the stored angle stands.

use std::sync::Arc;

use parking_lot::Mutex;

use joyservo_core::config::ServoConfig;
use joyservo_core::error::{JoyservoError, JoyservoResult};

use super::axis::pulse_from_angle;
use super::servo_state::{AngleUpdate, ServoState};
use crate::drivers::ServoDriver;

/// Shared handle used by every execution context
pub type SharedServos = Arc<Mutex<ServoBank>>;

pub struct ServoBank {
    state: ServoState,
    driver: ServoDriver,
    pulse_min: u16,
    pulse_max: u16,
    parked: bool,
    write_failures: u64,
}

impl ServoBank {
    pub fn new(config: &ServoConfig, driver: ServoDriver) -> Self {
        Self {
            state: ServoState::from_config(config),
            driver,
            pulse_min: config.min_pulse,
            pulse_max: config.max_pulse,
            parked: false,
            write_failures: 0,
        }
    }

    pub fn shared(self) -> SharedServos {
        Arc::new(Mutex::new(self))
    }

    /// Drive every channel to its stored (initial) angle
    pub fn center_all(&mut self) {
        for channel in self.state.channel_indices() {
            if let Some(angle) = self.state.channel(channel).map(|c| c.angle) {
                self.write(channel, angle);
            }
        }
    }

    pub fn state(&self) -> &ServoState {
        &self.state
    }

    pub fn driver(&self) -> &ServoDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut ServoDriver {
        &mut self.driver
    }

    pub fn is_parked(&self) -> bool {
        self.parked
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    fn ensure_active(&self) -> JoyservoResult<()> {
        if self.parked {
            Err(JoyservoError::Stopped)
        } else {
            Ok(())
        }
    }

    fn write(&mut self, channel: u8, angle: u8) {
        let pulse = pulse_from_angle(angle as i64, self.pulse_min, self.pulse_max);
        if let Err(e) = self.driver.set_pulse(channel, 0, pulse) {
            self.write_failures += 1;
            tracing::warn!("PWM write to channel {} failed: {}", channel, e);
        }
    }

    fn apply(&mut self, update: &AngleUpdate) {
        self.write(update.channel, update.angle);
    }

    // ========================================================================
    // Mutations (state change followed by PWM write)
    // ========================================================================

    pub fn set_angle(&mut self, channel: u8, angle: i64) -> JoyservoResult<AngleUpdate> {
        self.ensure_active()?;
        let update = self.state.set_angle(channel, angle)?;
        self.apply(&update);
        Ok(update)
    }

    pub fn move_from_axis(&mut self, channel: u8, raw: i32) -> JoyservoResult<Option<AngleUpdate>> {
        self.ensure_active()?;
        let update = self.state.move_from_axis(channel, raw)?;
        if let Some(update) = &update {
            self.apply(update);
        }
        Ok(update)
    }

    pub fn move_all_to(&mut self, angle: i64) -> JoyservoResult<Vec<AngleUpdate>> {
        self.ensure_active()?;
        let updates = self.state.move_all_to(angle);
        for update in &updates {
            self.apply(update);
        }
        Ok(updates)
    }

    pub fn toggle_hold(&mut self, channel: u8) -> JoyservoResult<bool> {
        self.ensure_active()?;
        self.state.toggle_hold(channel)
    }

    pub fn set_hold(&mut self, channel: u8, hold: bool) -> JoyservoResult<()> {
        self.ensure_active()?;
        self.state.set_hold(channel, hold)
    }

    pub fn toggle_lock(&mut self) -> JoyservoResult<bool> {
        self.ensure_active()?;
        Ok(self.state.toggle_lock())
    }

    pub fn set_lock(&mut self, lock: bool) -> JoyservoResult<()> {
        self.ensure_active()?;
        self.state.set_lock(lock);
        Ok(())
    }

    pub fn adjust_speed(&mut self, delta: f32) -> JoyservoResult<f32> {
        self.ensure_active()?;
        Ok(self.state.adjust_speed(delta))
    }

    /// Zero every output and refuse further moves
    ///
    /// Returns false if the bank was already parked.
    pub fn park(&mut self) -> bool {
        if self.parked {
            return false;
        }
        self.parked = true;
        if let Err(e) = self.driver.set_all_off() {
            tracing::error!("Failed to zero PWM outputs: {}", e);
        }
        true
    }
}
