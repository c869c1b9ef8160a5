//! Simulation servo driver

use joyservo_core::driver::DriverStatus;
use joyservo_core::error::{JoyservoError, JoyservoResult};

pub const CHANNEL_COUNT: usize = 16;

/// Simulation servo driver
///
/// Stands in for a PCA9685 when none is attached. Keeps the last on/off
/// tick pair per channel so callers can observe what would have been sent,
/// and can be told to fail writes.
pub struct SimulationServoDriver {
    status: DriverStatus,
    frequency: u16,
    pulses: [(u16, u16); CHANNEL_COUNT],
    writes: u64,
    fail_writes: bool,
}

impl SimulationServoDriver {
    pub fn new() -> Self {
        Self {
            status: DriverStatus::Uninitialized,
            frequency: 0,
            pulses: [(0, 0); CHANNEL_COUNT],
            writes: 0,
            fail_writes: false,
        }
    }

    pub fn init(&mut self) -> JoyservoResult<()> {
        self.pulses = [(0, 0); CHANNEL_COUNT];
        self.status = DriverStatus::Ready;
        Ok(())
    }

    pub fn shutdown(&mut self) -> JoyservoResult<()> {
        self.pulses = [(0, 0); CHANNEL_COUNT];
        self.status = DriverStatus::Shutdown;
        Ok(())
    }

    pub fn status(&self) -> DriverStatus {
        self.status.clone()
    }

    pub fn set_frequency(&mut self, hz: u16) -> JoyservoResult<()> {
        self.frequency = hz;
        Ok(())
    }

    pub fn frequency(&self) -> u16 {
        self.frequency
    }

    pub fn set_pulse(&mut self, channel: u8, on: u16, off: u16) -> JoyservoResult<()> {
        if self.fail_writes {
            return Err(JoyservoError::driver(format!(
                "simulated write failure on channel {}",
                channel
            )));
        }
        let slot = self
            .pulses
            .get_mut(channel as usize)
            .ok_or_else(|| JoyservoError::driver("Invalid channel (0-15)"))?;
        *slot = (on, off);
        self.writes += 1;
        self.status = DriverStatus::Running;
        Ok(())
    }

    pub fn set_all_off(&mut self) -> JoyservoResult<()> {
        self.pulses = [(0, 0); CHANNEL_COUNT];
        self.writes += 1;
        Ok(())
    }

    /// Last (on, off) pair written to a channel
    pub fn pulse(&self, channel: u8) -> Option<(u16, u16)> {
        self.pulses.get(channel as usize).copied()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Make every subsequent `set_pulse` fail
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl Default for SimulationServoDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_driver_lifecycle() {
        let mut driver = SimulationServoDriver::new();
        assert_eq!(driver.status(), DriverStatus::Uninitialized);

        driver.init().unwrap();
        assert_eq!(driver.status(), DriverStatus::Ready);

        driver.set_pulse(3, 0, 375).unwrap();
        assert_eq!(driver.status(), DriverStatus::Running);
        assert_eq!(driver.pulse(3), Some((0, 375)));

        driver.set_all_off().unwrap();
        assert_eq!(driver.pulse(3), Some((0, 0)));

        driver.shutdown().unwrap();
        assert_eq!(driver.status(), DriverStatus::Shutdown);
    }

    #[test]
    fn test_rejects_out_of_range_channel() {
        let mut driver = SimulationServoDriver::new();
        driver.init().unwrap();
        assert!(driver.set_pulse(16, 0, 300).is_err());
    }

    #[test]
    fn test_injected_failure() {
        let mut driver = SimulationServoDriver::new();
        driver.init().unwrap();
        driver.set_fail_writes(true);
        assert!(driver.set_pulse(0, 0, 300).is_err());
        assert_eq!(driver.write_count(), 0);
    }
}
