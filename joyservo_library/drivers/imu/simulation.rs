//! Simulation IMU driver
//!
//! Reports a fixed, settable reading. Lets the sampler be driven through
//! its device path (including read failures) without hardware attached.

use joyservo_core::driver::DriverStatus;
use joyservo_core::error::{JoyservoError, JoyservoResult};

use crate::messages::Vector3;

pub struct SimulationImuDriver {
    status: DriverStatus,
    accel: Vector3,
    gyro: Vector3,
    temperature: f64,
    fail_reads: bool,
    reads: u64,
}

impl SimulationImuDriver {
    /// Starts level and at rest: gravity on z, no rotation, 25 °C
    pub fn new() -> Self {
        Self {
            status: DriverStatus::Uninitialized,
            accel: Vector3::new(0.0, 0.0, 9.8),
            gyro: Vector3::default(),
            temperature: 25.0,
            fail_reads: false,
            reads: 0,
        }
    }

    pub fn init(&mut self) -> JoyservoResult<()> {
        self.status = DriverStatus::Ready;
        Ok(())
    }

    /// Fails while reads are failing, like a device that stopped answering
    pub fn shutdown(&mut self) -> JoyservoResult<()> {
        self.status = DriverStatus::Shutdown;
        if self.fail_reads {
            return Err(JoyservoError::driver("simulated IMU not responding"));
        }
        Ok(())
    }

    pub fn status(&self) -> DriverStatus {
        self.status.clone()
    }

    fn check(&mut self) -> JoyservoResult<()> {
        if self.fail_reads {
            return Err(JoyservoError::driver("simulated IMU read failure"));
        }
        self.reads += 1;
        self.status = DriverStatus::Running;
        Ok(())
    }

    pub fn read_accel(&mut self) -> JoyservoResult<Vector3> {
        self.check()?;
        Ok(self.accel)
    }

    pub fn read_gyro(&mut self) -> JoyservoResult<Vector3> {
        self.check()?;
        Ok(self.gyro)
    }

    pub fn read_temperature(&mut self) -> JoyservoResult<f64> {
        self.check()?;
        Ok(self.temperature)
    }

    // ========================================================================
    // Test knobs
    // ========================================================================

    pub fn set_accel(&mut self, accel: Vector3) {
        self.accel = accel;
    }

    pub fn set_gyro(&mut self, gyro: Vector3) {
        self.gyro = gyro;
    }

    pub fn set_temperature(&mut self, celsius: f64) {
        self.temperature = celsius;
    }

    /// Make every subsequent read fail
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn read_count(&self) -> u64 {
        self.reads
    }
}

impl Default for SimulationImuDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_configured_reading() {
        let mut driver = SimulationImuDriver::new();
        driver.init().unwrap();
        driver.set_accel(Vector3::new(1.0, -1.0, 9.0));
        driver.set_temperature(31.5);

        assert_eq!(driver.read_accel().unwrap(), Vector3::new(1.0, -1.0, 9.0));
        assert_eq!(driver.read_gyro().unwrap(), Vector3::default());
        assert_eq!(driver.read_temperature().unwrap(), 31.5);
        assert_eq!(driver.read_count(), 3);
        assert_eq!(driver.status(), DriverStatus::Running);
    }

    #[test]
    fn test_failing_reads() {
        let mut driver = SimulationImuDriver::new();
        driver.init().unwrap();
        driver.set_fail_reads(true);
        assert!(driver.read_accel().is_err());
        assert_eq!(driver.read_count(), 0);
        assert!(driver.shutdown().is_err());
        assert_eq!(driver.status(), DriverStatus::Shutdown);
    }
}
