//! Driver factory - pick hardware or simulation backends at startup
//!
//! Missing hardware is an expected outcome here, not an error: every
//! category falls back to its simulation backend (or, for the IMU, to no
//! device at all so the sampler synthesizes data).

use joyservo_core::config::{I2cConfig, ServoConfig};

use super::{ImuDriver, ServoDriver};

/// What `probe_hardware` found
pub struct ProbedHardware {
    pub servo: ServoDriver,
    /// Bus the PCA9685 answered on
    pub pca_bus: Option<u8>,
    /// `None` when no MPU6050 answered
    pub imu: Option<ImuDriver>,
    pub mpu_bus: Option<u8>,
}

impl ProbedHardware {
    /// All-simulation result
    pub fn simulated() -> Self {
        Self {
            servo: ServoDriver::simulation(),
            pca_bus: None,
            imu: None,
            mpu_bus: None,
        }
    }
}

/// Walk the configured I2C buses looking for the PWM controller and the IMU
///
/// With `simulate` set, or without the `i2c-hardware` feature, no bus is
/// touched.
pub fn probe_hardware(i2c: &I2cConfig, servo: &ServoConfig, simulate: bool) -> ProbedHardware {
    if simulate {
        tracing::info!("Simulation requested; skipping I2C probe");
        return ProbedHardware::simulated();
    }
    probe_buses(i2c, servo)
}

#[cfg(feature = "i2c-hardware")]
fn probe_buses(i2c: &I2cConfig, servo: &ServoConfig) -> ProbedHardware {
    use super::imu::{Mpu6050Config, Mpu6050Driver};
    use super::servo::{Pca9685Config, Pca9685Driver};

    let mut found = ProbedHardware::simulated();

    for &bus in &i2c.buses {
        if found.pca_bus.is_some() {
            break;
        }
        let mut driver = Pca9685Driver::with_config(Pca9685Config {
            bus,
            address: i2c.pca9685_address,
        });
        match driver.init().and_then(|_| driver.set_frequency(servo.frequency_hz)) {
            Ok(()) => {
                tracing::info!("PCA9685 found on I2C bus {}", bus);
                found.servo = ServoDriver::Pca9685(driver);
                found.pca_bus = Some(bus);
            }
            Err(e) => tracing::debug!("No PCA9685 on bus {}: {}", bus, e),
        }
    }
    if found.pca_bus.is_none() {
        tracing::warn!("PCA9685 not found; servo output is simulated");
    }

    for &bus in &i2c.buses {
        let mut driver = Mpu6050Driver::with_config(Mpu6050Config {
            bus,
            address: i2c.mpu6050_address,
        });
        match driver.init() {
            Ok(()) => {
                tracing::info!("MPU6050 found on I2C bus {}", bus);
                found.imu = Some(ImuDriver::Mpu6050(driver));
                found.mpu_bus = Some(bus);
                break;
            }
            Err(e) => tracing::debug!("No MPU6050 on bus {}: {}", bus, e),
        }
    }
    if found.mpu_bus.is_none() {
        tracing::warn!("MPU6050 not found; sensor data is synthesized");
    }

    found
}

#[cfg(not(feature = "i2c-hardware"))]
fn probe_buses(_i2c: &I2cConfig, _servo: &ServoConfig) -> ProbedHardware {
    tracing::info!("Built without i2c-hardware; using simulation drivers");
    ProbedHardware::simulated()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_skips_probe() {
        let found = probe_hardware(&I2cConfig::default(), &ServoConfig::default(), true);
        assert!(!found.servo.is_hardware());
        assert!(found.pca_bus.is_none());
        assert!(found.imu.is_none());
        assert!(found.mpu_bus.is_none());
    }
}
