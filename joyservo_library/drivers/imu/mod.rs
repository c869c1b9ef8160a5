//! IMU (Inertial Measurement Unit) drivers
//!
//! # Available Drivers
//!
//! - `SimulationImuDriver` - Always available, reports a settable reading
//! - `Mpu6050Driver` - MPU6050 6-axis IMU (requires `i2c-hardware` feature)

mod simulation;

#[cfg(feature = "i2c-hardware")]
mod mpu6050;

pub use simulation::SimulationImuDriver;

#[cfg(feature = "i2c-hardware")]
pub use mpu6050::{Mpu6050Config, Mpu6050Driver};

use joyservo_core::driver::DriverStatus;
use joyservo_core::error::JoyservoResult;

use crate::messages::Vector3;

/// Type-erased IMU driver
pub enum ImuDriver {
    Simulation(SimulationImuDriver),
    #[cfg(feature = "i2c-hardware")]
    Mpu6050(Mpu6050Driver),
}

impl ImuDriver {
    /// An initialized simulation driver
    pub fn simulation() -> Self {
        let mut driver = SimulationImuDriver::new();
        let _ = driver.init();
        Self::Simulation(driver)
    }

    pub fn is_hardware(&self) -> bool {
        !matches!(self, Self::Simulation(_))
    }

    pub fn as_simulation_mut(&mut self) -> Option<&mut SimulationImuDriver> {
        match self {
            Self::Simulation(d) => Some(d),
            #[cfg(feature = "i2c-hardware")]
            _ => None,
        }
    }

    // ========================================================================
    // Lifecycle methods
    // ========================================================================

    pub fn init(&mut self) -> JoyservoResult<()> {
        match self {
            Self::Simulation(d) => d.init(),
            #[cfg(feature = "i2c-hardware")]
            Self::Mpu6050(d) => d.init(),
        }
    }

    pub fn shutdown(&mut self) -> JoyservoResult<()> {
        match self {
            Self::Simulation(d) => d.shutdown(),
            #[cfg(feature = "i2c-hardware")]
            Self::Mpu6050(d) => d.shutdown(),
        }
    }

    pub fn status(&self) -> DriverStatus {
        match self {
            Self::Simulation(d) => d.status(),
            #[cfg(feature = "i2c-hardware")]
            Self::Mpu6050(d) => d.status(),
        }
    }

    // ========================================================================
    // Sensor methods
    // ========================================================================

    pub fn read_accel(&mut self) -> JoyservoResult<Vector3> {
        match self {
            Self::Simulation(d) => d.read_accel(),
            #[cfg(feature = "i2c-hardware")]
            Self::Mpu6050(d) => d.read_accel(),
        }
    }

    pub fn read_gyro(&mut self) -> JoyservoResult<Vector3> {
        match self {
            Self::Simulation(d) => d.read_gyro(),
            #[cfg(feature = "i2c-hardware")]
            Self::Mpu6050(d) => d.read_gyro(),
        }
    }

    pub fn read_temperature(&mut self) -> JoyservoResult<f64> {
        match self {
            Self::Simulation(d) => d.read_temperature(),
            #[cfg(feature = "i2c-hardware")]
            Self::Mpu6050(d) => d.read_temperature(),
        }
    }
}
