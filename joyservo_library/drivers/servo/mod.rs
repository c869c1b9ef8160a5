//! Servo drivers
//!
//! # Available Drivers
//!
//! - `SimulationServoDriver` - Always available, records what would be sent
//! - `Pca9685Driver` - PCA9685 PWM controller (requires `i2c-hardware` feature)

mod simulation;

#[cfg(feature = "i2c-hardware")]
mod pca9685;

pub use simulation::SimulationServoDriver;

#[cfg(feature = "i2c-hardware")]
pub use pca9685::{Pca9685Config, Pca9685Driver};

use joyservo_core::driver::DriverStatus;
use joyservo_core::error::JoyservoResult;

/// Type-erased servo driver
pub enum ServoDriver {
    Simulation(SimulationServoDriver),
    #[cfg(feature = "i2c-hardware")]
    Pca9685(Pca9685Driver),
}

impl ServoDriver {
    /// An initialized simulation driver
    pub fn simulation() -> Self {
        let mut driver = SimulationServoDriver::new();
        // Simulation init cannot fail
        let _ = driver.init();
        Self::Simulation(driver)
    }

    /// Whether writes reach real hardware
    pub fn is_hardware(&self) -> bool {
        !matches!(self, Self::Simulation(_))
    }

    pub fn as_simulation(&self) -> Option<&SimulationServoDriver> {
        match self {
            Self::Simulation(d) => Some(d),
            #[cfg(feature = "i2c-hardware")]
            _ => None,
        }
    }

    pub fn as_simulation_mut(&mut self) -> Option<&mut SimulationServoDriver> {
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
            Self::Pca9685(d) => d.init(),
        }
    }

    pub fn shutdown(&mut self) -> JoyservoResult<()> {
        match self {
            Self::Simulation(d) => d.shutdown(),
            #[cfg(feature = "i2c-hardware")]
            Self::Pca9685(d) => d.shutdown(),
        }
    }

    pub fn status(&self) -> DriverStatus {
        match self {
            Self::Simulation(d) => d.status(),
            #[cfg(feature = "i2c-hardware")]
            Self::Pca9685(d) => d.status(),
        }
    }

    // ========================================================================
    // Actuator methods
    // ========================================================================

    pub fn set_frequency(&mut self, hz: u16) -> JoyservoResult<()> {
        match self {
            Self::Simulation(d) => d.set_frequency(hz),
            #[cfg(feature = "i2c-hardware")]
            Self::Pca9685(d) => d.set_frequency(hz),
        }
    }

    pub fn set_pulse(&mut self, channel: u8, on: u16, off: u16) -> JoyservoResult<()> {
        match self {
            Self::Simulation(d) => d.set_pulse(channel, on, off),
            #[cfg(feature = "i2c-hardware")]
            Self::Pca9685(d) => d.set_pulse(channel, on, off),
        }
    }

    /// Zero every PWM output
    pub fn set_all_off(&mut self) -> JoyservoResult<()> {
        match self {
            Self::Simulation(d) => d.set_all_off(),
            #[cfg(feature = "i2c-hardware")]
            Self::Pca9685(d) => d.set_all_off(),
        }
    }
}
