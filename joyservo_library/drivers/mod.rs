//! Hardware drivers for joyservo
//!
//! ```text
//! ServoCore (runtime)
//!   │
//!   ├── ServoDriver  ── Simulation | Pca9685 (i2c-hardware)
//!   ├── ImuDriver    ── Simulation | Mpu6050 (i2c-hardware)
//!   └── InputDriver  ── Scripted   | Evdev   (evdev-input)
//! ```
//!
//! Each category is an enum over its backends. Simulation backends are
//! always compiled in; hardware backends sit behind Cargo features.

pub mod factory;
pub mod imu;
pub mod joystick;
pub mod servo;

pub use factory::{probe_hardware, ProbedHardware};
pub use imu::{ImuDriver, SimulationImuDriver};
pub use joystick::{DeviceInfo, InputDriver, ScriptedInputDriver};
pub use servo::{ServoDriver, SimulationServoDriver};

#[cfg(feature = "i2c-hardware")]
pub use imu::{Mpu6050Config, Mpu6050Driver};
#[cfg(feature = "i2c-hardware")]
pub use servo::{Pca9685Config, Pca9685Driver};

#[cfg(feature = "evdev-input")]
pub use joystick::EvdevInputDriver;
