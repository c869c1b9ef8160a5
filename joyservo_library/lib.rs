//! # joyservo Library
//!
//! The servo/input state engine behind the `joyservo` binary.
//!
//! ## Structure
//!
//! ```text
//! joyservo_library/
//! ── messages/       # Plain data: input events, sensor snapshots
//! ── drivers/        # PCA9685, MPU6050, evdev input (+ simulation backends)
//! ── control/        # Axis transform, servo state, input routing, exit confirm
//! ── sampler.rs      # Accelerometer sampling with synthetic fallback
//! ── status.rs       # Status projection (JSON + console line)
//! ── store.rs        # Persistent JSON Lines snapshot log
//! ── runtime.rs      # ServoCore: shared state and execution contexts
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use joyservo_library::{ServoCore, ScriptedInputDriver, InputEvent};
//! use joyservo_core::JoyservoConfig;
//!
//! let core = ServoCore::simulated(JoyservoConfig::default());
//! core.set_channel_angle(0, 45)?;
//!
//! // Drive the core from a scripted controller
//! let pad = ScriptedInputDriver::new("Xbox Wireless Controller", [InputEvent::axis(0, 32767)]);
//! core.run_controller_session(pad.into());
//! assert_eq!(core.get_status().servos.channels[0].angle, 180);
//! ```

pub mod control;
pub mod drivers;
pub mod messages;
pub mod runtime;
pub mod sampler;
pub mod status;
pub mod store;

pub use messages::*;

// Control
pub use control::{
    ControllerSession, ExitConfirm, ExitPhase, InputRouter, RouteOutcome, ServoBank, ServoState,
    SessionStatus, SharedServos,
};

// Drivers
pub use drivers::{
    probe_hardware, DeviceInfo, ImuDriver, InputDriver, ProbedHardware, ScriptedInputDriver,
    ServoDriver, SimulationImuDriver, SimulationServoDriver,
};
#[cfg(feature = "evdev-input")]
pub use drivers::EvdevInputDriver;
#[cfg(feature = "i2c-hardware")]
pub use drivers::{Mpu6050Driver, Pca9685Driver};

pub use runtime::ServoCore;
pub use sampler::{SensorSampler, SensorSource};
pub use status::{Console, HardwareBuses, StatusReport};
pub use store::{LogRecord, LogStore};
