//! # joyservo Core
//!
//! Shared building blocks for the joyservo controller:
//!
//! - **Errors**: one error type for every crate in the workspace
//! - **Drivers**: lifecycle status shared by all hardware backends
//! - **Config**: TOML configuration, including the controller mapping tables
//! - **Shutdown**: the process-wide stop signal and its run-once resting hook

pub mod config;
pub mod driver;
pub mod error;
pub mod shutdown;

pub use config::{
    ChannelConfig, ControllerKind, EventCategory, InputAction, JoyservoConfig, MappingEntry,
    Orientation,
};
pub use driver::DriverStatus;
pub use error::{JoyservoError, JoyservoResult};
pub use shutdown::{ShutdownSignal, StopSource};
