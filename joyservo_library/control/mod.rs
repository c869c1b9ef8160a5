//! Servo control engine
//!
//! - `axis` - stick value → angle → pulse transforms
//! - `servo_state` - per-channel angle/direction/hold, global lock and speed
//! - `servo_bank` - state store plus PWM driver behind one mutex
//! - `router` - controller event dispatch
//! - `session` / `exit` - controller connection and exit confirmation

pub mod axis;
pub mod exit;
pub mod names;
pub mod router;
pub mod servo_bank;
pub mod servo_state;
pub mod session;

pub use exit::{ExitConfirm, ExitPhase, ExitState};
pub use router::{InputRouter, RouteOutcome, EVENT_LOG_TARGET};
pub use servo_bank::{ServoBank, SharedServos};
pub use servo_state::{AngleUpdate, ServoChannel, ServoState};
pub use session::{ControllerSession, SessionStatus};
