//! joyservo Manager Library
//!
//! The pieces behind the `joyservo` binary: subcommands, the web API and
//! tracing setup.

pub mod api;
pub mod commands;
pub mod logging;
