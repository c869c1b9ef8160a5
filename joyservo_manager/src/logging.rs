//! Tracing setup
//!
//! Two layers on one registry:
//! - stderr, filtered by `RUST_LOG` (default `info`, `debug` with `-v`)
//! - optional file receiving only the raw controller event log

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use joyservo_library::control::EVENT_LOG_TARGET;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber
///
/// `event_log`, when given, is opened in append mode and receives every
/// `controller_events` record at debug level and above.
pub fn init(verbose: bool, event_log: Option<&Path>) -> anyhow::Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter(verbose));

    let file_layer = match event_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open event log {}", path.display()))?;
            let targets = Targets::new().with_target(EVENT_LOG_TARGET, Level::DEBUG);
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(targets),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}
