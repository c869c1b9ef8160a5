//! Run command - start the servo core, controller loop and web API

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use colored::*;

use joyservo_core::{JoyservoConfig, ShutdownSignal, StopSource};
use joyservo_library::{probe_hardware, LogStore, ProbedHardware, ServoCore};

use crate::api::{self, AppState};
use crate::logging;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    /// Input device path; disables auto-detection and re-scan
    pub device: Option<String>,
    /// Serve the API without reading a controller
    pub web_only: bool,
    /// Skip the I2C probe and use simulation backends
    pub simulate: bool,
    pub port: Option<u16>,
    pub no_console: bool,
    pub verbose: bool,
}

impl RunOptions {
    /// Fold command-line overrides into the loaded config
    pub fn apply(&self, config: &mut JoyservoConfig) {
        if let Some(port) = self.port {
            config.web.port = port;
        }
        if self.no_console {
            config.runtime.console = false;
        }
        if let Some(device) = &self.device {
            config.controller.device = Some(device.clone());
        }
    }
}

fn print_banner(config: &JoyservoConfig, hardware: &ProbedHardware, opts: &RunOptions) {
    let found = |bus: Option<u8>| match bus {
        Some(bus) => format!("bus {}", bus).green(),
        None => "simulated".yellow(),
    };

    println!("{}", "joyservo is running!".green().bold());
    println!("\n{}:", "Hardware".cyan().bold());
    println!("   • PCA9685:   {}", found(hardware.pca_bus));
    println!("   • MPU6050:   {}", found(hardware.mpu_bus));
    let controller = if opts.web_only {
        "disabled (--web-only)".dimmed()
    } else {
        match &config.controller.device {
            Some(path) => path.as_str().normal(),
            None => "auto-detect".normal(),
        }
    };
    println!("   • Controller: {}", controller);

    println!("\n{}:", "Web API".cyan().bold());
    println!(
        "   • {}",
        format!("http://{}:{}", config.web.host, config.web.port).bright_blue()
    );
    println!("   • Snapshots: {}", config.store.path.dimmed());

    println!("\n   Press {} to stop\n", "Ctrl+C".bright_red());
}

fn open_store(config: &JoyservoConfig) -> Option<LogStore> {
    match LogStore::open(&config.store.path) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!("Log store disabled: {}", e);
            None
        }
    }
}

pub fn execute(opts: RunOptions) -> anyhow::Result<()> {
    let mut config = super::load_config(opts.config.as_deref())?;
    opts.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    logging::init(
        opts.verbose,
        config.logging.event_log.as_deref().map(std::path::Path::new),
    )?;

    let hardware = probe_hardware(&config.i2c, &config.servo, opts.simulate);
    print_banner(&config, &hardware, &opts);

    let store = open_store(&config);
    let shutdown = Arc::new(ShutdownSignal::new());
    let core = Arc::new(ServoCore::new(
        config.clone(),
        hardware,
        store,
        Arc::clone(&shutdown),
    ));

    let signal_core = Arc::clone(&core);
    if let Err(e) = ctrlc::set_handler(move || {
        signal_core.request_stop(StopSource::Signal);
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let update = core.spawn_update_loop()?;
    if !opts.web_only {
        // Not joined: an evdev read blocks until the next event, the
        // process exit ends it
        core.spawn_controller_loop(config.controller.device.clone())?;
    }

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let served = runtime.block_on(api::serve(AppState::new(Arc::clone(&core)), &addr));
    if served.is_err() {
        core.request_stop(StopSource::Signal);
    }

    if update.join().is_err() {
        tracing::error!("Update thread panicked");
    }
    core.close();

    println!(
        "{} Servos at rest ({})",
        "✓".green(),
        shutdown
            .source()
            .map(|s| format!("{:?}", s).to_lowercase())
            .unwrap_or_else(|| "unknown".to_string())
    );
    served.with_context(|| format!("Web API on {} failed", addr))
}
