use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::*;

use joyservo_manager::commands::{self, run::RunOptions};
use joyservo_manager::logging;

#[derive(Parser)]
#[command(name = "joyservo")]
#[command(about = "Game controller to PCA9685 servo bridge with MPU6050 telemetry")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to ./joyservo.toml when present)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging on stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the servo core, controller loop and web API
    Run {
        /// Input device path (e.g. /dev/input/event5); skips auto-detection
        #[arg(short = 'd', long = "device")]
        device: Option<String>,

        /// Serve the web API without reading a controller
        #[arg(long = "web-only")]
        web_only: bool,

        /// Do not probe I2C; use simulated servo and sensor backends
        #[arg(short = 's', long = "simulate")]
        simulate: bool,

        /// Web API port (overrides web.port)
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,

        /// Do not draw the status line on stdout
        #[arg(long = "no-console")]
        no_console: bool,
    },

    /// List input devices and their detected layout
    Devices,

    /// Show or clear recorded status snapshots
    Logs {
        /// Number of most recent snapshots to show
        #[arg(short = 'n', long = "limit")]
        limit: Option<usize>,

        /// Delete all recorded snapshots
        #[arg(long = "clear")]
        clear: bool,

        /// Print raw JSON records
        #[arg(long = "json")]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_command(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            device,
            web_only,
            simulate,
            port,
            no_console,
        } => commands::run::execute(RunOptions {
            config: cli.config,
            device,
            web_only,
            simulate,
            port,
            no_console,
            verbose: cli.verbose,
        }),

        Commands::Devices => {
            logging::init(cli.verbose, None)?;
            commands::devices::execute()
        }

        Commands::Logs { limit, clear, json } => {
            logging::init(cli.verbose, None)?;
            let config = commands::load_config(cli.config.as_deref())?;
            let limit = limit.unwrap_or(config.store.recent_default_limit);
            commands::logs::execute(Path::new(&config.store.path), limit, clear, json)
        }
    }
}
