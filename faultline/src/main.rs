//! # faultline Demo Host
//!
//! Composition root showing how a host process owns a [`HookRegistry`]:
//! load config, build the router, install the hooks, run, then go through
//! the shutdown phase while the hooks are still live.
//!
//! # Usage
//!
//! ```bash
//! # Report a runtime error into ./log/faultline.log
//! faultline --log-dir ./log --trigger error
//!
//! # Same error in throw mode: surfaces as the process error
//! faultline --mode throw --trigger error
//!
//! # Leave a fatal record pending and exit
//! faultline --config /etc/faultline/faultline.toml --trigger fatal -v
//! ```

use clap::{Parser, ValueEnum};
use faultline_common::prelude::{ConfigLoader, LogLevel, SharedConfig};
use faultline_router::{
    ErrorRouter, Exception, HookRegistry, RouterConfig, RouterMode, RouterSection, host,
    raise_error, record_fatal,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status used when a fatal record is left for the exit hook.
const FATAL_EXIT_CODE: i32 = 70;

/// faultline - route panics, runtime errors and exit-time fatals to a sink
#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Demo host for the faultline error router")]
#[command(long_about = None)]
struct Args {
    /// Path to a TOML config with [shared] and [router] tables.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Router mode override (0-3 or log_file, system_log, throw, log_file_and_custom)
    #[arg(short, long)]
    mode: Option<RouterMode>,

    /// File log directory override
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Error to provoke once the hooks are installed
    #[arg(short, long, value_enum, default_value_t = Trigger::None)]
    trigger: Trigger,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Trigger {
    None,
    /// Panic on a worker thread with an `Exception` payload
    Panic,
    /// Report a runtime error
    Error,
    /// Record a fatal error and exit
    Fatal,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        // Tracing may not be initialized yet.
        eprintln!("faultline: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args)?;
    setup_tracing(&args, config.shared.log_level);

    info!(
        "faultline v{} starting as {} (mode {})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name,
        config.router.mode
    );

    let router = Arc::new(ErrorRouter::from_config(&config.router)?);
    let registry = HookRegistry::install(router)?;

    match args.trigger {
        Trigger::None => info!("No trigger requested"),
        Trigger::Panic => {
            let worker = std::thread::Builder::new()
                .name("worker".to_string())
                .spawn(panicking_worker)?;
            if worker.join().is_err() {
                warn!("Worker thread panicked");
            }
        }
        Trigger::Error => {
            raise_error!(8, "undefined offset {}", 3)?;
            info!("Runtime error reported");
        }
        Trigger::Fatal => {
            record_fatal!("unrecoverable state in {}", config.shared.service_name);
            warn!("Exiting with a pending fatal record");
            // exit(3) runs the exit hook while the registry is still installed.
            std::process::exit(FATAL_EXIT_CODE);
        }
    }

    // Shutdown phase: the registry is still live.
    host::run_exit_hooks();
    drop(registry);

    info!("faultline shutdown complete");
    Ok(())
}

fn panicking_worker() {
    std::panic::panic_any(Exception::new(7, "boom"))
}

/// Load the config file, or fall back to defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<RouterConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => RouterConfig::load(path)?,
        None => RouterConfig {
            shared: SharedConfig {
                log_level: LogLevel::default(),
                service_name: "faultline-demo".to_string(),
            },
            router: RouterSection::default(),
        },
    };

    if let Some(mode) = args.mode {
        config.router.mode = mode;
    }
    if let Some(dir) = &args.log_dir {
        config.router.log_dir = Some(dir.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber based on CLI arguments and config.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        log_level.into()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
