//! Desktop simulator for the soil-monitor moisture broadcaster.
//!
//! Runs the soil-core poll cycle against simulated probes, a logging BLE
//! advertiser and a console LED, so settings and payloads can be checked
//! without a board.
//!
//! # Usage
//!
//! | Flag                    | Effect                                        |
//! |-------------------------|-----------------------------------------------|
//! | `--config <FILE>`       | Read settings from TOML instead of `SOIL_*`   |
//! | `--cycles <N>`          | Exit after N poll cycles                      |
//! | `--restart-delay <SEC>` | Pause before rebuilding after an error        |
//!
//! Log verbosity follows `RUST_LOG` (defaults to `info`).

mod hardware;
mod settings;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;
use log::{error, info};

use soil_core::Monitor;

use crate::hardware::{ConsoleLed, SimulatedAdvertiser, SimulatedProbe};
use crate::settings::SimulatorSettings;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "soil-simulator", version, about = "Simulated soil moisture broadcaster")]
struct Cli {
    /// TOML settings file; `SOIL_*` environment variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of poll cycles to run before exiting
    #[arg(short = 'n', long)]
    cycles: Option<u64>,

    /// Seconds to wait before rebuilding the monitor after an error
    #[arg(long = "restart-delay", default_value_t = 5)]
    restart_delay_secs: u64,
}

// ---------------------------------------------------------------------------
// Poll loop
// ---------------------------------------------------------------------------

/// Builds a monitor from the settings and polls it until `remaining` runs
/// out. Returns the number of cycles completed.
fn run(cli: &Cli, remaining: Option<u64>) -> Result<u64> {
    let settings = SimulatorSettings::load(cli.config.as_deref())?;
    let config = settings
        .monitor_config()
        .map_err(|e| anyhow!("invalid settings: {e}"))?;

    let mut monitor = Monitor::new(
        &config,
        SimulatedProbe::new(&config),
        SimulatedAdvertiser::default(),
        ConsoleLed::default(),
    )
    .map_err(|e| anyhow!("failed to initialise monitor: {e}"))?;

    let mut completed = 0;
    loop {
        if remaining.is_some_and(|limit| completed >= limit) {
            report(&monitor);
            return Ok(completed);
        }

        monitor
            .poll_once()
            .map_err(|e| anyhow!("poll cycle failed: {e}"))?;
        completed += 1;

        // Skip the final sleep when the cycle budget is spent
        if remaining.is_some_and(|limit| completed >= limit) {
            report(&monitor);
            return Ok(completed);
        }
        thread::sleep(monitor.broadcast_interval());
    }
}

/// Logs what the simulated radio and LED ended up doing.
fn report(monitor: &Monitor<SimulatedProbe, SimulatedAdvertiser, ConsoleLed>) {
    let advertiser = monitor.broadcaster().advertiser();
    info!(
        "Published {} payloads, advertising: {}, LED lit: {}",
        advertiser.published(),
        advertiser.is_advertising(),
        monitor.heartbeat().led().is_lit()
    );
    if let Some(service_data) = advertiser.service_data() {
        info!("Last service data: {:02x?}", service_data);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    info!("Starting soil-monitor simulator");
    let restart_delay = Duration::from_secs(cli.restart_delay_secs);
    let mut remaining = cli.cycles;

    loop {
        match run(&cli, remaining) {
            Ok(completed) => {
                info!("Finished after {} poll cycles", completed);
                break;
            }
            Err(e) => {
                error!("Error: {:#}", e);
                info!("Restarting in {} seconds...", restart_delay.as_secs());
                thread::sleep(restart_delay);
            }
        }

        // A failed attempt still spends one cycle so a bad config cannot spin forever
        if let Some(limit) = remaining.as_mut() {
            *limit = limit.saturating_sub(1);
            if *limit == 0 {
                info!("Cycle budget exhausted, exiting");
                break;
            }
        }
    }

    info!("Simulator exiting");
}
