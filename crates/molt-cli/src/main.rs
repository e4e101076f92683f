//! Molt - host binary for the process lifecycle controller.
//!
//! Sets an exit intent from the command line and lets the controller carry it
//! out when the process exits or receives `SIGINT` / `SIGTERM`.

use anyhow::{Context, Result};
use clap::Parser;
use molt_lifecycle::{Behavior, Lifecycle};
use std::path::PathBuf;
use tracing::info;

mod config;
mod telemetry;

use config::Config;

/// Molt - terminate or restart in place on exit
#[derive(Parser, Debug)]
#[command(name = "molt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// What to do when the process exits: none, terminate or restart
    #[arg(long, default_value_t = Behavior::None)]
    behavior: Behavior,

    /// Exit code used by the terminate behavior
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    exit_code: i32,

    /// State file handed to the restarted instance
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Set by a restart: never schedule another one
    #[arg(long)]
    no_spawn: bool,

    /// State file left behind by the previous instance
    #[arg(long)]
    with_state: Option<PathBuf>,

    /// Print `ready` and wait for SIGINT or SIGTERM instead of exiting
    #[arg(long)]
    wait_for_signal: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init(cli.log_json)
        .map_err(|e| anyhow::anyhow!("Failed to init telemetry: {}", e))?;

    let config = Config::load(cli.config.as_deref())?;
    let lifecycle =
        Lifecycle::install(config.lifecycle).context("Failed to install lifecycle controller")?;

    println!("started pid={}", std::process::id());

    if cli.no_spawn {
        let state = cli
            .with_state
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        info!(state = %state, "Started by a restart, not scheduling another");
        println!("respawned state={}", state);
    } else {
        lifecycle.set_behavior(cli.behavior);
        lifecycle.set_exit_code(cli.exit_code);
        lifecycle.set_state_file(cli.state_file);
        info!(intent = ?lifecycle.snapshot(), "Exit intent recorded");
    }

    if cli.wait_for_signal {
        println!("ready");
        std::future::pending::<()>().await;
    }

    Ok(())
}
