//! Logging setup for the molt binary.
//!
//! Events go to stderr so stdout stays free for the process's own output.
//! Colors are only used when stderr is a terminal.
//!
//! # Configuration
//!
//! - `RUST_LOG`: Log filter (default: `info,molt=debug,molt_lifecycle=debug`)

use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,molt=debug,molt_lifecycle=debug";

/// Initialize the global tracing subscriber.
///
/// `json` selects the JSON formatter instead of the human-readable one.
pub fn init(json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .with_thread_ids(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()?;
    }

    tracing::debug!(json, "Telemetry initialized");

    Ok(())
}
