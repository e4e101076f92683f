//! # molt-lifecycle
//!
//! Owns the "how do we leave" decision for a process.
//!
//! ## Overview
//!
//! Application code records an *intent* on a shared [`Lifecycle`] handle:
//! 1. a [`Behavior`] (`None`, `Terminate` or `Restart`)
//! 2. an exit code used by `Terminate`
//! 3. an optional state file handed to the restarted instance
//!
//! Nothing happens until a trigger fires. [`Lifecycle::install`] subscribes
//! to two triggers, and both funnel into the same [`Lifecycle::dispatch`]:
//! - process exit (an `atexit(3)` hook)
//! - `SIGINT` / `SIGTERM` (a tokio signal watcher)
//!
//! Dispatch runs at most once per process.
//!
//! ## Restart
//!
//! A restart replaces the process image in place with `execv(2)`: same PID,
//! no child process. The argument list is rebuilt so that the new instance
//! carries `--no-spawn` exactly once and at most one `--with-state=<path>`.
//!
//! ## Platform
//!
//! This crate requires Unix (Linux / macOS).

#[cfg(not(unix))]
compile_error!("molt-lifecycle requires a Unix platform (Linux or macOS)");

pub mod args;
mod behavior;
mod config;
mod controller;
mod error;
mod hooks;
mod intent;
mod process;

pub use args::{Invocation, NO_SPAWN_FLAG, WITH_STATE_FLAG};
pub use behavior::{Behavior, ParseBehaviorError};
pub use config::LifecycleConfig;
pub use controller::{Dispatch, Lifecycle, Trigger};
pub use error::LifecycleError;
pub use hooks::Signal;
pub use intent::Intent;
pub use process::{ProcessControl, SystemProcess};
