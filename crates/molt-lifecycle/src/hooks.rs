//! Trigger glue: the process-exit hook and the signal watcher.
//!
//! Both only forward into [`Lifecycle::dispatch`]; no lifecycle logic lives here.
//! - exit: `atexit(3)`, run on `return` from `main`, on a panic escaping
//!   `main` and on `std::process::exit` anywhere in the program
//! - `SIGINT` / `SIGTERM`: tokio signal streams polled by a spawned task

use std::fmt;
use std::sync::OnceLock;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::controller::{Lifecycle, Trigger};
use crate::error::LifecycleError;

/// Termination signals the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT`
    Interrupt,
    /// `SIGTERM`
    Terminate,
}

impl Signal {
    /// The POSIX signal number.
    pub fn number(self) -> i32 {
        match self {
            Signal::Interrupt => libc::SIGINT,
            Signal::Terminate => libc::SIGTERM,
        }
    }

    fn kind(self) -> SignalKind {
        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => write!(f, "SIGINT"),
            Signal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// The controller the exit hook dispatches to. Set once per process.
static EXIT_HOOK: OnceLock<Lifecycle> = OnceLock::new();

extern "C" fn run_exit_hook() {
    let Some(lifecycle) = EXIT_HOOK.get() else {
        return;
    };

    // The exiting thread's thread-locals are already destroyed when atexit
    // handlers run, and logging touches thread-locals. Dispatch from a fresh
    // thread; terminate and restart end the whole process from there.
    let spawned = std::thread::Builder::new()
        .name("molt-exit".to_string())
        .spawn(move || {
            lifecycle.dispatch(Trigger::Exit);
        });

    match spawned {
        Ok(handle) => {
            let _ = handle.join();
        }
        Err(_) => {
            lifecycle.dispatch(Trigger::Exit);
        }
    }
}

/// Register `lifecycle` as the process-exit handler.
///
/// Fails with [`LifecycleError::AlreadyInstalled`] on any call after the first.
pub(crate) fn register_exit_hook(lifecycle: &Lifecycle) -> Result<(), LifecycleError> {
    EXIT_HOOK
        .set(lifecycle.clone())
        .map_err(|_| LifecycleError::AlreadyInstalled)?;

    // SAFETY: run_exit_hook is a plain extern "C" fn with no captured state.
    let rc = unsafe { libc::atexit(run_exit_hook) };
    if rc != 0 {
        return Err(LifecycleError::ExitHook);
    }

    debug!("Exit hook registered");
    Ok(())
}

/// `SIGINT` and `SIGTERM` streams, registered but not yet polled.
pub(crate) struct SignalWatcher {
    runtime: tokio::runtime::Handle,
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

impl SignalWatcher {
    /// Register both signal streams. Every fallible step of signal trapping
    /// happens here, so a failure leaves no watcher behind.
    ///
    /// The OS-level handlers installed by tokio are process-wide and are never
    /// removed. Once the runtime is gone (after `main` returns, including
    /// while the exit hook dispatches) a `SIGINT` or `SIGTERM` is absorbed by
    /// those handlers and has no effect.
    pub(crate) fn register() -> Result<Self, LifecycleError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| LifecycleError::NoRuntime)?;

        let sigint =
            signal(Signal::Interrupt.kind()).map_err(LifecycleError::SignalRegistration)?;
        let sigterm =
            signal(Signal::Terminate.kind()).map_err(LifecycleError::SignalRegistration)?;

        debug!("Signal watcher registered for SIGINT and SIGTERM");
        Ok(Self {
            runtime,
            sigint,
            sigterm,
        })
    }

    /// Dispatch `lifecycle` on the first signal received. Cannot fail.
    ///
    /// Signals delivered between [`register`](Self::register) and this call
    /// are buffered by the streams, not lost.
    pub(crate) fn spawn(self, lifecycle: Lifecycle) -> JoinHandle<()> {
        let Self {
            runtime,
            mut sigint,
            mut sigterm,
        } = self;

        runtime.spawn(async move {
            // Streams only end when the runtime goes away; that is not a trigger.
            let received = tokio::select! {
                Some(()) = sigint.recv() => Signal::Interrupt,
                Some(()) = sigterm.recv() => Signal::Terminate,
                else => return,
            };
            info!(signal = %received, "Received termination signal");
            lifecycle.dispatch(Trigger::Signal(received));
        })
    }
}
