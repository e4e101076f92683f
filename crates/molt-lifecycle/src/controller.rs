//! The lifecycle controller: intent setters and the single dispatch path.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::args::Invocation;
use crate::behavior::Behavior;
use crate::config::LifecycleConfig;
use crate::error::LifecycleError;
use crate::hooks::{self, Signal, SignalWatcher};
use crate::intent::{Intent, IntentState};
use crate::process::{ProcessControl, SystemProcess};

/// What caused a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The process is exiting normally.
    Exit,
    /// A termination signal was received.
    Signal(Signal),
}

/// The result of a dispatch that returned to the caller.
///
/// With [`SystemProcess`], `Terminated` and a successful restart never come
/// back; the values exist for process seams that do return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Another trigger already claimed the dispatch.
    AlreadyDispatched,
    /// Behavior was `None`.
    NoAction,
    /// The process was told to exit with this code.
    Terminated(i32),
    /// Replacing the process image failed; it was told to exit with this code.
    RestartFailed(i32),
}

/// Shared handle to the process lifecycle controller.
///
/// Cheap to clone. Pass it to whatever code needs to set exit intent.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

struct Inner {
    intent: IntentState,
    dispatched: AtomicBool,
    invocation: Invocation,
    config: LifecycleConfig,
    process: Box<dyn ProcessControl>,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("intent", &self.inner.intent.snapshot())
            .field("dispatched", &self.has_dispatched())
            .field("invocation", &self.inner.invocation)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Lifecycle {
    /// Create the process controller and subscribe it to the exit hook and,
    /// when `config.trap_signals` is set, to `SIGINT` / `SIGTERM`.
    ///
    /// Call this early in `main`, from inside a tokio runtime when signals
    /// are trapped. Only one controller may be installed per process; a call
    /// that returns an error installs nothing and may be retried.
    pub fn install(config: LifecycleConfig) -> Result<Self, LifecycleError> {
        let mut invocation = Invocation::current();
        if let Some(executable) = &config.executable {
            invocation.executable = executable.clone();
        }

        let trap_signals = config.trap_signals;
        let watcher = if trap_signals {
            Some(SignalWatcher::register()?)
        } else {
            None
        };

        let lifecycle = Self::with_process(config, invocation, SystemProcess);
        hooks::register_exit_hook(&lifecycle)?;
        if let Some(watcher) = watcher {
            watcher.spawn(lifecycle.clone());
        }

        info!(
            executable = %lifecycle.inner.invocation.executable.display(),
            trap_signals,
            "Lifecycle controller installed"
        );
        Ok(lifecycle)
    }

    /// Create a controller without subscribing it to any trigger.
    ///
    /// Dispatch happens only through explicit [`dispatch`](Self::dispatch) calls.
    pub fn with_process(
        config: LifecycleConfig,
        invocation: Invocation,
        process: impl ProcessControl,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                intent: IntentState::default(),
                dispatched: AtomicBool::new(false),
                invocation,
                config,
                process: Box::new(process),
            }),
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        debug!(behavior = %behavior, "Lifecycle behavior set");
        self.inner.intent.set_behavior(behavior);
    }

    /// Any value is accepted and passed to the OS unchanged.
    pub fn set_exit_code(&self, code: i32) {
        self.inner.intent.set_exit_code(code);
    }

    /// Stored verbatim. The file is never opened or checked.
    pub fn set_state_file<P: Into<PathBuf>>(&self, path: Option<P>) {
        self.inner.intent.set_state_file(path.map(Into::into));
    }

    pub fn behavior(&self) -> Behavior {
        self.inner.intent.behavior()
    }

    pub fn exit_code(&self) -> i32 {
        self.inner.intent.exit_code()
    }

    pub fn state_file(&self) -> Option<PathBuf> {
        self.inner.intent.state_file()
    }

    pub fn snapshot(&self) -> Intent {
        self.inner.intent.snapshot()
    }

    pub fn invocation(&self) -> &Invocation {
        &self.inner.invocation
    }

    /// Whether a trigger has already claimed the dispatch.
    pub fn has_dispatched(&self) -> bool {
        self.inner.dispatched.load(Ordering::SeqCst)
    }

    /// Execute the current intent. Runs at most once per controller.
    ///
    /// The behavior is read once, after the single-shot guard is claimed.
    pub fn dispatch(&self, trigger: Trigger) -> Dispatch {
        if self.inner.dispatched.swap(true, Ordering::SeqCst) {
            debug!(trigger = ?trigger, "Lifecycle already dispatched, ignoring trigger");
            return Dispatch::AlreadyDispatched;
        }

        let intent = self.inner.intent.snapshot();
        match intent.behavior {
            Behavior::None => self.no_action(trigger),
            Behavior::Terminate => self.terminate(intent.exit_code),
            Behavior::Restart => self.restart(intent.state_file),
        }
    }

    fn no_action(&self, trigger: Trigger) -> Dispatch {
        debug!(trigger = ?trigger, action = "none", "No lifecycle action requested");
        if let Trigger::Signal(signal) = trigger {
            self.inner.process.resume_default(signal);
        }
        Dispatch::NoAction
    }

    fn terminate(&self, code: i32) -> Dispatch {
        warn!(action = "terminate", exit_code = code, "Terminating process");
        self.inner.process.exit(code);
        Dispatch::Terminated(code)
    }

    fn restart(&self, state_file: Option<PathBuf>) -> Dispatch {
        let invocation = &self.inner.invocation;
        let args = invocation.restart_args(state_file.as_deref());

        warn!(
            action = "restart",
            executable = %invocation.executable.display(),
            args = ?args,
            "Restarting process in place"
        );

        let failure = self.inner.process.replace(&invocation.executable, &args);

        let code = self.inner.config.effective_failure_code();
        error!(
            action = "restart",
            executable = %invocation.executable.display(),
            error = %failure,
            exit_code = code,
            "Restart failed, terminating"
        );
        self.inner.process.exit(code);
        Dispatch::RestartFailed(code)
    }
}
