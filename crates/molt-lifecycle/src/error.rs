//! Lifecycle controller errors.

use thiserror::Error;

/// Errors raised while installing the controller or replacing the process.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("a lifecycle controller is already installed in this process")]
    AlreadyInstalled,

    #[error("signal trapping requires a running tokio runtime")]
    NoRuntime,

    #[error("failed to register signal handler: {0}")]
    SignalRegistration(#[source] std::io::Error),

    #[error("atexit refused to register the exit hook")]
    ExitHook,

    #[error("argument contains an interior NUL byte: {0:?}")]
    InvalidArgument(String),

    #[error("failed to replace process image: {0}")]
    Exec(#[source] std::io::Error),
}
