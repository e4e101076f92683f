//! Process-ending primitives behind a seam.
//!
//! [`SystemProcess`] talks to the OS: `execv(2)` to replace the image,
//! `_exit(2)` to end without running exit hooks, and signal re-raise for
//! signals that arrive while no behavior is set. Tests substitute a
//! recording implementation and call dispatch directly.

use std::ffi::{CString, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::error::LifecycleError;
use crate::hooks::Signal;

/// The OS operations a lifecycle dispatch may perform.
///
/// The real implementation never returns from [`exit`](Self::exit),
/// [`resume_default`](Self::resume_default) or a successful
/// [`replace`](Self::replace). Implementations that do return are test seams.
pub trait ProcessControl: Send + Sync + 'static {
    /// Replace the current process image. Returns only on failure.
    fn replace(&self, executable: &Path, args: &[OsString]) -> LifecycleError;

    /// End the process immediately, skipping exit hooks.
    fn exit(&self, code: i32);

    /// Let `signal` take its default effect on the process.
    fn resume_default(&self, signal: Signal);
}

/// [`ProcessControl`] backed by libc.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcess;

impl ProcessControl for SystemProcess {
    fn replace(&self, executable: &Path, args: &[OsString]) -> LifecycleError {
        match exec(executable, args) {
            Ok(never) => match never {},
            Err(error) => error,
        }
    }

    fn exit(&self, code: i32) {
        // SAFETY: _exit is async-signal-safe and takes no pointers.
        unsafe { libc::_exit(code) }
    }

    fn resume_default(&self, signal: Signal) {
        let signum = signal.number();
        // SAFETY: restoring SIG_DFL and raising a standard signal number.
        unsafe {
            libc::signal(signum, libc::SIG_DFL);
            libc::raise(signum);
        }
        // Only reached if the default disposition did not end the process.
        self.exit(128 + signum);
    }
}

enum Never {}

/// Execute a new process image with the current environment.
/// Does not return on success.
fn exec(executable: &Path, args: &[OsString]) -> Result<Never, LifecycleError> {
    let c_exe = to_cstring(executable.as_os_str().as_bytes())?;

    let c_args: Vec<CString> = args
        .iter()
        .map(|arg| to_cstring(arg.as_bytes()))
        .collect::<Result<_, _>>()?;

    let c_arg_ptrs: Vec<*const libc::c_char> = c_args
        .iter()
        .map(|a| a.as_ptr())
        .chain(std::iter::once(std::ptr::null()))
        .collect();

    // SAFETY: both pointers reference NUL-terminated strings owned by
    // `c_exe` and `c_args`, and the argument array is NULL-terminated.
    unsafe {
        libc::execv(c_exe.as_ptr(), c_arg_ptrs.as_ptr());
    }

    // execv only returns on error
    Err(LifecycleError::Exec(std::io::Error::last_os_error()))
}

fn to_cstring(bytes: &[u8]) -> Result<CString, LifecycleError> {
    CString::new(bytes).map_err(|_| {
        LifecycleError::InvalidArgument(String::from_utf8_lossy(bytes).into_owned())
    })
}
