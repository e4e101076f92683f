//! Command-line reconstruction for restart.
//!
//! Two tokens are understood:
//! - [`NO_SPAWN_FLAG`]: tells the new instance not to schedule further restarts.
//!   The controller only passes it along; interpreting it is up to the host.
//! - [`WITH_STATE_FLAG`]: `--with-state=<path>`, the state file to load.

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Marker that prevents restart chains.
pub const NO_SPAWN_FLAG: &str = "--no-spawn";

/// Value-bearing token carrying the state file path.
pub const WITH_STATE_FLAG: &str = "--with-state";

/// The executable and argument vector of the running process.
///
/// `args[0]` is the program name as invoked, exactly like `argv[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub executable: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(executable: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            executable: executable.into(),
            args,
        }
    }

    /// Capture the current process's invocation.
    ///
    /// Falls back to `argv[0]` when the OS cannot report the executable path.
    pub fn current() -> Self {
        let args: Vec<OsString> = std::env::args_os().collect();
        let executable = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(error) => {
                let fallback = args.first().cloned().unwrap_or_default();
                warn!(
                    error = %error,
                    fallback = ?fallback,
                    "Cannot determine current executable, falling back to argv[0]"
                );
                PathBuf::from(fallback)
            }
        };
        Self { executable, args }
    }

    /// Build the argument vector for the replacement process.
    pub fn restart_args(&self, state_file: Option<&Path>) -> Vec<OsString> {
        restart_args(&self.args, state_file)
    }
}

/// Rebuild `args` for a restart.
///
/// `args[0]` is kept as-is. In the rest of the list the no-spawn marker ends
/// up present exactly once, every `--with-state` argument is dropped (both the
/// `--with-state=<path>` and `--with-state <path>` forms; a bare `--with-state`
/// followed by another `--` flag keeps that flag), and a single
/// `--with-state=<state_file>` is appended when a state file is given.
pub fn restart_args(args: &[OsString], state_file: Option<&Path>) -> Vec<OsString> {
    let mut rebuilt: Vec<OsString> = Vec::with_capacity(args.len() + 2);
    let mut rest = args.iter();

    if let Some(program) = rest.next() {
        rebuilt.push(program.clone());
    }

    while let Some(arg) = rest.next() {
        if arg == WITH_STATE_FLAG {
            // Space-separated form: the value is the next token, unless that
            // token is another flag.
            if rest.as_slice().first().is_some_and(|next| !is_flag(next)) {
                rest.next();
            }
            continue;
        }
        if state_value(arg).is_some() {
            continue;
        }
        rebuilt.push(arg.clone());
    }

    if !rebuilt.iter().skip(1).any(|arg| arg == NO_SPAWN_FLAG) {
        rebuilt.push(NO_SPAWN_FLAG.into());
    }

    if let Some(path) = state_file {
        let mut token = OsString::from(format!("{WITH_STATE_FLAG}="));
        token.push(path.as_os_str());
        rebuilt.push(token);
    }

    rebuilt
}

/// Whether this process was started by a restart (carries the no-spawn marker).
pub fn is_respawned<S: AsRef<OsStr>>(args: &[S]) -> bool {
    args.iter()
        .skip(1)
        .any(|arg| AsRef::<OsStr>::as_ref(arg) == NO_SPAWN_FLAG)
}

/// The state file passed to this process, if any.
///
/// When the token appears more than once the last one wins, matching how
/// most argument parsers treat repeated options.
pub fn inherited_state_file<S: AsRef<OsStr>>(args: &[S]) -> Option<PathBuf> {
    let mut found = None;
    let mut rest = args.iter().skip(1).map(AsRef::<OsStr>::as_ref).peekable();
    while let Some(arg) = rest.next() {
        if arg == WITH_STATE_FLAG {
            found = rest.next_if(|next| !is_flag(next)).map(PathBuf::from);
        } else if let Some(value) = state_value(arg) {
            found = Some(value);
        }
    }
    found
}

fn is_flag(arg: &OsStr) -> bool {
    arg.as_bytes().starts_with(b"--")
}

fn state_value(arg: &OsStr) -> Option<PathBuf> {
    let prefix = format!("{WITH_STATE_FLAG}=");
    arg.as_bytes()
        .strip_prefix(prefix.as_bytes())
        .map(|value| PathBuf::from(OsString::from_vec(value.to_vec())))
}
