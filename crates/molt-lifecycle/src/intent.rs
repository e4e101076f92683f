//! Shared intent state.
//!
//! Written from arbitrary application threads and read once by dispatch.
//! Behavior and exit code are atomics. The state file sits behind a mutex
//! whose critical sections only clone or replace an `Option<PathBuf>`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::behavior::Behavior;

/// A point-in-time copy of the intent state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Intent {
    pub behavior: Behavior,
    pub exit_code: i32,
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub(crate) struct IntentState {
    behavior: AtomicU8,
    exit_code: AtomicI32,
    state_file: Mutex<Option<PathBuf>>,
}

impl IntentState {
    pub(crate) fn set_behavior(&self, behavior: Behavior) {
        self.behavior.store(behavior.to_u8(), Ordering::SeqCst);
    }

    pub(crate) fn behavior(&self) -> Behavior {
        Behavior::from_u8(self.behavior.load(Ordering::SeqCst))
    }

    pub(crate) fn set_exit_code(&self, code: i32) {
        self.exit_code.store(code, Ordering::SeqCst);
    }

    pub(crate) fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::SeqCst)
    }

    pub(crate) fn set_state_file(&self, path: Option<PathBuf>) {
        *self.lock_state_file() = path;
    }

    pub(crate) fn state_file(&self) -> Option<PathBuf> {
        self.lock_state_file().clone()
    }

    pub(crate) fn snapshot(&self) -> Intent {
        Intent {
            behavior: self.behavior(),
            exit_code: self.exit_code(),
            state_file: self.state_file(),
        }
    }

    // A panic while holding this lock cannot leave a half-written Option.
    fn lock_state_file(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.state_file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
