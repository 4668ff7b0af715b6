// SPDX-License-Identifier: MIT

//! Single-instance guard (§4.1) and the daemon's fatal-error taxonomy (§7).

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("a daemon object already exists in this process")]
    SingletonViolation,
    #[error("failed to acquire lock file {0:?}: {1}")]
    LockFailed(PathBuf, std::io::Error),
    #[error("failed to bind socket at {0:?}: {1}")]
    BindFailed(PathBuf, std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Guards against constructing a second in-process `Daemon` (§9: "a
/// module-scoped slot"). This is distinct from — and checked before — the
/// cross-process advisory file lock, which instead yields a no-op daemon.
static CONSTRUCTED: AtomicBool = AtomicBool::new(false);

/// Claims the in-process singleton slot. Only the daemon constructor calls
/// this; tests that construct multiple daemons in one process must use
/// `reset_for_test`.
pub(crate) fn claim_process_slot() -> Result<(), LifecycleError> {
    if CONSTRUCTED.swap(true, Ordering::SeqCst) {
        return Err(LifecycleError::SingletonViolation);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn reset_for_test() {
    CONSTRUCTED.store(false, Ordering::SeqCst);
}

/// The advisory exclusive lock on `<path>.lock`, held for the daemon's full
/// lifetime. The backing `File` is kept alive only to hold the lock; it is
/// never unlinked (§4.1: "staleness is harmless").
pub struct InstanceLock {
    _file: File,
}

impl InstanceLock {
    /// Attempts to acquire the lock non-blocking. `Ok(None)` means another
    /// live daemon already holds it — the caller should become a no-op
    /// daemon rather than treat this as fatal.
    pub fn try_acquire(path: &PathBuf) -> Result<Option<Self>, LifecycleError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)
            .map_err(|e| LifecycleError::LockFailed(path.clone(), e))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(InstanceLock { _file: file })),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn second_in_process_construction_is_a_singleton_violation() {
        reset_for_test();
        claim_process_slot().expect("first claim succeeds");
        let err = claim_process_slot().expect_err("second claim must fail");
        assert!(matches!(err, LifecycleError::SingletonViolation));
        reset_for_test();
    }

    #[test]
    fn second_cross_process_lock_attempt_yields_none_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("daemon.lock");
        let first = InstanceLock::try_acquire(&path).expect("first acquire").expect("held");
        let second = InstanceLock::try_acquire(&path).expect("second acquire call");
        assert!(second.is_none());
        drop(first);
    }
}
