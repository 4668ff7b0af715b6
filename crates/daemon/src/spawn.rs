// SPDX-License-Identifier: MIT

//! The workspace scheduler (§4.5): forks a child to run `perform(key)`.
//!
//! Forking a multithreaded server is dangerous in any language (§9); this
//! is only ever called from the single-threaded event loop, never from a
//! spawned thread.

use std::os::fd::{AsRawFd, RawFd};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use nix::unistd::{fork, ForkResult, Pid};
use stampede_core::{Key, Outcome, Perform};
use tracing::error;

use crate::state::DaemonState;
use crate::watchdog;

/// Forks a child for `key`. The parent gets back the new pid; the caller
/// is responsible for recording it on the workspace and in `state.tasks`.
/// The child never returns — it closes every inherited connection, arms
/// the watchdog, runs `perform`, and exits via an immediate primitive that
/// skips the parent's destructors.
pub fn spawn_worker(
    state: &DaemonState,
    listener_fd: RawFd,
    signal_fd: RawFd,
    key: Key,
    task: Arc<dyn Perform>,
    alarm_secs: u64,
) -> nix::Result<Pid> {
    let inherited = fds_to_close(state, listener_fd, signal_fd);

    // SAFETY: called only from the single-threaded event loop, before any
    // other thread has been started, per the fork-in-server constraint above.
    match unsafe { fork() }? {
        ForkResult::Parent { child, .. } => Ok(child),
        ForkResult::Child => {
            for fd in inherited {
                let _ = nix::unistd::close(fd);
            }
            run_child(key, task, alarm_secs)
        }
    }
}

fn fds_to_close(state: &DaemonState, listener_fd: RawFd, signal_fd: RawFd) -> Vec<RawFd> {
    let mut fds = vec![listener_fd, signal_fd];
    fds.extend(state.clients.values().map(|c| c.socket.as_raw_fd()));
    for workspace in state.queues.values() {
        fds.extend(workspace.waiters.iter().map(|w| w.socket.as_raw_fd()));
    }
    fds
}

fn run_child(key: Key, task: Arc<dyn Perform>, alarm_secs: u64) -> ! {
    watchdog::arm(alarm_secs);

    match catch_unwind(AssertUnwindSafe(|| task.perform(&key))) {
        Ok(Outcome::Success) => exit_child(0),
        Ok(Outcome::ExitCode(code)) => exit_child(code),
        Err(_) => {
            error!("Failed task");
            error!("Exception: FAIL");
            exit_child(255)
        }
    }
}

/// Skips the parent's registered teardown (destructors, atexit handlers)
/// so the child cannot corrupt resources inherited from the parent.
fn exit_child(code: u8) -> ! {
    nix::unistd::_exit(code as i32)
}
