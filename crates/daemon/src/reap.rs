// SPDX-License-Identifier: MIT

//! Child-exit collector (§4.7): a two-pass, non-blocking zombie drain.
//!
//! Signal delivery is coalesced by the kernel — N ≥ 1 `SIGCHLD`s can
//! collapse into a single readable record — so a single `waitpid` per
//! record is not sufficient. The loop must always follow up with a sweep
//! for *any* reapable child.

use std::os::fd::{AsRawFd, RawFd};

use nix::errno::Errno;
use nix::sys::signal::{SigSet, Signal};
use nix::sys::signalfd::{SfdFlags, SignalFd};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::warn;

pub struct ChildExitCollector {
    signal_fd: SignalFd,
}

impl ChildExitCollector {
    /// Blocks `SIGCHLD` on the calling thread and installs a `signalfd` to
    /// receive it instead (§5: "removes the classic async-signal-handler
    /// unsafety"). Must be called once, before the event loop starts
    /// polling, and before any child is forked.
    pub fn install() -> nix::Result<Self> {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGCHLD);
        mask.thread_block()?;
        let signal_fd = SignalFd::with_flags(&mask, SfdFlags::SFD_NONBLOCK | SfdFlags::SFD_CLOEXEC)?;
        Ok(ChildExitCollector { signal_fd })
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.signal_fd.as_raw_fd()
    }

    /// Returns every `(pid, exit_code)` observed since the last call.
    ///
    /// Pass 1 records the signalfd's own `ssi_status` verbatim — this is
    /// already the raw wait-status value the kernel attached to the
    /// `SIGCHLD` (14 for a `SIGALRM` kill, the exit code for a normal
    /// exit), not something pass 2's `WIFEXITED`/`WIFSIGNALED` normalization
    /// needs to touch. `waitpid` is still called here, but only to reap the
    /// zombie; its result is otherwise discarded, and `ECHILD` (the child
    /// was already reaped by a prior iteration) is not an error.
    pub fn drain(&mut self) -> Vec<(Pid, i32)> {
        let mut results = Vec::new();

        while let Ok(Some(siginfo)) = self.signal_fd.read_signal() {
            let pid = Pid::from_raw(siginfo.ssi_pid as i32);
            if let Err(err) = waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                if err != Errno::ECHILD {
                    warn!("waitpid failed for pid {}: {}", pid, err);
                }
            }
            results.push((pid, siginfo.ssi_status));
        }

        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    if let Some(pair) = normalize(status) {
                        results.push(pair);
                    }
                }
                Err(Errno::ECHILD) => break,
                Err(err) => {
                    warn!("waitpid(-1) failed: {}", err);
                    break;
                }
            }
        }

        results
    }
}

fn normalize(status: WaitStatus) -> Option<(Pid, i32)> {
    match status {
        WaitStatus::Exited(pid, code) => Some((pid, code)),
        WaitStatus::Signaled(pid, sig, _) => Some((pid, -(sig as i32))),
        WaitStatus::Stopped(pid, sig) => Some((pid, sig as i32)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_exit_is_the_raw_exit_status() {
        let pid = Pid::from_raw(7);
        assert_eq!(normalize(WaitStatus::Exited(pid, 123)), Some((pid, 123)));
    }

    #[test]
    fn normalize_signal_death_is_negated() {
        let pid = Pid::from_raw(7);
        assert_eq!(
            normalize(WaitStatus::Signaled(pid, Signal::SIGALRM, false)),
            Some((pid, -(Signal::SIGALRM as i32)))
        );
    }
}
