// SPDX-License-Identifier: MIT

//! The event loop (§4.9) and the single-instance wrapper around it (§4.1).

use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::os::unix::net::UnixListener;
use std::sync::Arc;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use stampede_core::Perform;
use tracing::{error, info, warn};

use crate::accept;
use crate::client_read::{self, ReadOutcome};
use crate::completion;
use crate::config::Config;
use crate::lifecycle::{claim_process_slot, InstanceLock, LifecycleError};
use crate::listener;
use crate::reap::ChildExitCollector;
use crate::spawn;
use crate::state::DaemonState;
use crate::workspace::ClientAttachment;

const POLL_TIMEOUT_MS: u16 = 1000;

/// Either a live daemon or the no-op stand-in returned when the instance
/// lock is already held (§4.1, §9 "No-op daemon").
pub enum Daemon {
    Running(RunningDaemon),
    NoOp,
}

impl Daemon {
    /// Claims the in-process singleton slot, then attempts the advisory
    /// file lock. A second in-process construction is a hard error
    /// (`SingletonViolation`); losing the cross-process race instead
    /// yields `Daemon::NoOp`.
    pub fn new(config: Config, task: Arc<dyn Perform>) -> Result<Self, LifecycleError> {
        claim_process_slot()?;

        let lock_path = config.lock_path();
        let lock = match InstanceLock::try_acquire(&lock_path)? {
            Some(lock) => lock,
            None => {
                info!("instance lock held by another daemon; becoming a no-op");
                return Ok(Daemon::NoOp);
            }
        };

        let listener = listener::bind_listener(&config)?;
        let collector = ChildExitCollector::install().map_err(|e| LifecycleError::Io(e.into()))?;

        Ok(Daemon::Running(RunningDaemon {
            config,
            listener,
            _lock: lock,
            collector,
            state: DaemonState::new(),
            task,
        }))
    }

    /// Runs the event loop. Returns only on a fatal error (§7): bind
    /// failure already surfaced from `new`; losing the instance lock is the
    /// other, and is not expected while the process is alive.
    pub fn run(self) -> Result<(), LifecycleError> {
        match self {
            Daemon::Running(daemon) => daemon.run(),
            Daemon::NoOp => Ok(()),
        }
    }
}

pub struct RunningDaemon {
    config: Config,
    listener: UnixListener,
    _lock: InstanceLock,
    collector: ChildExitCollector,
    state: DaemonState,
    task: Arc<dyn Perform>,
}

impl RunningDaemon {
    fn run(mut self) -> Result<(), LifecycleError> {
        let listener_fd = self.listener.as_raw_fd();
        let signal_fd = self.collector.as_raw_fd();

        loop {
            let client_fds: Vec<RawFd> = self.state.clients.keys().copied().collect();
            let mut poll_fds = Vec::with_capacity(2 + client_fds.len());
            poll_fds.push(borrowed_poll_fd(listener_fd));
            poll_fds.push(borrowed_poll_fd(signal_fd));
            for fd in &client_fds {
                poll_fds.push(borrowed_poll_fd(*fd));
            }

            match poll(&mut poll_fds, PollTimeout::from(POLL_TIMEOUT_MS)) {
                Ok(_) => {}
                Err(Errno::EINTR) => continue,
                Err(err) => {
                    warn!("poll error: {}", err);
                    continue;
                }
            }

            self.state.log_queue_depth();

            if readable(&poll_fds[0]) {
                if let Err(err) = accept::accept_one(&self.listener, &mut self.state) {
                    warn!("accept failed: {}", err);
                }
            }

            if readable(&poll_fds[1]) {
                self.handle_child_exits();
            }

            for (i, fd) in client_fds.iter().enumerate() {
                if readable(&poll_fds[i + 2]) {
                    self.handle_client_readable(*fd, listener_fd, signal_fd);
                }
            }
        }
    }

    fn handle_child_exits(&mut self) {
        for (pid, exit_code) in self.collector.drain() {
            match self.state.take_completed_workspace(pid) {
                Some(workspace) => completion::complete_workspace(workspace, pid.as_raw(), exit_code),
                None => warn!("unknown child pid {} exited with code {}", pid, exit_code),
            }
        }
    }

    fn handle_client_readable(&mut self, fd: RawFd, listener_fd: RawFd, signal_fd: RawFd) {
        let Some(mut pending) = self.state.take_pending_client(fd) else {
            return;
        };

        match client_read::read_request_line(&mut pending.socket) {
            ReadOutcome::EmptyKey => {
                info!("client {} sent an empty key, closing", pending.peer.client_id());
                let _ = pending.socket.shutdown(std::net::Shutdown::Both);
            }
            ReadOutcome::Failed => {
                error!("Failed to read request from client {}", pending.peer.client_id());
                let _ = pending.socket.shutdown(std::net::Shutdown::Both);
            }
            ReadOutcome::WellFormed(key) => {
                if key.is_empty() {
                    // defense in depth (§11): an empty key should already
                    // have been caught above, but never fork for one.
                    let _ = pending.socket.shutdown(std::net::Shutdown::Both);
                    return;
                }

                let attachment = ClientAttachment::new(pending.socket, pending.peer);
                let should_spawn = {
                    let workspace = self.state.workspace_for(key.clone());
                    workspace.attach(attachment);
                    workspace.should_spawn()
                };

                if should_spawn {
                    let result = spawn::spawn_worker(
                        &self.state,
                        listener_fd,
                        signal_fd,
                        key.clone(),
                        Arc::clone(&self.task),
                        self.config.alarm_secs,
                    );
                    match result {
                        Ok(pid) => {
                            self.state.workspace_for(key.clone()).child_pid = Some(pid);
                            self.state.record_task(pid, key);
                        }
                        Err(err) => error!("fork failed for key {}: {}", key, err),
                    }
                }
            }
        }
    }
}

fn borrowed_poll_fd(fd: RawFd) -> PollFd<'static> {
    // SAFETY: `fd` is kept alive by its owner (the listener, the signalfd,
    // or a client socket in `DaemonState::clients`) for at least as long as
    // this poll call, since nothing closes it between building the poll set
    // and calling `poll`.
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    PollFd::new(borrowed, PollFlags::POLLIN)
}

fn readable(poll_fd: &PollFd) -> bool {
    poll_fd.revents().is_some_and(|events| events.intersects(PollFlags::POLLIN | PollFlags::POLLHUP))
}
