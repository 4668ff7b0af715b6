// SPDX-License-Identifier: MIT

//! `DaemonState`: the process-wide maps owned by the event loop (§3). Single
//! threaded, so no locking — handlers never suspend on anything but the
//! loop's poll (§5).

use std::collections::HashMap;
use std::os::fd::RawFd;
use std::os::unix::net::UnixStream;

use nix::unistd::Pid;
use stampede_core::{Key, PeerId};
use tracing::debug;

use crate::workspace::Workspace;

/// An accepted connection that hasn't yet sent a complete key line.
pub struct PendingClient {
    pub socket: UnixStream,
    pub peer: PeerId,
}

#[derive(Default)]
pub struct DaemonState {
    pub queues: HashMap<Key, Workspace>,
    pub tasks: HashMap<Pid, Key>,
    pub clients: HashMap<RawFd, PendingClient>,
}

impl DaemonState {
    pub fn new() -> Self {
        DaemonState::default()
    }

    pub fn insert_pending_client(&mut self, fd: RawFd, client: PendingClient) {
        self.clients.insert(fd, client);
    }

    pub fn take_pending_client(&mut self, fd: RawFd) -> Option<PendingClient> {
        self.clients.remove(&fd)
    }

    /// Look up the workspace for `key`, creating it if absent (§4.4).
    pub fn workspace_for(&mut self, key: Key) -> &mut Workspace {
        self.queues.entry(key.clone()).or_insert_with(|| Workspace::new(key))
    }

    pub fn record_task(&mut self, pid: Pid, key: Key) {
        self.tasks.insert(pid, key);
    }

    /// Removes and returns the workspace whose child just exited, plus the
    /// `tasks` entry (§4.8: "Remove the workspace from queues and tasks").
    pub fn take_completed_workspace(&mut self, pid: Pid) -> Option<Workspace> {
        let key = self.tasks.remove(&pid)?;
        self.queues.remove(&key)
    }

    /// Per-iteration diagnostic (§4.9, §11): `"Queues => N workspaces"`.
    pub fn log_queue_depth(&self) {
        debug!("Queues => {} workspaces", self.queues.len());
        for workspace in self.queues.values() {
            debug!(
                "  key={} waiters={} child_pid={:?}",
                workspace.key,
                workspace.waiters.len(),
                workspace.child_pid
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_for_creates_on_first_use() {
        let mut state = DaemonState::new();
        let key = Key::new(b"k".to_vec()).unwrap();
        assert_eq!(state.queues.len(), 0);
        let _ = state.workspace_for(key.clone());
        assert_eq!(state.queues.len(), 1);
        let _ = state.workspace_for(key);
        assert_eq!(state.queues.len(), 1);
    }

    #[test]
    fn take_completed_workspace_removes_both_maps() {
        let mut state = DaemonState::new();
        let key = Key::new(b"k".to_vec()).unwrap();
        let pid = Pid::from_raw(4242);
        state.workspace_for(key.clone());
        state.record_task(pid, key.clone());

        let workspace = state.take_completed_workspace(pid).expect("present");
        assert_eq!(workspace.key, key);
        assert!(state.tasks.is_empty());
        assert!(state.queues.is_empty());
    }
}
