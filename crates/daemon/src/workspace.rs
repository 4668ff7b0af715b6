// SPDX-License-Identifier: MIT

//! The per-key workspace that coalesces duplicate requests (§3 Data Model).

use std::os::unix::net::UnixStream;

use nix::unistd::Pid;
use stampede_core::{Key, PeerId};

/// A client connection attached to a workspace, waiting for its result.
pub struct ClientAttachment {
    pub socket: UnixStream,
    pub client_id: String,
}

impl ClientAttachment {
    pub fn new(socket: UnixStream, peer: PeerId) -> Self {
        ClientAttachment { socket, client_id: peer.client_id() }
    }
}

/// One per distinct pending key. Invariants (§3):
/// (i) `child_pid` set ⇒ this workspace's key is in `DaemonState::tasks`;
/// (ii) destroyed immediately after its child exits and all waiters are
/// served; (iii) between spawn and reap, new requests for the same key
/// attach here instead of triggering a second fork.
pub struct Workspace {
    pub key: Key,
    pub waiters: Vec<ClientAttachment>,
    pub child_pid: Option<Pid>,
}

impl Workspace {
    pub fn new(key: Key) -> Self {
        Workspace { key, waiters: Vec::new(), child_pid: None }
    }

    pub fn attach(&mut self, waiter: ClientAttachment) {
        self.waiters.push(waiter);
    }

    /// Waiters are drained LIFO at completion (§3, §5: "an implementation
    /// artifact — the test suite must not depend on order").
    pub fn drain_waiters_lifo(&mut self) -> impl Iterator<Item = ClientAttachment> {
        std::mem::take(&mut self.waiters).into_iter().rev()
    }

    pub fn should_spawn(&self) -> bool {
        self.child_pid.is_none() && !self.waiters.is_empty()
    }
}
