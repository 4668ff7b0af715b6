// SPDX-License-Identifier: MIT

//! Peer credentials read from an accepted Unix-domain connection.
//!
//! Advisory only (§1 Non-goals): used for log lines, never for access control.

use nix::unistd::{Uid, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerId {
    pub pid: i32,
    pub uid: u32,
    pub gid: u32,
}

impl PeerId {
    /// `"<username>:<pid>"`, falling back to the raw uid if the passwd
    /// lookup fails (e.g. the peer belongs to a uid with no nss entry).
    pub fn client_id(&self) -> String {
        let name = User::from_uid(Uid::from_raw(self.uid))
            .ok()
            .flatten()
            .map(|u| u.name)
            .unwrap_or_else(|| self.uid.to_string());
        format!("{name}:{pid}", pid = self.pid)
    }
}
