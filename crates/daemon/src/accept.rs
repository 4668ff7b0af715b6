// SPDX-License-Identifier: MIT

//! The accept handler (§4.3).

use std::os::fd::AsRawFd;
use std::os::unix::net::UnixListener;
use std::time::Duration;

use nix::sys::socket::{getsockopt, sockopt::PeerCredentials};
use stampede_core::PeerId;

use crate::state::{DaemonState, PendingClient};

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Accepts one connection off the listener and files it under `clients`,
/// keyed by its raw fd (§9: "key by the raw file-descriptor integer —
/// preferred, stable, small, matches what the poller returns").
pub fn accept_one(listener: &UnixListener, state: &mut DaemonState) -> std::io::Result<()> {
    let (socket, _addr) = listener.accept()?;
    socket.set_read_timeout(Some(RECV_TIMEOUT))?;

    let cred = getsockopt(&socket, PeerCredentials)?;
    let peer = PeerId { pid: cred.pid(), uid: cred.uid(), gid: cred.gid() };

    let fd = socket.as_raw_fd();
    state.insert_pending_client(fd, PendingClient { socket, peer });
    Ok(())
}
