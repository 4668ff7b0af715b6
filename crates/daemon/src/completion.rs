// SPDX-License-Identifier: MIT

//! The completion handler (§4.8): reply to every waiter, LIFO, then let the
//! workspace drop.

use std::io::Write;
use std::net::Shutdown;

use tracing::error;

use crate::workspace::Workspace;
use stampede_wire::Reply;

pub fn complete_workspace(mut workspace: Workspace, pid: i32, exit_code: i32) {
    let bytes = Reply::new(exit_code, pid).encode();
    for mut waiter in workspace.drain_waiters_lifo() {
        if let Err(err) = waiter.socket.write_all(&bytes) {
            error!("Failed to write reply to client {}: {}", waiter.client_id, err);
            continue;
        }
        let _ = waiter.socket.shutdown(Shutdown::Both);
    }
}
