// SPDX-License-Identifier: MIT

//! Listening socket setup (§4.2): bind to a staging name, listen, then
//! atomically rename into place so no client can connect before the
//! backlog is armed.

use std::os::fd::{FromRawFd, IntoRawFd};
use std::os::unix::net::UnixListener;

use nix::sys::socket::{bind, listen, socket, AddressFamily, Backlog, SockFlag, SockType, UnixAddr};

use crate::config::Config;
use crate::lifecycle::LifecycleError;

const BACKLOG: i32 = 5;

pub fn bind_listener(config: &Config) -> Result<UnixListener, LifecycleError> {
    let sock_path = config.sock_path();
    let pending_path = config.pending_sock_path();

    // The instance lock proves no other daemon owns `<path>.sock`, so a
    // stale one from a prior crash can be unlinked unconditionally.
    if sock_path.exists() {
        std::fs::remove_file(&sock_path)?;
    }
    let _ = std::fs::remove_file(&pending_path);

    let fd = socket(AddressFamily::Unix, SockType::Stream, SockFlag::SOCK_CLOEXEC, None)
        .map_err(|e| LifecycleError::BindFailed(pending_path.clone(), std::io::Error::from(e)))?;
    let addr = UnixAddr::new(&pending_path)
        .map_err(|e| LifecycleError::BindFailed(pending_path.clone(), std::io::Error::from(e)))?;
    bind(std::os::fd::AsRawFd::as_raw_fd(&fd), &addr)
        .map_err(|e| LifecycleError::BindFailed(pending_path.clone(), std::io::Error::from(e)))?;
    let backlog = Backlog::new(BACKLOG)
        .map_err(|e| LifecycleError::BindFailed(pending_path.clone(), std::io::Error::from(e)))?;
    listen(&fd, backlog)
        .map_err(|e| LifecycleError::BindFailed(pending_path.clone(), std::io::Error::from(e)))?;

    std::fs::rename(&pending_path, &sock_path)
        .map_err(|e| LifecycleError::BindFailed(sock_path.clone(), e))?;

    // SAFETY: `fd` was just created above and is a valid, open, CLOEXEC
    // Unix stream socket fd that nothing else holds a reference to.
    let listener = unsafe { UnixListener::from_raw_fd(fd.into_raw_fd()) };
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_leaves_only_the_final_socket_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::new(dir.path().join("daemon"));
        let _listener = bind_listener(&config).expect("bind");
        assert!(config.sock_path().exists());
        assert!(!config.pending_sock_path().exists());
    }

    #[test]
    fn bind_unlinks_a_stale_socket() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::new(dir.path().join("daemon"));
        std::fs::write(config.sock_path(), b"stale").expect("seed stale file");
        let _listener = bind_listener(&config).expect("bind over stale socket");
        assert!(config.sock_path().exists());
    }
}
