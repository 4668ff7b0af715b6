// SPDX-License-Identifier: MIT

//! Client-side library: send a request, read the structured reply, and (for
//! callers that don't know whether the daemon is up) the auto-spawn
//! handshake of §4.10.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use fs2::FileExt;
use stampede_core::Key;

use crate::error::ClientError;
use crate::reply::Reply;

/// Send `key` to the daemon listening at `<path>.sock` and block for the
/// reply. Returns `Ok` on `exit_code == 0`, `Err(ClientError::TaskFailed)`
/// otherwise (§6 "Reply has non-zero exit_code ⇒ task-failed").
pub fn request(path: &Path, key: &Key) -> Result<Reply, ClientError> {
    let reply = raw_request(path, key)?;
    if reply.is_success() {
        Ok(reply)
    } else {
        Err(ClientError::TaskFailed { exit_code: reply.exit_code, pid: reply.pid })
    }
}

/// Send `key` and return without waiting for a reply — the upstream
/// project's `async=True` client mode, for callers that only want to
/// trigger the coalesced computation.
pub fn request_detached(path: &Path, key: &Key) -> Result<(), ClientError> {
    let sock = stampede_core::sock_path(path);
    let mut stream = UnixStream::connect(&sock)?;
    write_request_line(&mut stream, key)?;
    Ok(())
}

fn raw_request(path: &Path, key: &Key) -> Result<Reply, ClientError> {
    let sock = stampede_core::sock_path(path);
    let mut stream = UnixStream::connect(&sock)?;
    write_request_line(&mut stream, key)?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    Ok(Reply::decode(&buf)?)
}

fn write_request_line(stream: &mut UnixStream, key: &Key) -> std::io::Result<()> {
    stream.write_all(key.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()
}

/// The launcher handshake (§4.10): reuse a live daemon, or bring one up and
/// then issue the normal request.
///
/// `cmd` and `cmd_args` spawn the daemon binary detached (stdin from
/// `/dev/null`, no inherited fds beyond what `Command` itself sets up).
/// `timeout` bounds how long to poll for the socket to appear after a spawn;
/// `None` falls back to the default of 1s (§4.10). Callers that want the
/// `STAMPEDE_IPC_TIMEOUT_MS` override honored (e.g. `stampede-cli`) pass
/// `Some(stampede_daemon::ipc_timeout())` explicitly rather than relying on
/// this default, since this crate does not depend on `stampede-daemon`.
pub fn request_and_spawn(
    cmd: &Path,
    cmd_args: &[&str],
    path: &Path,
    key: &Key,
    timeout: Option<Duration>,
) -> Result<Reply, ClientError> {
    let timeout = timeout.unwrap_or(Duration::from_secs(1));
    let sock = stampede_core::sock_path(path);
    let lock = stampede_core::lock_path(path);

    let should_spawn = if !sock.exists() {
        true
    } else {
        // Probe the lock: if we can acquire it, no live daemon holds it.
        match std::fs::OpenOptions::new().create(true).write(true).open(&lock) {
            Ok(file) => match file.try_lock_exclusive() {
                Ok(()) => {
                    let _ = std::fs::remove_file(&sock);
                    file.unlock().ok();
                    true
                }
                Err(_) => false,
            },
            Err(_) => false,
        }
    };

    if should_spawn {
        spawn_detached(cmd, cmd_args)?;
    }

    wait_for_socket(&sock, timeout);
    request(path, key)
}

fn spawn_detached(cmd: &Path, args: &[&str]) -> std::io::Result<()> {
    Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

fn wait_for_socket(sock: &Path, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !sock.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use std::os::unix::net::UnixListener;

    #[test]
    fn request_reads_structured_reply() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().join("daemon");
        let sock = stampede_core::sock_path(&prefix);
        let listener = UnixListener::bind(&sock).expect("bind");

        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().expect("accept");
            let mut reader = std::io::BufReader::new(conn.try_clone().expect("clone"));
            let mut line = String::new();
            reader.read_line(&mut line).expect("read line");
            assert_eq!(line, "foobar\n");
            conn.write_all(&Reply::new(0, 4242).encode()).expect("write reply");
            conn.shutdown(std::net::Shutdown::Both).ok();
        });

        let key = Key::new(b"foobar".to_vec()).expect("key");
        let reply = request(&prefix, &key).expect("request");
        assert_eq!(reply.pid, 4242);
        server.join().expect("server thread");
    }

    #[test]
    fn request_surfaces_task_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().join("daemon");
        let sock = stampede_core::sock_path(&prefix);
        let listener = UnixListener::bind(&sock).expect("bind");

        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().expect("accept");
            conn.write_all(&Reply::new(255, 99).encode()).expect("write reply");
            conn.shutdown(std::net::Shutdown::Both).ok();
        });

        let key = Key::new(b"boom".to_vec()).expect("key");
        let err = request(&prefix, &key).expect_err("should fail");
        match err {
            ClientError::TaskFailed { exit_code, pid } => {
                assert_eq!(exit_code, 255);
                assert_eq!(pid, 99);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        server.join().expect("server thread");
    }
}
