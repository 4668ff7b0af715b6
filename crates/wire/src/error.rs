// SPDX-License-Identifier: MIT

use stampede_core::KeyError;
use thiserror::Error;

/// Malformed traffic on the wire — wrong side of the line boundary, or a
/// reply that doesn't parse as the structured JSON form.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("request line missing terminating LF")]
    MissingTerminator,
    #[error("malformed reply: {0}")]
    MalformedReply(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The four client-visible error kinds named in the external interface:
/// invalid-argument, type-error, connection-error, task-failed. Rust's type
/// system rules out "key is not bytes" at the call site, so `InvalidKey`
/// covers both the upstream `invalid-argument` and `type-error` cases.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),
    #[error("malformed reply: {0}")]
    MalformedReply(#[from] serde_json::Error),
    #[error("task failed: exit_code={exit_code} pid={pid}")]
    TaskFailed { exit_code: i32, pid: i32 },
}
