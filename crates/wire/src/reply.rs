// SPDX-License-Identifier: MIT

//! The structured reply (§6): `{"exit_code": int, "pid": int}`, no trailing
//! newline, no length prefix — the connection is shut down and closed
//! immediately after the bytes are written.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub exit_code: i32,
    pub pid: i32,
}

impl Reply {
    pub fn new(exit_code: i32, pid: i32) -> Self {
        Reply { exit_code, pid }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn encode(&self) -> Vec<u8> {
        // infallible: Reply has no types serde_json can fail to encode.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
