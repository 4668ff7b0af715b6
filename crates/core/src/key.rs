// SPDX-License-Identifier: MIT

//! The opaque byte-string key clients use to identify a coalesced task.

use std::fmt;
use thiserror::Error;

/// Upper bound on key size (§3 Data Model). The wire reader itself is only
/// bounded by the per-connection read timeout; this is an additional guard
/// against a client streaming an unbounded line.
pub const MAX_KEY_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(Vec<u8>);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key contains CR or LF")]
    ContainsLineBreak,
    #[error("key exceeds {MAX_KEY_LEN} bytes")]
    TooLong,
}

impl Key {
    pub fn new(bytes: Vec<u8>) -> Result<Self, KeyError> {
        if bytes.len() > MAX_KEY_LEN {
            return Err(KeyError::TooLong);
        }
        if bytes.iter().any(|&b| b == b'\r' || b == b'\n') {
            return Err(KeyError::ContainsLineBreak);
        }
        Ok(Key(bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}
