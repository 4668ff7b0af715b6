// SPDX-License-Identifier: MIT

//! Shared types for the stampede worker daemon: the request key, peer
//! credentials, and the pluggable task hook. No I/O lives here.

mod key;
mod paths;
mod peer;
mod perform;

pub use key::{Key, KeyError, MAX_KEY_LEN};
pub use paths::{lock_path, pending_sock_path, sock_path};
pub use peer::PeerId;
pub use perform::{Outcome, Perform};
