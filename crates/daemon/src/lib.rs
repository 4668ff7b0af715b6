// SPDX-License-Identifier: MIT

//! The worker daemon: a single-threaded event loop over a Unix-domain
//! listener that coalesces concurrent requests for the same key into one
//! forked child (§1-§5).
//!
//! This crate has no `main` — embedding binaries construct a [`Daemon`]
//! with their own [`stampede_core::Perform`] implementation. See
//! `stampede-demo-task` for a reference wiring.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod accept;
mod client_read;
mod completion;
mod config;
mod lifecycle;
mod listener;
mod reap;
mod server;
mod spawn;
mod state;
mod watchdog;
mod workspace;

pub use config::{ipc_timeout, Config};
pub use lifecycle::{InstanceLock, LifecycleError};
pub use server::Daemon;
pub use watchdog::pet as pet_watchdog;
