// SPDX-License-Identifier: MIT

//! Reference wiring for the stampede daemon library: a [`Perform`]
//! implementation whose behavior is selected by the request key, used to
//! drive the end-to-end test scenarios (simple success, task failure,
//! explicit exit code, queue collapse, watchdog timeout, malformed input).
//!
//! Keys recognized:
//!   - `foobar`            — logs `JOB foobar EXECUTED`, exits 0.
//!   - `collapse`          — sleeps 350ms, exits 0 (for coalescing tests).
//!   - `timeout`           — logs `timeout STARTED`, sleeps past any
//!                           reasonable watchdog so the alarm kills it.
//!   - `progress`          — sleeps in short increments, re-arming the
//!                           watchdog between each one, to outlive an alarm
//!                           shorter than its total runtime.
//!   - `boom`              — panics, exits 255 via the daemon's catch.
//!   - `exit:<0-255>`      — exits with the given explicit code.
//!   - anything else       — logs `JOB <key> EXECUTED`, exits 0.

#![allow(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use stampede_core::{Key, Outcome, Perform};
use stampede_daemon::{Config, Daemon};
use tracing::info;

#[derive(Parser)]
struct Args {
    /// The path prefix; `<path>.sock`, `<path>.sock-pending`, and
    /// `<path>.lock` are all derived from it.
    path: PathBuf,
}

struct DemoTask;

impl Perform for DemoTask {
    fn perform(&self, key: &Key) -> Outcome {
        let key_str = key.to_string();
        match key_str.as_str() {
            "collapse" => {
                std::thread::sleep(Duration::from_millis(350));
                Outcome::Success
            }
            "timeout" => {
                info!("timeout STARTED");
                std::thread::sleep(Duration::from_secs(2));
                info!("timeout FAIL");
                Outcome::Success
            }
            "progress" => {
                // Five 300ms naps with a re-arm after each beat a 1s alarm
                // even though the total runtime (1.5s) exceeds it.
                for _ in 0..5 {
                    std::thread::sleep(Duration::from_millis(300));
                    stampede_daemon::pet_watchdog(1);
                }
                Outcome::Success
            }
            "boom" => panic!("demo task boom"),
            other if other.starts_with("exit:") => {
                let code: u8 = other["exit:".len()..].parse().unwrap_or(255);
                Outcome::ExitCode(code)
            }
            other => {
                info!("JOB {} EXECUTED", other);
                Outcome::Success
            }
        }
    }
}


fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::new(args.path);
    let daemon = Daemon::new(config, Arc::new(DemoTask))?;
    daemon.run()?;
    Ok(())
}
