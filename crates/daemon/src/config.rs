// SPDX-License-Identifier: MIT

//! Daemon configuration: the base path prefix and the two env-var
//! overrides (§10.3).

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ALARM_SECS: u64 = 300;
const DEFAULT_IPC_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    /// The positional CLI argument (§6 CLI surface): everything else is
    /// derived from this.
    pub base_path: PathBuf,
    /// Wall-clock seconds the watchdog gives a child before killing it
    /// (§4.6, default 300s).
    pub alarm_secs: u64,
}

impl Config {
    pub fn new(base_path: PathBuf) -> Self {
        Config { base_path, alarm_secs: alarm_secs() }
    }

    pub fn sock_path(&self) -> PathBuf {
        stampede_core::sock_path(&self.base_path)
    }

    pub fn pending_sock_path(&self) -> PathBuf {
        stampede_core::pending_sock_path(&self.base_path)
    }

    pub fn lock_path(&self) -> PathBuf {
        stampede_core::lock_path(&self.base_path)
    }
}

/// `STAMPEDE_ALARM_SECS` overrides the default watchdog duration.
fn alarm_secs() -> u64 {
    std::env::var("STAMPEDE_ALARM_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_ALARM_SECS)
}

/// `STAMPEDE_IPC_TIMEOUT_MS` overrides the default auto-spawn poll timeout
/// used by `request_and_spawn` (§4.10).
pub fn ipc_timeout() -> Duration {
    std::env::var("STAMPEDE_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(DEFAULT_IPC_TIMEOUT_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_paths_from_base() {
        let config = Config::new(PathBuf::from("/tmp/stampede-test"));
        assert_eq!(config.sock_path(), PathBuf::from("/tmp/stampede-test.sock"));
        assert_eq!(config.lock_path(), PathBuf::from("/tmp/stampede-test.lock"));
    }

    #[test]
    fn default_alarm_is_300s() {
        std::env::remove_var("STAMPEDE_ALARM_SECS");
        let config = Config::new(PathBuf::from("/tmp/stampede-test"));
        assert_eq!(config.alarm_secs, 300);
    }
}
