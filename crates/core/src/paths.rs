// SPDX-License-Identifier: MIT

//! Derives the three well-known paths from a single base path prefix (§6).

use std::ffi::OsString;
use std::path::{Path, PathBuf};

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = prefix.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// `<basePath>.sock` — the Unix socket.
pub fn sock_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, ".sock")
}

/// `<basePath>.sock-pending` — transient during bind; never left behind on success.
pub fn pending_sock_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, ".sock-pending")
}

/// `<basePath>.lock` — advisory exclusive lock file held by the live daemon.
pub fn lock_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, ".lock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_are_appended_not_substituted() {
        let prefix = Path::new("/var/run/myapp");
        assert_eq!(sock_path(prefix), PathBuf::from("/var/run/myapp.sock"));
        assert_eq!(pending_sock_path(prefix), PathBuf::from("/var/run/myapp.sock-pending"));
        assert_eq!(lock_path(prefix), PathBuf::from("/var/run/myapp.lock"));
    }

    #[test]
    fn prefix_with_existing_dot_is_not_treated_as_an_extension() {
        let prefix = Path::new("/tmp/my.app");
        assert_eq!(sock_path(prefix), PathBuf::from("/tmp/my.app.sock"));
    }
}
