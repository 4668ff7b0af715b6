// SPDX-License-Identifier: MIT

//! The child's wall-clock watchdog (§4.6). Left unhandled, `SIGALRM`'s
//! default disposition terminates the process — the parent then observes a
//! signalled exit and reports it to waiters (§6: exit code 14).

use nix::unistd::alarm;

/// Arms the alarm for the first time, right after the fork.
pub fn arm(alarm_secs: u64) {
    alarm::set(alarm_secs as u32);
}

/// Re-arms the alarm. A task that wants to signal liveness on a
/// long-running job calls this to push the deadline back out, rather than
/// disabling the watchdog outright.
pub fn pet(alarm_secs: u64) {
    alarm::set(alarm_secs as u32);
}
