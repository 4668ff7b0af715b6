// SPDX-License-Identifier: MIT

//! The external task hook (§4.5, §9 "inheritance for task injection").
//!
//! The upstream design expects callers to subclass a worker base class and
//! override `perform(key)`. Here that becomes a plain trait accepted at
//! daemon construction — no subclassing, no metaprogramming required.

use crate::key::Key;

/// How a task finished, from the child's point of view.
///
/// A panic unwinding out of [`Perform::perform`] is caught by the daemon and
/// treated as [`Outcome::Failed`] with no explicit code (exit 255); it is not
/// a variant here because `perform` never constructs it itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Clean return; the child exits 0.
    Success,
    /// The task explicitly requested exit code `0..=255`.
    ExitCode(u8),
}

/// A task implementation, called once per workspace in the forked child.
///
/// Runs after the child has already closed every inherited client
/// connection and before the watchdog alarm fires; a long-running task can
/// re-arm the alarm via the daemon's liveness hook to signal progress.
pub trait Perform: Send + Sync {
    fn perform(&self, key: &Key) -> Outcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysSucceeds;
    impl Perform for AlwaysSucceeds {
        fn perform(&self, _key: &Key) -> Outcome {
            Outcome::Success
        }
    }

    struct ExplicitCode(u8);
    impl Perform for ExplicitCode {
        fn perform(&self, _key: &Key) -> Outcome {
            Outcome::ExitCode(self.0)
        }
    }

    #[test]
    fn success_outcome() {
        let key = Key::new(b"k".to_vec()).unwrap();
        assert_eq!(AlwaysSucceeds.perform(&key), Outcome::Success);
    }

    #[test]
    fn explicit_exit_code_outcome() {
        let key = Key::new(b"k".to_vec()).unwrap();
        assert_eq!(ExplicitCode(123).perform(&key), Outcome::ExitCode(123));
    }
}
