//! # Respawn policy for the worker process.
//!
//! [`RespawnPolicy`] decides what happens when the worker exits unexpectedly
//! *after* it became ready. Exits before readiness are launch failures and
//! are always reported to the `start` caller instead; a deliberate `stop()`
//! never triggers the policy.
//!
//! - [`RespawnPolicy::Never`] — the worker stays down until the owner calls
//!   `start()` again.
//! - [`RespawnPolicy::OnCrash`] — the supervisor relaunches the worker after
//!   the given delay, with no caller action.
//!
//! ```
//! use std::time::Duration;
//! use dmxvisor::RespawnPolicy;
//!
//! let policy = RespawnPolicy::OnCrash { delay: Duration::from_secs(2) };
//! assert_eq!(policy.delay(), Some(Duration::from_secs(2)));
//! assert_eq!(RespawnPolicy::Never.delay(), None);
//! ```

use std::time::Duration;

/// Policy controlling automatic relaunch after an unexpected post-ready exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RespawnPolicy {
    /// Never relaunch automatically.
    Never,
    /// Relaunch after `delay` whenever a ready worker exits unexpectedly.
    OnCrash {
        /// Wait before the relaunch attempt. `Duration::ZERO` relaunches
        /// on the next loop turn.
        delay: Duration,
    },
}

impl RespawnPolicy {
    /// Returns the relaunch delay, or `None` if the policy never respawns.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            RespawnPolicy::Never => None,
            RespawnPolicy::OnCrash { delay } => Some(*delay),
        }
    }
}

impl Default for RespawnPolicy {
    /// Returns [`RespawnPolicy::OnCrash`] with a one second delay.
    fn default() -> Self {
        RespawnPolicy::OnCrash {
            delay: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_has_no_delay() {
        assert_eq!(RespawnPolicy::Never.delay(), None);
    }

    #[test]
    fn on_crash_reports_its_delay() {
        let policy = RespawnPolicy::OnCrash {
            delay: Duration::from_millis(50),
        };
        assert_eq!(policy.delay(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn default_respawns_after_one_second() {
        assert_eq!(RespawnPolicy::default().delay(), Some(Duration::from_secs(1)));
    }
}
