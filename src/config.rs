//! # Supervisor configuration.
//!
//! [`RelayConfig`] defines everything the supervisor needs to launch and talk
//! to the worker: the device handed to the worker, the baud parameter, the
//! worker command, the shared response timeout, and the respawn policy.
//!
//! The configuration is read once when a [`Relay`](crate::Relay) is built and
//! is immutable for the lifetime of that supervisor instance.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use dmxvisor::{RelayConfig, RespawnPolicy};
//!
//! let mut cfg = RelayConfig::default();
//! cfg.device = "/dev/ttyUSB0".into();
//! cfg.response_timeout = Duration::from_millis(250);
//! cfg.respawn = RespawnPolicy::Never;
//!
//! assert_eq!(cfg.baud, 115_200);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::policies::RespawnPolicy;

/// Configuration for one relay supervisor instance.
///
/// The `device` and `baud` fields are not interpreted by the supervisor; they
/// are passed to the worker as its two positional arguments and the worker
/// owns the actual serial I/O.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Device identifier handed to the worker (first positional argument).
    pub device: String,
    /// Baud-equivalent parameter handed to the worker (second positional argument).
    pub baud: u32,
    /// Path to the worker command. Invoked directly on Unix; through
    /// `python` on Windows.
    pub command: PathBuf,
    /// Maximum time to wait for the handshake after launch, and for each
    /// acknowledgement after a frame write.
    pub response_timeout: Duration,
    /// What to do when the worker exits unexpectedly after becoming ready.
    pub respawn: RespawnPolicy,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
}

impl Default for RelayConfig {
    /// Provides a default configuration:
    /// - `device = "/dev/ttyACM0"`
    /// - `baud = 115_200`
    /// - `command = "./dmx-serial-relay.py"`
    /// - `response_timeout = 500ms`
    /// - `respawn = RespawnPolicy::default()` (relaunch after 1s)
    /// - `bus_capacity = 256`
    fn default() -> Self {
        Self {
            device: "/dev/ttyACM0".to_string(),
            baud: 115_200,
            command: PathBuf::from("./dmx-serial-relay.py"),
            response_timeout: Duration::from_millis(500),
            respawn: RespawnPolicy::default(),
            bus_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.device, "/dev/ttyACM0");
        assert_eq!(cfg.baud, 115_200);
        assert_eq!(cfg.response_timeout, Duration::from_millis(500));
        assert_eq!(cfg.bus_capacity, 256);
        assert!(cfg.respawn.delay().is_some());
    }
}
