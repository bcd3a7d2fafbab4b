//! Subscriber API: hook into worker lifecycle events.
//!
//! - [`Subscribe`] — the trait a custom sink implements.
//! - [`SubscriberSet`] — non-blocking fan-out with one bounded queue and
//!   worker task per subscriber.
//! - [`LogWriter`] — a simple stdout sink behind the `logging` feature,
//!   for demos and debugging.
//!
//! There is no process-wide logging hook: each [`Relay`](crate::Relay) is
//! built with its own set of sinks, and supervisors in the same process can
//! observe their workers independently.

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
