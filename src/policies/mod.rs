//! Recovery policies for the supervised worker.
//!
//! Currently a single policy: [`RespawnPolicy`], which controls whether the
//! worker is relaunched after an unexpected post-ready exit.

mod respawn;

pub use respawn::RespawnPolicy;
