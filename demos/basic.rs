//! Minimal walkthrough: start the worker, push one frame, stop.
//!
//! Run with:
//! ```sh
//! cargo run --example basic --features logging
//! ```
//! Expects a relay worker at `./dmx-serial-relay.py` and a serial device at
//! `/dev/ttyACM0` (adjust below).

use std::sync::Arc;

use dmxvisor::{LogWriter, Relay, RelayConfig, RespawnPolicy};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = RelayConfig::default();
    cfg.respawn = RespawnPolicy::Never;

    let relay = Relay::builder(cfg)
        .with_subscriber(Arc::new(LogWriter))
        .build();

    relay.start().await?;
    println!("worker ready: {}", relay.status().await);

    let sent = relay.send(&[0, 128, 255]).await?;
    println!("acknowledged {sent} channels");

    relay.stop(false).await?;
    relay.shutdown();
    Ok(())
}
