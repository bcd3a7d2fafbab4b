//! Keep-alive demo: watch the supervisor relaunch a crashing worker.
//!
//! Run with:
//! ```sh
//! cargo run --example keep_alive --features logging
//! ```
//! Point `cfg.command` at a worker that dies now and then; the event stream
//! shows the exit, the scheduled respawn, and the fresh handshake.

use std::sync::Arc;
use std::time::Duration;

use dmxvisor::{EventKind, LogWriter, Relay, RelayConfig, RespawnPolicy};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = RelayConfig::default();
    cfg.respawn = RespawnPolicy::OnCrash {
        delay: Duration::from_millis(500),
    };

    let relay = Relay::builder(cfg)
        .with_subscriber(Arc::new(LogWriter))
        .build();
    relay.start().await?;

    // Follow the lifecycle for a while; every crash should be followed by a
    // RespawnScheduled and, once the worker handshakes again, RelayReady.
    let mut events = relay.subscribe();
    let watch = async {
        while let Ok(ev) = events.recv().await {
            if ev.kind == EventKind::RelayReady {
                println!("worker is back up (seq {})", ev.seq);
            }
        }
    };
    let _ = tokio::time::timeout(Duration::from_secs(30), watch).await;

    relay.stop(false).await?;
    relay.shutdown();
    Ok(())
}
