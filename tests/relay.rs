//! End-to-end tests driving the supervisor against shell-script workers.
//!
//! Each test writes a small `/bin/sh` worker into a temp directory and points
//! the supervisor at it. The scripts receive the device and baud arguments
//! like the real relay would, but only speak the stdio protocol.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

use dmxvisor::{
    EventKind, Relay, RelayConfig, RespawnPolicy, SendError, StartError,
};

/// Writes `body` as an executable worker script and returns its path.
fn script(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("worker.sh");
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn config(command: PathBuf) -> RelayConfig {
    RelayConfig {
        command,
        respawn: RespawnPolicy::Never,
        response_timeout: Duration::from_secs(2),
        ..RelayConfig::default()
    }
}

/// Handshakes and acknowledges every frame with its actual channel count.
const ECHO_WORKER: &str = r#"#!/bin/sh
echo ready
while read line; do
  n=$(printf '%s' "$line" | awk -F, '{print NF}')
  echo "OK:$n"
done
"#;

#[tokio::test]
async fn start_handshake_and_status() {
    let dir = TempDir::new().unwrap();
    let relay = Relay::new(config(script(&dir, ECHO_WORKER)));

    assert!(!relay.status().await);
    relay.start().await.unwrap();
    assert!(relay.status().await);

    // A second start against a live worker is a no-op success.
    relay.start().await.unwrap();
    assert!(relay.status().await);

    relay.stop(false).await.unwrap();
    assert!(!relay.status().await);
    relay.shutdown();
}

#[tokio::test]
async fn send_resolves_acknowledged_count() {
    let dir = TempDir::new().unwrap();
    let relay = Relay::new(config(script(&dir, ECHO_WORKER)));
    relay.start().await.unwrap();

    assert_eq!(relay.send(&[0, 128, 255]).await.unwrap(), 3);
    assert_eq!(relay.send(&[42]).await.unwrap(), 1);
    let full = vec![7u8; 512];
    assert_eq!(relay.send(&full).await.unwrap(), 512);

    relay.stop(false).await.unwrap();
    relay.shutdown();
}

#[tokio::test]
async fn send_without_worker_is_not_ready() {
    let dir = TempDir::new().unwrap();
    let relay = Relay::new(config(script(&dir, ECHO_WORKER)));

    assert!(matches!(
        relay.send(&[1, 2, 3]).await,
        Err(SendError::NotReady)
    ));
    relay.shutdown();
}

#[tokio::test]
async fn frames_outside_bounds_are_rejected() {
    let dir = TempDir::new().unwrap();
    let relay = Relay::new(config(script(&dir, ECHO_WORKER)));
    relay.start().await.unwrap();

    assert!(matches!(
        relay.send(&[]).await,
        Err(SendError::InvalidFrame { len: 0 })
    ));
    let oversized = vec![0u8; 513];
    assert!(matches!(
        relay.send(&oversized).await,
        Err(SendError::InvalidFrame { len: 513 })
    ));

    // The worker is untouched by rejected frames.
    assert_eq!(relay.send(&[9, 9]).await.unwrap(), 2);
    relay.stop(false).await.unwrap();
    relay.shutdown();
}

#[tokio::test]
async fn mismatched_ack_is_corrupt_and_worker_survives() {
    let dir = TempDir::new().unwrap();
    let worker = script(
        &dir,
        r#"#!/bin/sh
echo ready
while read line; do echo "OK:99"; done
"#,
    );
    let relay = Relay::new(config(worker));
    relay.start().await.unwrap();

    match relay.send(&[1, 2, 3]).await {
        Err(SendError::Corrupt { expected, acked }) => {
            assert_eq!(expected, 3);
            assert_eq!(acked, 99);
        }
        other => panic!("expected Corrupt, got {other:?}"),
    }
    // Only the exchange failed; the worker is still considered live.
    assert!(relay.status().await);

    relay.stop(false).await.unwrap();
    relay.shutdown();
}

#[tokio::test]
async fn garbled_ack_is_unknown_response() {
    let dir = TempDir::new().unwrap();
    let worker = script(
        &dir,
        r#"#!/bin/sh
echo ready
while read line; do echo "garbled"; done
"#,
    );
    let relay = Relay::new(config(worker));
    relay.start().await.unwrap();

    match relay.send(&[1, 2]).await {
        Err(SendError::UnknownResponse { response }) => assert_eq!(response, "garbled"),
        other => panic!("expected UnknownResponse, got {other:?}"),
    }
    relay.stop(false).await.unwrap();
    relay.shutdown();
}

#[tokio::test]
async fn missing_ack_times_out_without_killing_worker() {
    let dir = TempDir::new().unwrap();
    let worker = script(
        &dir,
        r#"#!/bin/sh
echo ready
while read line; do :; done
"#,
    );
    let mut cfg = config(worker);
    cfg.response_timeout = Duration::from_millis(200);
    let relay = Relay::new(cfg);
    relay.start().await.unwrap();

    assert!(matches!(
        relay.send(&[5, 5, 5]).await,
        Err(SendError::ResponseTimeout { .. })
    ));
    assert!(relay.status().await);

    relay.stop(false).await.unwrap();
    relay.shutdown();
}

#[tokio::test]
async fn overlapping_send_is_busy() {
    let dir = TempDir::new().unwrap();
    let worker = script(
        &dir,
        r#"#!/bin/sh
echo ready
while read line; do
  sleep 0.4
  echo "OK:3"
done
"#,
    );
    let relay = Relay::new(config(worker));
    relay.start().await.unwrap();

    let first = {
        let relay = relay.clone();
        tokio::spawn(async move { relay.send(&[1, 2, 3]).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(matches!(relay.send(&[4, 5, 6]).await, Err(SendError::Busy)));

    // The in-flight exchange is unaffected by the rejected one.
    assert_eq!(first.await.unwrap().unwrap(), 3);
    relay.stop(false).await.unwrap();
    relay.shutdown();
}

#[tokio::test]
async fn device_error_handshake_fails_start() {
    let dir = TempDir::new().unwrap();
    let worker = script(
        &dir,
        r#"#!/bin/sh
echo "cannot open /dev/ttyACM0" 1>&2
sleep 0.1
echo "error:device"
sleep 2
"#,
    );
    let relay = Relay::new(config(worker));

    match relay.start().await {
        Err(StartError::Device { stderr }) => assert!(stderr.contains("cannot open")),
        other => panic!("expected Device, got {other:?}"),
    }
    assert!(!relay.status().await);
    relay.shutdown();
}

#[tokio::test]
async fn unexpected_handshake_fails_start() {
    let dir = TempDir::new().unwrap();
    let worker = script(
        &dir,
        r#"#!/bin/sh
echo "hello there"
sleep 2
"#,
    );
    let relay = Relay::new(config(worker));

    match relay.start().await {
        Err(StartError::UnexpectedHandshake { message }) => assert_eq!(message, "hello there"),
        other => panic!("expected UnexpectedHandshake, got {other:?}"),
    }
    relay.shutdown();
}

#[tokio::test]
async fn silent_worker_times_out_handshake() {
    let dir = TempDir::new().unwrap();
    let worker = script(
        &dir,
        r#"#!/bin/sh
sleep 5
"#,
    );
    let mut cfg = config(worker);
    cfg.response_timeout = Duration::from_millis(200);
    let relay = Relay::new(cfg);

    match relay.start().await {
        Err(StartError::HandshakeTimeout { timeout }) => {
            assert_eq!(timeout, Duration::from_millis(200));
        }
        other => panic!("expected HandshakeTimeout, got {other:?}"),
    }
    assert!(!relay.status().await);
    relay.shutdown();
}

#[tokio::test]
async fn missing_command_fails_spawn() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(dir.path().join("does-not-exist.sh"));
    cfg.respawn = RespawnPolicy::Never;
    let relay = Relay::new(cfg);

    assert!(matches!(relay.start().await, Err(StartError::Spawn { .. })));
    assert!(!relay.status().await);
    relay.shutdown();
}

#[tokio::test]
async fn early_exit_before_handshake_fails_start() {
    let dir = TempDir::new().unwrap();
    let worker = script(
        &dir,
        r#"#!/bin/sh
echo "boom" 1>&2
exit 7
"#,
    );
    let relay = Relay::new(config(worker));

    match relay.start().await {
        Err(StartError::ExitedEarly { code, .. }) => assert_eq!(code, Some(7)),
        other => panic!("expected ExitedEarly, got {other:?}"),
    }
    relay.shutdown();
}

#[tokio::test]
async fn crash_while_awaiting_ack_interrupts_send() {
    let dir = TempDir::new().unwrap();
    let worker = script(
        &dir,
        r#"#!/bin/sh
echo ready
read line
exit 2
"#,
    );
    let relay = Relay::new(config(worker));
    relay.start().await.unwrap();

    assert!(matches!(
        relay.send(&[1, 2, 3]).await,
        Err(SendError::Interrupted)
    ));
    assert!(!relay.status().await);
    relay.shutdown();
}

#[tokio::test]
async fn stop_interrupts_pending_start() {
    let dir = TempDir::new().unwrap();
    let worker = script(
        &dir,
        r#"#!/bin/sh
sleep 5
"#,
    );
    let mut cfg = config(worker);
    cfg.response_timeout = Duration::from_secs(5);
    let relay = Relay::new(cfg);

    let starter = {
        let relay = relay.clone();
        tokio::spawn(async move { relay.start().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    relay.stop(false).await.unwrap();

    assert!(matches!(
        starter.await.unwrap(),
        Err(StartError::Interrupted)
    ));
    relay.shutdown();
}

#[tokio::test]
async fn stop_without_worker_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let relay = Relay::new(config(script(&dir, ECHO_WORKER)));

    relay.stop(false).await.unwrap();
    relay.start().await.unwrap();
    relay.stop(false).await.unwrap();
    relay.stop(false).await.unwrap();
    relay.shutdown();
}

#[tokio::test]
async fn stop_with_respawn_brings_worker_back() {
    let dir = TempDir::new().unwrap();
    let relay = Relay::new(config(script(&dir, ECHO_WORKER)));
    relay.start().await.unwrap();

    relay.stop(true).await.unwrap();

    // The relaunch is fire-and-forget; poll for the fresh handshake.
    let relaunched = async {
        loop {
            if relay.status().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    };
    timeout(Duration::from_secs(5), relaunched).await.unwrap();

    assert_eq!(relay.send(&[10, 20]).await.unwrap(), 2);
    relay.stop(false).await.unwrap();
    relay.shutdown();
}

#[tokio::test]
async fn crash_triggers_respawn_per_policy() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("crashed-once");
    let body = format!(
        r#"#!/bin/sh
if [ -e "{marker}" ]; then
  echo ready
  while read line; do echo "OK:3"; done
else
  : > "{marker}"
  echo ready
  sleep 0.2
  exit 3
fi
"#,
        marker = marker.display()
    );
    let mut cfg = config(script(&dir, &body));
    cfg.respawn = RespawnPolicy::OnCrash {
        delay: Duration::from_millis(100),
    };
    let relay = Relay::new(cfg);

    let mut events = relay.subscribe();
    relay.start().await.unwrap();

    // Watch the lifecycle: crash, scheduled respawn, second handshake.
    let mut saw_exit = false;
    let mut saw_scheduled = false;
    let watch = async {
        loop {
            let ev = events.recv().await.unwrap();
            match ev.kind {
                EventKind::RelayExited => {
                    assert_eq!(ev.code, Some(3));
                    saw_exit = true;
                }
                EventKind::RespawnScheduled => {
                    assert_eq!(ev.delay_ms, Some(100));
                    saw_scheduled = true;
                }
                EventKind::RelayReady if saw_exit => break,
                _ => {}
            }
        }
    };
    timeout(Duration::from_secs(5), watch).await.unwrap();
    assert!(saw_scheduled);

    assert!(relay.status().await);
    assert_eq!(relay.send(&[1, 2, 3]).await.unwrap(), 3);
    relay.stop(false).await.unwrap();
    relay.shutdown();
}

#[tokio::test]
async fn explicit_stop_does_not_respawn() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(script(&dir, ECHO_WORKER));
    cfg.respawn = RespawnPolicy::OnCrash {
        delay: Duration::from_millis(50),
    };
    let relay = Relay::new(cfg);
    relay.start().await.unwrap();

    let mut events = relay.subscribe();
    relay.stop(false).await.unwrap();

    // Give an erroneous respawn ample time to show itself.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!relay.status().await);
    while let Ok(ev) = events.try_recv() {
        assert_ne!(ev.kind, EventKind::RespawnScheduled);
        assert_ne!(ev.kind, EventKind::RelaySpawned);
    }
    relay.shutdown();
}

#[tokio::test]
async fn events_trace_the_happy_path() {
    let dir = TempDir::new().unwrap();
    let relay = Relay::new(config(script(&dir, ECHO_WORKER)));
    let mut events = relay.subscribe();

    relay.start().await.unwrap();
    relay.send(&[1, 2, 3, 4]).await.unwrap();
    relay.stop(false).await.unwrap();

    let mut kinds = Vec::new();
    let collect = async {
        loop {
            let ev = events.recv().await.unwrap();
            let done = ev.kind == EventKind::RelayTerminated;
            kinds.push(ev.kind);
            if done {
                break;
            }
        }
    };
    timeout(Duration::from_secs(5), collect).await.unwrap();

    assert_eq!(
        kinds,
        vec![
            EventKind::RelaySpawned,
            EventKind::RelayReady,
            EventKind::FrameAcked,
            EventKind::RelayTerminated,
        ]
    );
    relay.shutdown();
}

#[tokio::test]
async fn shutdown_interrupts_callers() {
    let dir = TempDir::new().unwrap();
    let relay = Relay::new(config(script(&dir, ECHO_WORKER)));
    relay.start().await.unwrap();

    relay.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!relay.status().await);
    assert!(matches!(
        relay.send(&[1]).await,
        Err(SendError::Interrupted)
    ));
    assert!(matches!(relay.start().await, Err(StartError::Interrupted)));
}
