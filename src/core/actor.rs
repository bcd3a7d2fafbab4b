//! # RelayActor: the supervisor's event loop.
//!
//! One actor task owns all mutable state: the worker process handle, the
//! readiness/failure flags, the single in-flight [`Pending`] slot, the
//! deadline racing it, and the respawn timer. Public calls arrive as
//! [`Command`]s over a channel and resolve through oneshot replies; nothing
//! else touches the worker.
//!
//! ## Event sources (raced in one `select!`)
//! ```text
//!   commands ──────► Start / Send / Stop / Status
//!   stdout lines ──► handshake / acknowledgement (generation-checked)
//!   child exit ────► launch failure, crash, or stop confirmation
//!   deadline ──────► handshake timeout / response timeout
//!   respawn timer ─► internal relaunch
//!   token ─────────► supervisor shutdown
//! ```
//!
//! ## Rules
//! - At most one worker process exists; `start` while one exists is a no-op
//!   success.
//! - At most one exchange is in flight; a second `send` resolves `Busy`.
//! - The [`Pending`] slot is taken before either resolution branch delivers,
//!   so a message and its timeout can never both fire.
//! - `ready` and the process handle live and die together: the handle is
//!   discarded first, and everything tied to it (stale lines, armed
//!   deadlines) becomes inert.

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::core::pending::{Pending, SendReply, StartReply};
use crate::core::process::{condense, ExitInfo, RelayProcess, WorkerLine};
use crate::core::protocol::{self, Handshake, MAX_CHANNELS};
use crate::error::{SendError, StartError, StopError};
use crate::events::{Bus, Event, EventKind};

/// A public operation, carried from a [`Relay`](crate::Relay) handle to the
/// actor.
pub(crate) enum Command {
    Start {
        reply: StartReply,
    },
    Send {
        channels: Vec<u8>,
        reply: SendReply,
    },
    Stop {
        respawn: bool,
        reply: oneshot::Sender<Result<(), StopError>>,
    },
    Status {
        reply: oneshot::Sender<bool>,
    },
}

/// An explicit `stop()` whose exit confirmation is still outstanding.
struct StopInFlight {
    reply: oneshot::Sender<Result<(), StopError>>,
    respawn: bool,
}

pub(crate) struct RelayActor {
    cfg: RelayConfig,
    bus: Bus,
    commands: mpsc::Receiver<Command>,
    lines_rx: mpsc::Receiver<WorkerLine>,
    lines_tx: mpsc::Sender<WorkerLine>,
    token: CancellationToken,

    process: Option<RelayProcess>,
    /// Bumped on every spawn; lines from older generations are ignored.
    generation: u64,
    ready: bool,
    failed: bool,
    pending: Pending,
    stopping: Option<StopInFlight>,
    respawn_at: Option<Instant>,
}

impl RelayActor {
    pub fn new(
        cfg: RelayConfig,
        bus: Bus,
        commands: mpsc::Receiver<Command>,
        token: CancellationToken,
    ) -> Self {
        let (lines_tx, lines_rx) = mpsc::channel(64);
        Self {
            cfg,
            bus,
            commands,
            lines_rx,
            lines_tx,
            token,
            process: None,
            generation: 0,
            ready: false,
            failed: false,
            pending: Pending::Idle,
            stopping: None,
            respawn_at: None,
        }
    }

    /// Runs the actor until the supervisor shuts down (token cancelled or
    /// every handle dropped). Kills any live worker on the way out.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                line = self.lines_rx.recv() => {
                    // Cannot yield None: the actor keeps a sender clone.
                    if let Some(line) = line {
                        self.handle_line(line);
                    }
                },
                info = Self::wait_exit(&mut self.process) => self.on_exit(info),
                _ = Self::tick(self.pending.deadline()) => self.on_deadline(),
                _ = Self::tick(self.respawn_at) => self.on_respawn_due(),
            }
        }
        self.discard_worker();
    }

    /// Resolves when the live worker exits; never resolves while there is no
    /// worker.
    async fn wait_exit(process: &mut Option<RelayProcess>) -> ExitInfo {
        match process {
            Some(p) => p.wait().await,
            None => std::future::pending().await,
        }
    }

    /// Resolves at `deadline`; never resolves while nothing is armed.
    async fn tick(deadline: Option<Instant>) {
        match deadline {
            Some(at) => time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start { reply } => self.handle_start(Some(reply)),
            Command::Send { channels, reply } => self.handle_send(channels, reply).await,
            Command::Stop { respawn, reply } => self.handle_stop(respawn, reply),
            Command::Status { reply } => {
                let _ = reply.send(self.process.is_some() && self.ready && !self.failed);
            }
        }
    }

    /// Launches the worker and arms the handshake wait. `reply` is absent
    /// for supervisor-internal relaunches.
    fn handle_start(&mut self, reply: Option<StartReply>) {
        if self.process.is_some() {
            // Already launching or ready: no-op success.
            if let Some(reply) = reply {
                let _ = reply.send(Ok(()));
            }
            return;
        }

        self.failed = false;
        self.generation += 1;
        match RelayProcess::spawn(
            &self.cfg.command,
            &self.cfg.device,
            self.cfg.baud,
            self.generation,
            self.lines_tx.clone(),
        ) {
            Ok(process) => {
                self.bus
                    .publish(Event::new(EventKind::RelaySpawned).with_pid(process.id()));
                self.pending = Pending::AwaitingHandshake {
                    reply,
                    deadline: Instant::now() + self.cfg.response_timeout,
                };
                self.process = Some(process);
            }
            Err(source) => {
                // Spawn refusal is synchronous here, so no exit event can
                // ever double-report this launch attempt.
                self.failed = true;
                self.bus
                    .publish(Event::new(EventKind::SpawnFailed).with_reason(source.to_string()));
                if let Some(reply) = reply {
                    let _ = reply.send(Err(StartError::Spawn { source }));
                }
            }
        }
    }

    async fn handle_send(&mut self, channels: Vec<u8>, reply: SendReply) {
        if self.process.is_none() {
            let _ = reply.send(Err(SendError::NotReady));
            return;
        }
        if channels.is_empty() || channels.len() > MAX_CHANNELS {
            let _ = reply.send(Err(SendError::InvalidFrame {
                len: channels.len(),
            }));
            return;
        }
        if !self.pending.is_idle() {
            let _ = reply.send(Err(SendError::Busy));
            return;
        }

        let line = protocol::encode_frame(&channels);
        let Some(process) = self.process.as_mut() else {
            let _ = reply.send(Err(SendError::NotReady));
            return;
        };
        match process.write_frame(&line).await {
            Ok(()) => {
                self.pending = Pending::AwaitingAck {
                    reply,
                    expected: channels.len(),
                    deadline: Instant::now() + self.cfg.response_timeout,
                };
            }
            Err(source) => {
                self.bus
                    .publish(Event::new(EventKind::SendFailed).with_reason(source.to_string()));
                let _ = reply.send(Err(SendError::Write { source }));
            }
        }
    }

    fn handle_stop(&mut self, respawn: bool, reply: oneshot::Sender<Result<(), StopError>>) {
        let process = match self.process.as_mut() {
            None => {
                // Already stopped: success, no side effects.
                let _ = reply.send(Ok(()));
                return;
            }
            Some(p) => p,
        };
        if self.stopping.is_some() {
            // Termination already underway; this caller rides along.
            let _ = reply.send(Ok(()));
            return;
        }
        match process.signal_terminate() {
            Ok(()) => {
                self.stopping = Some(StopInFlight { reply, respawn });
            }
            Err(source) => {
                let _ = reply.send(Err(StopError::Kill { source }));
            }
        }
    }

    /// Routes one worker stdout line to the pending slot.
    fn handle_line(&mut self, line: WorkerLine) {
        if line.generation != self.generation || self.process.is_none() {
            // Straggler from a replaced or discarded process.
            return;
        }
        match self.pending.take() {
            Pending::Idle => {
                // Unsolicited output; nothing is waiting for it.
            }
            Pending::AwaitingHandshake { reply, .. } => self.on_handshake(&line.text, reply),
            Pending::AwaitingAck {
                reply, expected, ..
            } => self.on_ack(line.text, expected, reply),
        }
    }

    fn on_handshake(&mut self, message: &str, reply: Option<StartReply>) {
        match protocol::classify_handshake(message) {
            Handshake::Ready => {
                self.ready = true;
                self.bus.publish(Event::new(EventKind::RelayReady));
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(()));
                }
            }
            Handshake::DeviceError => {
                let stderr = self.stderr_snapshot();
                self.bus.publish(
                    Event::new(EventKind::HandshakeFailed).with_reason(condense(&stderr)),
                );
                if let Some(reply) = reply {
                    let _ = reply.send(Err(StartError::Device { stderr }));
                }
                self.discard_worker();
            }
            Handshake::Other(other) => {
                self.bus.publish(
                    Event::new(EventKind::HandshakeFailed)
                        .with_reason(format!("unexpected handshake {other:?}")),
                );
                if let Some(reply) = reply {
                    let _ = reply.send(Err(StartError::UnexpectedHandshake {
                        message: other.to_string(),
                    }));
                }
                self.discard_worker();
            }
        }
    }

    fn on_ack(&mut self, message: String, expected: usize, reply: SendReply) {
        match protocol::parse_ack(&message) {
            Some(acked) if acked == expected => {
                self.bus
                    .publish(Event::new(EventKind::FrameAcked).with_bytes(acked));
                let _ = reply.send(Ok(acked));
            }
            Some(acked) => {
                // Count mismatch: the worker stays up; retrying is the
                // caller's choice.
                self.bus.publish(
                    Event::new(EventKind::SendFailed)
                        .with_reason(format!("acked {acked} of {expected} channels")),
                );
                let _ = reply.send(Err(SendError::Corrupt { expected, acked }));
            }
            None => {
                self.bus.publish(
                    Event::new(EventKind::SendFailed)
                        .with_reason(format!("unknown response {message:?}")),
                );
                let _ = reply.send(Err(SendError::UnknownResponse { response: message }));
            }
        }
    }

    /// The armed deadline fired before the worker's message arrived.
    fn on_deadline(&mut self) {
        match self.pending.take() {
            Pending::Idle => {}
            Pending::AwaitingHandshake { reply, .. } => {
                self.bus.publish(
                    Event::new(EventKind::HandshakeFailed).with_reason("not ready in time"),
                );
                if let Some(reply) = reply {
                    let _ = reply.send(Err(StartError::HandshakeTimeout {
                        timeout: self.cfg.response_timeout,
                    }));
                }
                if self.stopping.is_none() {
                    self.discard_worker();
                }
            }
            Pending::AwaitingAck { reply, .. } => {
                // The worker stays up; only this exchange is abandoned. A
                // late acknowledgement finds the slot idle and is dropped.
                self.bus.publish(
                    Event::new(EventKind::SendFailed).with_reason("no acknowledgement in time"),
                );
                let _ = reply.send(Err(SendError::ResponseTimeout {
                    timeout: self.cfg.response_timeout,
                }));
            }
        }
    }

    /// The worker exited: stop confirmation, launch failure, or crash.
    fn on_exit(&mut self, info: ExitInfo) {
        let was_ready = self.ready;
        self.process = None;
        self.ready = false;

        if let Some(stop) = self.stopping.take() {
            // Deliberate termination: confirm to the stop caller and drop
            // whatever exchange was still pending (its caller resolves
            // `Interrupted`). The respawn policy does not apply.
            drop(self.pending.take());
            self.bus.publish(Event::new(EventKind::RelayTerminated));
            let _ = stop.reply.send(Ok(()));
            if stop.respawn {
                self.handle_start(None);
            }
            return;
        }

        if was_ready {
            // Runtime crash: start resolved long ago, so nobody is called
            // back; observability and the respawn policy take over.
            drop(self.pending.take());
            self.bus.publish(
                Event::new(EventKind::RelayExited)
                    .with_exit(info.code, info.signal)
                    .with_reason(condense(&info.stderr)),
            );
            if let Some(delay) = self.cfg.respawn.delay() {
                self.respawn_at = Some(Instant::now() + delay);
                self.bus
                    .publish(Event::new(EventKind::RespawnScheduled).with_delay(delay));
            }
            return;
        }

        // Exit before readiness: the launch itself failed.
        self.failed = true;
        match self.pending.take() {
            Pending::AwaitingHandshake { reply, .. } => {
                self.bus.publish(
                    Event::new(EventKind::HandshakeFailed)
                        .with_exit(info.code, info.signal)
                        .with_reason(condense(&info.stderr)),
                );
                if let Some(reply) = reply {
                    let _ = reply.send(Err(StartError::ExitedEarly {
                        code: info.code,
                        signal: info.signal,
                        stderr: info.stderr,
                    }));
                }
            }
            other => {
                // The launch outcome was already reported (device error or
                // timeout raced ahead); nothing left to resolve.
                drop(other);
            }
        }
    }

    /// The respawn delay elapsed; relaunch if nothing else started a worker
    /// in the meantime.
    fn on_respawn_due(&mut self) {
        self.respawn_at = None;
        if self.process.is_none() {
            self.handle_start(None);
        }
    }

    /// Discards the worker handle: polite SIGTERM, then `kill_on_drop`
    /// escalates when the handle drops. Everything tied to the handle
    /// (stale lines, armed deadline) becomes inert immediately.
    fn discard_worker(&mut self) {
        if let Some(mut process) = self.process.take() {
            let _ = process.signal_terminate();
        }
        self.ready = false;
    }

    fn stderr_snapshot(&self) -> String {
        self.process
            .as_ref()
            .map(|p| p.stderr_snapshot())
            .unwrap_or_default()
    }
}
