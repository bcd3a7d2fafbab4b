//! # Worker process lifecycle.
//!
//! [`RelayProcess`] owns one external worker across its full life: spawn
//! with piped stdio, frame writes to stdin, termination signalling, and exit
//! normalization into a single [`ExitInfo`].
//!
//! Two background pumps are spawned per process:
//! - **stdout** — raw chunks through a [`LineBuffer`], every completed line
//!   forwarded to the actor tagged with this process's generation number, so
//!   stragglers from a replaced process are detectable and ignored.
//! - **stderr** — accumulated into a shared buffer, reset with each process;
//!   reported alongside handshake failures and exits.
//!
//! The child is configured with `kill_on_drop`, so discarding the handle is
//! always sufficient to ensure no worker outlives the supervisor, even when
//! a polite SIGTERM was ignored.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;

use crate::core::framing::LineBuffer;

/// One trimmed stdout line, tagged with the generation of the process that
/// produced it.
#[derive(Debug)]
pub(crate) struct WorkerLine {
    pub generation: u64,
    pub text: String,
}

/// Normalized terminal state of a worker process.
#[derive(Debug)]
pub(crate) struct ExitInfo {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal, if any (Unix only).
    pub signal: Option<i32>,
    /// Everything the process wrote to stderr.
    pub stderr: String,
}

/// Handle to a live worker process. Exclusively owned by the actor.
pub(crate) struct RelayProcess {
    child: Child,
    stdin: ChildStdin,
    stderr: Arc<Mutex<String>>,
}

impl RelayProcess {
    /// Launches the worker with `[device, baud]` as positional arguments.
    ///
    /// On Windows the command is run through `python`; elsewhere it is
    /// executed directly (it must carry its own shebang/exec bit).
    pub fn spawn(
        command: &Path,
        device: &str,
        baud: u32,
        generation: u64,
        lines: mpsc::Sender<WorkerLine>,
    ) -> io::Result<Self> {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("python");
            c.arg(command);
            c
        } else {
            Command::new(command)
        };
        cmd.arg(device)
            .arg(baud.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("worker stdin was not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("worker stdout was not piped"))?;
        let stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("worker stderr was not piped"))?;

        // stdout pump: chunks → lines → actor, tagged with this generation.
        tokio::spawn(async move {
            let mut stdout = stdout;
            let mut buffer = LineBuffer::new();
            let mut chunk = [0u8; 1024];
            loop {
                match stdout.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        for text in buffer.extend(&chunk[..n]) {
                            if lines.send(WorkerLine { generation, text }).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        // stderr pump: accumulate for failure reports.
        let stderr = Arc::new(Mutex::new(String::new()));
        {
            let sink = Arc::clone(&stderr);
            tokio::spawn(async move {
                let mut pipe = stderr_pipe;
                let mut chunk = [0u8; 1024];
                loop {
                    match pipe.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            let text = String::from_utf8_lossy(&chunk[..n]).into_owned();
                            sink.lock()
                                .unwrap_or_else(|poisoned| poisoned.into_inner())
                                .push_str(&text);
                        }
                    }
                }
            });
        }

        Ok(Self {
            child,
            stdin,
            stderr,
        })
    }

    /// OS process id, while the process is alive.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Writes one frame line (terminator appended) to the worker's stdin.
    pub async fn write_frame(&mut self, line: &str) -> io::Result<()> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await
    }

    /// Sends the polite termination signal (SIGTERM; TerminateProcess on
    /// Windows) without waiting for the exit.
    pub fn signal_terminate(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }

    /// Waits for the process to exit and normalizes the outcome.
    ///
    /// Cancel safe (delegates to `Child::wait`), so the actor can race this
    /// against its other event sources.
    pub async fn wait(&mut self) -> ExitInfo {
        let (code, signal) = match self.child.wait().await {
            Ok(status) => (status.code(), signal_of(&status)),
            Err(_) => (None, None),
        };
        ExitInfo {
            code,
            signal,
            stderr: self.stderr_snapshot(),
        }
    }

    /// Current contents of the accumulated stderr buffer.
    pub fn stderr_snapshot(&self) -> String {
        self.stderr
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Folds a multi-line stderr capture into one log-friendly line: newlines
/// become `" | "`, runs of whitespace collapse to single spaces.
pub(crate) fn condense(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !out.is_empty() {
            out.push_str(" | ");
        }
        let mut first = true;
        for word in line.split_whitespace() {
            if !first {
                out.push(' ');
            }
            out.push_str(word);
            first = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condense_folds_lines_and_whitespace() {
        assert_eq!(
            condense("  open failed\n\n  device   busy \n"),
            "open failed | device busy"
        );
        assert_eq!(condense(""), "");
        assert_eq!(condense("single"), "single");
    }
}
