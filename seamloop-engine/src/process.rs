//! Subprocess supervision
//!
//! Runs an external program with:
//! - a wall-clock timeout, after which the child is killed and reaped
//! - stderr drained concurrently and reduced to a bounded tail
//! - optional stdout capture
//! - `kill_on_drop`, so cancelling the caller's future terminates the child

use std::collections::VecDeque;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// A program invocation with its supervision settings
#[derive(Debug, Clone)]
pub struct SupervisedCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    capture_stdout: bool,
    tail_limit: usize,
}

impl SupervisedCommand {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
            capture_stdout: false,
            tail_limit: 2000,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Collect stdout instead of discarding it
    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    /// Bytes of stderr to keep
    pub fn tail_limit(mut self, bytes: usize) -> Self {
        self.tail_limit = bytes;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }
}

/// Outcome of a process that exited on its own
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    /// Empty unless stdout capture was requested
    pub stdout: String,
    /// Last lines of stderr, at most `tail_limit` bytes
    pub diagnostics: String,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Supervision failure
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting on {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exceeded {after:?} and was terminated")]
    TimedOut {
        program: String,
        after: Duration,
        /// OS pid of the terminated child
        pid: Option<u32>,
    },
}

/// Runs `command` to completion or until its timeout elapses
///
/// A non-zero exit is not an error here; callers inspect
/// [`ProcessOutput::status`] and map it to their own taxonomy.
pub async fn run(command: &SupervisedCommand) -> Result<ProcessOutput, ProcessError> {
    debug!("Spawning {} {:?}", command.program, command.args);

    let started = Instant::now();
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(if command.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: command.program.clone(),
            source,
        })?;

    let pid = child.id();

    let stderr_task = child.stderr.take().map(|stderr| {
        let program = command.program.clone();
        let limit = command.tail_limit;
        tokio::spawn(async move { collect_tail(stderr, &program, limit).await })
    });

    let stdout_task = child
        .stdout
        .take()
        .map(|stdout| tokio::spawn(async move { read_all(stdout).await }));

    let status = match tokio::time::timeout(command.timeout, child.wait()).await {
        Ok(waited) => waited.map_err(|source| ProcessError::Wait {
            program: command.program.clone(),
            source,
        })?,
        Err(_) => {
            warn!(
                "{} (pid {:?}) exceeded {:?}, terminating",
                command.program, pid, command.timeout
            );

            // kill() also waits, so the child is reaped before we return
            if let Err(e) = child.kill().await {
                warn!("Failed to terminate {}: {}", command.program, e);
            }

            if let Some(task) = stderr_task {
                task.abort();
            }
            if let Some(task) = stdout_task {
                task.abort();
            }

            return Err(ProcessError::TimedOut {
                program: command.program.clone(),
                after: command.timeout,
                pid,
            });
        }
    };

    let diagnostics = match stderr_task {
        Some(task) => task.await.unwrap_or_else(|e| {
            warn!("stderr reader for {} failed: {}", command.program, e);
            String::new()
        }),
        None => String::new(),
    };

    let stdout = match stdout_task {
        Some(task) => task.await.unwrap_or_else(|e| {
            warn!("stdout reader for {} failed: {}", command.program, e);
            String::new()
        }),
        None => String::new(),
    };

    let elapsed = started.elapsed();
    debug!(
        "{} exited with {} after {:?}",
        command.program, status, elapsed
    );

    Ok(ProcessOutput {
        status,
        stdout,
        diagnostics,
        elapsed,
    })
}

async fn collect_tail<R: AsyncRead + Unpin>(reader: R, program: &str, limit: usize) -> String {
    let mut tail = DiagnosticTail::new(limit);
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!("[{}] {}", program, line);
                tail.push(line);
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Stopped reading {} stderr: {}", program, e);
                break;
            }
        }
    }

    tail.into_string()
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut buf = Vec::new();
    if let Err(e) = reader.read_to_end(&mut buf).await {
        debug!("Stopped reading stdout: {}", e);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Rolling window over the last lines of a diagnostic stream
#[derive(Debug)]
pub struct DiagnosticTail {
    lines: VecDeque<String>,
    bytes: usize,
    limit: usize,
}

impl DiagnosticTail {
    pub fn new(limit: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            bytes: 0,
            limit,
        }
    }

    pub fn push(&mut self, line: String) {
        self.bytes += line.len() + 1;
        self.lines.push_back(line);

        while self.bytes > self.limit && self.lines.len() > 1 {
            if let Some(dropped) = self.lines.pop_front() {
                self.bytes -= dropped.len() + 1;
            }
        }
    }

    /// Joins the retained lines, cutting the oldest bytes if one line alone
    /// exceeds the limit
    pub fn into_string(self) -> String {
        let joined = Vec::from(self.lines).join("\n");
        truncate_tail(&joined, self.limit).to_string()
    }
}

/// Returns the last `limit` bytes of `text`, aligned to a char boundary
pub fn truncate_tail(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut start = text.len() - limit;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

/// Whether `pid` has exited, reaped or still a zombie
#[cfg(all(test, target_os = "linux"))]
pub(crate) fn terminated(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Err(_) => true,
        Ok(stat) => {
            stat.rsplit_once(')')
                .and_then(|(_, rest)| rest.split_whitespace().next())
                == Some("Z")
        }
    }
}
