//! Safe subprocess execution.
//!
//! Runs init-system tools with:
//! - No shell interpretation (direct exec)
//! - A poll-based timeout that kills the child
//! - Captured stdout/stderr, drained on reader threads so a chatty child
//!   never blocks on a full pipe
//! - A fixed `C` locale so tool output can be parsed

use std::collections::HashMap;
use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{CommandErrorKind, ServiceError};

/// Result of a subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubprocessResult {
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
    /// The exit code, if available.
    pub exit_code: Option<i32>,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl SubprocessResult {
    /// Build a result from its parts.
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            success: exit_code == 0,
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    fn from_parts(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            success: status.success(),
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(stdout).to_string(),
            stderr: String::from_utf8_lossy(stderr).to_string(),
        }
    }

    /// Stderr if present, stdout otherwise.
    ///
    /// Init scripts are inconsistent about which stream carries the reason
    /// for a failure.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Builder for subprocess execution.
pub struct SubprocessBuilder {
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    timeout: Duration,
}

impl SubprocessBuilder {
    /// Create a new subprocess builder.
    pub fn new(program: &str) -> Self {
        let mut env = HashMap::new();
        env.insert("LC_ALL".to_string(), "C".to_string());

        Self {
            program: program.to_string(),
            args: Vec::new(),
            env,
            timeout: Duration::from_secs(60),
        }
    }

    /// Add arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the timeout for the command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute the command and wait for completion with timeout enforcement.
    ///
    /// A non-zero exit is not an error here; callers decide what an exit
    /// code means. Only spawn failures and timeouts are errors.
    pub fn run(self) -> Result<SubprocessResult, ServiceError> {
        debug!(
            program = %self.program,
            args = ?self.args,
            timeout_secs = self.timeout.as_secs(),
            "Executing subprocess"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| ServiceError::Command {
            kind: CommandErrorKind::SpawnFailed {
                program: self.program.clone(),
                message: e.to_string(),
            },
        })?;

        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let start = Instant::now();
        let poll_interval = Duration::from_millis(50);

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let stdout = join_reader(stdout_reader, &self.program)?;
                    let stderr = join_reader(stderr_reader, &self.program)?;
                    let result = SubprocessResult::from_parts(status, &stdout, &stderr);
                    debug!(
                        success = result.success,
                        exit_code = ?result.exit_code,
                        stdout_bytes = stdout.len(),
                        duration_ms = start.elapsed().as_millis(),
                        "Subprocess completed"
                    );
                    return Ok(result);
                }
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        warn!(
                            program = %self.program,
                            timeout_secs = self.timeout.as_secs(),
                            "Process timed out, killing"
                        );
                        if let Err(e) = child.kill() {
                            warn!(error = %e, "Failed to kill timed-out process");
                        }
                        // Reap the zombie. The readers are left detached: a
                        // grandchild may still hold the pipes open.
                        let _ = child.wait();
                        return Err(ServiceError::Command {
                            kind: CommandErrorKind::Timeout {
                                timeout_secs: self.timeout.as_secs(),
                            },
                        });
                    }
                    thread::sleep(poll_interval);
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ServiceError::Command {
                        kind: CommandErrorKind::ExecutionFailed {
                            message: format!("Failed to check process status: {}", e),
                        },
                    });
                }
            }
        }
    }
}

/// Read a pipe to EOF on its own thread.
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_reader(
    reader: Option<JoinHandle<io::Result<Vec<u8>>>>,
    program: &str,
) -> Result<Vec<u8>, ServiceError> {
    let Some(handle) = reader else {
        return Ok(Vec::new());
    };
    let read_failed = |message: String| ServiceError::Command {
        kind: CommandErrorKind::ExecutionFailed {
            message: format!("Failed to get output from {}: {}", program, message),
        },
    };
    match handle.join() {
        Ok(Ok(buf)) => Ok(buf),
        Ok(Err(e)) => Err(read_failed(e.to_string())),
        Err(_) => Err(read_failed("output reader panicked".to_string())),
    }
}

/// Run a command with the given arguments and timeout.
pub fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<SubprocessResult, ServiceError> {
    SubprocessBuilder::new(program)
        .args(args.iter().copied())
        .timeout(timeout)
        .run()
}
