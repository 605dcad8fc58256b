//! Process invocation primitive.
//!
//! Backends and the process-list scanner never spawn processes directly;
//! they go through a [`CommandRunner`] so each reconciliation can use its own
//! channel and tests can substitute a scripted one.

use std::sync::Mutex;
use std::time::Duration;

use crate::error::{CommandErrorKind, ServiceError};

use super::subprocess::{SubprocessBuilder, SubprocessResult};

/// Runs a command and returns its exit code and captured output.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`.
    ///
    /// A non-zero exit is reported through the result, not as an error.
    fn run(&self, program: &str, args: &[String]) -> Result<SubprocessResult, ServiceError>;
}

/// Runs commands on the local host.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    /// Create a runner that kills commands running longer than `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<SubprocessResult, ServiceError> {
        SubprocessBuilder::new(program)
            .args(args)
            .timeout(self.timeout)
            .run()
    }
}

/// Canned reply for a [`ScriptedRunner`] rule.
#[derive(Debug, Clone)]
enum Reply {
    Output(SubprocessResult),
    SpawnFailure,
}

/// A runner that answers from a script and records every invocation.
///
/// Rules match on the space-joined command line, either exactly or as a
/// prefix followed by further arguments. The most recently added matching
/// rule wins, so a test can change the host's behaviour between calls.
/// Unmatched commands succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<(String, Reply)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule (builder form).
    pub fn on(self, command_line: &str, exit_code: i32, stdout: &str) -> Self {
        self.respond(command_line, exit_code, stdout);
        self
    }

    /// Add a rule that makes the command fail to spawn (builder form).
    pub fn missing(self, command_line: &str) -> Self {
        self.push_rule(command_line, Reply::SpawnFailure);
        self
    }

    /// Add a rule after construction.
    pub fn respond(&self, command_line: &str, exit_code: i32, stdout: &str) {
        let stderr = if exit_code == 0 { "" } else { stdout };
        self.push_rule(
            command_line,
            Reply::Output(SubprocessResult::new(exit_code, stdout, stderr)),
        );
    }

    fn push_rule(&self, command_line: &str, reply: Reply) {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push((command_line.to_string(), reply));
        }
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Forget recorded calls, keeping the rules.
    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<SubprocessResult, ServiceError> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        let rules = self.rules.lock().map_err(|e| ServiceError::Command {
            kind: CommandErrorKind::ExecutionFailed {
                message: format!("Failed to acquire script lock: {}", e),
            },
        })?;

        let reply = rules.iter().rev().find_map(|(pattern, reply)| {
            let matches = line == *pattern
                || line
                    .strip_prefix(pattern.as_str())
                    .is_some_and(|rest| rest.starts_with(' '));
            matches.then(|| reply.clone())
        });

        match reply {
            Some(Reply::Output(result)) => Ok(result),
            Some(Reply::SpawnFailure) => Err(ServiceError::Command {
                kind: CommandErrorKind::SpawnFailed {
                    program: program.to_string(),
                    message: "No such file or directory".to_string(),
                },
            }),
            None => Ok(SubprocessResult::new(0, "", "")),
        }
    }
}
