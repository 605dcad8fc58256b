//! Status resolution.
//!
//! Reads the current state of a service: the backend's own status query
//! first, then a process-list scan when the backend cannot answer and a
//! pattern was given.

use serde::Serialize;
use tracing::{debug, warn};

use crate::backends::{Backend, RunState, ServiceTarget};
use crate::error::{CommandErrorKind, ServiceError, ServiceResult};
use crate::executor::{sanitize_output, CommandRunner};

use super::plan::PrimitiveAction;

/// Where the running state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusSource {
    BackendReported,
    PatternMatched,
    Unknown,
}

/// A snapshot of a service's state.
///
/// `None` means the state could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub running: Option<bool>,
    pub enabled: Option<bool>,
    pub source: StatusSource,
}

impl ServiceStatus {
    /// Nothing known.
    pub fn unknown() -> Self {
        Self {
            running: None,
            enabled: None,
            source: StatusSource::Unknown,
        }
    }

    /// The state expected once `actions` have completed.
    ///
    /// Returns a new snapshot; `self` is left as it was read.
    pub fn after(&self, actions: &[PrimitiveAction]) -> Self {
        let mut next = *self;
        for action in actions {
            match action {
                PrimitiveAction::Start | PrimitiveAction::Restart | PrimitiveAction::Reload => {
                    next.running = Some(true)
                }
                PrimitiveAction::Stop => next.running = Some(false),
                PrimitiveAction::Enable => next.enabled = Some(true),
                PrimitiveAction::Disable => next.enabled = Some(false),
            }
        }
        next
    }
}

/// Scans the process list for a substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessScanner {
    program: String,
    args: Vec<String>,
}

impl ProcessScanner {
    /// Scan with `program args...`; the first output line is a header.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Whether any process line other than the scan itself contains
    /// `pattern`.
    pub fn matches(&self, runner: &dyn CommandRunner, pattern: &str) -> ServiceResult<bool> {
        let result = runner.run(&self.program, &self.args)?;
        if !result.success {
            return Err(ServiceError::Command {
                kind: CommandErrorKind::ExecutionFailed {
                    message: format!(
                        "{} failed: {}",
                        self.program,
                        sanitize_output(result.diagnostic(), 5)
                    ),
                },
            });
        }

        let own = self.command_line();
        Ok(result
            .stdout
            .lines()
            .skip(1)
            .filter(|line| !line.contains(&own))
            .any(|line| line.contains(pattern)))
    }

    /// The scan command as it shows up in its own output.
    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for ProcessScanner {
    fn default() -> Self {
        Self::new("ps", vec!["auxww".to_string()])
    }
}

/// Result of a status read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: ServiceStatus,
    /// False when the backend answered the enablement query with
    /// `EnableUnsupported`.
    pub enable_supported: bool,
}

/// Inputs to [`resolve_status`].
pub struct StatusQuery<'a> {
    pub target: ServiceTarget<'a>,
    /// Already capability-gated: `Some` only if the backend accepts patterns
    /// and lacks reliable native status.
    pub pattern: Option<&'a str>,
    /// Whether to ask the backend about enablement at all.
    pub include_enabled: bool,
}

/// Determine the current running and enabled state.
///
/// Soft failures (an indeterminate answer or `StatusUnsupported`) fall back
/// to the pattern scan, or to an unknown running state without one. Hard
/// faults from the status query (the tool could not be run) are returned.
pub fn resolve_status(
    backend: &dyn Backend,
    runner: &dyn CommandRunner,
    scanner: &ProcessScanner,
    query: &StatusQuery<'_>,
) -> ServiceResult<Resolution> {
    let native = match backend.status(runner, &query.target) {
        Ok(RunState::Running) => Some(true),
        Ok(RunState::Stopped) => Some(false),
        Ok(RunState::Indeterminate) => None,
        Err(ServiceError::StatusUnsupported { .. }) => None,
        Err(e) => return Err(e),
    };

    let (running, source) = match (native, query.pattern) {
        (Some(running), _) => (Some(running), StatusSource::BackendReported),
        (None, Some(pattern)) => match scanner.matches(runner, pattern) {
            Ok(found) => {
                debug!(
                    service = %query.target.name,
                    pattern,
                    found,
                    "Resolved status from process list"
                );
                (Some(found), StatusSource::PatternMatched)
            }
            Err(e) => {
                warn!(
                    service = %query.target.name,
                    error = %e,
                    "Process list scan failed, running state unknown"
                );
                (None, StatusSource::Unknown)
            }
        },
        (None, None) => (None, StatusSource::Unknown),
    };

    let (enabled, enable_supported) = if query.include_enabled {
        match backend.is_enabled(runner, &query.target) {
            Ok(enabled) => (enabled, true),
            Err(ServiceError::EnableUnsupported { .. }) => (None, false),
            Err(e) => return Err(e),
        }
    } else {
        (None, true)
    };

    Ok(Resolution {
        status: ServiceStatus {
            running,
            enabled,
            source,
        },
        enable_supported,
    })
}
