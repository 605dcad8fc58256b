//! Backend capability interface.
//!
//! Every init-system backend implements [`Backend`] and advertises what it
//! can honour through a [`Capabilities`] record. The reconciliation engine
//! branches only on those flags, never on which backend it is talking to.

use serde::Serialize;

use crate::error::{ServiceError, ServiceResult};
use crate::executor::{sanitize_output, CommandRunner, SubprocessResult};
use crate::reconcile::PrimitiveAction;

/// Optional features a backend may honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    /// Honours a delay between stop and start during a restart.
    pub sleep: bool,
    /// Accepts process-list pattern matching as a status fallback.
    pub pattern: bool,
    /// Scopes enablement to a named runlevel (OpenRC-class).
    pub runlevel: bool,
    /// Passes extra arguments through to the service invocation.
    pub arguments: bool,
    /// Reports running state reliably on its own (systemd-class).
    pub status_query: bool,
    /// Has a single restart command.
    pub native_restart: bool,
    /// Can toggle start-at-boot.
    pub enable: bool,
}

/// Identifies a backend and what it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendDescriptor {
    /// Init-system identifier (e.g. "systemd", "openrc").
    pub id: &'static str,
    /// Capability set.
    pub capabilities: Capabilities,
}

/// Running state as reported by a backend's native status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopped,
    /// The query ran but its answer cannot be trusted (e.g. an init script
    /// without a status action).
    Indeterminate,
}

impl RunState {
    /// Interpret an LSB init-script status exit code.
    ///
    /// 0 means running, 1-3 mean not running (dead with pid file, dead with
    /// lock file, stopped). Anything else, including 4 ("unknown"), is
    /// indeterminate.
    pub fn from_lsb_exit(code: Option<i32>) -> Self {
        match code {
            Some(0) => RunState::Running,
            Some(1..=3) => RunState::Stopped,
            _ => RunState::Indeterminate,
        }
    }
}

/// What a backend is asked to act on.
///
/// Built from the capability-gated spec, so options the backend does not
/// honour are already `None` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTarget<'a> {
    /// Service name.
    pub name: &'a str,
    /// Extra arguments for the service invocation.
    pub arguments: Option<&'a str>,
    /// Runlevel for enablement.
    pub runlevel: Option<&'a str>,
}

impl<'a> ServiceTarget<'a> {
    /// A target with no extra options.
    pub fn named(name: &'a str) -> Self {
        Self {
            name,
            arguments: None,
            runlevel: None,
        }
    }

    /// Extra arguments split into argv elements.
    pub fn extra_args(&self) -> Vec<String> {
        self.arguments
            .map(|a| a.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Contract every init-system backend satisfies.
///
/// Action methods return [`ServiceError::ActionFailed`] when the underlying
/// command fails. Status and enablement queries return
/// [`ServiceError::StatusUnsupported`] / [`ServiceError::EnableUnsupported`]
/// when the backend cannot answer at all.
pub trait Backend: Send + Sync {
    /// Backend identity and capabilities.
    fn descriptor(&self) -> &BackendDescriptor;

    /// Backend identifier.
    fn id(&self) -> &'static str {
        self.descriptor().id
    }

    /// Capability set.
    fn capabilities(&self) -> Capabilities {
        self.descriptor().capabilities
    }

    /// Query whether the service is running.
    fn status(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>)
        -> ServiceResult<RunState>;

    /// Query whether the service starts at boot. `None` means the backend
    /// answered but the answer is not a clear yes or no.
    fn is_enabled(
        &self,
        _runner: &dyn CommandRunner,
        _target: &ServiceTarget<'_>,
    ) -> ServiceResult<Option<bool>> {
        Err(ServiceError::EnableUnsupported {
            backend: self.id().to_string(),
        })
    }

    /// Start the service.
    fn start(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()>;

    /// Stop the service.
    fn stop(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()>;

    /// Restart the service in one step.
    ///
    /// Only called when `capabilities().native_restart` is set; the default
    /// stops then starts.
    fn restart(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.stop(runner, target)?;
        self.start(runner, target)
    }

    /// Reload the service configuration.
    fn reload(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()>;

    /// Enable or disable start at boot.
    fn set_enabled(
        &self,
        _runner: &dyn CommandRunner,
        _target: &ServiceTarget<'_>,
        _enabled: bool,
    ) -> ServiceResult<()> {
        Err(ServiceError::EnableUnsupported {
            backend: self.id().to_string(),
        })
    }
}

/// Run a command that carries out `action`, mapping any failure to
/// [`ServiceError::ActionFailed`].
pub(crate) fn run_action(
    runner: &dyn CommandRunner,
    action: PrimitiveAction,
    program: &str,
    args: Vec<String>,
) -> ServiceResult<SubprocessResult> {
    let result = runner
        .run(program, &args)
        .map_err(|e| ServiceError::ActionFailed {
            action,
            message: e.to_string(),
        })?;

    if !result.success {
        let code = result
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let detail = sanitize_output(result.diagnostic(), 10);
        let message = if detail.is_empty() {
            format!("{} exited with {}", program, code)
        } else {
            format!("{} exited with {}: {}", program, code, detail)
        };
        return Err(ServiceError::ActionFailed { action, message });
    }

    Ok(result)
}

/// Build an argv from fixed leading arguments plus the target's extras.
pub(crate) fn argv(leading: &[&str], target: &ServiceTarget<'_>) -> Vec<String> {
    let mut args: Vec<String> = leading.iter().map(|s| s.to_string()).collect();
    args.extend(target.extra_args());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ScriptedRunner;

    #[test]
    fn test_lsb_exit_codes() {
        assert_eq!(RunState::from_lsb_exit(Some(0)), RunState::Running);
        assert_eq!(RunState::from_lsb_exit(Some(1)), RunState::Stopped);
        assert_eq!(RunState::from_lsb_exit(Some(3)), RunState::Stopped);
        assert_eq!(RunState::from_lsb_exit(Some(4)), RunState::Indeterminate);
        assert_eq!(RunState::from_lsb_exit(Some(127)), RunState::Indeterminate);
        assert_eq!(RunState::from_lsb_exit(None), RunState::Indeterminate);
    }

    #[test]
    fn test_extra_args_split() {
        let target = ServiceTarget {
            name: "network",
            arguments: Some("eth0  --verbose"),
            runlevel: None,
        };
        assert_eq!(target.extra_args(), vec!["eth0", "--verbose"]);
        assert!(ServiceTarget::named("network").extra_args().is_empty());
    }

    #[test]
    fn test_run_action_failure_names_action() {
        let runner = ScriptedRunner::new().on("service nginx start", 1, "port in use");
        let err = run_action(
            &runner,
            PrimitiveAction::Start,
            "service",
            vec!["nginx".to_string(), "start".to_string()],
        )
        .unwrap_err();

        match err {
            ServiceError::ActionFailed { action, message } => {
                assert_eq!(action, PrimitiveAction::Start);
                assert!(message.contains("exited with 1"));
                assert!(message.contains("port in use"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_action_spawn_failure() {
        let runner = ScriptedRunner::new().missing("service");
        let err = run_action(&runner, PrimitiveAction::Stop, "service", vec![]).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::ActionFailed {
                action: PrimitiveAction::Stop,
                ..
            }
        ));
    }
}
