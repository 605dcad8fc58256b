//! Upstart backend.
//!
//! Jobs are controlled with `initctl`. Upstart has no command for toggling
//! start-on-boot (that lives in job override files), so enablement is
//! reported as unsupported.

use crate::error::ServiceResult;
use crate::executor::CommandRunner;
use crate::reconcile::PrimitiveAction;

use super::traits::{
    argv, run_action, Backend, BackendDescriptor, Capabilities, RunState, ServiceTarget,
};

/// Upstart job manager.
pub struct UpstartBackend {
    descriptor: BackendDescriptor,
}

impl UpstartBackend {
    pub fn new() -> Self {
        Self {
            descriptor: BackendDescriptor {
                id: "upstart",
                capabilities: Capabilities {
                    sleep: true,
                    pattern: true,
                    arguments: true,
                    native_restart: true,
                    ..Capabilities::default()
                },
            },
        }
    }

    fn control(
        &self,
        runner: &dyn CommandRunner,
        action: PrimitiveAction,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<()> {
        run_action(
            runner,
            action,
            "initctl",
            argv(&[action.as_str(), target.name], target),
        )?;
        Ok(())
    }
}

impl Default for UpstartBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `initctl status` output such as `ssh start/running, process 812`.
fn parse_job_status(output: &str) -> RunState {
    let Some(goal_state) = output
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
    else {
        return RunState::Indeterminate;
    };

    let goal_state = goal_state.trim_end_matches(',');
    if goal_state.starts_with("start/") {
        RunState::Running
    } else if goal_state.starts_with("stop/") {
        RunState::Stopped
    } else {
        RunState::Indeterminate
    }
}

impl Backend for UpstartBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn status(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<RunState> {
        let result = runner.run("initctl", &["status".to_string(), target.name.to_string()])?;
        if !result.success {
            return Ok(RunState::Indeterminate);
        }
        Ok(parse_job_status(&result.stdout))
    }

    fn start(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.control(runner, PrimitiveAction::Start, target)
    }

    fn stop(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.control(runner, PrimitiveAction::Stop, target)
    }

    fn restart(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.control(runner, PrimitiveAction::Restart, target)
    }

    fn reload(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.control(runner, PrimitiveAction::Reload, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::executor::ScriptedRunner;

    #[test]
    fn test_parse_job_status() {
        assert_eq!(
            parse_job_status("ssh start/running, process 812\n"),
            RunState::Running
        );
        assert_eq!(parse_job_status("ssh stop/waiting\n"), RunState::Stopped);
        assert_eq!(parse_job_status(""), RunState::Indeterminate);
    }

    #[test]
    fn test_unknown_job_is_indeterminate() {
        let backend = UpstartBackend::new();
        let runner = ScriptedRunner::new().on("initctl status nope", 1, "initctl: Unknown job: nope");
        assert_eq!(
            backend
                .status(&runner, &ServiceTarget::named("nope"))
                .unwrap(),
            RunState::Indeterminate
        );
    }

    #[test]
    fn test_enablement_unsupported() {
        let backend = UpstartBackend::new();
        let runner = ScriptedRunner::new();
        let target = ServiceTarget::named("ssh");

        assert!(matches!(
            backend.is_enabled(&runner, &target),
            Err(ServiceError::EnableUnsupported { .. })
        ));
        assert!(matches!(
            backend.set_enabled(&runner, &target, true),
            Err(ServiceError::EnableUnsupported { .. })
        ));
        assert!(runner.calls().is_empty());
    }
}
