//! OpenRC backend.
//!
//! Controls services with `rc-service` and manages runlevel membership with
//! `rc-update`. The only backend that honours a runlevel.

use crate::error::ServiceResult;
use crate::executor::CommandRunner;
use crate::reconcile::PrimitiveAction;

use super::traits::{
    argv, run_action, Backend, BackendDescriptor, Capabilities, RunState, ServiceTarget,
};

/// Runlevel used when the caller does not name one.
pub const DEFAULT_RUNLEVEL: &str = "default";

/// OpenRC service manager.
pub struct OpenRcBackend {
    descriptor: BackendDescriptor,
}

impl OpenRcBackend {
    pub fn new() -> Self {
        Self {
            descriptor: BackendDescriptor {
                id: "openrc",
                capabilities: Capabilities {
                    sleep: true,
                    pattern: true,
                    runlevel: true,
                    arguments: true,
                    native_restart: true,
                    enable: true,
                    status_query: false,
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
            "rc-service",
            argv(&[target.name, action.as_str()], target),
        )?;
        Ok(())
    }
}

impl Default for OpenRcBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `rc-update show <runlevel>` output lists `name`.
///
/// Lines look like `                 sshd | default`.
fn runlevel_lists(output: &str, name: &str) -> bool {
    output
        .lines()
        .filter_map(|line| line.split('|').next())
        .any(|service| service.trim() == name)
}

impl Backend for OpenRcBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn status(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<RunState> {
        let result = runner.run("rc-service", &argv(&[target.name, "status"], target))?;
        Ok(RunState::from_lsb_exit(result.exit_code))
    }

    fn is_enabled(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<Option<bool>> {
        let runlevel = target.runlevel.unwrap_or(DEFAULT_RUNLEVEL);
        let result = runner.run("rc-update", &["show".to_string(), runlevel.to_string()])?;
        if !result.success {
            return Ok(None);
        }
        Ok(Some(runlevel_lists(&result.stdout, target.name)))
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

    fn set_enabled(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
        enabled: bool,
    ) -> ServiceResult<()> {
        let (action, verb) = if enabled {
            (PrimitiveAction::Enable, "add")
        } else {
            (PrimitiveAction::Disable, "del")
        };
        let runlevel = target.runlevel.unwrap_or(DEFAULT_RUNLEVEL);
        run_action(
            runner,
            action,
            "rc-update",
            vec![verb.to_string(), target.name.to_string(), runlevel.to_string()],
        )?;
        Ok(())
    }
}
