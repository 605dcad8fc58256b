//! Solaris SMF backend.
//!
//! Uses `svcs` for state and `svcadm` for control. Start and stop are
//! temporary (`-t`) so they never touch the persistent enabled property;
//! only enable/disable do.

use crate::error::ServiceResult;
use crate::executor::CommandRunner;
use crate::reconcile::PrimitiveAction;

use super::traits::{run_action, Backend, BackendDescriptor, Capabilities, RunState, ServiceTarget};

/// Solaris Service Management Facility.
pub struct SmfBackend {
    descriptor: BackendDescriptor,
}

impl SmfBackend {
    pub fn new() -> Self {
        Self {
            descriptor: BackendDescriptor {
                id: "smf",
                capabilities: Capabilities {
                    status_query: true,
                    native_restart: true,
                    enable: true,
                    ..Capabilities::default()
                },
            },
        }
    }

    fn svcadm(
        &self,
        runner: &dyn CommandRunner,
        action: PrimitiveAction,
        args: &[&str],
    ) -> ServiceResult<()> {
        run_action(
            runner,
            action,
            "svcadm",
            args.iter().map(|s| s.to_string()).collect(),
        )?;
        Ok(())
    }
}

impl Default for SmfBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_svc_state(output: &str) -> RunState {
    match output.trim() {
        "online" | "degraded" => RunState::Running,
        "offline" | "disabled" | "maintenance" | "uninitialized" => RunState::Stopped,
        _ => RunState::Indeterminate,
    }
}

impl Backend for SmfBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn status(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<RunState> {
        let args = ["-H", "-o", "state", target.name].map(str::to_string);
        let result = runner.run("svcs", &args)?;
        if !result.success {
            return Ok(RunState::Indeterminate);
        }
        Ok(parse_svc_state(&result.stdout))
    }

    fn is_enabled(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<Option<bool>> {
        let args = ["-p", "general/enabled", target.name].map(str::to_string);
        let result = runner.run("svcprop", &args)?;
        Ok(match result.stdout.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    }

    fn start(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.svcadm(runner, PrimitiveAction::Start, &["enable", "-rst", target.name])
    }

    fn stop(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.svcadm(runner, PrimitiveAction::Stop, &["disable", "-st", target.name])
    }

    fn restart(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.svcadm(runner, PrimitiveAction::Restart, &["restart", target.name])
    }

    fn reload(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.svcadm(runner, PrimitiveAction::Reload, &["refresh", target.name])
    }

    fn set_enabled(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
        enabled: bool,
    ) -> ServiceResult<()> {
        if enabled {
            self.svcadm(runner, PrimitiveAction::Enable, &["enable", target.name])
        } else {
            self.svcadm(runner, PrimitiveAction::Disable, &["disable", target.name])
        }
    }
}
