//! Generic `service` backend.
//!
//! Fallback used when the init system cannot be detected or has no
//! dedicated backend. It only assumes a `service <name> <verb>` wrapper
//! exists, so restarts are done as stop + start and boot enablement is
//! unsupported.

use crate::error::ServiceResult;
use crate::executor::CommandRunner;
use crate::reconcile::PrimitiveAction;

use super::traits::{
    argv, run_action, Backend, BackendDescriptor, Capabilities, RunState, ServiceTarget,
};

/// Identifier of the fallback backend.
pub const LEGACY_BACKEND_ID: &str = "service";

/// The generic `service` command backend.
pub struct LegacyServiceBackend {
    descriptor: BackendDescriptor,
}

impl LegacyServiceBackend {
    pub fn new() -> Self {
        Self {
            descriptor: BackendDescriptor {
                id: LEGACY_BACKEND_ID,
                capabilities: Capabilities {
                    sleep: true,
                    pattern: true,
                    arguments: true,
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
            "service",
            argv(&[target.name, action.as_str()], target),
        )?;
        Ok(())
    }
}

impl Default for LegacyServiceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for LegacyServiceBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn status(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<RunState> {
        let result = runner.run("service", &argv(&[target.name, "status"], target))?;
        Ok(RunState::from_lsb_exit(result.exit_code))
    }

    fn start(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.control(runner, PrimitiveAction::Start, target)
    }

    fn stop(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.control(runner, PrimitiveAction::Stop, target)
    }

    fn reload(&self, runner: &dyn CommandRunner, target: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.control(runner, PrimitiveAction::Reload, target)
    }
}
