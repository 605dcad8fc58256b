//! systemd backend.
//!
//! Drives units through `systemctl`. Status is authoritative, so pattern
//! matching is never needed; unit invocations take no extra arguments.

use tracing::debug;

use crate::error::ServiceResult;
use crate::executor::CommandRunner;
use crate::reconcile::PrimitiveAction;

use super::traits::{run_action, Backend, BackendDescriptor, Capabilities, RunState, ServiceTarget};

const SYSTEMCTL: &str = "systemctl";

/// systemd service manager.
pub struct SystemdBackend {
    descriptor: BackendDescriptor,
}

impl SystemdBackend {
    pub fn new() -> Self {
        Self {
            descriptor: BackendDescriptor {
                id: "systemd",
                capabilities: Capabilities {
                    status_query: true,
                    native_restart: true,
                    enable: true,
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
            SYSTEMCTL,
            vec![action.as_str().to_string(), target.name.to_string()],
        )?;
        Ok(())
    }
}

impl Default for SystemdBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Map `systemctl is-active` output to a run state.
fn parse_active_state(output: &str) -> RunState {
    match output.trim() {
        "active" | "reloading" | "activating" | "refreshing" => RunState::Running,
        "inactive" | "failed" | "deactivating" | "dead" => RunState::Stopped,
        _ => RunState::Indeterminate,
    }
}

/// Map `systemctl is-enabled` output to an enablement answer.
fn parse_enabled_state(output: &str) -> Option<bool> {
    match output.trim() {
        "enabled" | "enabled-runtime" | "alias" | "static" | "indirect" | "generated"
        | "transient" => Some(true),
        "disabled" | "masked" | "masked-runtime" | "linked" | "linked-runtime" => Some(false),
        _ => None,
    }
}

impl Backend for SystemdBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn status(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<RunState> {
        // is-active exits non-zero for anything but "active"; the text is
        // what matters.
        let result = runner.run(
            SYSTEMCTL,
            &["is-active".to_string(), target.name.to_string()],
        )?;
        let state = parse_active_state(&result.stdout);
        debug!(service = %target.name, output = %result.stdout.trim(), ?state, "systemctl is-active");
        Ok(state)
    }

    fn is_enabled(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<Option<bool>> {
        let result = runner.run(
            SYSTEMCTL,
            &["is-enabled".to_string(), target.name.to_string()],
        )?;
        Ok(parse_enabled_state(&result.stdout))
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
        let action = if enabled {
            PrimitiveAction::Enable
        } else {
            PrimitiveAction::Disable
        };
        self.control(runner, action, target)
    }
}
