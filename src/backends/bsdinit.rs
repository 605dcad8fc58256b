//! BSD rc.d backend.
//!
//! Scripts under `/etc/rc.d` are driven with the `one*` verbs so they run
//! whether or not `<name>_enable` is set in `rc.conf`. Enablement is read
//! and written with `sysrc`.

use crate::error::ServiceResult;
use crate::executor::CommandRunner;
use crate::reconcile::PrimitiveAction;

use super::traits::{
    argv, run_action, Backend, BackendDescriptor, Capabilities, RunState, ServiceTarget,
};

/// BSD init (rc.d) backend.
pub struct BsdInitBackend {
    descriptor: BackendDescriptor,
}

impl BsdInitBackend {
    pub fn new() -> Self {
        Self {
            descriptor: BackendDescriptor {
                id: "bsdinit",
                capabilities: Capabilities {
                    sleep: true,
                    pattern: true,
                    arguments: true,
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
        let verb = format!("one{}", action.as_str());
        run_action(
            runner,
            action,
            &script(target.name),
            argv(&[verb.as_str()], target),
        )?;
        Ok(())
    }
}

impl Default for BsdInitBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn script(name: &str) -> String {
    format!("/etc/rc.d/{}", name)
}

/// The rc.conf variable controlling start at boot.
fn rcvar(name: &str) -> String {
    format!("{}_enable", name.replace(['-', '.'], "_"))
}

impl Backend for BsdInitBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn status(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<RunState> {
        let result = runner.run(&script(target.name), &argv(&["onestatus"], target))?;
        Ok(RunState::from_lsb_exit(result.exit_code))
    }

    fn is_enabled(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<Option<bool>> {
        let result = runner.run("sysrc", &["-n".to_string(), rcvar(target.name)])?;
        // sysrc exits non-zero when the variable is unset, which means off.
        if !result.success {
            return Ok(Some(false));
        }
        Ok(match result.stdout.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" | "1" => Some(true),
            "no" | "false" | "off" | "0" => Some(false),
            _ => None,
        })
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
        let (action, value) = if enabled {
            (PrimitiveAction::Enable, "YES")
        } else {
            (PrimitiveAction::Disable, "NO")
        };
        run_action(
            runner,
            action,
            "sysrc",
            vec![format!("{}={}", rcvar(target.name), value)],
        )?;
        Ok(())
    }
}
