//! SysV init backend.
//!
//! Invokes `/etc/init.d/<name>` scripts directly. Status follows LSB exit
//! codes, which many scripts implement poorly, so pattern matching stays
//! available. Boot enablement is read from the `rc?.d` start links and
//! changed with `update-rc.d` or `chkconfig`, whichever the host has.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ServiceResult;
use crate::executor::CommandRunner;
use crate::reconcile::PrimitiveAction;

use super::traits::{
    argv, run_action, Backend, BackendDescriptor, Capabilities, RunState, ServiceTarget,
};

/// Multi-user runlevels checked for start links.
const MULTI_USER_RUNLEVELS: &[char] = &['2', '3', '4', '5'];

/// SysV init script backend.
pub struct SysvInitBackend {
    descriptor: BackendDescriptor,
    root: PathBuf,
}

impl SysvInitBackend {
    /// Create a backend that inspects the filesystem under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            descriptor: BackendDescriptor {
                id: "sysvinit",
                capabilities: Capabilities {
                    sleep: true,
                    pattern: true,
                    arguments: true,
                    native_restart: true,
                    enable: true,
                    ..Capabilities::default()
                },
            },
            root: root.into(),
        }
    }

    fn script(&self, name: &str) -> String {
        format!("/etc/init.d/{}", name)
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
            &self.script(target.name),
            argv(&[action.as_str()], target),
        )?;
        Ok(())
    }

    fn has_start_link(&self, name: &str) -> bool {
        MULTI_USER_RUNLEVELS.iter().any(|level| {
            let dir = self.root.join(format!("etc/rc{}.d", level));
            start_link_in(&dir, name)
        })
    }
}

/// Whether `dir` holds an `S<nn><name>` link.
fn start_link_in(dir: &Path, name: &str) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };

    entries.flatten().any(|entry| {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        file_name
            .strip_prefix('S')
            .map(|rest| rest.trim_start_matches(|c: char| c.is_ascii_digit()))
            .is_some_and(|rest| rest == name)
    })
}

impl Backend for SysvInitBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn status(
        &self,
        runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<RunState> {
        let result = runner.run(&self.script(target.name), &argv(&["status"], target))?;
        Ok(RunState::from_lsb_exit(result.exit_code))
    }

    fn is_enabled(
        &self,
        _runner: &dyn CommandRunner,
        target: &ServiceTarget<'_>,
    ) -> ServiceResult<Option<bool>> {
        let enabled = self.has_start_link(target.name);
        debug!(service = %target.name, enabled, "Checked rc.d start links");
        Ok(Some(enabled))
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

        if self.root.join("usr/sbin/update-rc.d").exists() {
            let verb = if enabled { "defaults" } else { "disable" };
            run_action(
                runner,
                action,
                "update-rc.d",
                vec![target.name.to_string(), verb.to_string()],
            )?;
        } else {
            let verb = if enabled { "on" } else { "off" };
            run_action(
                runner,
                action,
                "chkconfig",
                vec![target.name.to_string(), verb.to_string()],
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ScriptedRunner;
    use tempfile::TempDir;

    #[test]
    fn test_status_uses_lsb_codes() {
        let backend = SysvInitBackend::new("/");
        let target = ServiceTarget::named("ntp");

        let runner = ScriptedRunner::new().on("/etc/init.d/ntp status", 3, "");
        assert_eq!(backend.status(&runner, &target).unwrap(), RunState::Stopped);

        let runner = ScriptedRunner::new().on("/etc/init.d/ntp status", 4, "");
        assert_eq!(
            backend.status(&runner, &target).unwrap(),
            RunState::Indeterminate
        );
    }

    #[test]
    fn test_arguments_passed_through() {
        let backend = SysvInitBackend::new("/");
        let runner = ScriptedRunner::new();
        let target = ServiceTarget {
            name: "network",
            arguments: Some("eth0"),
            runlevel: None,
        };

        backend.restart(&runner, &target).unwrap();
        assert_eq!(runner.calls(), vec!["/etc/init.d/network restart eth0"]);
    }

    #[test]
    fn test_enabled_from_start_links() {
        let root = TempDir::new().unwrap();
        let rc3 = root.path().join("etc/rc3.d");
        fs::create_dir_all(&rc3).unwrap();
        fs::write(rc3.join("S20ntp"), "").unwrap();
        fs::write(rc3.join("K01ntpdate"), "").unwrap();

        let backend = SysvInitBackend::new(root.path());
        let runner = ScriptedRunner::new();

        assert_eq!(
            backend
                .is_enabled(&runner, &ServiceTarget::named("ntp"))
                .unwrap(),
            Some(true)
        );
        assert_eq!(
            backend
                .is_enabled(&runner, &ServiceTarget::named("ntpdate"))
                .unwrap(),
            Some(false)
        );
    }

    #[test]
    fn test_enable_tool_selection() {
        let root = TempDir::new().unwrap();
        let backend = SysvInitBackend::new(root.path());
        let runner = ScriptedRunner::new();
        let target = ServiceTarget::named("ntp");

        backend.set_enabled(&runner, &target, true).unwrap();
        assert_eq!(runner.calls(), vec!["chkconfig ntp on"]);

        fs::create_dir_all(root.path().join("usr/sbin")).unwrap();
        fs::write(root.path().join("usr/sbin/update-rc.d"), "").unwrap();
        runner.clear_calls();

        backend.set_enabled(&runner, &target, false).unwrap();
        assert_eq!(runner.calls(), vec!["update-rc.d ntp disable"]);
    }
}
