//! Integration tests for service reconciliation.
//!
//! These drive the public `Reconciler` with a scripted command runner, the
//! built-in backends, and an in-memory backend, and check the observable
//! outcome plus every command that would have reached the host.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use servicectl::backends::{
    Backend, BackendDescriptor, BackendRegistry, Capabilities, RunState, ServiceTarget,
};
use servicectl::error::{ServiceError, ServiceResult};
use servicectl::executor::{CommandRunner, ScriptedRunner};
use servicectl::facts::StaticFacts;
use servicectl::reconcile::{DesiredState, PrimitiveAction, Reconciler, ServiceSpec, StatusSource};

const PS_OUTPUT: &str = "USER PID COMMAND\n\
                         root 1 /sbin/init\n\
                         daemon 4242 /usr/sbin/memcached -d\n";

fn no_pause(_: Duration) {}

fn builtin(runner: &Arc<ScriptedRunner>, detected: Option<&str>) -> Reconciler {
    Reconciler::new(
        Arc::new(BackendRegistry::new()),
        Arc::new(StaticFacts::new(detected)),
        runner.clone(),
    )
    .with_pause(no_pause)
}

/// Backend keeping service state in memory; cannot report status itself.
struct MemoryBackend {
    descriptor: BackendDescriptor,
    running: Mutex<bool>,
    log: Mutex<Vec<&'static str>>,
}

impl MemoryBackend {
    fn new(capabilities: Capabilities) -> Self {
        Self {
            descriptor: BackendDescriptor {
                id: "memory",
                capabilities,
            },
            running: Mutex::new(false),
            log: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, entry: &'static str, running: bool) -> ServiceResult<()> {
        self.log.lock().unwrap().push(entry);
        *self.running.lock().unwrap() = running;
        Ok(())
    }

    fn log(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

impl Backend for MemoryBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn status(&self, _: &dyn CommandRunner, _: &ServiceTarget<'_>) -> ServiceResult<RunState> {
        Err(ServiceError::StatusUnsupported {
            backend: "memory".to_string(),
        })
    }

    fn start(&self, _: &dyn CommandRunner, _: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.record("start", true)
    }

    fn stop(&self, _: &dyn CommandRunner, _: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.record("stop", false)
    }

    fn reload(&self, _: &dyn CommandRunner, _: &ServiceTarget<'_>) -> ServiceResult<()> {
        self.record("reload", true)
    }
}

fn with_memory(runner: &Arc<ScriptedRunner>, backend: Arc<MemoryBackend>) -> Reconciler {
    let registry = BackendRegistry::empty().with_backend(backend);
    Reconciler::new(
        Arc::new(registry),
        Arc::new(StaticFacts::new(Some("memory"))),
        runner.clone(),
    )
    .with_pause(no_pause)
}

#[test]
fn test_started_and_running_is_noop() {
    let runner = Arc::new(ScriptedRunner::new().on("systemctl is-active nginx", 0, "active"));
    let outcome = builtin(&runner, Some("systemd"))
        .run(&ServiceSpec::new("nginx").state(DesiredState::Started));

    assert!(outcome.error.is_none());
    assert!(!outcome.changed);
    assert!(outcome.actions.is_empty());
    assert_eq!(outcome.status.unwrap().running, Some(true));
}

#[test]
fn test_stopped_and_not_running_is_noop() {
    let runner = Arc::new(ScriptedRunner::new().on("rc-service sshd status", 3, "stopped"));
    let outcome = builtin(&runner, Some("openrc"))
        .run(&ServiceSpec::new("sshd").state(DesiredState::Stopped));

    assert!(!outcome.changed);
    assert!(outcome.actions.is_empty());
    assert_eq!(runner.calls(), vec!["rc-service sshd status"]);
}

#[test]
fn test_restarted_always_changes() {
    for (exit, output) in [(0, "active"), (3, "inactive")] {
        let runner = Arc::new(ScriptedRunner::new().on("systemctl is-active nginx", exit, output));
        let outcome = builtin(&runner, Some("systemd"))
            .run(&ServiceSpec::new("nginx").state(DesiredState::Restarted));

        assert!(outcome.changed);
        assert_eq!(outcome.actions, vec![PrimitiveAction::Restart]);
        assert_eq!(
            runner.calls(),
            vec!["systemctl is-active nginx", "systemctl restart nginx"]
        );
    }
}

#[test]
fn test_started_twice_changes_nothing() {
    let runner = Arc::new(ScriptedRunner::new().on("systemctl is-active nginx", 0, "active"));
    let reconciler = builtin(&runner, Some("systemd"));
    let spec = ServiceSpec::new("nginx").state(DesiredState::Started);

    assert!(!reconciler.run(&spec).changed);
    assert!(!reconciler.run(&spec).changed);
    assert_eq!(runner.calls().len(), 2);
}

#[test]
fn test_stop_then_start() {
    let runner = Arc::new(ScriptedRunner::new().on("systemctl is-active nginx", 0, "active"));
    let reconciler = builtin(&runner, Some("systemd"));

    let stopped = reconciler.run(&ServiceSpec::new("nginx").state(DesiredState::Stopped));
    assert!(stopped.changed);
    assert_eq!(stopped.actions, vec![PrimitiveAction::Stop]);

    runner.respond("systemctl is-active nginx", 3, "inactive");
    let started = reconciler.run(&ServiceSpec::new("nginx").state(DesiredState::Started));
    assert!(started.changed);
    assert_eq!(started.actions, vec![PrimitiveAction::Start]);
}

#[test]
fn test_pattern_with_native_status_never_scans() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .on("systemctl is-active memcached", 3, "inactive")
            .on("ps auxww", 0, PS_OUTPUT),
    );
    let outcome = builtin(&runner, Some("systemd")).run(
        &ServiceSpec::new("memcached")
            .state(DesiredState::Started)
            .pattern("memcached"),
    );

    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("pattern"));
    assert!(runner.calls().iter().all(|c| !c.starts_with("ps")));
    assert_eq!(outcome.actions, vec![PrimitiveAction::Start]);
}

#[test]
fn test_invalid_spec_runs_no_commands() {
    let runner = Arc::new(ScriptedRunner::new());
    let outcome = builtin(&runner, Some("systemd")).run(&ServiceSpec::new("nginx"));

    let error = outcome.error.unwrap();
    assert_eq!(error.kind, "INVALID_SPEC");
    assert!(!outcome.changed);
    assert!(runner.calls().is_empty());
}

#[test]
fn test_restart_partial_failure_then_retry() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .on("service httpd status", 0, "running")
            .on("service httpd start", 1, "Address already in use"),
    );
    let reconciler = builtin(&runner, None);

    let outcome = reconciler.run(&ServiceSpec::new("httpd").state(DesiredState::Restarted));
    assert!(outcome.changed);
    assert_eq!(outcome.backend.as_deref(), Some("service"));
    assert_eq!(outcome.actions, vec![PrimitiveAction::Stop]);
    let error = outcome.error.unwrap();
    assert_eq!(error.kind, "ACTION_FAILED");
    assert_eq!(error.action, Some(PrimitiveAction::Start));
    assert!(error.message.contains("Address already in use"));

    // The service is now down; a plain "started" only starts it.
    runner.respond("service httpd status", 3, "stopped");
    runner.respond("service httpd start", 0, "");
    runner.clear_calls();

    let retry = reconciler.run(&ServiceSpec::new("httpd").state(DesiredState::Started));
    assert!(retry.error.is_none());
    assert_eq!(retry.actions, vec![PrimitiveAction::Start]);
    assert_eq!(
        runner.calls(),
        vec!["service httpd status", "service httpd start"]
    );
}

#[test]
fn test_restart_with_sleep_on_sysvinit() {
    let runner = Arc::new(ScriptedRunner::new().on("/etc/init.d/network status", 0, ""));
    let outcome = builtin(&runner, Some("sysvinit")).run(
        &ServiceSpec::new("network")
            .state(DesiredState::Restarted)
            .sleep(3)
            .arguments("eth0"),
    );

    assert!(outcome.warnings.is_empty());
    assert_eq!(
        outcome.actions,
        vec![PrimitiveAction::Stop, PrimitiveAction::Start]
    );
    assert_eq!(
        runner.calls(),
        vec![
            "/etc/init.d/network status eth0",
            "/etc/init.d/network stop eth0",
            "/etc/init.d/network start eth0",
        ]
    );
}

#[test]
fn test_openrc_enable_in_runlevel() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .on("rc-service sshd status", 0, "started")
            .on("rc-update show boot", 0, "  hostname | boot\n  sysctl | boot\n"),
    );
    let outcome = builtin(&runner, Some("openrc")).run(
        &ServiceSpec::new("sshd")
            .state(DesiredState::Started)
            .enabled(true)
            .runlevel("boot"),
    );

    assert!(outcome.changed);
    assert_eq!(outcome.actions, vec![PrimitiveAction::Enable]);
    assert_eq!(outcome.status.unwrap().enabled, Some(true));
    assert_eq!(
        runner.calls().last().map(String::as_str),
        Some("rc-update add sshd boot")
    );
}

#[test]
fn test_explicit_backend_skips_detection() {
    let runner = Arc::new(ScriptedRunner::new().on("svcs -H -o state", 0, "online\n"));
    let outcome = builtin(&runner, Some("systemd")).run(
        &ServiceSpec::new("network/ssh")
            .state(DesiredState::Started)
            .use_backend("smf"),
    );

    assert_eq!(outcome.backend.as_deref(), Some("smf"));
    assert!(!outcome.changed);
}

#[test]
fn test_unknown_backend_fails_before_commands() {
    let runner = Arc::new(ScriptedRunner::new());
    let outcome = builtin(&runner, None).run(
        &ServiceSpec::new("nginx")
            .state(DesiredState::Started)
            .use_backend("launchd"),
    );

    assert_eq!(outcome.error.unwrap().kind, "UNKNOWN_BACKEND");
    assert!(runner.calls().is_empty());
}

#[test]
fn test_pattern_fallback_when_status_unsupported() {
    let runner = Arc::new(ScriptedRunner::new().on("ps auxww", 0, PS_OUTPUT));
    let backend = Arc::new(MemoryBackend::new(Capabilities {
        pattern: true,
        ..Capabilities::default()
    }));
    let outcome = with_memory(&runner, backend.clone()).run(
        &ServiceSpec::new("memcached")
            .state(DesiredState::Started)
            .pattern("/usr/sbin/memcached"),
    );

    assert!(!outcome.changed);
    assert_eq!(outcome.status.unwrap().source, StatusSource::PatternMatched);
    assert_eq!(runner.calls(), vec!["ps auxww"]);
    assert!(backend.log().is_empty());
}

#[test]
fn test_unknown_status_stops_conservatively() {
    let runner = Arc::new(ScriptedRunner::new());
    let backend = Arc::new(MemoryBackend::new(Capabilities::default()));
    let outcome = with_memory(&runner, backend.clone())
        .run(&ServiceSpec::new("memcached").state(DesiredState::Stopped));

    assert!(outcome.changed);
    assert_eq!(backend.log(), vec!["stop"]);
    assert!(runner.calls().is_empty());
}

#[test]
fn test_enable_unsupported_still_runs_state_action() {
    let runner = Arc::new(ScriptedRunner::new());
    let backend = Arc::new(MemoryBackend::new(Capabilities {
        enable: true,
        ..Capabilities::default()
    }));
    let outcome = with_memory(&runner, backend.clone()).run(
        &ServiceSpec::new("memcached")
            .state(DesiredState::Reloaded)
            .enabled(true),
    );

    assert!(outcome.error.is_none());
    assert_eq!(backend.log(), vec!["start"]);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("enablement"));
}

#[test]
fn test_check_mode_touches_nothing() {
    let runner = Arc::new(ScriptedRunner::new());
    let backend = Arc::new(MemoryBackend::new(Capabilities {
        native_restart: true,
        ..Capabilities::default()
    }));
    let outcome = with_memory(&runner, backend.clone()).run(
        &ServiceSpec::new("memcached")
            .state(DesiredState::Restarted)
            .check_mode(true),
    );

    assert!(outcome.changed);
    assert!(outcome.check_mode);
    assert_eq!(outcome.actions, vec![PrimitiveAction::Restart]);
    assert!(backend.log().is_empty());
}
