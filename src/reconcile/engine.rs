//! Reconciliation engine.
//!
//! Drives one spec from validation to a reported [`Outcome`]: resolve the
//! backend, gate options, read status, plan, then execute the plan in order
//! and stop at the first failed primitive.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backends::{Backend, BackendRegistry, ServiceTarget, AUTO_SELECTOR};
use crate::error::{ServiceError, ServiceResult};
use crate::executor::CommandRunner;
use crate::facts::FactProvider;
use crate::report::{ErrorReport, Outcome};

use super::capability::gate_options;
use super::plan::{plan_actions, PlanStep, PrimitiveAction};
use super::spec::ServiceSpec;
use super::status::{resolve_status, ProcessScanner, StatusQuery};

/// Reconciles service specs against the host.
///
/// Holds only shared, read-only collaborators, so one instance can serve
/// many threads.
pub struct Reconciler {
    registry: Arc<BackendRegistry>,
    facts: Arc<dyn FactProvider>,
    runner: Arc<dyn CommandRunner>,
    scanner: ProcessScanner,
    pause: fn(Duration),
}

impl Reconciler {
    pub fn new(
        registry: Arc<BackendRegistry>,
        facts: Arc<dyn FactProvider>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            registry,
            facts,
            runner,
            scanner: ProcessScanner::default(),
            pause: std::thread::sleep,
        }
    }

    /// Use a different process listing command (builder form).
    pub fn with_scanner(mut self, scanner: ProcessScanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Replace the function used for the stop/start delay (builder form).
    pub fn with_pause(mut self, pause: fn(Duration)) -> Self {
        self.pause = pause;
        self
    }

    /// Reconcile one spec.
    ///
    /// Never fails; errors are carried in the returned outcome.
    pub fn run(&self, spec: &ServiceSpec) -> Outcome {
        let request_id = Uuid::new_v4();
        let mut outcome = Outcome::new(request_id, &spec.name);
        outcome.check_mode = spec.check_mode;

        info!(
            request_id = %request_id,
            service = %spec.name,
            state = ?spec.state,
            enabled = ?spec.enabled,
            check_mode = spec.check_mode,
            "Reconciling service"
        );

        if let Err(e) = self.reconcile(spec, &mut outcome) {
            error!(
                request_id = %request_id,
                service = %spec.name,
                error = %e,
                kind = e.kind(),
                "Reconciliation failed"
            );
            outcome.error = Some(ErrorReport::from(&e));
        } else {
            info!(
                request_id = %request_id,
                service = %spec.name,
                changed = outcome.changed,
                "Reconciliation complete"
            );
        }

        outcome
    }

    fn reconcile(&self, spec: &ServiceSpec, outcome: &mut Outcome) -> ServiceResult<()> {
        let request_id = outcome.request_id;
        spec.validate()?;

        let detected = if spec.backend == AUTO_SELECTOR {
            self.facts.detected_service_manager()
        } else {
            None
        };
        let backend = self.registry.resolve(&spec.backend, detected.as_deref())?;
        outcome.backend = Some(backend.id().to_string());

        debug!(
            request_id = %request_id,
            service = %spec.name,
            backend = backend.id(),
            detected = ?detected,
            "Backend selected"
        );

        let (mut effective, warnings) = gate_options(spec, backend.descriptor());
        for warning in warnings {
            self.warn(outcome, warning);
        }

        let resolution = resolve_status(
            backend.as_ref(),
            self.runner.as_ref(),
            &self.scanner,
            &StatusQuery {
                target: effective.target(),
                pattern: effective.pattern.as_deref(),
                include_enabled: effective.enabled.is_some(),
            },
        )?;
        if !resolution.enable_supported {
            effective.enabled = None;
            let message = ServiceError::EnableUnsupported {
                backend: backend.id().to_string(),
            }
            .to_string();
            self.warn(outcome, message);
        }
        let before = resolution.status;

        debug!(
            request_id = %request_id,
            service = %spec.name,
            running = ?before.running,
            enabled = ?before.enabled,
            source = ?before.source,
            "Current status"
        );

        let plan = plan_actions(&effective, &before, backend.capabilities());

        if spec.check_mode {
            outcome.actions = plan.actions();
            outcome.changed = !plan.is_empty();
            outcome.status = Some(before.after(&outcome.actions));
            info!(
                request_id = %request_id,
                service = %spec.name,
                planned = ?outcome.actions,
                "Check mode, no actions executed"
            );
            return Ok(());
        }

        let target = effective.target();
        for step in plan.steps() {
            let action = match step {
                PlanStep::Sleep(pause) => {
                    debug!(request_id = %request_id, seconds = pause.as_secs(), "Sleeping between stop and start");
                    (self.pause)(pause);
                    continue;
                }
                PlanStep::Act(action) => action,
            };

            info!(
                request_id = %request_id,
                service = %spec.name,
                backend = backend.id(),
                action = %action,
                "Executing action"
            );

            match perform(backend.as_ref(), self.runner.as_ref(), action, &target) {
                Ok(()) => {
                    outcome.actions.push(action);
                    outcome.changed = true;
                }
                Err(e @ ServiceError::EnableUnsupported { .. }) => {
                    self.warn(outcome, e.to_string());
                }
                Err(e) => {
                    outcome.status = Some(before.after(&outcome.actions));
                    return Err(match e {
                        ServiceError::ActionFailed { .. } => e,
                        other => ServiceError::ActionFailed {
                            action,
                            message: other.to_string(),
                        },
                    });
                }
            }
        }

        outcome.status = Some(before.after(&outcome.actions));
        Ok(())
    }

    fn warn(&self, outcome: &mut Outcome, message: String) {
        warn!(
            request_id = %outcome.request_id,
            service = %outcome.service,
            warning = %message,
            "Reconciliation warning"
        );
        outcome.warnings.push(message);
    }
}

fn perform(
    backend: &dyn Backend,
    runner: &dyn CommandRunner,
    action: PrimitiveAction,
    target: &ServiceTarget<'_>,
) -> ServiceResult<()> {
    match action {
        PrimitiveAction::Start => backend.start(runner, target),
        PrimitiveAction::Stop => backend.stop(runner, target),
        PrimitiveAction::Restart => backend.restart(runner, target),
        PrimitiveAction::Reload => backend.reload(runner, target),
        PrimitiveAction::Enable => backend.set_enabled(runner, target, true),
        PrimitiveAction::Disable => backend.set_enabled(runner, target, false),
    }
}
