//! Action planning.
//!
//! Turns a gated spec and a status snapshot into the minimal list of
//! primitives to execute. Planning is pure; nothing here touches the host.

use std::time::Duration;

use serde::Serialize;

use crate::backends::{Backend, Capabilities};

use super::capability::{gate_options, EffectiveSpec};
use super::spec::{DesiredState, ServiceSpec};
use super::status::ServiceStatus;

/// A single command a backend can carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveAction {
    Start,
    Stop,
    Restart,
    Reload,
    Enable,
    Disable,
}

impl PrimitiveAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveAction::Start => "start",
            PrimitiveAction::Stop => "stop",
            PrimitiveAction::Restart => "restart",
            PrimitiveAction::Reload => "reload",
            PrimitiveAction::Enable => "enable",
            PrimitiveAction::Disable => "disable",
        }
    }
}

impl std::fmt::Display for PrimitiveAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step of an executed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStep {
    Act(PrimitiveAction),
    Sleep(Duration),
}

/// The primitives needed to reach the desired state.
///
/// At most two state primitives, an optional pause between them, and an
/// optional enable/disable that always runs last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPlan {
    state_actions: Vec<PrimitiveAction>,
    sleep: Option<Duration>,
    enablement: Option<PrimitiveAction>,
}

impl ActionPlan {
    /// State primitives followed by the enablement primitive, if any.
    pub fn actions(&self) -> Vec<PrimitiveAction> {
        self.state_actions
            .iter()
            .copied()
            .chain(self.enablement)
            .collect()
    }

    /// Execution order, with the pause placed between stop and start.
    pub fn steps(&self) -> Vec<PlanStep> {
        let mut steps = Vec::with_capacity(4);
        for (i, action) in self.state_actions.iter().enumerate() {
            if i > 0 {
                if let Some(pause) = self.sleep {
                    steps.push(PlanStep::Sleep(pause));
                }
            }
            steps.push(PlanStep::Act(*action));
        }
        if let Some(action) = self.enablement {
            steps.push(PlanStep::Act(action));
        }
        steps
    }

    pub fn is_empty(&self) -> bool {
        self.state_actions.is_empty() && self.enablement.is_none()
    }

    /// The enable/disable primitive, if one is planned.
    pub fn enablement(&self) -> Option<PrimitiveAction> {
        self.enablement
    }
}

/// Compute the plan for `spec` given the current `status`.
///
/// `spec` must already be gated against `caps`; a surviving `sleep` means
/// the backend honours it, which forces a stop/start restart.
pub fn plan_actions(spec: &EffectiveSpec, status: &ServiceStatus, caps: Capabilities) -> ActionPlan {
    let mut plan = ActionPlan::default();

    match (spec.state, status.running) {
        (None, _) => {}
        (Some(DesiredState::Started), Some(true)) => {}
        (Some(DesiredState::Started), _) => plan.state_actions.push(PrimitiveAction::Start),
        (Some(DesiredState::Stopped), Some(false)) => {}
        (Some(DesiredState::Stopped), _) => plan.state_actions.push(PrimitiveAction::Stop),
        (Some(DesiredState::Restarted), _) => {
            if spec.sleep.is_none() && caps.native_restart {
                plan.state_actions.push(PrimitiveAction::Restart);
            } else {
                plan.state_actions
                    .extend([PrimitiveAction::Stop, PrimitiveAction::Start]);
                plan.sleep = spec.sleep;
            }
        }
        (Some(DesiredState::Reloaded), Some(true)) => {
            plan.state_actions.push(PrimitiveAction::Reload)
        }
        (Some(DesiredState::Reloaded), _) => plan.state_actions.push(PrimitiveAction::Start),
    }

    if let Some(wanted) = spec.enabled {
        if status.enabled != Some(wanted) {
            plan.enablement = Some(if wanted {
                PrimitiveAction::Enable
            } else {
                PrimitiveAction::Disable
            });
        }
    }

    plan
}

/// Gate `spec` against `backend` and plan from `status`.
///
/// Returns the plan and the gating warnings in order.
pub fn reconcile(
    spec: &ServiceSpec,
    status: &ServiceStatus,
    backend: &dyn Backend,
) -> (ActionPlan, Vec<String>) {
    let (effective, warnings) = gate_options(spec, backend.descriptor());
    let plan = plan_actions(&effective, status, backend.capabilities());
    (plan, warnings)
}
