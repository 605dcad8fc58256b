//! Service reconciliation.
//!
//! - [`spec`]: the desired state as supplied by the caller.
//! - [`capability`]: dropping options a backend cannot honour.
//! - [`status`]: reading the current state.
//! - [`plan`]: deciding which primitives to run.
//! - [`engine`]: executing a plan and producing an outcome.

pub mod capability;
pub mod engine;
pub mod plan;
pub mod spec;
pub mod status;

pub use capability::{gate_options, EffectiveSpec};
pub use engine::Reconciler;
pub use plan::{plan_actions, reconcile, ActionPlan, PlanStep, PrimitiveAction};
pub use spec::{DesiredState, ServiceSpec};
pub use status::{resolve_status, ProcessScanner, Resolution, ServiceStatus, StatusQuery, StatusSource};
