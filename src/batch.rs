//! Concurrent reconciliation of many specs.
//!
//! Specs naming different services run in parallel on tokio's blocking
//! pool. Specs naming the same service run one after another, in input
//! order, inside a single task.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::reconcile::{Reconciler, ServiceSpec};
use crate::report::Outcome;

/// Reconcile every spec and return outcomes in input order.
pub async fn reconcile_all(reconciler: Arc<Reconciler>, specs: Vec<ServiceSpec>) -> Vec<Outcome> {
    let total = specs.len();

    // Group input positions by service name, keeping first-seen order.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<(usize, ServiceSpec)>> = HashMap::new();
    for (index, spec) in specs.into_iter().enumerate() {
        let entry = groups.entry(spec.name.clone()).or_insert_with(|| {
            order.push(spec.name.clone());
            Vec::new()
        });
        entry.push((index, spec));
    }

    debug!(specs = total, services = order.len(), "Starting batch");

    let mut tasks = Vec::with_capacity(order.len());
    for name in order {
        let Some(group) = groups.remove(&name) else {
            continue;
        };
        let indices: Vec<(usize, String)> = group
            .iter()
            .map(|(i, spec)| (*i, spec.name.clone()))
            .collect();
        let reconciler = Arc::clone(&reconciler);
        let handle = tokio::task::spawn_blocking(move || {
            group
                .into_iter()
                .map(|(index, spec)| (index, reconciler.run(&spec)))
                .collect::<Vec<_>>()
        });
        tasks.push((indices, handle));
    }

    let mut slots: Vec<Option<Outcome>> = (0..total).map(|_| None).collect();
    for (indices, handle) in tasks {
        match handle.await {
            Ok(outcomes) => {
                for (index, outcome) in outcomes {
                    slots[index] = Some(outcome);
                }
            }
            Err(e) => {
                error!(error = %e, "Reconciliation task failed");
                let err = ServiceError::Task {
                    message: e.to_string(),
                };
                for (index, name) in indices {
                    slots[index] = Some(Outcome::from_error(Uuid::new_v4(), name, &err));
                }
            }
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{BackendRegistry, SystemdBackend};
    use crate::executor::ScriptedRunner;
    use crate::facts::StaticFacts;
    use crate::reconcile::{DesiredState, PrimitiveAction};

    fn reconciler(runner: Arc<ScriptedRunner>) -> Arc<Reconciler> {
        let registry = BackendRegistry::empty().with_backend(Arc::new(SystemdBackend::new()));
        Arc::new(Reconciler::new(
            Arc::new(registry),
            Arc::new(StaticFacts::new(Some("systemd"))),
            runner,
        ))
    }

    #[tokio::test]
    async fn test_outcomes_in_input_order() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on("systemctl is-active nginx", 0, "active")
                .on("systemctl is-active sshd", 3, "inactive")
                .on("systemctl is-active cron", 0, "active"),
        );
        let specs = vec![
            ServiceSpec::new("nginx").state(DesiredState::Started),
            ServiceSpec::new("sshd").state(DesiredState::Started),
            ServiceSpec::new("cron").state(DesiredState::Stopped),
        ];

        let outcomes = reconcile_all(reconciler(runner), specs).await;

        let names: Vec<&str> = outcomes.iter().map(|o| o.service.as_str()).collect();
        assert_eq!(names, vec!["nginx", "sshd", "cron"]);
        assert!(!outcomes[0].changed);
        assert_eq!(outcomes[1].actions, vec![PrimitiveAction::Start]);
        assert_eq!(outcomes[2].actions, vec![PrimitiveAction::Stop]);
    }

    #[tokio::test]
    async fn test_same_service_runs_in_order() {
        let runner = Arc::new(ScriptedRunner::new().on("systemctl is-active nginx", 0, "active"));
        let specs = vec![
            ServiceSpec::new("nginx").state(DesiredState::Stopped),
            ServiceSpec::new("nginx").state(DesiredState::Reloaded),
        ];

        let outcomes = reconcile_all(reconciler(runner.clone()), specs).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].actions, vec![PrimitiveAction::Stop]);
        assert_eq!(outcomes[1].actions, vec![PrimitiveAction::Reload]);
        assert_eq!(
            runner.calls(),
            vec![
                "systemctl is-active nginx",
                "systemctl stop nginx",
                "systemctl is-active nginx",
                "systemctl reload nginx",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let runner = Arc::new(ScriptedRunner::new());
        assert!(reconcile_all(reconciler(runner), Vec::new()).await.is_empty());
    }
}
