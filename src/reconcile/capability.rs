//! Capability gating.
//!
//! Options a backend cannot honour are dropped here, once, before status is
//! read or a plan is made. Each dropped option produces exactly one warning;
//! dropping never fails.

use std::time::Duration;

use crate::backends::{BackendDescriptor, ServiceTarget, DEFAULT_RUNLEVEL};

use super::spec::{DesiredState, ServiceSpec};

/// A spec with every option the backend cannot honour removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSpec {
    pub name: String,
    pub state: Option<DesiredState>,
    pub enabled: Option<bool>,
    /// Non-zero delay between stop and start, if the backend honours one.
    pub sleep: Option<Duration>,
    pub pattern: Option<String>,
    pub runlevel: Option<String>,
    pub arguments: Option<String>,
}

impl EffectiveSpec {
    /// The view handed to backend calls.
    pub fn target(&self) -> ServiceTarget<'_> {
        ServiceTarget {
            name: &self.name,
            arguments: self.arguments.as_deref(),
            runlevel: self.runlevel.as_deref(),
        }
    }
}

fn ignored(option: &str, backend: &str, reason: &str) -> String {
    format!("Ignoring '{}': backend '{}' {}", option, backend, reason)
}

/// Drop options `backend` cannot honour.
///
/// Options left at their defaults (no runlevel or "default", empty
/// arguments, zero sleep) are dropped without a warning.
pub fn gate_options(spec: &ServiceSpec, backend: &BackendDescriptor) -> (EffectiveSpec, Vec<String>) {
    let caps = backend.capabilities;
    let id = backend.id;
    let mut warnings = Vec::new();

    let sleep = match spec.sleep {
        Some(secs) if secs > 0 => {
            if caps.sleep {
                Some(Duration::from_secs(secs))
            } else {
                warnings.push(ignored(
                    "sleep",
                    id,
                    "does not support a delay between stop and start",
                ));
                None
            }
        }
        _ => None,
    };

    let pattern = match &spec.pattern {
        Some(_) if caps.status_query => {
            warnings.push(ignored("pattern", id, "reports service status natively"));
            None
        }
        Some(_) if !caps.pattern => {
            warnings.push(ignored("pattern", id, "does not support pattern matching"));
            None
        }
        other => other.clone(),
    };

    let runlevel = if caps.runlevel {
        Some(
            spec.runlevel
                .clone()
                .unwrap_or_else(|| DEFAULT_RUNLEVEL.to_string()),
        )
    } else {
        if spec.runlevel.as_deref().is_some_and(|r| r != DEFAULT_RUNLEVEL) {
            warnings.push(ignored("runlevel", id, "does not use runlevels"));
        }
        None
    };

    let arguments = match spec.arguments.trim() {
        "" => None,
        args if caps.arguments => Some(args.to_string()),
        _ => {
            warnings.push(ignored(
                "arguments",
                id,
                "does not pass extra arguments to services",
            ));
            None
        }
    };

    let enabled = match spec.enabled {
        Some(_) if !caps.enable => {
            warnings.push(format!("Backend '{}' cannot manage service enablement", id));
            None
        }
        other => other,
    };

    let effective = EffectiveSpec {
        name: spec.name.clone(),
        state: spec.state,
        enabled,
        sleep,
        pattern,
        runlevel,
        arguments,
    };

    (effective, warnings)
}
