//! Reconciliation outcome.

use serde::Serialize;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::reconcile::{PrimitiveAction, ServiceStatus};

/// Failure details attached to an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Stable error code, e.g. `ACTION_FAILED`.
    pub kind: String,
    pub message: String,
    /// The primitive that failed, for `ACTION_FAILED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<PrimitiveAction>,
}

impl From<&ServiceError> for ErrorReport {
    fn from(err: &ServiceError) -> Self {
        let action = match err {
            ServiceError::ActionFailed { action, .. } => Some(*action),
            _ => None,
        };
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            action,
        }
    }
}

/// Everything the caller learns about one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub request_id: Uuid,
    pub service: String,
    /// Backend that was selected; `None` if resolution never happened.
    pub backend: Option<String>,
    /// Whether any primitive ran (or, in check mode, would run).
    pub changed: bool,
    pub check_mode: bool,
    /// State after the executed actions; `None` if status was never read.
    pub status: Option<ServiceStatus>,
    pub warnings: Vec<String>,
    /// Primitives completed in order; planned primitives in check mode.
    pub actions: Vec<PrimitiveAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl Outcome {
    /// An empty outcome for `service`.
    pub fn new(request_id: Uuid, service: impl Into<String>) -> Self {
        Self {
            request_id,
            service: service.into(),
            backend: None,
            changed: false,
            check_mode: false,
            status: None,
            warnings: Vec::new(),
            actions: Vec::new(),
            error: None,
        }
    }

    /// An outcome that failed before anything ran.
    pub fn from_error(request_id: Uuid, service: impl Into<String>, err: &ServiceError) -> Self {
        let mut outcome = Self::new(request_id, service);
        outcome.error = Some(err.into());
        outcome
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
