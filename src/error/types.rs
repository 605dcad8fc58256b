//! Error types for servicectl.

use thiserror::Error;

use crate::reconcile::PrimitiveAction;

/// Main error type for service reconciliation.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The service spec was rejected before any backend interaction.
    #[error("Invalid service spec: {kind}")]
    InvalidSpec { kind: ValidationErrorKind },

    /// An explicit backend selector names an unregistered backend.
    #[error("Unknown backend: {name}")]
    UnknownBackend { name: String },

    /// The backend cannot toggle or report boot-time enablement.
    #[error("Backend '{backend}' cannot manage service enablement")]
    EnableUnsupported { backend: String },

    /// The backend cannot report whether the service is running.
    #[error("Backend '{backend}' cannot report service status")]
    StatusUnsupported { backend: String },

    /// A primitive action's underlying command failed.
    #[error("Action '{action}' failed: {message}")]
    ActionFailed {
        action: PrimitiveAction,
        message: String,
    },

    /// Process invocation errors.
    #[error("Command error: {kind}")]
    Command { kind: CommandErrorKind },

    /// A worker task panicked or was cancelled.
    #[error("Task error: {message}")]
    Task { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Stable error code reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Config { .. } => "CONFIG_ERROR",
            ServiceError::InvalidSpec { .. } => "INVALID_SPEC",
            ServiceError::UnknownBackend { .. } => "UNKNOWN_BACKEND",
            ServiceError::EnableUnsupported { .. } => "ENABLE_UNSUPPORTED",
            ServiceError::StatusUnsupported { .. } => "STATUS_UNSUPPORTED",
            ServiceError::ActionFailed { .. } => "ACTION_FAILED",
            ServiceError::Command { .. } => "COMMAND_ERROR",
            ServiceError::Task { .. } => "TASK_ERROR",
            ServiceError::Io(_) => "IO_ERROR",
            ServiceError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Shorthand for an `InvalidSpec` error.
    pub fn invalid(kind: ValidationErrorKind) -> Self {
        ServiceError::InvalidSpec { kind }
    }
}

/// Validation error kinds.
#[derive(Error, Debug)]
pub enum ValidationErrorKind {
    #[error("at least one of 'state' or 'enabled' is required")]
    MissingStateAndEnabled,

    #[error("invalid service name '{name}': {reason}")]
    InvalidServiceName { name: String, reason: String },

    #[error("invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

/// Command error kinds.
#[derive(Error, Debug)]
pub enum CommandErrorKind {
    #[error("Failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Command execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("Command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
