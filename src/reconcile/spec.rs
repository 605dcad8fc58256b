//! Service spec: the caller's desired state.

use serde::{Deserialize, Serialize};

use crate::backends::AUTO_SELECTOR;
use crate::error::{ServiceError, ValidationErrorKind};
use crate::validation::{validate_runlevel, validate_service_name};

/// Desired running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// Running; no command if already running.
    Started,
    /// Not running; no command if already stopped.
    Stopped,
    /// Always bounced.
    Restarted,
    /// Always reloaded, or started if not running.
    Reloaded,
}

impl DesiredState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesiredState::Started => "started",
            DesiredState::Stopped => "stopped",
            DesiredState::Restarted => "restarted",
            DesiredState::Reloaded => "reloaded",
        }
    }
}

impl std::fmt::Display for DesiredState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Desired state for one named service.
///
/// Deserializes from the invocation surface (`name`, `state`, `enabled`,
/// `sleep`, `pattern`, `runlevel`, `arguments`/`args`, `use`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSpec {
    /// Service name.
    pub name: String,
    /// Desired running state.
    #[serde(default)]
    pub state: Option<DesiredState>,
    /// Whether the service should start at boot.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Seconds to wait between stop and start when restarting.
    #[serde(default)]
    pub sleep: Option<u64>,
    /// Process-list substring standing in for a status query.
    #[serde(default)]
    pub pattern: Option<String>,
    /// OpenRC runlevel; `None` means "default".
    #[serde(default)]
    pub runlevel: Option<String>,
    /// Extra arguments for the service invocation.
    #[serde(default, alias = "args")]
    pub arguments: String,
    /// Backend selector.
    #[serde(default = "default_selector", rename = "use")]
    pub backend: String,
    /// Plan and report without executing.
    #[serde(default)]
    pub check_mode: bool,
}

fn default_selector() -> String {
    AUTO_SELECTOR.to_string()
}

impl ServiceSpec {
    /// A spec for `name` with nothing requested yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: None,
            enabled: None,
            sleep: None,
            pattern: None,
            runlevel: None,
            arguments: String::new(),
            backend: default_selector(),
            check_mode: false,
        }
    }

    pub fn state(mut self, state: DesiredState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn sleep(mut self, seconds: u64) -> Self {
        self.sleep = Some(seconds);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn runlevel(mut self, runlevel: impl Into<String>) -> Self {
        self.runlevel = Some(runlevel.into());
        self
    }

    pub fn arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = arguments.into();
        self
    }

    /// Select a backend explicitly instead of `auto`.
    pub fn use_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    /// Reject specs that cannot be acted on.
    ///
    /// Runs before any backend is consulted.
    pub fn validate(&self) -> Result<(), ServiceError> {
        validate_service_name(&self.name)?;

        if self.state.is_none() && self.enabled.is_none() {
            return Err(ServiceError::invalid(
                ValidationErrorKind::MissingStateAndEnabled,
            ));
        }

        if let Some(runlevel) = &self.runlevel {
            validate_runlevel(runlevel)?;
        }

        if self.pattern.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(ServiceError::invalid(ValidationErrorKind::InvalidParameter {
                param: "pattern".to_string(),
                message: "pattern cannot be empty".to_string(),
            }));
        }

        if self.backend.trim().is_empty() {
            return Err(ServiceError::invalid(ValidationErrorKind::InvalidParameter {
                param: "use".to_string(),
                message: "backend selector cannot be empty".to_string(),
            }));
        }

        Ok(())
    }
}
