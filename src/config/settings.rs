//! Configuration settings for servicectl.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ServiceError;
use crate::reconcile::ProcessScanner;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/servicectl/config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Process invocation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    /// Seconds before a backend command is killed.
    #[serde(default = "default_timeout")]
    pub default_timeout_seconds: u64,
    /// Process listing command used for pattern matching; the first element
    /// is the program.
    #[serde(default = "default_ps_command")]
    pub ps_command: Vec<String>,
}

/// Service manager detection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Skip probing and report this manager for `use=auto`.
    #[serde(default)]
    pub service_mgr: Option<String>,
    /// Filesystem root to probe.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Path to the audit log file.
    #[serde(default = "default_audit_log_path")]
    pub path: PathBuf,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_ps_command() -> Vec<String> {
    vec!["ps".to_string(), "auxww".to_string()]
}

fn default_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("/var/log/servicectl/audit.log")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: default_timeout(),
            ps_command: default_ps_command(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            service_mgr: None,
            root: default_root(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_audit_log_path(),
        }
    }
}

impl ExecutorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_seconds)
    }

    /// The configured process listing command as a scanner.
    pub fn scanner(&self) -> ProcessScanner {
        match self.ps_command.split_first() {
            Some((program, args)) => ProcessScanner::new(program.clone(), args.to_vec()),
            None => ProcessScanner::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ServiceError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ServiceError::Config { message } => ServiceError::Config {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Load settings from `path`, falling back to defaults if the file does
    /// not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate settings from TOML text.
    pub fn parse(content: &str) -> Result<Self, ServiceError> {
        let settings: Settings = toml::from_str(content).map_err(|e| ServiceError::Config {
            message: format!("Failed to parse config: {}", e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), ServiceError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ServiceError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(ServiceError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.executor.default_timeout_seconds == 0 {
            return Err(ServiceError::Config {
                message: "default_timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.executor.ps_command.is_empty() {
            return Err(ServiceError::Config {
                message: "ps_command cannot be empty".to_string(),
            });
        }

        if self
            .detection
            .service_mgr
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            return Err(ServiceError::Config {
                message: "service_mgr cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, "pretty");
        assert_eq!(settings.executor.default_timeout_seconds, 60);
        assert_eq!(settings.executor.ps_command, vec!["ps", "auxww"]);
        assert_eq!(settings.detection.root, PathBuf::from("/"));
        assert!(!settings.audit.enabled);
    }

    #[test]
    fn test_parse_sections() {
        let settings = Settings::parse(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [executor]
            default_timeout_seconds = 15
            ps_command = ["ps", "-ef"]

            [detection]
            service_mgr = "openrc"

            [audit]
            enabled = true
            path = "/tmp/servicectl-audit.log"
            "#,
        )
        .unwrap();

        assert_eq!(settings.logging.format, "json");
        assert_eq!(settings.executor.timeout(), Duration::from_secs(15));
        assert_eq!(
            settings.executor.scanner(),
            ProcessScanner::new("ps", vec!["-ef".to_string()])
        );
        assert_eq!(settings.detection.service_mgr.as_deref(), Some("openrc"));
        assert!(settings.audit.enabled);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(Settings::parse("[logging]\nlevel = \"loud\"").is_err());
        assert!(Settings::parse("[logging]\nformat = \"xml\"").is_err());
        assert!(Settings::parse("[executor]\ndefault_timeout_seconds = 0").is_err());
        assert!(Settings::parse("[executor]\nps_command = []").is_err());
        assert!(Settings::parse("[detection]\nservice_mgr = \"\"").is_err());
        assert!(Settings::parse("[sockets]\npath = \"/tmp\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            Settings::load(&path),
            Err(ServiceError::Config { .. })
        ));
        assert_eq!(
            Settings::load_or_default(&path).unwrap().logging.level,
            "info"
        );
    }
}
