//! Audit log for reconciliations.
//!
//! Appends one JSON object per outcome to a file, stamped with the time it
//! was recorded.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ServiceError, ServiceResult};

use super::outcome::Outcome;
use super::reporter::Reporter;

#[derive(Serialize)]
struct AuditRecord<'a> {
    timestamp: String,
    #[serde(flatten)]
    outcome: &'a Outcome,
}

/// JSON-lines audit log.
pub struct AuditLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl AuditLogger {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn new(path: &Path) -> ServiceResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!(path = %parent.display(), "Creating audit log directory");
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        debug!(path = %path.display(), "Audit logger initialized");

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reporter for AuditLogger {
    fn report(&self, outcome: &Outcome) -> ServiceResult<()> {
        let record = AuditRecord {
            timestamp: Utc::now().to_rfc3339(),
            outcome,
        };
        let json = serde_json::to_string(&record)?;

        let mut file = self.file.lock().map_err(|e| ServiceError::Config {
            message: format!("Failed to acquire audit log lock: {}", e),
        })?;
        writeln!(file, "{}", json)?;

        if let Err(e) = file.sync_data() {
            warn!(error = %e, "Failed to sync audit log");
        }

        debug!(
            request_id = %outcome.request_id,
            service = %outcome.service,
            "Audit entry logged"
        );
        Ok(())
    }
}
