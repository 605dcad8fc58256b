//! Outcome reporters.

use std::io::Write;
use std::sync::Mutex;

use tracing::debug;

use crate::error::{ServiceError, ServiceResult};

use super::outcome::Outcome;

/// Receives finished outcomes.
pub trait Reporter: Send + Sync {
    fn report(&self, outcome: &Outcome) -> ServiceResult<()>;
}

/// Writes each outcome as one line of JSON.
pub struct JsonReporter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Reporter for JsonReporter<W> {
    fn report(&self, outcome: &Outcome) -> ServiceResult<()> {
        let json = serde_json::to_string(outcome)?;
        let mut writer = self.writer.lock().map_err(|e| ServiceError::Config {
            message: format!("Failed to acquire reporter lock: {}", e),
        })?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        debug!(request_id = %outcome.request_id, service = %outcome.service, "Outcome reported");
        Ok(())
    }
}

/// Process exit code for a set of outcomes: 0 if none failed, 1 otherwise.
pub fn exit_code(outcomes: &[Outcome]) -> u8 {
    if outcomes.iter().any(Outcome::is_error) {
        1
    } else {
        0
    }
}
