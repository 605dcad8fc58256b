//! Runlevel validation.

use crate::error::{ServiceError, ValidationErrorKind};

/// Validate an OpenRC runlevel name.
///
/// Runlevels are directory names under `/etc/runlevels`, so only
/// alphanumerics, `-`, `_` and `.` are accepted.
pub fn validate_runlevel(runlevel: &str) -> Result<(), ServiceError> {
    let valid = !runlevel.is_empty()
        && !runlevel.starts_with('.')
        && runlevel
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(ServiceError::invalid(ValidationErrorKind::InvalidParameter {
            param: "runlevel".to_string(),
            message: format!("'{}' is not a valid runlevel name", runlevel),
        }))
    }
}
