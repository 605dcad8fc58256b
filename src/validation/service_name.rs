//! Service name validation.
//!
//! Service names are passed as a single argv element to init-system tools,
//! never through a shell, but a few shapes are still unsafe: a leading `-`
//! would be parsed as an option, and an absolute path or a `..` segment
//! would let SysV and BSD backends escape their script directories. SMF
//! names (`network/ssh`, `svc:/network/ssh:default`) keep inner slashes.

use crate::error::{ServiceError, ValidationErrorKind};

/// Validate a service name before it reaches any backend.
///
/// # Example
///
/// ```
/// use servicectl::validation::validate_service_name;
///
/// assert!(validate_service_name("nginx").is_ok());
/// assert!(validate_service_name("getty@tty1.service").is_ok());
/// assert!(validate_service_name("../etc/passwd").is_err());
/// ```
pub fn validate_service_name(name: &str) -> Result<(), ServiceError> {
    let reject = |reason: &str| {
        Err(ServiceError::invalid(ValidationErrorKind::InvalidServiceName {
            name: name.to_string(),
            reason: reason.to_string(),
        }))
    };

    if name.is_empty() {
        return reject("service name cannot be empty");
    }

    if name.starts_with('-') {
        return reject("service name cannot start with '-'");
    }

    if name.starts_with('/') {
        return reject("service name cannot be an absolute path");
    }

    if name.split('/').any(|segment| segment == ".." || segment == ".") {
        return reject("service name cannot contain '.' or '..' path segments");
    }

    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return reject("service name cannot contain whitespace or control characters");
    }

    Ok(())
}
