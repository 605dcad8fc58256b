//! Input validation module.
//!
//! Provides validators for service names and runlevels.

mod runlevel;
mod service_name;

pub use runlevel::validate_runlevel;
pub use service_name::validate_service_name;
