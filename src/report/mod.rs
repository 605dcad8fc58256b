//! Result reporting.
//!
//! The engine produces an [`Outcome`]; how it is rendered and what exit code
//! follows is decided here.

mod audit;
mod outcome;
mod reporter;

pub use audit::AuditLogger;
pub use outcome::{ErrorReport, Outcome};
pub use reporter::{exit_code, JsonReporter, Reporter};
