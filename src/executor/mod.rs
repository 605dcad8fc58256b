//! Command executor module.
//!
//! Handles safe subprocess spawning, the injectable process-invocation
//! primitive, and output trimming.

mod output;
mod runner;
mod subprocess;

pub use output::sanitize_output;
pub use runner::{CommandRunner, ScriptedRunner, SystemRunner};
pub use subprocess::{run_command, SubprocessBuilder, SubprocessResult};
