//! Error types for servicectl.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
