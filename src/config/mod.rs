//! Configuration module for servicectl.
//!
//! Handles loading and validating configuration from TOML files.

mod settings;

pub use settings::*;
