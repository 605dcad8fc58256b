//! Init-system backends.
//!
//! Contains the backend capability interface, the built-in backends and the
//! backend registry.
//!
//! ## Adding a New Backend
//!
//! 1. Create a new file in this directory (e.g., `runit.rs`)
//! 2. Implement the `Backend` trait and describe its `Capabilities`
//! 3. Register the backend in `BackendRegistry::builtin()`

mod bsdinit;
mod legacy;
mod openrc;
mod registry;
mod smf;
mod systemd;
mod sysvinit;
mod traits;
mod upstart;

pub use bsdinit::BsdInitBackend;
pub use legacy::{LegacyServiceBackend, LEGACY_BACKEND_ID};
pub use openrc::{OpenRcBackend, DEFAULT_RUNLEVEL};
pub use registry::{BackendRegistry, AUTO_SELECTOR};
pub use smf::SmfBackend;
pub use systemd::SystemdBackend;
pub use sysvinit::SysvInitBackend;
pub use traits::{Backend, BackendDescriptor, Capabilities, RunState, ServiceTarget};
pub use upstart::UpstartBackend;
