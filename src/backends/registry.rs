//! Backend registry.
//!
//! Maps init-system identifiers to backends. Populated once when built and
//! read-only afterwards, so a single registry can be shared across threads.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{ServiceError, ServiceResult};

use super::bsdinit::BsdInitBackend;
use super::legacy::{LegacyServiceBackend, LEGACY_BACKEND_ID};
use super::openrc::OpenRcBackend;
use super::smf::SmfBackend;
use super::systemd::SystemdBackend;
use super::sysvinit::SysvInitBackend;
use super::traits::Backend;
use super::upstart::UpstartBackend;

/// Selector value that defers to host detection.
pub const AUTO_SELECTOR: &str = "auto";

/// Registry of available backends.
#[derive(Clone)]
pub struct BackendRegistry {
    backends: HashMap<&'static str, Arc<dyn Backend>>,
    fallback: &'static str,
}

impl BackendRegistry {
    /// Create a registry with all built-in backends, inspecting the host
    /// filesystem at `/`.
    pub fn new() -> Self {
        Self::builtin("/")
    }

    /// Create a registry with all built-in backends, inspecting the
    /// filesystem under `root` where a backend reads state from disk.
    pub fn builtin(root: impl Into<PathBuf>) -> Self {
        let registry = Self::empty()
            .with_backend(Arc::new(SystemdBackend::new()))
            .with_backend(Arc::new(SysvInitBackend::new(root)))
            .with_backend(Arc::new(OpenRcBackend::new()))
            .with_backend(Arc::new(UpstartBackend::new()))
            .with_backend(Arc::new(SmfBackend::new()))
            .with_backend(Arc::new(BsdInitBackend::new()))
            .with_backend(Arc::new(LegacyServiceBackend::new()));

        info!(
            count = registry.backends.len(),
            "Backend registry initialized"
        );

        registry
    }

    /// Create a registry with no backends, falling back to `service`.
    pub fn empty() -> Self {
        Self {
            backends: HashMap::new(),
            fallback: LEGACY_BACKEND_ID,
        }
    }

    /// Add a backend (builder form).
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        let id = backend.id();
        debug!(backend = id, "Registering backend");
        self.backends.insert(id, backend);
        self
    }

    /// Use a different backend when detection fails (builder form).
    pub fn with_fallback(mut self, id: &'static str) -> Self {
        self.fallback = id;
        self
    }

    /// Get a backend by identifier.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Backend>> {
        self.backends.get(id).cloned()
    }

    /// List all registered identifiers.
    pub fn list(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.backends.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get the count of registered backends.
    pub fn count(&self) -> usize {
        self.backends.len()
    }

    /// Pick the backend for a selector.
    ///
    /// `auto` uses `detected` when it names a registered backend and the
    /// fallback otherwise. Any other selector must name a registered
    /// backend exactly.
    pub fn resolve(
        &self,
        selector: &str,
        detected: Option<&str>,
    ) -> ServiceResult<Arc<dyn Backend>> {
        if selector != AUTO_SELECTOR {
            return self.get(selector).ok_or_else(|| ServiceError::UnknownBackend {
                name: selector.to_string(),
            });
        }

        if let Some(backend) = detected.and_then(|id| self.get(id)) {
            return Ok(backend);
        }

        debug!(
            detected = ?detected,
            fallback = self.fallback,
            "No backend for detected service manager, using fallback"
        );

        self.get(self.fallback).ok_or_else(|| ServiceError::UnknownBackend {
            name: self.fallback.to_string(),
        })
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
