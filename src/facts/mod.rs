//! Host facts.
//!
//! The engine only asks one question of the host: which service manager is
//! running it. The answer comes from a [`FactProvider`] so callers can use
//! filesystem probing, a configured override, or a fixed value in tests.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Reports which service manager a host uses.
pub trait FactProvider: Send + Sync {
    /// Backend identifier of the detected manager, or `None` if detection
    /// failed.
    fn detected_service_manager(&self) -> Option<String>;
}

/// A fixed answer.
#[derive(Debug, Clone, Default)]
pub struct StaticFacts {
    service_mgr: Option<String>,
}

impl StaticFacts {
    pub fn new(service_mgr: Option<&str>) -> Self {
        Self {
            service_mgr: service_mgr.map(str::to_string),
        }
    }
}

impl FactProvider for StaticFacts {
    fn detected_service_manager(&self) -> Option<String> {
        self.service_mgr.clone()
    }
}

/// Detects the service manager from well-known paths under a root.
#[derive(Debug, Clone)]
pub struct HostFacts {
    root: PathBuf,
}

impl HostFacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn is_dir(&self, rel: &str) -> bool {
        self.root.join(rel).is_dir()
    }

    fn exists(&self, rel: &str) -> bool {
        self.root.join(rel).exists()
    }

    /// The root being probed.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for HostFacts {
    fn default() -> Self {
        Self::new("/")
    }
}

impl FactProvider for HostFacts {
    fn detected_service_manager(&self) -> Option<String> {
        // Strongest runtime signals first; a bare /etc/init.d is present on
        // most systems, so it is checked last.
        let detected = if self.is_dir("run/systemd/system") {
            Some("systemd")
        } else if self.is_dir("run/openrc") || self.exists("sbin/openrc-run") {
            Some("openrc")
        } else if self.exists("sbin/initctl") {
            Some("upstart")
        } else if self.exists("usr/sbin/svcadm") {
            Some("smf")
        } else if self.is_dir("etc/rc.d") && self.exists("etc/rc.conf") {
            Some("bsdinit")
        } else if self.is_dir("etc/init.d") {
            Some("sysvinit")
        } else {
            None
        };

        debug!(root = %self.root.display(), detected = ?detected, "Probed service manager");
        detected.map(str::to_string)
    }
}
