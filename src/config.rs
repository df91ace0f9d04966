//! Runtime configuration
//!
//! Settings come from an optional YAML file. Every key has a default that
//! matches a stock Ubuntu host, so the file only needs the keys an operator
//! wants to change:
//!
//! ```yaml
//! wait_apt_lock: 300
//! lock_probes: [lsof, lslocks, fuser]
//! supported_releases: ["22.04", "24.04"]
//! ```
//!
//! Lookup order: `--config`/`LAMPKIT_CONFIG`, then
//! `/etc/lampkitctl/config.yaml`, then `$XDG_CONFIG_HOME/lampkitctl/config.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LampError, Result};
use crate::locks::LockProbe;

/// System-wide configuration file
pub const SYSTEM_CONFIG: &str = "/etc/lampkitctl/config.yaml";

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Package-manager lock files watched for contention
    pub lock_paths: Vec<String>,
    /// Lock inspection tools, tried in order
    pub lock_probes: Vec<LockProbe>,
    /// Poll interval while waiting for the lock
    pub lock_tick_ms: u64,
    /// Default for `install-lamp --wait-apt-lock`
    pub wait_apt_lock: i64,
    /// Ubuntu `VERSION_ID`s accepted by the OS preflight check
    pub supported_releases: Vec<String>,
    pub os_release: PathBuf,
    pub apache_dir: PathBuf,
    pub sites_available: PathBuf,
    pub sites_enabled: PathBuf,
    pub hosts_file: PathBuf,
    pub web_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lock_paths: vec![
                "/var/lib/dpkg/lock-frontend".to_string(),
                "/var/lib/dpkg/lock".to_string(),
                "/var/lib/apt/lists/lock".to_string(),
            ],
            lock_probes: vec![LockProbe::Lslocks, LockProbe::Lsof, LockProbe::Fuser],
            lock_tick_ms: 1000,
            wait_apt_lock: 120,
            supported_releases: vec![
                "20.04".to_string(),
                "22.04".to_string(),
                "24.04".to_string(),
            ],
            os_release: PathBuf::from("/etc/os-release"),
            apache_dir: PathBuf::from("/etc/apache2"),
            sites_available: PathBuf::from("/etc/apache2/sites-available"),
            sites_enabled: PathBuf::from("/etc/apache2/sites-enabled"),
            hosts_file: PathBuf::from("/etc/hosts"),
            web_root: PathBuf::from("/var/www"),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when no file exists
    ///
    /// An explicitly requested file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for candidate in default_locations() {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Parse a YAML settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|err| LampError::ConfigReadFailed {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;
        let settings = Self::from_yaml(&content).map_err(|err| match err {
            LampError::ConfigParseFailed { reason, .. } => LampError::ConfigParseFailed {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(settings)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.lock_probes.is_empty() {
            return Err(LampError::ConfigParseFailed {
                path: "unknown".to_string(),
                reason: "lock_probes must name at least one probe".to_string(),
            });
        }
        if self.lock_tick_ms == 0 {
            return Err(LampError::ConfigParseFailed {
                path: "unknown".to_string(),
                reason: "lock_tick_ms must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Path of the vhost file for `domain` under sites-available
    pub fn vhost_available(&self, domain: &str) -> PathBuf {
        self.sites_available.join(format!("{domain}.conf"))
    }

    /// Path of the vhost link for `domain` under sites-enabled
    pub fn vhost_enabled(&self, domain: &str) -> PathBuf {
        self.sites_enabled.join(format!("{domain}.conf"))
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(SYSTEM_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("lampkitctl").join("config.yaml"));
    }
    locations
}
