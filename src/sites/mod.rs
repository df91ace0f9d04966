//! Apache sites: virtual hosts, hosts-file entries and document roots
//!
//! - [`vhost`]: render, write, enable and list virtual host files
//! - [`hosts`]: idempotent `/etc/hosts` maintenance

pub mod hosts;
pub mod vhost;

pub use hosts::{LOOPBACK, add_host_entry, remove_host_entry};
pub use vhost::{VHost, disable_site, enable_site, list_vhosts, remove_vhost, write_vhost};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{LampError, Result};

/// `<web_root>/<domain>`
pub fn default_doc_root(web_root: &Path, domain: &str) -> PathBuf {
    web_root.join(domain)
}

pub fn create_web_directory(path: &Path, dry_run: bool) -> Result<()> {
    info!(path = %path.display(), dry_run, "create_web_directory");
    if dry_run {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| LampError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Recursively delete a document root
///
/// Refuses relative paths, the filesystem root and `web_root` itself.
pub fn remove_web_directory(path: &Path, web_root: &Path, dry_run: bool) -> Result<()> {
    if !path.is_absolute() || path.parent().is_none() || path == web_root {
        return Err(LampError::invalid("document root", path.display().to_string()));
    }
    info!(path = %path.display(), dry_run, "remove_web_directory");
    if dry_run || !path.exists() {
        return Ok(());
    }
    fs::remove_dir_all(path).map_err(|e| LampError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
