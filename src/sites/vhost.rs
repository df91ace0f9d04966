//! Apache virtual host files

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{LampError, Result};
use crate::exec::{CommandRunner, Invocation, run_mutation};

/// A virtual host found in `sites-available`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VHost {
    pub domain: String,
    pub doc_root: Option<String>,
    pub conf_path: PathBuf,
    /// The config redirects or rewrites to an http(s) URL, as certbot leaves it
    pub ssl: bool,
}

/// Plain HTTP virtual host for `domain` serving `doc_root`
pub fn render_vhost(domain: &str, doc_root: &Path) -> String {
    let root = doc_root.display();
    format!(
        "<VirtualHost *:80>
    ServerName {domain}
    DocumentRoot {root}
    <Directory {root}>
        AllowOverride All
        Require all granted
    </Directory>
    ErrorLog ${{APACHE_LOG_DIR}}/{domain}_error.log
    CustomLog ${{APACHE_LOG_DIR}}/{domain}_access.log combined
</VirtualHost>
"
    )
}

pub fn conf_path(sites_available: &Path, domain: &str) -> PathBuf {
    sites_available.join(format!("{domain}.conf"))
}

/// Write the vhost file for `domain`, returning its path
pub fn write_vhost(
    sites_available: &Path,
    domain: &str,
    doc_root: &Path,
    dry_run: bool,
) -> Result<PathBuf> {
    let path = conf_path(sites_available, domain);
    info!(path = %path.display(), dry_run, "create_virtualhost");
    if dry_run {
        return Ok(path);
    }
    fs::write(&path, render_vhost(domain, doc_root)).map_err(|e| LampError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(path)
}

/// Delete the vhost file; a missing file is only logged
pub fn remove_vhost(sites_available: &Path, domain: &str, dry_run: bool) -> Result<()> {
    let path = conf_path(sites_available, domain);
    info!(path = %path.display(), dry_run, "remove_virtualhost");
    if dry_run {
        return Ok(());
    }
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "virtual host not found");
            Ok(())
        }
        Err(e) => Err(LampError::FileWriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

fn reload_apache(runner: &dyn CommandRunner, dry_run: bool) -> Result<()> {
    run_mutation(
        runner,
        &Invocation::new(["systemctl", "reload", "apache2"]),
        dry_run,
    )
    .map(|_| ())
}

/// `a2ensite` followed by an Apache reload
pub fn enable_site(runner: &dyn CommandRunner, domain: &str, dry_run: bool) -> Result<()> {
    run_mutation(runner, &Invocation::new(["a2ensite", domain]), dry_run)?;
    reload_apache(runner, dry_run)
}

/// `a2dissite` followed by an Apache reload
pub fn disable_site(runner: &dyn CommandRunner, domain: &str, dry_run: bool) -> Result<()> {
    run_mutation(runner, &Invocation::new(["a2dissite", domain]), dry_run)?;
    reload_apache(runner, dry_run)
}

fn directive<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(key), Some(value)) if key.eq_ignore_ascii_case(name) => Some(value),
        _ => None,
    }
}

/// First `ServerName`, first `DocumentRoot`, and whether any line names an http(s) URL
pub fn parse_vhost(content: &str) -> (Option<String>, Option<String>, bool) {
    let mut domain = None;
    let mut doc_root = None;
    let mut ssl = false;
    for line in content.lines() {
        if domain.is_none() {
            domain = directive(line, "ServerName").map(str::to_string);
        }
        if doc_root.is_none() {
            doc_root = directive(line, "DocumentRoot").map(str::to_string);
        }
        let lower = line.to_ascii_lowercase();
        ssl = ssl || lower.contains("http://") || lower.contains("https://");
    }
    (domain, doc_root, ssl)
}

/// Virtual hosts under `sites_available`, sorted by file name
///
/// Unreadable files and files without `ServerName` are skipped; when two
/// files declare the same domain the first one wins.
pub fn list_vhosts(sites_available: &Path) -> Vec<VHost> {
    let mut vhosts: Vec<VHost> = Vec::new();
    let files = WalkDir::new(sites_available)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "conf"));

    for entry in files {
        let Ok(content) = fs::read(entry.path()) else {
            debug!(path = %entry.path().display(), "unreadable vhost skipped");
            continue;
        };
        let (domain, doc_root, ssl) = parse_vhost(&String::from_utf8_lossy(&content));
        let Some(domain) = domain else {
            continue;
        };
        if vhosts.iter().any(|v| v.domain == domain) {
            continue;
        }
        vhosts.push(VHost {
            domain,
            doc_root,
            conf_path: entry.into_path(),
            ssl,
        });
    }
    vhosts
}
