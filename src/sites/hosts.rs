//! `/etc/hosts` entries for local sites

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{LampError, Result};

pub const LOOPBACK: &str = "127.0.0.1";

/// Hostnames of a hosts-file line, comments stripped
fn hostnames(line: &str) -> impl Iterator<Item = &str> {
    let data = line.split('#').next().unwrap_or_default();
    data.split_whitespace().skip(1)
}

/// `content` already maps `domain` to some address
pub fn has_entry(content: &str, domain: &str) -> bool {
    content
        .lines()
        .any(|line| hostnames(line).any(|name| name == domain))
}

/// `content` without `domain`, and how many lines mentioned it
///
/// Only whole hostname tokens match, so removing `a.test` leaves
/// `www.a.test` alone. A line left without hostnames is dropped.
pub fn strip_entry(content: &str, domain: &str) -> (String, usize) {
    let mut removed = 0;
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        if !hostnames(line).any(|name| name == domain) {
            out.push_str(line);
            out.push('\n');
            continue;
        }
        removed += 1;
        let remaining: Vec<&str> = hostnames(line).filter(|name| *name != domain).collect();
        if let (Some(address), false) = (line.split_whitespace().next(), remaining.is_empty()) {
            out.push_str(&format!("{address}\t{}\n", remaining.join(" ")));
        }
    }
    (out, removed)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| LampError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn write(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| LampError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Map `domain` to `ip`; returns false when an entry already existed
pub fn add_host_entry(path: &Path, domain: &str, ip: &str, dry_run: bool) -> Result<bool> {
    let mut content = if path.exists() {
        read(path)?
    } else {
        String::new()
    };
    if has_entry(&content, domain) {
        info!(domain, "hosts entry already present");
        return Ok(false);
    }

    info!(entry = %format!("{ip} {domain}"), dry_run, "add_host_entry");
    if dry_run {
        return Ok(true);
    }
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&format!("{ip} {domain}\n"));
    write(path, &content)?;
    Ok(true)
}

/// Remove `domain` from the hosts file, returning the number of lines touched
pub fn remove_host_entry(path: &Path, domain: &str, dry_run: bool) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let (content, removed) = strip_entry(&read(path)?, domain);
    info!(domain, removed, dry_run, "remove_host_entry");
    if removed > 0 && !dry_run {
        write(path, &content)?;
    }
    Ok(removed)
}
