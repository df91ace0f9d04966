//! WordPress download, configuration and file permissions

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{LampError, Result};
use crate::exec::{CommandRunner, Invocation, run_mutation};

pub const WORDPRESS_URL: &str = "https://wordpress.org/latest.tar.gz";
pub const WEB_OWNER: &str = "www-data";

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

#[allow(clippy::expect_used)]
fn define_re(key: &str) -> Regex {
    Regex::new(&format!(
        r#"define\(\s*['"]{key}['"]\s*,\s*['"]([^'"]+)['"]\s*\)"#
    ))
    .expect("define pattern is valid")
}

static DB_NAME_RE: LazyLock<Regex> = LazyLock::new(|| define_re("DB_NAME"));
static DB_USER_RE: LazyLock<Regex> = LazyLock::new(|| define_re("DB_USER"));
static DB_HOST_RE: LazyLock<Regex> = LazyLock::new(|| define_re("DB_HOST"));
#[allow(clippy::expect_used)]
static TABLE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*\$table_prefix\s*=\s*['"]([^'"]+)['"];"#)
        .expect("table prefix pattern is valid")
});

/// Database settings found in a `wp-config.php`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WpConfig {
    pub name: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub table_prefix: Option<String>,
}

impl WpConfig {
    /// `DB_USER@DB_HOST` with any port or socket suffix dropped
    pub fn account(&self) -> Option<String> {
        let user = self.user.as_deref()?;
        let host = self
            .host
            .as_deref()
            .and_then(|host| host.split(':').next())
            .filter(|host| !host.is_empty())
            .unwrap_or("localhost");
        Some(format!("{user}@{host}"))
    }
}

pub fn parse_wp_config_str(content: &str) -> WpConfig {
    let capture = |re: &Regex| {
        re.captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };
    WpConfig {
        name: capture(&DB_NAME_RE),
        user: capture(&DB_USER_RE),
        host: capture(&DB_HOST_RE),
        table_prefix: capture(&TABLE_PREFIX_RE),
    }
}

/// `<doc_root>/wp-config.php`, if present and readable
pub fn parse_wp_config(doc_root: &Path) -> Option<WpConfig> {
    let content = fs::read(doc_root.join("wp-config.php")).ok()?;
    Some(parse_wp_config_str(&String::from_utf8_lossy(&content)))
}

fn archive_path() -> PathBuf {
    std::env::temp_dir().join(format!("wordpress-{}.tar.gz", std::process::id()))
}

/// Fetch the latest release and unpack it directly into `doc_root`
pub fn download_wordpress(runner: &dyn CommandRunner, doc_root: &Path, dry_run: bool) -> Result<()> {
    let archive = archive_path();
    let archive_arg = archive.to_string_lossy().into_owned();
    let target = doc_root.to_string_lossy().into_owned();

    run_mutation(
        runner,
        &Invocation::new(["wget", "-q", WORDPRESS_URL, "-O", &archive_arg]),
        dry_run,
    )?;
    let extracted = run_mutation(
        runner,
        &Invocation::new(["tar", "-xzf", &archive_arg, "-C", &target, "--strip-components=1"]),
        dry_run,
    );
    run_mutation(runner, &Invocation::new(["rm", "-f", &archive_arg]), dry_run)?;
    extracted.map(|_| ())
}

/// Fill the sample config's placeholders with the site's credentials
pub fn render_wp_config(sample: &str, db_name: &str, db_user: &str, db_password: &str) -> String {
    sample
        .replace("database_name_here", db_name)
        .replace("username_here", db_user)
        .replace("password_here", db_password)
}

fn write_wp_config(doc_root: &Path, db_name: &str, db_user: &str, db_password: &str) -> Result<()> {
    let sample_path = doc_root.join("wp-config-sample.php");
    let config_path = doc_root.join("wp-config.php");
    let sample = fs::read_to_string(&sample_path).map_err(|e| LampError::FileReadFailed {
        path: sample_path.display().to_string(),
        reason: e.to_string(),
    })?;
    fs::write(
        &config_path,
        render_wp_config(&sample, db_name, db_user, db_password),
    )
    .map_err(|e| LampError::FileWriteFailed {
        path: config_path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Download, configure and lock down WordPress in `doc_root`
///
/// An existing `wp-config.php` means a previous install: only the
/// permissions are reapplied. Returns whether a fresh copy was installed.
pub fn install_wordpress(
    runner: &dyn CommandRunner,
    doc_root: &Path,
    db_name: &str,
    db_user: &str,
    db_password: &str,
    dry_run: bool,
) -> Result<bool> {
    let installed = if doc_root.join("wp-config.php").exists() {
        warn!(doc_root = %doc_root.display(), "WordPress appears to be installed, skipping download");
        false
    } else {
        download_wordpress(runner, doc_root, dry_run)?;
        info!(path = %doc_root.join("wp-config.php").display(), dry_run, "configure_wp");
        if !dry_run {
            write_wp_config(doc_root, db_name, db_user, db_password)?;
        }
        true
    };
    set_permissions(runner, doc_root, WEB_OWNER, dry_run)?;
    Ok(installed)
}

/// `chown -R owner:owner`, then 755 on directories and 644 on files
pub fn set_permissions(
    runner: &dyn CommandRunner,
    doc_root: &Path,
    owner: &str,
    dry_run: bool,
) -> Result<()> {
    info!(doc_root = %doc_root.display(), owner, dry_run, "set_wp_permissions");
    let target = doc_root.to_string_lossy().into_owned();
    run_mutation(
        runner,
        &Invocation::new(["chown", "-R", &format!("{owner}:{owner}"), &target]),
        dry_run,
    )?;
    if dry_run {
        return Ok(());
    }
    apply_modes(doc_root)
}

fn apply_modes(doc_root: &Path) -> Result<()> {
    for entry in WalkDir::new(doc_root).follow_links(false) {
        let entry = entry.map_err(|e| LampError::IoError {
            message: e.to_string(),
        })?;
        let mode = match entry.file_type() {
            ft if ft.is_dir() => DIR_MODE,
            ft if ft.is_file() => FILE_MODE,
            _ => continue,
        };
        fs::set_permissions(entry.path(), fs::Permissions::from_mode(mode)).map_err(|e| {
            LampError::FileWriteFailed {
                path: entry.path().display().to_string(),
                reason: e.to_string(),
            }
        })?;
    }
    Ok(())
}
