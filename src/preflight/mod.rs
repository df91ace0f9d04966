//! Preflight checks
//!
//! Each mutating command declares the environment it needs as a list of
//! [`CheckResult`]s built by [`Preflight::checks_for`]. [`ensure_or_fail`]
//! turns that list into a go/no-go decision:
//! - blocking failures abort (except under dry-run, where they are only shown)
//! - warning failures abort unless an interactive operator confirms

pub mod host;

pub use host::{HostProbe, SystemHost};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::config::Settings;
use crate::error::{LampError, Result};
use crate::prompt::Prompter;

const CONTINUE_PROMPT: &str = "Some prerequisites are missing. Continue anyway?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Blocking,
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub ok: bool,
    pub message: String,
    pub severity: Severity,
}

impl CheckResult {
    pub fn blocking(ok: bool, message: impl Into<String>) -> Self {
        Self {
            ok,
            message: message.into(),
            severity: Severity::Blocking,
        }
    }

    pub fn warning(ok: bool, message: impl Into<String>) -> Self {
        Self {
            ok,
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// Operations that carry a preflight check list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    InstallLamp,
    CreateSite,
    UninstallSite,
    WpPermissions,
    GenerateSsl,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::InstallLamp => "install-lamp",
            Operation::CreateSite => "create-site",
            Operation::UninstallSite => "uninstall-site",
            Operation::WpPermissions => "wp-permissions",
            Operation::GenerateSsl => "generate-ssl",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = LampError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "install-lamp" => Ok(Operation::InstallLamp),
            "create-site" => Ok(Operation::CreateSite),
            "uninstall-site" => Ok(Operation::UninstallSite),
            "wp-permissions" => Ok(Operation::WpPermissions),
            "generate-ssl" => Ok(Operation::GenerateSsl),
            other => Err(LampError::invalid("operation", other)),
        }
    }
}

/// Per-invocation inputs some checks depend on
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    pub domain: Option<String>,
    pub doc_root: Option<PathBuf>,
}

impl CheckContext {
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..Self::default()
        }
    }

    pub fn for_doc_root(doc_root: impl Into<PathBuf>) -> Self {
        Self {
            doc_root: Some(doc_root.into()),
            ..Self::default()
        }
    }
}

/// Registry of the check lists, evaluated against a [`HostProbe`]
pub struct Preflight<'a> {
    host: &'a dyn HostProbe,
    settings: &'a Settings,
}

impl<'a> Preflight<'a> {
    pub fn new(host: &'a dyn HostProbe, settings: &'a Settings) -> Self {
        Self { host, settings }
    }

    /// Evaluate the checks `operation` needs
    pub fn checks_for(&self, operation: Operation, ctx: &CheckContext) -> Vec<CheckResult> {
        let results = match operation {
            Operation::InstallLamp => vec![
                self.is_root_or_sudo(),
                self.has_cmd("apt", "apt not found. Install apt package manager."),
                self.has_cmd("systemctl", "systemctl not found. Install systemd."),
                self.is_supported_os(),
            ],
            Operation::CreateSite => vec![
                self.apache_installed(),
                self.apache_paths_present(),
                self.has_cmd("mysql", "MySQL not installed. Run: install-lamp."),
                self.has_cmd("php", "PHP not installed. Run: install-lamp."),
                self.can_write(&self.settings.hosts_file),
                self.can_write(&self.settings.web_root),
            ],
            Operation::UninstallSite => vec![
                self.apache_installed(),
                self.apache_paths_present(),
                self.has_cmd("mysql", "MySQL not installed. Run: install-lamp."),
                self.can_write(&self.settings.hosts_file),
                self.can_write(&self.settings.web_root),
            ],
            Operation::WpPermissions => {
                let doc_root = ctx.doc_root.clone().unwrap_or_default();
                vec![
                    self.apache_installed(),
                    self.apache_paths_present(),
                    self.path_exists(&doc_root),
                    self.is_wordpress_dir(&doc_root),
                ]
            }
            Operation::GenerateSsl => {
                let domain = ctx.domain.as_deref().unwrap_or_default();
                vec![
                    self.apache_installed(),
                    self.apache_paths_present(),
                    CheckResult::blocking(
                        self.host
                            .path_exists(&self.settings.vhost_available(domain)),
                        format!("Virtual host {domain} missing. Create the site first."),
                    ),
                    CheckResult::blocking(
                        self.host.path_exists(&self.settings.vhost_enabled(domain)),
                        format!(
                            "Virtual host {domain} not enabled. Run: a2ensite {domain} && systemctl reload apache2."
                        ),
                    ),
                    self.has_cmd(
                        "certbot",
                        "certbot not installed. Run: apt install certbot python3-certbot-apache.",
                    ),
                ]
            }
        };
        debug!(
            operation = %operation,
            failed = results.iter().filter(|r| !r.ok).count(),
            "preflight evaluated"
        );
        results
    }

    /// Like [`Preflight::checks_for`], keyed by command name
    ///
    /// Names without a check list yield no checks.
    pub fn checks_for_name(&self, name: &str, ctx: &CheckContext) -> Vec<CheckResult> {
        name.parse::<Operation>()
            .map(|operation| self.checks_for(operation, ctx))
            .unwrap_or_default()
    }

    fn is_root_or_sudo(&self) -> CheckResult {
        CheckResult::blocking(
            self.host.is_root(),
            "Root privileges required. Run with sudo.",
        )
    }

    fn has_cmd(&self, name: &str, message: &str) -> CheckResult {
        CheckResult::blocking(self.host.has_command(name), message)
    }

    fn apache_installed(&self) -> CheckResult {
        self.has_cmd("apache2", "Apache not installed. Run: install-lamp.")
    }

    fn is_supported_os(&self) -> CheckResult {
        let content = self.host.read_os_release(&self.settings.os_release);
        let (id, version) = parse_os_release(&content);
        let ok = id.as_deref() == Some("ubuntu")
            && version.is_some_and(|v| self.settings.supported_releases.contains(&v));
        CheckResult::blocking(
            ok,
            format!(
                "Unsupported OS. Supported: Ubuntu {}.",
                self.settings.supported_releases.join("/")
            ),
        )
    }

    fn apache_paths_present(&self) -> CheckResult {
        CheckResult::blocking(
            self.host.path_exists(&self.settings.apache_dir)
                && self.host.path_exists(&self.settings.sites_available),
            "Apache paths missing. Run: install-lamp.",
        )
    }

    fn can_write(&self, path: &Path) -> CheckResult {
        CheckResult::blocking(
            self.host.can_write(path),
            format!("Cannot write {}. Check permissions.", path.display()),
        )
    }

    fn path_exists(&self, path: &Path) -> CheckResult {
        CheckResult::blocking(
            self.host.path_exists(path),
            format!("{} does not exist.", path.display()),
        )
    }

    fn is_wordpress_dir(&self, path: &Path) -> CheckResult {
        let ok = ["wp-config.php", "wp-content", "wp-includes"]
            .iter()
            .all(|entry| self.host.path_exists(&path.join(entry)));
        CheckResult::blocking(
            ok,
            format!("{} is not a WordPress directory.", path.display()),
        )
    }
}

/// `ID` and `VERSION_ID` of an os-release file, quotes stripped
pub fn parse_os_release(content: &str) -> (Option<String>, Option<String>) {
    let field = |key: &str| {
        content
            .lines()
            .find_map(|line| line.strip_prefix(key))
            .map(|value| value.trim().trim_matches('"').to_string())
    };
    (field("ID="), field("VERSION_ID="))
}

/// Human-readable summary of failed checks
pub fn summarize(failures: &[&CheckResult]) -> String {
    let mut lines = vec!["Preflight failed:".to_string()];
    lines.extend(failures.iter().map(|r| format!("- {}", r.message)));
    lines.join("\n")
}

/// Decide whether an operation may proceed given its check results
///
/// Summaries are written to stderr. Under `dry_run` blocking failures are
/// reported but do not abort.
pub fn ensure_or_fail(
    results: &[CheckResult],
    interactive: bool,
    dry_run: bool,
    prompter: &dyn Prompter,
) -> Result<()> {
    let (blocking, warnings): (Vec<&CheckResult>, Vec<&CheckResult>) = results
        .iter()
        .filter(|r| !r.ok)
        .partition(|r| r.severity == Severity::Blocking);

    let messages = |list: &[&CheckResult]| -> Vec<String> {
        list.iter().map(|r| r.message.clone()).collect()
    };

    if !blocking.is_empty() {
        eprintln!("{}", summarize(&blocking));
        if !dry_run {
            return Err(LampError::PreflightBlocked {
                failures: messages(&blocking),
            });
        }
    }

    if !warnings.is_empty() {
        eprintln!("{}", summarize(&warnings));
        let proceed = interactive && prompter.confirm(CONTINUE_PROMPT, false)?;
        if !proceed {
            return Err(LampError::PreflightWarned {
                failures: messages(&warnings),
            });
        }
    }

    Ok(())
}
