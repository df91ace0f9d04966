//! Read-only package database queries

use tracing::debug;

use crate::error::{LampError, Result};
use crate::exec::{CommandRunner, Invocation, capture};

/// Query capability over the apt index and the dpkg database
pub trait PackageIndex {
    /// Raw `apt-cache policy` output for `package`
    fn policy(&self, package: &str) -> Result<String>;

    /// Whether dpkg reports `package` as installed
    fn is_installed(&self, package: &str) -> bool;

    /// `mysql --version` output, if a client binary is present
    fn server_version(&self) -> Option<String>;

    /// Whether the index offers an installation candidate for `package`
    fn has_candidate(&self, package: &str) -> bool {
        self.policy(package)
            .map(|out| super::status::parse_policy(&out).candidate.is_some())
            .unwrap_or(false)
    }

    /// The `Candidate:` line for `package`, used in diagnostics
    fn candidate_line(&self, package: &str) -> String {
        match self.policy(package) {
            Ok(out) => out
                .lines()
                .map(str::trim)
                .find(|line| line.starts_with("Candidate:"))
                .map_or_else(|| "Candidate: (none)".to_string(), str::to_string),
            Err(_) => "Candidate: (error)".to_string(),
        }
    }
}

/// [`PackageIndex`] backed by `apt-cache` and `dpkg`
pub struct AptIndex<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> AptIndex<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }
}

impl PackageIndex for AptIndex<'_> {
    fn policy(&self, package: &str) -> Result<String> {
        // Field names are localised; force the C locale.
        let invocation = Invocation::new(["apt-cache", "policy", package]).env("LC_ALL", "C");
        let output = self
            .runner
            .run(&invocation)
            .map_err(|err| LampError::CommandSpawnFailed {
                program: "apt-cache".to_string(),
                reason: err.to_string(),
            })?;
        if !output.success() {
            return Err(LampError::CommandFailed {
                command: invocation.display(),
                status: output.status_text(),
                output: output.combined(),
            });
        }
        Ok(output.stdout)
    }

    fn is_installed(&self, package: &str) -> bool {
        let invocation = Invocation::new(["dpkg", "-s", package]).env("LC_ALL", "C");
        let installed = capture(self.runner, &invocation).is_some_and(|output| {
            output.success()
                && output
                    .stdout
                    .lines()
                    .any(|line| line.starts_with("Status:") && line.ends_with(" installed"))
        });
        debug!(package, installed, "dpkg status");
        installed
    }

    fn server_version(&self) -> Option<String> {
        capture(self.runner, &Invocation::new(["mysql", "--version"]))
            .filter(crate::exec::CommandOutput::success)
            .map(|output| output.stdout)
    }
}
