//! Package mutations through `apt-get`

use tracing::info;

use crate::error::{LampError, Result, classify_apt_error};
use crate::exec::{CommandRunner, Invocation, run_mutation};

/// Kind of mutation applied to a package subset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationMode {
    Install,
    Upgrade,
    Reinstall,
}

impl MutationMode {
    fn flags(self) -> &'static [&'static str] {
        match self {
            MutationMode::Install => &[],
            MutationMode::Upgrade => &["--only-upgrade"],
            MutationMode::Reinstall => &["--reinstall"],
        }
    }
}

/// System package manager capable of mutating installed packages
pub trait PackageManager {
    /// Install, upgrade or reinstall exactly `packages`
    fn apply(&self, packages: &[String], mode: MutationMode, dry_run: bool) -> Result<()>;

    /// Refresh the package index
    fn refresh(&self, dry_run: bool) -> Result<()>;
}

/// [`PackageManager`] backed by `apt-get`
pub struct AptManager<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> AptManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    fn run(&self, invocation: Invocation, dry_run: bool) -> Result<()> {
        let invocation = invocation
            .env("DEBIAN_FRONTEND", "noninteractive")
            .env("LC_ALL", "C");
        run_mutation(self.runner, &invocation, dry_run)
            .map(|_| ())
            .map_err(|err| match err {
                LampError::CommandFailed {
                    command, output, ..
                } => LampError::PackageMutationFailed {
                    command,
                    cause: classify_apt_error(&output),
                },
                other => other,
            })
    }
}

/// argv of an `apt-get install` for `packages` in `mode`
pub fn install_argv(packages: &[String], mode: MutationMode) -> Vec<String> {
    let mut argv: Vec<String> = ["apt-get", "install", "-y", "--no-install-recommends"]
        .iter()
        .chain(mode.flags())
        .map(|s| (*s).to_string())
        .collect();
    argv.extend(packages.iter().cloned());
    argv
}

impl PackageManager for AptManager<'_> {
    fn apply(&self, packages: &[String], mode: MutationMode, dry_run: bool) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        info!(?mode, count = packages.len(), "applying package mutation");
        self.run(Invocation::new(install_argv(packages, mode)), dry_run)
    }

    fn refresh(&self, dry_run: bool) -> Result<()> {
        self.run(Invocation::new(["apt-get", "update"]), dry_run)
    }
}
