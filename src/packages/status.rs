//! Three-way classification of a package set against the live index

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::index::PackageIndex;

/// Versions dpkg has installed and apt would install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyVersions {
    pub installed: Option<String>,
    pub candidate: Option<String>,
}

/// Where a single package stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    Missing,
    Upgradable,
    UpToDate,
}

/// Partition of a package set into missing, upgradable and up-to-date
///
/// The three lists are disjoint, keep the input order, and together hold
/// every distinct input name exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PkgStatus {
    pub missing: Vec<String>,
    pub upgradable: Vec<String>,
    pub uptodate: Vec<String>,
}

impl PkgStatus {
    pub fn len(&self) -> usize {
        self.missing.len() + self.upgradable.len() + self.uptodate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, name: String, state: PackageState) {
        match state {
            PackageState::Missing => self.missing.push(name),
            PackageState::Upgradable => self.upgradable.push(name),
            PackageState::UpToDate => self.uptodate.push(name),
        }
    }
}

/// Values apt prints in place of a version
const NO_VERSION: [&str; 2] = ["(none)", ""];

/// Extract the `Installed:` and `Candidate:` fields of `apt-cache policy`
pub fn parse_policy(out: &str) -> PolicyVersions {
    let field = |name: &str| {
        out.lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix(name))
            .map(str::trim)
            .filter(|value| !NO_VERSION.contains(value))
            .map(str::to_string)
    };
    PolicyVersions {
        installed: field("Installed:"),
        candidate: field("Candidate:"),
    }
}

/// Classify one package from its policy versions
pub fn classify(versions: &PolicyVersions) -> PackageState {
    match (&versions.installed, &versions.candidate) {
        (None, _) => PackageState::Missing,
        (Some(installed), Some(candidate)) if installed != candidate => PackageState::Upgradable,
        _ => PackageState::UpToDate,
    }
}

/// Classify every name in `names` against the index
///
/// A package whose query fails is reported as missing so it gets
/// (re)installed rather than silently skipped. Repeated names are counted
/// once.
pub fn detect_pkg_status<S: AsRef<str>>(index: &dyn PackageIndex, names: &[S]) -> PkgStatus {
    let mut status = PkgStatus::default();
    let mut seen = HashSet::new();

    for name in names.iter().map(AsRef::as_ref) {
        if !seen.insert(name) {
            continue;
        }
        let state = match index.policy(name) {
            Ok(out) => classify(&parse_policy(&out)),
            Err(err) => {
                warn!(package = name, error = %err, "package query failed, treating as missing");
                PackageState::Missing
            }
        };
        debug!(package = name, ?state, "classified package");
        status.push(name.to_string(), state);
    }

    status
}
