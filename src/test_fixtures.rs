//! Test fixtures: in-memory fakes of every collaborator trait.
//!
//! The production code talks to the host only through [`CommandRunner`],
//! [`DetectLock`], [`PackageIndex`], [`PackageManager`], [`HostProbe`] and
//! [`Prompter`]. Each fake here is scripted up front with builder calls and
//! records what it was asked, so tests can assert on both outcome and
//! interaction:
//!
//! ```ignore
//! let runner = FakeRunner::new().on(["apt-cache", "policy"], CommandOutput::ok("..."));
//! let index = AptIndex::new(&runner);
//! // ...
//! assert_eq!(runner.calls().len(), 1);
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::Settings;
use crate::error::{LampError, Result, classify_apt_error};
use crate::exec::{CommandOutput, CommandRunner, Invocation};
use crate::locks::{DetectLock, LockInfo};
use crate::packages::{MutationMode, PackageIndex, PackageManager};
use crate::preflight::HostProbe;
use crate::prompt::Prompter;

/// Create a temp directory that cleans up on drop.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Apache, hosts-file and web-root layout inside a temp directory
pub struct SiteLayout {
    _temp: TempDir,
    pub settings: Settings,
}

impl SiteLayout {
    pub fn new() -> Self {
        let temp = create_temp_dir();
        let settings = Settings {
            apache_dir: temp.path().join("apache2"),
            sites_available: temp.path().join("apache2/sites-available"),
            sites_enabled: temp.path().join("apache2/sites-enabled"),
            hosts_file: temp.path().join("hosts"),
            web_root: temp.path().join("www"),
            ..Settings::default()
        };
        std::fs::create_dir_all(&settings.sites_available).unwrap();
        std::fs::create_dir_all(&settings.sites_enabled).unwrap();
        std::fs::create_dir_all(&settings.web_root).unwrap();
        std::fs::write(&settings.hosts_file, "127.0.0.1 localhost\n").unwrap();
        Self {
            _temp: temp,
            settings,
        }
    }

    /// Root host with the stack installed and every layout path in place
    pub fn host(&self) -> FakeHost {
        let s = &self.settings;
        let path = |p: &Path| p.to_str().unwrap().to_string();
        let (apache, available, hosts, web) = (
            path(&s.apache_dir),
            path(&s.sites_available),
            path(&s.hosts_file),
            path(&s.web_root),
        );
        FakeHost::new()
            .root(true)
            .commands(&["apache2", "mysql", "php", "certbot"])
            .paths(&[apache.as_str(), available.as_str()])
            .writable(&[hosts.as_str(), web.as_str()])
    }
}

/// Scripted [`CommandRunner`]: the first rule whose argv prefix matches wins.
///
/// Unmatched commands behave like a missing binary.
#[derive(Default)]
pub struct FakeRunner {
    rules: Vec<(Vec<String>, CommandOutput)>,
    invocations: RefCell<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on<I, S>(mut self, prefix: I, output: CommandOutput) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .push((prefix.into_iter().map(Into::into).collect(), output));
        self
    }

    /// argv of every invocation, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.invocations
            .borrow()
            .iter()
            .map(|inv| inv.argv.clone())
            .collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.invocations.borrow_mut().push(invocation.clone());
        self.rules
            .iter()
            .find(|(prefix, _)| invocation.argv.starts_with(prefix))
            .map(|(_, output)| output.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such program"))
    }
}

/// [`DetectLock`] replaying a fixed sequence; the last snapshot repeats.
pub struct SeqDetector {
    snapshots: Vec<LockInfo>,
    calls: Cell<usize>,
}

impl SeqDetector {
    pub fn new(snapshots: Vec<LockInfo>) -> Self {
        Self {
            snapshots,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl DetectLock for SeqDetector {
    fn detect_lock(&self) -> LockInfo {
        let n = self.calls.get();
        self.calls.set(n + 1);
        self.snapshots
            .get(n)
            .or_else(|| self.snapshots.last())
            .cloned()
            .unwrap_or_default()
    }
}

/// In-memory [`PackageIndex`]; packages without a policy fail to query.
#[derive(Default)]
pub struct FakeIndex {
    policies: BTreeMap<String, String>,
    installed: BTreeSet<String>,
    version: Option<String>,
    calls: RefCell<Vec<String>>,
}

impl FakeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn policy(mut self, package: &str, output: &str) -> Self {
        self.policies.insert(package.to_string(), output.to_string());
        self
    }

    #[must_use]
    pub fn installed(mut self, package: &str) -> Self {
        self.installed.insert(package.to_string());
        self
    }

    #[must_use]
    pub fn version(mut self, banner: &str) -> Self {
        self.version = Some(banner.to_string());
        self
    }

    /// Queries made so far, as `policy:<pkg>`, `dpkg:<pkg>` or `version`
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl PackageIndex for FakeIndex {
    fn policy(&self, package: &str) -> Result<String> {
        self.calls.borrow_mut().push(format!("policy:{package}"));
        self.policies
            .get(package)
            .cloned()
            .ok_or_else(|| LampError::CommandFailed {
                command: format!("apt-cache policy {package}"),
                status: "exit code 100".to_string(),
                output: String::new(),
            })
    }

    fn is_installed(&self, package: &str) -> bool {
        self.calls.borrow_mut().push(format!("dpkg:{package}"));
        self.installed.contains(package)
    }

    fn server_version(&self) -> Option<String> {
        self.calls.borrow_mut().push("version".to_string());
        self.version.clone()
    }
}

/// [`PackageManager`] that records mutations instead of running apt.
#[derive(Default)]
pub struct RecordingManager {
    applies: RefCell<Vec<(Vec<String>, MutationMode)>>,
    dry_runs: RefCell<Vec<bool>>,
    refreshes: Cell<usize>,
    failure: Option<String>,
}

impl RecordingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `apply` fails as if apt printed `output`
    pub fn failing(output: &str) -> Self {
        Self {
            failure: Some(output.to_string()),
            ..Self::default()
        }
    }

    pub fn applies(&self) -> Vec<(Vec<String>, MutationMode)> {
        self.applies.borrow().clone()
    }

    pub fn dry_runs(&self) -> Vec<bool> {
        self.dry_runs.borrow().clone()
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.get()
    }
}

impl PackageManager for RecordingManager {
    fn apply(&self, packages: &[String], mode: MutationMode, dry_run: bool) -> Result<()> {
        self.applies.borrow_mut().push((packages.to_vec(), mode));
        self.dry_runs.borrow_mut().push(dry_run);
        match &self.failure {
            Some(output) => Err(LampError::PackageMutationFailed {
                command: "apt-get install".to_string(),
                cause: classify_apt_error(output),
            }),
            None => Ok(()),
        }
    }

    fn refresh(&self, _dry_run: bool) -> Result<()> {
        self.refreshes.set(self.refreshes.get() + 1);
        Ok(())
    }
}

/// Configurable [`HostProbe`]; nothing exists unless declared.
#[derive(Default, Clone)]
pub struct FakeHost {
    root: bool,
    commands: BTreeSet<String>,
    os_release: String,
    paths: BTreeSet<PathBuf>,
    writable: BTreeSet<PathBuf>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn root(mut self, root: bool) -> Self {
        self.root = root;
        self
    }

    #[must_use]
    pub fn commands(mut self, names: &[&str]) -> Self {
        self.commands.extend(names.iter().map(|n| (*n).to_string()));
        self
    }

    #[must_use]
    pub fn without_command(mut self, name: &str) -> Self {
        self.commands.remove(name);
        self
    }

    #[must_use]
    pub fn os_release(mut self, content: &str) -> Self {
        self.os_release = content.to_string();
        self
    }

    #[must_use]
    pub fn paths(mut self, paths: &[&str]) -> Self {
        self.paths.extend(paths.iter().map(PathBuf::from));
        self
    }

    #[must_use]
    pub fn writable(mut self, paths: &[&str]) -> Self {
        self.writable.extend(paths.iter().map(PathBuf::from));
        self
    }

    #[must_use]
    pub fn read_only(mut self, path: &str) -> Self {
        self.writable.remove(Path::new(path));
        self
    }

}

impl HostProbe for FakeHost {
    fn is_root(&self) -> bool {
        self.root
    }

    fn has_command(&self, name: &str) -> bool {
        self.commands.contains(name)
    }

    fn read_os_release(&self, _path: &Path) -> String {
        self.os_release.clone()
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    fn can_write(&self, path: &Path) -> bool {
        self.writable.contains(path)
    }
}

/// [`Prompter`] answering from queues; an empty queue yields the default.
pub struct ScriptedPrompter {
    interactive: bool,
    confirms: RefCell<VecDeque<bool>>,
    selects: RefCell<VecDeque<usize>>,
    texts: RefCell<VecDeque<String>>,
    passwords: RefCell<VecDeque<String>>,
    asked: RefCell<Vec<String>>,
}

impl Default for ScriptedPrompter {
    fn default() -> Self {
        Self {
            interactive: true,
            confirms: RefCell::default(),
            selects: RefCell::default(),
            texts: RefCell::default(),
            passwords: RefCell::default(),
            asked: RefCell::default(),
        }
    }
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    #[must_use]
    pub fn with_confirm(self, answer: bool) -> Self {
        self.confirms.borrow_mut().push_back(answer);
        self
    }

    #[must_use]
    pub fn with_select(self, index: usize) -> Self {
        self.selects.borrow_mut().push_back(index);
        self
    }

    #[must_use]
    pub fn with_text(self, answer: &str) -> Self {
        self.texts.borrow_mut().push_back(answer.to_string());
        self
    }

    #[must_use]
    pub fn with_password(self, answer: &str) -> Self {
        self.passwords.borrow_mut().push_back(answer.to_string());
        self
    }

    /// Messages of every question asked, in order
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    fn record(&self, message: &str) {
        self.asked.borrow_mut().push(message.to_string());
    }

    fn exhausted(message: &str) -> LampError {
        LampError::PromptFailed {
            message: format!("no scripted answer for: {message}"),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn select(&self, message: &str, options: &[String], default: usize) -> Result<usize> {
        self.record(message);
        let index = self.selects.borrow_mut().pop_front().unwrap_or(default);
        if index >= options.len() {
            return Err(Self::exhausted(message));
        }
        Ok(index)
    }

    fn text(&self, message: &str, default: Option<&str>) -> Result<String> {
        self.record(message);
        self.texts
            .borrow_mut()
            .pop_front()
            .or_else(|| default.map(str::to_string))
            .ok_or_else(|| Self::exhausted(message))
    }

    fn password(&self, message: &str) -> Result<String> {
        self.record(message);
        self.passwords
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Self::exhausted(message))
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        self.record(message);
        Ok(self.confirms.borrow_mut().pop_front().unwrap_or(default))
    }
}
