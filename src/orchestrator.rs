//! Install-or-update of the whole LAMP stack
//!
//! One run walks a fixed sequence and never reorders it:
//! lock wait, preflight, engine resolution, index refresh, classification,
//! and finally exactly one of install / upgrade / reinstall-offer.
//!
//! Every collaborator is injected, so the flow is exercised in tests
//! without touching apt.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{LampError, Result};
use crate::locks::{DetectLock, LockInfo, LockWait, wait_for_lock};
use crate::packages::{
    Engine, EngineChoice, MutationMode, PackageIndex, PackageManager, PkgStatus,
    detect_pkg_status, lamp_packages, resolve_engine,
};
use crate::preflight::{CheckContext, Operation, Preflight, ensure_or_fail};
use crate::progress::LockWaitDisplay;
use crate::prompt::Prompter;

/// Knobs of one install-or-update run
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub lock_wait: LockWait,
    pub tick: Duration,
    pub dry_run: bool,
    /// Answer yes to install and upgrade confirmations
    pub assume_yes: bool,
    /// Reinstall everything when nothing is missing or upgradable
    pub force_reinstall: bool,
    /// Ask before installing missing packages
    pub confirm_install: bool,
    /// Run `apt-get update` before classifying
    pub refresh: bool,
    pub show_progress: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            lock_wait: LockWait::Wait(Duration::from_secs(120)),
            tick: Duration::from_secs(1),
            dry_run: false,
            assume_yes: false,
            force_reinstall: false,
            confirm_install: false,
            refresh: true,
            show_progress: false,
        }
    }
}

/// Remediation chosen for a classified package set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Install(Vec<String>),
    Upgrade(Vec<String>),
    UpToDate,
}

/// Pick the single remediation for `status`; missing beats upgradable
pub fn decide_action(status: &PkgStatus) -> Action {
    if !status.missing.is_empty() {
        Action::Install(status.missing.clone())
    } else if !status.upgradable.is_empty() {
        Action::Upgrade(status.upgradable.clone())
    } else {
        Action::UpToDate
    }
}

pub struct InstallOrchestrator<'a> {
    locks: &'a dyn DetectLock,
    preflight: Preflight<'a>,
    index: &'a dyn PackageIndex,
    manager: &'a dyn PackageManager,
    prompter: &'a dyn Prompter,
    options: InstallOptions,
}

impl<'a> InstallOrchestrator<'a> {
    pub fn new(
        locks: &'a dyn DetectLock,
        preflight: Preflight<'a>,
        index: &'a dyn PackageIndex,
        manager: &'a dyn PackageManager,
        prompter: &'a dyn Prompter,
        options: InstallOptions,
    ) -> Self {
        Self {
            locks,
            preflight,
            index,
            manager,
            prompter,
            options,
        }
    }

    /// Bring the stack to the index's current state
    ///
    /// Returns the engine the stack was resolved to, or `None` when the
    /// operator declined the proposed change.
    pub fn install_or_update(&self, choice: EngineChoice) -> Result<Option<Engine>> {
        self.acquire_lock()?;

        let checks = self
            .preflight
            .checks_for(Operation::InstallLamp, &CheckContext::default());
        ensure_or_fail(
            &checks,
            self.prompter.is_interactive(),
            self.options.dry_run,
            self.prompter,
        )?;

        let engine = resolve_engine(choice, self.index)?;
        let packages = lamp_packages(&engine);

        if self.options.refresh {
            self.manager.refresh(self.options.dry_run)?;
        }

        let status = detect_pkg_status(self.index, &packages);
        info!(
            missing = status.missing.len(),
            upgradable = status.upgradable.len(),
            uptodate = status.uptodate.len(),
            "package status"
        );

        let proceeded = match decide_action(&status) {
            Action::Install(missing) => self.install(&missing)?,
            Action::Upgrade(upgradable) => self.upgrade(&upgradable)?,
            Action::UpToDate => self.offer_reinstall(&packages)?,
        };
        Ok(proceeded.then_some(engine))
    }

    fn acquire_lock(&self) -> Result<()> {
        let info = match self.options.lock_wait {
            LockWait::Skip => {
                info!("package-manager lock check skipped");
                return Ok(());
            }
            LockWait::Check => self.locks.detect_lock(),
            LockWait::Wait(timeout) => self.wait_with_progress(timeout),
        };

        if info.locked {
            warn!(holder = %info.describe(), "package manager busy");
            return Err(LampError::PackageManagerBusy {
                holder: info.describe(),
            });
        }
        Ok(())
    }

    fn wait_with_progress(&self, timeout: Duration) -> LockInfo {
        let display = LockWaitDisplay::new(self.options.show_progress);
        let mut on_progress = |info: &LockInfo| {
            info!(holder = %info.describe(), "waiting for package-manager lock");
            display.update(info);
        };
        let info = wait_for_lock(
            self.locks,
            timeout,
            self.options.tick,
            Some(&mut on_progress),
        );
        if info.locked {
            display.abandon();
        } else {
            display.finish();
        }
        info
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        if self.options.assume_yes {
            return Ok(true);
        }
        self.prompter.confirm(message, default)
    }

    fn install(&self, missing: &[String]) -> Result<bool> {
        println!("Missing packages: {}", missing.join(" "));
        if self.options.confirm_install
            && !self.confirm(&format!("Install {} package(s)?", missing.len()), true)?
        {
            println!("Installation cancelled.");
            return Ok(false);
        }
        self.manager
            .apply(missing, MutationMode::Install, self.options.dry_run)?;
        println!("Installed {} package(s).", missing.len());
        Ok(true)
    }

    fn upgrade(&self, upgradable: &[String]) -> Result<bool> {
        println!("Upgradable packages: {}", upgradable.join(" "));
        if !self.confirm(
            &format!("Upgrade {} package(s)?", upgradable.len()),
            true,
        )? {
            println!("Upgrade cancelled.");
            return Ok(false);
        }
        self.manager
            .apply(upgradable, MutationMode::Upgrade, self.options.dry_run)?;
        println!("Upgraded {} package(s).", upgradable.len());
        Ok(true)
    }

    fn offer_reinstall(&self, packages: &[String]) -> Result<bool> {
        println!("All LAMP packages are installed and up to date.");
        let reinstall = self.options.force_reinstall
            || self
                .prompter
                .confirm("Reinstall all packages anyway?", false)?;
        if reinstall {
            self.manager
                .apply(packages, MutationMode::Reinstall, self.options.dry_run)?;
            println!("Reinstalled {} package(s).", packages.len());
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::exit;
    use crate::test_fixtures::{
        FakeHost, FakeIndex, RecordingManager, ScriptedPrompter, SeqDetector,
    };

    const UPTODATE: &str = "Installed: 1.0\nCandidate: 1.0\n";
    const MISSING: &str = "Installed: (none)\nCandidate: 1.0\n";
    const UPGRADABLE: &str = "Installed: 1.0\nCandidate: 1.1\n";

    fn host() -> FakeHost {
        FakeHost::new()
            .root(true)
            .commands(&["apt", "systemctl"])
            .os_release("ID=ubuntu\nVERSION_ID=\"24.04\"\n")
    }

    fn index_with(overrides: &[(&str, &str)]) -> FakeIndex {
        let mut index = FakeIndex::new();
        for package in lamp_packages(&Engine::mysql()) {
            index = index.policy(&package, UPTODATE);
        }
        for (package, policy) in overrides {
            index = index.policy(package, policy);
        }
        index
    }

    fn options() -> InstallOptions {
        InstallOptions {
            lock_wait: LockWait::Check,
            tick: Duration::from_millis(1),
            ..InstallOptions::default()
        }
    }

    struct Harness {
        locks: SeqDetector,
        host: FakeHost,
        settings: Settings,
        index: FakeIndex,
        manager: RecordingManager,
        prompter: ScriptedPrompter,
    }

    impl Harness {
        fn new(index: FakeIndex) -> Self {
            Self {
                locks: SeqDetector::new(vec![LockInfo::unlocked("")]),
                host: host(),
                settings: Settings::default(),
                index,
                manager: RecordingManager::new(),
                prompter: ScriptedPrompter::new(),
            }
        }

        fn run(&self, choice: EngineChoice, options: InstallOptions) -> Result<Option<Engine>> {
            InstallOrchestrator::new(
                &self.locks,
                Preflight::new(&self.host, &self.settings),
                &self.index,
                &self.manager,
                &self.prompter,
                options,
            )
            .install_or_update(choice)
        }
    }

    #[test]
    fn test_decide_action_priority() {
        let status = PkgStatus {
            missing: vec!["a".to_string()],
            upgradable: vec!["b".to_string()],
            uptodate: vec!["c".to_string()],
        };
        assert_eq!(decide_action(&status), Action::Install(vec!["a".to_string()]));

        let status = PkgStatus {
            missing: vec![],
            upgradable: vec!["b".to_string()],
            uptodate: vec!["c".to_string()],
        };
        assert_eq!(decide_action(&status), Action::Upgrade(vec!["b".to_string()]));

        assert_eq!(decide_action(&PkgStatus::default()), Action::UpToDate);
    }

    #[test]
    fn test_missing_installs_only_missing() {
        let harness = Harness::new(index_with(&[
            ("apache2", MISSING),
            ("php", UPGRADABLE),
        ]));
        let engine = harness.run(EngineChoice::Mysql, options()).unwrap();
        assert_eq!(engine, Some(Engine::mysql()));
        assert_eq!(
            harness.manager.applies(),
            vec![(vec!["apache2".to_string()], MutationMode::Install)]
        );
        assert_eq!(harness.manager.refreshes(), 1);
    }

    #[test]
    fn test_upgradable_confirmed_upgrades_subset() {
        let harness = Harness::new(index_with(&[("php", UPGRADABLE), ("php-gd", UPGRADABLE)]));
        let result = harness.run(EngineChoice::Mysql, options()).unwrap();
        assert!(result.is_some());
        assert_eq!(
            harness.manager.applies(),
            vec![(
                vec!["php".to_string(), "php-gd".to_string()],
                MutationMode::Upgrade
            )]
        );
    }

    #[test]
    fn test_upgrade_declined_returns_none() {
        let mut harness = Harness::new(index_with(&[("php", UPGRADABLE)]));
        harness.prompter = ScriptedPrompter::new().with_confirm(false);
        let result = harness.run(EngineChoice::Mysql, options()).unwrap();
        assert!(result.is_none());
        assert!(harness.manager.applies().is_empty());
    }

    #[test]
    fn test_all_uptodate_mutates_nothing() {
        let mut harness = Harness::new(index_with(&[]));
        harness.prompter = ScriptedPrompter::new().with_confirm(false);
        let result = harness.run(EngineChoice::Mysql, options()).unwrap();
        assert_eq!(result, Some(Engine::mysql()));
        assert!(harness.manager.applies().is_empty());
        assert_eq!(
            harness.prompter.asked(),
            vec!["Reinstall all packages anyway?".to_string()]
        );
    }

    #[test]
    fn test_uptodate_with_opt_in_reinstalls_everything() {
        let mut harness = Harness::new(index_with(&[]));
        harness.prompter = ScriptedPrompter::new().with_confirm(true);
        harness.run(EngineChoice::Mysql, options()).unwrap();
        let applies = harness.manager.applies();
        assert_eq!(applies.len(), 1);
        assert_eq!(applies[0].0, lamp_packages(&Engine::mysql()));
        assert_eq!(applies[0].1, MutationMode::Reinstall);
    }

    #[test]
    fn test_force_reinstall_skips_prompt() {
        let harness = Harness::new(index_with(&[]));
        let options = InstallOptions {
            force_reinstall: true,
            ..options()
        };
        harness.run(EngineChoice::Mysql, options).unwrap();
        assert_eq!(harness.manager.applies()[0].1, MutationMode::Reinstall);
        assert!(harness.prompter.asked().is_empty());
    }

    #[test]
    fn test_confirm_install_declined() {
        let mut harness = Harness::new(index_with(&[("apache2", MISSING)]));
        harness.prompter = ScriptedPrompter::new().with_confirm(false);
        let options = InstallOptions {
            confirm_install: true,
            ..options()
        };
        assert!(harness.run(EngineChoice::Mysql, options).unwrap().is_none());
        assert!(harness.manager.applies().is_empty());
    }

    #[test]
    fn test_assume_yes_answers_upgrade() {
        let mut harness = Harness::new(index_with(&[("php", UPGRADABLE)]));
        harness.prompter = ScriptedPrompter::new().with_confirm(false);
        let options = InstallOptions {
            assume_yes: true,
            ..options()
        };
        assert!(harness.run(EngineChoice::Mysql, options).unwrap().is_some());
        assert_eq!(harness.manager.applies().len(), 1);
        assert!(harness.prompter.asked().is_empty());
    }

    #[test]
    fn test_locked_check_is_busy() {
        let mut harness = Harness::new(index_with(&[]));
        harness.locks = SeqDetector::new(vec![LockInfo::held(
            915,
            "unattended-upgr",
            "/var/lib/dpkg/lock-frontend",
        )]);
        let err = harness.run(EngineChoice::Mysql, options()).unwrap_err();
        assert_eq!(err.exit_code(), exit::BUSY);
        assert!(err.to_string().contains("unattended-upgr (pid 915)"));
        assert_eq!(harness.locks.calls(), 1);
        assert!(harness.manager.applies().is_empty());
        assert_eq!(harness.manager.refreshes(), 0);
    }

    #[test]
    fn test_wait_times_out_busy() {
        let mut harness = Harness::new(index_with(&[]));
        harness.locks = SeqDetector::new(vec![LockInfo::held(1, "apt", "/var/lib/dpkg/lock")]);
        let options = InstallOptions {
            lock_wait: LockWait::Wait(Duration::from_millis(20)),
            ..options()
        };
        let err = harness.run(EngineChoice::Mysql, options).unwrap_err();
        assert!(matches!(err, LampError::PackageManagerBusy { .. }));
    }

    #[test]
    fn test_wait_proceeds_once_released() {
        let mut harness = Harness::new(index_with(&[]));
        let held = LockInfo::held(1, "apt", "/var/lib/dpkg/lock");
        harness.locks = SeqDetector::new(vec![held.clone(), held, LockInfo::unlocked("")]);
        let options = InstallOptions {
            lock_wait: LockWait::Wait(Duration::from_secs(2)),
            ..options()
        };
        assert!(harness.run(EngineChoice::Mysql, options).unwrap().is_some());
        assert_eq!(harness.locks.calls(), 3);
    }

    #[test]
    fn test_huge_wait_from_seconds_proceeds() {
        let harness = Harness::new(index_with(&[]));
        let options = InstallOptions {
            lock_wait: LockWait::from_seconds(i64::MAX),
            ..options()
        };
        assert!(harness.run(EngineChoice::Mysql, options).unwrap().is_some());
        assert_eq!(harness.locks.calls(), 1);
    }

    #[test]
    fn test_skip_never_detects() {
        let mut harness = Harness::new(index_with(&[]));
        harness.locks = SeqDetector::new(vec![LockInfo::held(1, "apt", "/var/lib/dpkg/lock")]);
        let options = InstallOptions {
            lock_wait: LockWait::Skip,
            ..options()
        };
        harness.run(EngineChoice::Mysql, options).unwrap();
        assert_eq!(harness.locks.calls(), 0);
    }

    #[test]
    fn test_preflight_blocks_before_any_mutation() {
        let mut harness = Harness::new(index_with(&[("apache2", MISSING)]));
        harness.host = host().root(false);
        let err = harness.run(EngineChoice::Mysql, options()).unwrap_err();
        assert_eq!(err.exit_code(), exit::PREFLIGHT);
        assert_eq!(harness.manager.refreshes(), 0);
        assert!(harness.manager.applies().is_empty());
        assert!(harness.index.calls().is_empty());
    }

    #[test]
    fn test_dry_run_reports_blocking_but_continues() {
        let mut harness = Harness::new(index_with(&[("apache2", MISSING)]));
        harness.host = host().root(false);
        let options = InstallOptions {
            dry_run: true,
            ..options()
        };
        harness.run(EngineChoice::Mysql, options).unwrap();
        assert_eq!(harness.manager.applies().len(), 1);
        assert!(harness.manager.dry_runs().iter().all(|dry| *dry));
    }

    #[test]
    fn test_explicit_engine_is_used_as_is() {
        let harness = Harness::new(index_with(&[]).installed("mariadb-server"));
        harness.run(EngineChoice::Mysql, options()).unwrap();
        assert!(
            harness
                .index
                .calls()
                .iter()
                .all(|call| call.starts_with("policy:"))
        );
    }

    #[test]
    fn test_auto_engine_uses_installed() {
        let harness = Harness::new(
            index_with(&[])
                .installed("mariadb-server")
                .policy("mariadb-server", UPTODATE)
                .policy("mariadb-client", UPTODATE),
        );
        let engine = harness.run(EngineChoice::Auto, options()).unwrap();
        assert_eq!(engine, Some(Engine::mariadb()));
    }

    #[test]
    fn test_no_refresh_option() {
        let harness = Harness::new(index_with(&[]));
        let options = InstallOptions {
            refresh: false,
            ..options()
        };
        harness.run(EngineChoice::Mysql, options).unwrap();
        assert_eq!(harness.manager.refreshes(), 0);
    }

    #[test]
    fn test_mutation_failure_propagates_without_retry() {
        let mut harness = Harness::new(index_with(&[("apache2", MISSING)]));
        harness.manager = RecordingManager::failing("E: Could not get lock /var/lib/dpkg/lock-frontend");
        let err = harness.run(EngineChoice::Mysql, options()).unwrap_err();
        assert!(err.to_string().contains("locked"));
        assert_eq!(harness.manager.applies().len(), 1);
    }
}
