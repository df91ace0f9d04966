//! Command implementations for the lampkitctl CLI
//!
//! Every command receives a [`Context`] holding the collaborators it may
//! touch, so the flows run unchanged against fakes in tests.

pub mod completions;
pub mod create_site;
pub mod generate_ssl;
pub mod install_lamp;
pub mod list;
pub mod menu;
pub mod uninstall_site;
pub mod wp_permissions;

use tracing::debug;

use crate::config::Settings;
use crate::db;
use crate::elevate;
use crate::error::Result;
use crate::exec::CommandRunner;
use crate::preflight::{CheckContext, HostProbe, Operation, Preflight, ensure_or_fail};
use crate::prompt::Prompter;
use crate::session::Session;

/// Collaborators and settings shared by all commands of one invocation
pub struct Context<'a> {
    pub settings: Settings,
    pub dry_run: bool,
    pub runner: &'a dyn CommandRunner,
    pub host: &'a dyn HostProbe,
    pub prompter: &'a dyn Prompter,
    pub session: Session,
    /// Command line to relaunch under sudo; the process arguments when unset
    pub command_line: Option<Vec<String>>,
}

type ListFn = fn(&dyn CommandRunner, &Session, Option<&str>) -> Result<Vec<String>>;

impl<'a> Context<'a> {
    pub fn new(
        settings: Settings,
        dry_run: bool,
        runner: &'a dyn CommandRunner,
        host: &'a dyn HostProbe,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            settings,
            dry_run,
            runner,
            host,
            prompter,
            session: Session::new(),
            command_line: None,
        }
    }

    /// Re-exec under sudo unless already root or dry-running
    pub fn require_root(&self) -> Result<()> {
        elevate::ensure_privileges(
            self.host.is_root(),
            self.dry_run,
            self.prompter,
            &self.relaunch_command(),
        )
    }

    pub fn relaunch_command(&self) -> Vec<String> {
        self.command_line
            .clone()
            .unwrap_or_else(|| std::env::args().collect())
    }

    /// Evaluate and enforce `operation`'s preflight checks
    pub fn preflight(&self, operation: Operation, check_ctx: &CheckContext) -> Result<()> {
        let checks = Preflight::new(self.host, &self.settings).checks_for(operation, check_ctx);
        ensure_or_fail(
            &checks,
            self.prompter.is_interactive(),
            self.dry_run,
            self.prompter,
        )
    }

    /// Database root password for password auth, asked once per session
    pub fn db_root_password(&mut self) -> Result<Option<String>> {
        if self.session.db_root_password().is_none() && self.prompter.is_interactive() {
            let password = self.prompter.password("Database root password")?;
            if !password.is_empty() {
                self.session.set_db_root_password(password);
            }
        }
        Ok(self.session.db_root_password().map(str::to_string))
    }

    /// List user databases; `explicit` overrides the cached root password
    pub fn list_databases(&mut self, explicit: Option<&str>) -> Result<Vec<String>> {
        self.list_with_sudo_fallback(db::list_databases_for_session, explicit)
    }

    /// List removable `user@host` accounts
    pub fn list_users(&mut self) -> Result<Vec<String>> {
        self.list_with_sudo_fallback(db::list_users_for_session, None)
    }

    /// Run `list`, asking once for the sudo password when direct access fails
    fn list_with_sudo_fallback(
        &mut self,
        list: ListFn,
        explicit: Option<&str>,
    ) -> Result<Vec<String>> {
        match list(self.runner, &self.session, explicit) {
            Ok(items) => Ok(items),
            Err(err) => {
                let can_ask = self.prompter.is_interactive()
                    && self.session.sudo_password().is_none()
                    && !self.host.is_root();
                if !can_ask {
                    return Err(err);
                }
                debug!(error = %err, "direct database access failed, trying sudo");
                let sudo = self.prompter.password("sudo password")?;
                self.session.set_sudo_password(sudo);
                list(self.runner, &self.session, explicit)
            }
        }
    }
}
