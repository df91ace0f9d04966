//! install-lamp command
//!
//! Runs the install-or-update orchestration against apt, then optionally
//! sets the database root password.

use std::io::IsTerminal;
use std::time::Duration;

use tracing::info;

use crate::cli::InstallLampArgs;
use crate::commands::Context;
use crate::db;
use crate::error::{LampError, Result};
use crate::locks::{LockDetector, LockWait};
use crate::orchestrator::{InstallOptions, InstallOrchestrator};
use crate::packages::{AptIndex, AptManager, Engine, EngineKind};
use crate::preflight::Preflight;
use crate::prompt::Prompter;

pub const MIN_ROOT_PASSWORD_LEN: usize = 8;
const PASSWORD_ATTEMPTS: usize = 3;

/// Run install-lamp command
pub fn run(ctx: &mut Context<'_>, args: &InstallLampArgs) -> Result<()> {
    ctx.require_root()?;

    let options = InstallOptions {
        lock_wait: LockWait::from_seconds(args.wait_apt_lock.unwrap_or(ctx.settings.wait_apt_lock)),
        tick: Duration::from_millis(ctx.settings.lock_tick_ms),
        dry_run: ctx.dry_run,
        assume_yes: args.yes,
        force_reinstall: args.reinstall,
        confirm_install: false,
        refresh: !args.no_refresh,
        show_progress: std::io::stderr().is_terminal(),
    };

    let locks = LockDetector::from_settings(ctx.runner, &ctx.settings);
    let index = AptIndex::new(ctx.runner);
    let manager = AptManager::new(ctx.runner);
    let orchestrator = InstallOrchestrator::new(
        &locks,
        Preflight::new(ctx.host, &ctx.settings),
        &index,
        &manager,
        ctx.prompter,
        options,
    );

    let Some(engine) = orchestrator.install_or_update(args.db_engine)? else {
        println!("No changes made.");
        return Ok(());
    };
    info!(engine = %engine.kind, "LAMP stack ready");

    if args.set_db_root_pass {
        configure_root_password(ctx, args, &engine, |name| std::env::var(name).ok())?;
    }
    Ok(())
}

fn configure_root_password(
    ctx: &mut Context<'_>,
    args: &InstallLampArgs,
    engine: &Engine,
    env: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let Some(password) = resolve_root_password(args, ctx.prompter, env)? else {
        println!("Skipping database root password: none given and running non-interactively.");
        return Ok(());
    };
    if engine.kind == EngineKind::Mariadb {
        println!("MariaDB: root will switch from socket to password authentication.");
    }
    db::set_root_password(
        ctx.runner,
        engine,
        &password,
        &args.db_root_plugin,
        ctx.dry_run,
    )?;
    println!("Database root password set.");
    ctx.session.set_db_root_password(password);
    Ok(())
}

/// Root password from the flag, the named environment variable or a prompt
///
/// `None` means no source was available and the step should be skipped.
pub fn resolve_root_password(
    args: &InstallLampArgs,
    prompter: &dyn Prompter,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<String>> {
    if let Some(password) = &args.db_root_pass {
        return Ok(Some(password.clone()));
    }
    if let Some(var) = &args.db_root_pass_env {
        return env(var)
            .filter(|value| !value.is_empty())
            .map(Some)
            .ok_or_else(|| LampError::invalid("environment variable", var.clone()));
    }
    if !prompter.is_interactive() {
        return Ok(None);
    }
    ask_new_password(prompter).map(Some)
}

/// Ask twice until both entries match and meet the minimum length
pub fn ask_new_password(prompter: &dyn Prompter) -> Result<String> {
    for _ in 0..PASSWORD_ATTEMPTS {
        let password = prompter.password("New database root password")?;
        if password.chars().count() < MIN_ROOT_PASSWORD_LEN {
            eprintln!("Password must be at least {MIN_ROOT_PASSWORD_LEN} characters.");
            continue;
        }
        if prompter.password("Repeat password")? != password {
            eprintln!("Passwords do not match.");
            continue;
        }
        return Ok(password);
    }
    Err(LampError::invalid("password", "no valid password entered"))
}
