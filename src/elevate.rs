//! Re-execution under `sudo` for commands that mutate the host

use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{LampError, Result};
use crate::logging;
use crate::prompt::Prompter;

const BINARY_NAME: &str = "lampkitctl";

/// Global flags that take a separate value
const GLOBAL_VALUE_FLAGS: [&str; 2] = ["--config", "--log-format"];
const GLOBAL_SWITCHES: [&str; 4] = ["--dry-run", "--non-interactive", "--verbose", "-v"];

/// What to do about missing privileges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elevation {
    AlreadyPrivileged,
    Reexec { argv: Vec<String> },
    Fail,
}

/// Decide how to obtain root for the current command line
///
/// `argv` is the full original command line; `exe` replaces its first
/// element when known.
pub fn plan_elevation(
    is_root: bool,
    dry_run: bool,
    prompter: &dyn Prompter,
    argv: &[String],
    exe: Option<PathBuf>,
) -> Result<Elevation> {
    if dry_run || is_root {
        return Ok(Elevation::AlreadyPrivileged);
    }
    if !prompter.is_interactive() {
        return Ok(Elevation::Fail);
    }
    if !prompter.confirm("Root required. Re-run with sudo now?", true)? {
        return Ok(Elevation::Fail);
    }

    let program = exe
        .map(|path| path.to_string_lossy().into_owned())
        .or_else(|| argv.first().cloned())
        .unwrap_or_else(|| BINARY_NAME.to_string());
    let rest = argv.get(1..).unwrap_or_default();
    Ok(Elevation::Reexec {
        argv: build_sudo_argv(&program, rest),
    })
}

/// `sudo <program> <args...>`
pub fn build_sudo_argv(program: &str, args: &[String]) -> Vec<String> {
    let mut argv = vec!["sudo".to_string(), program.to_string()];
    argv.extend(args.iter().cloned());
    argv
}

/// `process_args` with its subcommand replaced by `subcommand`
///
/// Keeps the program and the global flags so a menu action relaunched under
/// sudo runs with the same configuration.
pub fn relaunch_argv(process_args: &[String], subcommand: &[String]) -> Vec<String> {
    let mut argv: Vec<String> = process_args
        .first()
        .cloned()
        .into_iter()
        .collect();
    let mut rest = process_args.iter().skip(1);
    while let Some(arg) = rest.next() {
        let flag = arg.split_once('=').map_or(arg.as_str(), |(flag, _)| flag);
        if GLOBAL_VALUE_FLAGS.contains(&flag) {
            argv.push(arg.clone());
            if flag == arg.as_str() {
                argv.extend(rest.next().cloned());
            }
        } else if GLOBAL_SWITCHES.contains(&arg.as_str()) {
            argv.push(arg.clone());
        }
    }
    argv.extend(subcommand.iter().cloned());
    argv
}

/// Command line as shown to the operator, secrets masked
pub fn shown_command(argv: &[String]) -> String {
    logging::display_argv(&logging::mask_argv(argv))
}

/// Absolute path of the running binary, if it can be found
pub fn resolve_self_executable() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.canonicalize().ok())
        .filter(|path| path.is_file())
        .or_else(|| {
            which::which(BINARY_NAME)
                .ok()
                .and_then(|path| path.canonicalize().ok())
        })
}

/// Replace the current process with `argv`
///
/// Only returns when the exec itself fails.
pub fn reexec(argv: &[String]) -> LampError {
    let Some((program, args)) = argv.split_first() else {
        return LampError::invalid("command line", "");
    };
    let err = Command::new(program).args(args).exec();
    LampError::CommandSpawnFailed {
        program: program.clone(),
        reason: err.to_string(),
    }
}

/// Make sure the process runs as root, re-executing `argv` under sudo if needed
pub fn ensure_privileges(
    is_root: bool,
    dry_run: bool,
    prompter: &dyn Prompter,
    argv: &[String],
) -> Result<()> {
    let plan = plan_elevation(is_root, dry_run, prompter, argv, resolve_self_executable())?;
    debug!(?plan, "elevation plan");

    match plan {
        Elevation::AlreadyPrivileged => Ok(()),
        Elevation::Fail => Err(LampError::ElevationRequired),
        Elevation::Reexec { argv } => {
            let shown = shown_command(&argv);
            info!(cmd = %shown, "re-executing with sudo");
            println!("Re-running as root: {shown}");
            Err(reexec(&argv))
        }
    }
}
