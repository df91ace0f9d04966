//! External process execution
//!
//! Every interaction with `apt`, `dpkg`, `mysql`, `a2ensite` and friends goes
//! through the [`CommandRunner`] trait so the orchestration logic can be
//! exercised against scripted fakes. Queries and mutations are split:
//! - [`capture`]: read-only probe, spawn failures are reported as `None`
//! - [`run_mutation`]: system-mutating call, skipped under dry-run and
//!   turned into a [`LampError`] on failure

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{LampError, Result};
use crate::logging;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// A process to run: argv, optional stdin and extra environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub stdin: Option<String>,
    pub env: Vec<(String, String)>,
    /// Replacement argv used for logging when the real one carries secrets
    pub redacted: Option<Vec<String>>,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn redacted<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redacted = Some(argv.into_iter().map(Into::into).collect());
        self
    }

    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// Shell-quoted, secret-masked rendering for logs and error messages
    pub fn display(&self) -> String {
        let argv = self.redacted.as_ref().unwrap_or(&self.argv);
        logging::display_argv(&logging::mask_argv(argv))
    }
}

/// Runs external processes
pub trait CommandRunner {
    /// Run `invocation` to completion, capturing its output
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        let Some((program, args)) = invocation.argv.split_first() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty command line",
            ));
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        for (key, value) in &invocation.env {
            command.env(key, value);
        }

        let mut child = command.spawn()?;
        if let (Some(input), Some(mut pipe)) = (&invocation.stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())?;
        }
        let output = child.wait_with_output()?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a read-only probe; a program that cannot be spawned yields `None`
pub fn capture(runner: &dyn CommandRunner, invocation: &Invocation) -> Option<CommandOutput> {
    match runner.run(invocation) {
        Ok(output) => Some(output),
        Err(err) => {
            debug!(cmd = %invocation.display(), error = %err, "probe unavailable");
            None
        }
    }
}

/// Run a system-mutating command
///
/// Under `dry_run` the command is only logged and a successful empty output
/// is returned. A non-zero exit becomes [`LampError::CommandFailed`].
pub fn run_mutation(
    runner: &dyn CommandRunner,
    invocation: &Invocation,
    dry_run: bool,
) -> Result<CommandOutput> {
    info!(cmd = %invocation.display(), dry_run, "run_command");
    if dry_run {
        return Ok(CommandOutput::ok(""));
    }

    let output = runner
        .run(invocation)
        .map_err(|err| LampError::CommandSpawnFailed {
            program: invocation.program().to_string(),
            reason: err.to_string(),
        })?;

    if !output.success() {
        return Err(LampError::CommandFailed {
            command: invocation.display(),
            status: output.status_text(),
            output: output.combined(),
        });
    }
    Ok(output)
}
