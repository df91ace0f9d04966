//! Structured logging setup
//!
//! Diagnostics go through `tracing`; the subscriber is installed once in
//! `main`. Log lines always go to stderr so command output on stdout stays
//! clean for scripts.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Replacement shown wherever a secret would appear in logs
pub const SECRET_PLACEHOLDER: &str = "******";

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global tracing subscriber
///
/// `LAMPKIT_LOG` takes precedence over `RUST_LOG`. Without either, only
/// warnings are shown unless `verbose` is set.
pub fn init(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_env("LAMPKIT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false);

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Flags whose value is a secret, in both `--flag value` and `--flag=value` form
const SECRET_FLAGS: [&str; 3] = ["--password", "--db-password", "--db-root-pass"];

/// Mask passwords in a command line
///
/// Handles `mysql -p<secret>` and the [`SECRET_FLAGS`], whether the value
/// is attached with `=` or passed as the next argument.
pub fn mask_argv(argv: &[String]) -> Vec<String> {
    let mut masked = Vec::with_capacity(argv.len());
    let mut value_follows = false;
    for arg in argv {
        if value_follows {
            masked.push(SECRET_PLACEHOLDER.to_string());
            value_follows = false;
            continue;
        }
        if SECRET_FLAGS.contains(&arg.as_str()) {
            value_follows = true;
            masked.push(arg.clone());
        } else if let Some(flag) = SECRET_FLAGS
            .iter()
            .find(|flag| arg.strip_prefix(**flag).is_some_and(|rest| rest.starts_with('=')))
        {
            masked.push(format!("{flag}={SECRET_PLACEHOLDER}"));
        } else if arg.len() > 2 && arg.starts_with("-p") {
            masked.push(format!("-p{SECRET_PLACEHOLDER}"));
        } else {
            masked.push(arg.clone());
        }
    }
    masked
}

/// Shell-quoted rendering of a command line
pub fn display_argv(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| shlex::try_quote(arg).map_or_else(|_| arg.clone(), |quoted| quoted.into_owned()))
        .collect::<Vec<_>>()
        .join(" ")
}
