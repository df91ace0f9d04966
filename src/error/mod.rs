//! Error types and handling for lampkitctl
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Every variant maps to one of the stable process exit codes in [`exit`],
//! which is the only signal scripts wrapping the tool can rely on:
//! - [`apt`]: classification of failed package-manager invocations

pub mod apt;

pub use apt::{AptFailure, classify_apt_error};

use miette::Diagnostic;
use thiserror::Error;

/// Stable process exit codes
pub mod exit {
    /// Success, nothing to do, or the operator declined
    pub const SUCCESS: i32 = 0;
    /// Any failure without a dedicated code
    pub const FAILURE: i32 = 1;
    /// A preflight check blocked the operation (or a warning was not confirmed)
    pub const PREFLIGHT: i32 = 2;
    /// The package manager lock is held by another process
    pub const BUSY: i32 = 3;
    /// Neither MySQL nor MariaDB server packages are available
    pub const NO_ENGINE: i32 = 4;
}

/// Main error type for lampkitctl operations
#[derive(Error, Diagnostic, Debug)]
pub enum LampError {
    // Lock errors
    #[error("Package manager is busy: {holder}")]
    #[diagnostic(
        code(lampkit::locks::busy),
        help("Wait for the other apt/dpkg process to finish, or raise --wait-apt-lock")
    )]
    PackageManagerBusy { holder: String },

    // Preflight errors
    #[error("Preflight failed: {} blocking check(s)", failures.len())]
    #[diagnostic(
        code(lampkit::preflight::blocked),
        help("Fix every listed prerequisite and run the command again")
    )]
    PreflightBlocked { failures: Vec<String> },

    #[error("Preflight failed: {} unconfirmed warning(s)", failures.len())]
    #[diagnostic(
        code(lampkit::preflight::warned),
        help("Re-run interactively to confirm, or fix the listed prerequisites")
    )]
    PreflightWarned { failures: Vec<String> },

    #[error("Root privileges required")]
    #[diagnostic(
        code(lampkit::preflight::root_required),
        help("Re-run with: sudo $(command -v lampkitctl) ...")
    )]
    ElevationRequired,

    // Package errors
    #[error("No supported DB server package found\n{}", diagnostics.join("\n"))]
    #[diagnostic(
        code(lampkit::packages::no_engine),
        help("Enable the universe repository or run apt-get update, then retry")
    )]
    NoSupportedEngine { diagnostics: Vec<String> },

    #[error("{cause}")]
    #[diagnostic(code(lampkit::packages::mutation_failed))]
    PackageMutationFailed { command: String, cause: AptFailure },

    // Command errors
    #[error("Command failed: {command} ({status})")]
    #[diagnostic(code(lampkit::exec::failed))]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("Failed to run {program}: {reason}")]
    #[diagnostic(
        code(lampkit::exec::spawn_failed),
        help("Check that the program is installed and on PATH")
    )]
    CommandSpawnFailed { program: String, reason: String },

    // Input errors
    #[error("Invalid {what}: {value}")]
    #[diagnostic(code(lampkit::input::invalid))]
    InvalidInput { what: String, value: String },

    // Configuration errors
    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(lampkit::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(lampkit::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    // File system errors
    #[error("Failed to read file: {path}")]
    #[diagnostic(code(lampkit::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(lampkit::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(lampkit::fs::io_error))]
    IoError { message: String },

    // Prompt errors
    #[error("Prompt failed: {message}")]
    #[diagnostic(code(lampkit::prompt::failed))]
    PromptFailed { message: String },
}

impl LampError {
    /// Exit code the command surface reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            LampError::PreflightBlocked { .. }
            | LampError::PreflightWarned { .. }
            | LampError::ElevationRequired => exit::PREFLIGHT,
            LampError::PackageManagerBusy { .. } => exit::BUSY,
            LampError::NoSupportedEngine { .. } => exit::NO_ENGINE,
            _ => exit::FAILURE,
        }
    }

    /// Builds an [`LampError::InvalidInput`]
    pub fn invalid(what: impl Into<String>, value: impl Into<String>) -> Self {
        LampError::InvalidInput {
            what: what.into(),
            value: value.into(),
        }
    }
}

impl From<std::io::Error> for LampError {
    fn from(err: std::io::Error) -> Self {
        LampError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for LampError {
    fn from(err: serde_yaml::Error) -> Self {
        LampError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LampError {
    fn from(err: serde_json::Error) -> Self {
        LampError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for LampError {
    fn from(err: inquire::InquireError) -> Self {
        LampError::PromptFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, LampError>;

#[cfg(test)]
mod tests;
