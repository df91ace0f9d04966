//! Classification of failed apt/dpkg invocations
//!
//! The orchestrator never retries a failed package mutation. Instead the
//! captured output is mapped to a short, human-readable cause the operator
//! can act on.

use std::fmt;

/// Number of trailing output lines shown for unrecognised failures
const TAIL_LINES: usize = 10;

/// Cause of a failed package-manager invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AptFailure {
    PackageNotFound,
    Permissions,
    Locked,
    Network,
    Unknown { tail: String },
}

impl fmt::Display for AptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AptFailure::PackageNotFound => write!(
                f,
                "APT failed: package not found. Check the package name or run apt-get update."
            ),
            AptFailure::Permissions => write!(
                f,
                "APT failed: insufficient permissions. Run the command with sudo."
            ),
            AptFailure::Locked => write!(
                f,
                "APT failed: the package manager is locked by another process. Wait and retry."
            ),
            AptFailure::Network => write!(
                f,
                "APT failed: network/DNS issue while contacting the archive. Check connectivity."
            ),
            AptFailure::Unknown { tail } => write!(f, "APT failed:\n{tail}"),
        }
    }
}

/// Classify the combined stdout/stderr of a failed apt invocation
pub fn classify_apt_error(output: &str) -> AptFailure {
    let lower = output.to_lowercase();

    if lower.contains("unable to locate package") || lower.contains("has no installation candidate")
    {
        return AptFailure::PackageNotFound;
    }
    if lower.contains("permission denied") || lower.contains("are you root") {
        return AptFailure::Permissions;
    }
    if lower.contains("could not get lock") || lower.contains("unable to acquire the dpkg") {
        return AptFailure::Locked;
    }
    if lower.contains("temporary failure resolving")
        || lower.contains("could not resolve")
        || lower.contains("failed to fetch")
        || lower.contains("network is unreachable")
    {
        return AptFailure::Network;
    }

    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(TAIL_LINES);
    AptFailure::Unknown {
        tail: lines[start..].join("\n"),
    }
}
