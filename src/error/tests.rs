//! Error type tests
//!
//! Tests for LampError, its diagnostics and the exit-code contract.

#![allow(clippy::expect_used)]

use crate::error::{AptFailure, LampError, exit};
use miette::Diagnostic;

macro_rules! test_error_contains {
    ($test_name:ident, $err:expr, $($contains:expr),+ $(,)?) => {
        #[test]
        fn $test_name() {
            let err = $err;
            let error_string = err.to_string();
            $(
                assert!(error_string.contains($contains),
                    "Error message should contain '{}', got: {}",
                    $contains,
                    error_string
                );
            )+
        }
    };
}

#[test]
fn test_exit_codes_are_distinct() {
    let codes = [
        exit::SUCCESS,
        exit::FAILURE,
        exit::PREFLIGHT,
        exit::BUSY,
        exit::NO_ENGINE,
    ];
    for (i, a) in codes.iter().enumerate() {
        for b in &codes[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_exit_code_mapping() {
    assert_eq!(
        LampError::PreflightBlocked { failures: vec![] }.exit_code(),
        exit::PREFLIGHT
    );
    assert_eq!(
        LampError::PreflightWarned { failures: vec![] }.exit_code(),
        exit::PREFLIGHT
    );
    assert_eq!(LampError::ElevationRequired.exit_code(), exit::PREFLIGHT);
    assert_eq!(
        LampError::PackageManagerBusy {
            holder: "pid 1".to_string()
        }
        .exit_code(),
        exit::BUSY
    );
    assert_eq!(
        LampError::NoSupportedEngine {
            diagnostics: vec![]
        }
        .exit_code(),
        exit::NO_ENGINE
    );
    assert_eq!(
        LampError::PackageMutationFailed {
            command: "apt-get install".to_string(),
            cause: AptFailure::Network,
        }
        .exit_code(),
        exit::FAILURE
    );
}

#[test]
fn test_error_code() {
    let err = LampError::PackageManagerBusy {
        holder: "unattended-upgr (pid 915)".to_string(),
    };
    assert_eq!(
        err.code().map(|c| c.to_string()),
        Some("lampkit::locks::busy".to_string())
    );
}

#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: LampError = io_err.into();
    assert!(matches!(err, LampError::IoError { .. }));
    assert_eq!(err.exit_code(), exit::FAILURE);
}

#[test]
fn test_yaml_error_conversion() {
    let parse_result: std::result::Result<serde_yaml::Value, _> =
        serde_yaml::from_str("invalid: yaml: content: [unclosed");
    let yaml_err = parse_result.expect_err("yaml should not parse");
    let err: LampError = yaml_err.into();
    assert!(matches!(err, LampError::ConfigParseFailed { .. }));
}

test_error_contains!(
    test_no_supported_engine_lists_candidates,
    LampError::NoSupportedEngine {
        diagnostics: vec![
            "mysql-server: Candidate: (none)".to_string(),
            "mariadb-server: Candidate: (none)".to_string(),
        ],
    },
    "No supported DB server package found",
    "mysql-server: Candidate: (none)",
    "mariadb-server: Candidate: (none)"
);

test_error_contains!(
    test_preflight_blocked_counts_failures,
    LampError::PreflightBlocked {
        failures: vec!["a".to_string(), "b".to_string()],
    },
    "Preflight failed",
    "2 blocking"
);

test_error_contains!(
    test_mutation_failure_shows_cause,
    LampError::PackageMutationFailed {
        command: "apt-get install -y apache2".to_string(),
        cause: AptFailure::Locked,
    },
    "locked"
);
