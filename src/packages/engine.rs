//! MySQL/MariaDB engine resolution

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, info};

use super::index::PackageIndex;
use crate::error::{LampError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Mysql,
    Mariadb,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Mysql => write!(f, "mysql"),
            EngineKind::Mariadb => write!(f, "mariadb"),
        }
    }
}

/// A concrete database engine with its package and service names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Engine {
    pub kind: EngineKind,
    pub server_pkg: String,
    pub client_pkg: String,
    pub service_name: String,
}

impl Engine {
    fn build(kind: EngineKind, server: &str, client: &str, service: &str) -> Self {
        Self {
            kind,
            server_pkg: server.to_string(),
            client_pkg: client.to_string(),
            service_name: service.to_string(),
        }
    }

    pub fn mysql() -> Self {
        Self::build(EngineKind::Mysql, "mysql-server", "mysql-client", "mysql")
    }

    pub fn mariadb() -> Self {
        Self::build(
            EngineKind::Mariadb,
            "mariadb-server",
            "mariadb-client",
            "mariadb",
        )
    }

    /// Debian's virtual package, which resolves to MySQL on Ubuntu
    pub fn default_mysql() -> Self {
        Self::build(
            EngineKind::Mysql,
            "default-mysql-server",
            "default-mysql-client",
            "mysql",
        )
    }

    pub fn for_kind(kind: EngineKind) -> Self {
        match kind {
            EngineKind::Mysql => Self::mysql(),
            EngineKind::Mariadb => Self::mariadb(),
        }
    }

    pub fn name(&self) -> String {
        self.kind.to_string()
    }
}

/// Engine requested on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EngineChoice {
    #[default]
    Auto,
    Mysql,
    Mariadb,
}

/// Resolve `choice` into a concrete engine
///
/// An explicit choice is returned as-is without touching the index.
pub fn resolve_engine(choice: EngineChoice, index: &dyn PackageIndex) -> Result<Engine> {
    let engine = match choice {
        EngineChoice::Mysql => Engine::mysql(),
        EngineChoice::Mariadb => Engine::mariadb(),
        EngineChoice::Auto => auto_detect_engine(index)?,
    };
    info!(engine = %engine.kind, server = %engine.server_pkg, "resolved database engine");
    Ok(engine)
}

/// Engine already present on the host, if any
///
/// dpkg status is authoritative when exactly one server package is
/// installed; otherwise the client's `--version` banner decides.
pub fn detect_installed_engine(index: &dyn PackageIndex) -> Option<EngineKind> {
    let mysql = index.is_installed("mysql-server");
    let mariadb = index.is_installed("mariadb-server");
    match (mysql, mariadb) {
        (true, false) => return Some(EngineKind::Mysql),
        (false, true) => return Some(EngineKind::Mariadb),
        _ => {}
    }

    let banner = index.server_version()?.to_lowercase();
    debug!(banner = %banner.trim(), "mysql client banner");
    if banner.contains("mariadb") {
        Some(EngineKind::Mariadb)
    } else if banner.contains("mysql") {
        Some(EngineKind::Mysql)
    } else {
        None
    }
}

const CANDIDATE_ORDER: [&str; 3] = ["mysql-server", "mariadb-server", "default-mysql-server"];

fn auto_detect_engine(index: &dyn PackageIndex) -> Result<Engine> {
    if let Some(kind) = detect_installed_engine(index) {
        debug!(engine = %kind, "engine already installed");
        return Ok(Engine::for_kind(kind));
    }

    for package in CANDIDATE_ORDER {
        if index.has_candidate(package) {
            return Ok(match package {
                "mysql-server" => Engine::mysql(),
                "mariadb-server" => Engine::mariadb(),
                _ => Engine::default_mysql(),
            });
        }
    }

    let diagnostics = CANDIDATE_ORDER
        .iter()
        .map(|package| format!("{package}: {}", index.candidate_line(package)))
        .collect();
    Err(LampError::NoSupportedEngine { diagnostics })
}
