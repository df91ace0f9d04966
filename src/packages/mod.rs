//! Package sets, database engines and apt integration
//!
//! This module is organized into sub-modules:
//! - [`index`]: read-only queries against the apt/dpkg databases
//! - [`status`]: three-way classification of a package set
//! - [`engine`]: MySQL/MariaDB engine resolution
//! - [`apt`]: package mutations (install, upgrade, reinstall, index refresh)

pub mod apt;
pub mod engine;
pub mod index;
pub mod status;

pub use apt::{AptManager, MutationMode, PackageManager};
pub use engine::{Engine, EngineChoice, EngineKind, resolve_engine};
pub use index::{AptIndex, PackageIndex};
pub use status::{PkgStatus, detect_pkg_status};

pub const APACHE_PKG: &str = "apache2";
pub const PHP_BASE: [&str; 3] = ["php", "libapache2-mod-php", "php-mysql"];
pub const PHP_EXTRAS: [&str; 7] = [
    "php-curl",
    "php-xml",
    "php-imagick",
    "php-mbstring",
    "php-zip",
    "php-intl",
    "php-gd",
];
pub const CERTBOT_PKGS: [&str; 2] = ["certbot", "python3-certbot-apache"];

/// Full package set of the stack for `engine`
pub fn lamp_packages(engine: &Engine) -> Vec<String> {
    let mut packages = vec![
        engine.server_pkg.clone(),
        engine.client_pkg.clone(),
        APACHE_PKG.to_string(),
    ];
    packages.extend(PHP_BASE.iter().map(|p| (*p).to_string()));
    packages.extend(PHP_EXTRAS.iter().map(|p| (*p).to_string()));
    packages.extend(CERTBOT_PKGS.iter().map(|p| (*p).to_string()));
    packages
}
