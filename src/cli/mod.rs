//! CLI definitions using clap derive API
//!
//! One submodule per command's argument type:
//! - install_lamp: package installation and root password
//! - site: create-site and uninstall-site
//! - wp: wp-permissions and generate-ssl
//! - list: list-sites and list-dbs
//! - completions: shell completion scripts

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

pub mod completions;
pub mod install_lamp;
pub mod list;
pub mod site;
pub mod wp;

pub use completions::CompletionsArgs;
pub use install_lamp::InstallLampArgs;
pub use list::{ListDbsArgs, ListSitesArgs};
pub use site::{CreateSiteArgs, UninstallSiteArgs};
pub use wp::{GenerateSslArgs, WpPermissionsArgs};

/// lampkitctl - LAMP stack provisioning for Ubuntu hosts
#[derive(Parser, Debug)]
#[command(
    name = "lampkitctl",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Install a LAMP stack and manage Apache sites on Ubuntu",
    long_about = "lampkitctl installs and upgrades Apache, MySQL or MariaDB and PHP, \
                  then creates and removes sites: virtual hosts, /etc/hosts entries, \
                  databases and optional WordPress installs.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  lampkitctl install-lamp --db-engine mariadb   \x1b[90m# Install or upgrade the stack\x1b[0m\n   \
                  lampkitctl create-site shop.test --db-name shop --db-user shop --db-password pw\n   \
                  lampkitctl list-sites                         \x1b[90m# Show configured virtual hosts\x1b[0m\n   \
                  lampkitctl --dry-run uninstall-site shop.test \x1b[90m# Preview a removal\x1b[0m\n   \
                  lampkitctl                                    \x1b[90m# Interactive menu\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Log actions without changing the system
    #[arg(long, global = true, env = "LAMPKIT_DRY_RUN")]
    pub dry_run: bool,

    /// Never prompt; questions resolve to their defaults
    #[arg(long, global = true, env = "LAMPKIT_NON_INTERACTIVE")]
    pub non_interactive: bool,

    /// Configuration file (defaults to /etc/lampkitctl/config.yaml)
    #[arg(long, global = true, env = "LAMPKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Without a subcommand the interactive menu starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Spelling clap accepts for a value-enum argument
fn value_name<T: clap::ValueEnum>(value: &T) -> String {
    value
        .to_possible_value()
        .map(|possible| possible.get_name().to_string())
        .unwrap_or_default()
}

fn push_opt(argv: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value {
        argv.extend([flag.to_string(), value.to_string()]);
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install or upgrade Apache, the database server and PHP
    InstallLamp(InstallLampArgs),

    /// Create a virtual host, database and optional WordPress install
    CreateSite(CreateSiteArgs),

    /// Remove a site's virtual host, hosts entry and files
    UninstallSite(UninstallSiteArgs),

    /// Reset ownership and modes of a WordPress tree
    WpPermissions(WpPermissionsArgs),

    /// Issue a Let's Encrypt certificate with certbot
    GenerateSsl(GenerateSslArgs),

    /// List configured virtual hosts
    ListSites(ListSitesArgs),

    /// List user databases
    ListDbs(ListDbsArgs),

    /// Interactive menu
    Menu,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
