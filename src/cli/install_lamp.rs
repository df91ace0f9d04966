use clap::Parser;

use super::{push_opt, value_name};
use crate::db::DEFAULT_ROOT_PLUGIN;
use crate::packages::EngineChoice;

/// Arguments for the install-lamp command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Install or upgrade, picking the engine automatically:\n    lampkitctl install-lamp\n\n\
                  Install MariaDB and set its root password:\n    lampkitctl install-lamp --db-engine mariadb --set-db-root-pass\n\n\
                  Fail immediately if apt is busy:\n    lampkitctl install-lamp --wait-apt-lock 0\n\n\
                  Unattended, password from the environment:\n    DBPW=... lampkitctl --non-interactive install-lamp --yes --db-root-pass-env DBPW")]
pub struct InstallLampArgs {
    /// Database engine to install
    #[arg(long, value_enum, default_value_t = EngineChoice::Auto)]
    pub db_engine: EngineChoice,

    /// Seconds to wait for the apt lock (0 checks once, negative skips the check)
    #[arg(long, allow_negative_numbers = true)]
    pub wait_apt_lock: Option<i64>,

    /// Skip `apt-get update` before checking package status
    #[arg(long)]
    pub no_refresh: bool,

    /// Answer yes to install and upgrade confirmations
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Reinstall every package when the stack is already up to date
    #[arg(long)]
    pub reinstall: bool,

    /// Set the database root password after installation
    #[arg(long)]
    pub set_db_root_pass: bool,

    /// Root password to set (visible in the process list; prefer --db-root-pass-env)
    #[arg(long, requires = "set_db_root_pass", conflicts_with = "db_root_pass_env")]
    pub db_root_pass: Option<String>,

    /// Environment variable holding the root password
    #[arg(long, value_name = "VAR", requires = "set_db_root_pass")]
    pub db_root_pass_env: Option<String>,

    /// MySQL authentication plugin for root
    #[arg(long, default_value = DEFAULT_ROOT_PLUGIN)]
    pub db_root_plugin: String,
}

impl InstallLampArgs {
    /// Subcommand and flags that reproduce these arguments
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = vec![
            "install-lamp".to_string(),
            "--db-engine".to_string(),
            value_name(&self.db_engine),
        ];
        if let Some(seconds) = self.wait_apt_lock {
            argv.push(format!("--wait-apt-lock={seconds}"));
        }
        for (set, flag) in [
            (self.no_refresh, "--no-refresh"),
            (self.yes, "--yes"),
            (self.reinstall, "--reinstall"),
            (self.set_db_root_pass, "--set-db-root-pass"),
        ] {
            if set {
                argv.push(flag.to_string());
            }
        }
        push_opt(&mut argv, "--db-root-pass", self.db_root_pass.as_deref());
        push_opt(&mut argv, "--db-root-pass-env", self.db_root_pass_env.as_deref());
        push_opt(&mut argv, "--db-root-plugin", Some(self.db_root_plugin.as_str()));
        argv
    }
}
