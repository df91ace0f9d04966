use clap::Parser;
use std::path::PathBuf;

use super::{push_opt, value_name};
use crate::db::RootAuth;

/// Arguments for the create-site command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Create a site with its database:\n    lampkitctl create-site shop.test --db-name shop --db-user shop --db-password s3cret\n\n\
                  Create a WordPress site in a custom root:\n    lampkitctl create-site blog.test --doc-root /srv/blog --db-name blog --db-user blog --db-password s3cret --wordpress")]
pub struct CreateSiteArgs {
    /// Domain served by the new virtual host
    pub domain: String,

    /// Document root (defaults to <web_root>/<domain>)
    #[arg(long)]
    pub doc_root: Option<PathBuf>,

    /// Database to create
    #[arg(long)]
    pub db_name: String,

    /// Database user to create
    #[arg(long)]
    pub db_user: String,

    /// Password for the database user
    #[arg(long)]
    pub db_password: String,

    /// How to authenticate as the database root user
    #[arg(long, value_enum, default_value_t = RootAuth::Socket)]
    pub root_auth: RootAuth,

    /// Download and configure WordPress
    #[arg(long)]
    pub wordpress: bool,
}

/// Arguments for the uninstall-site command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Remove a site but keep its database:\n    lampkitctl uninstall-site shop.test\n\n\
                  Remove a site and its database:\n    lampkitctl uninstall-site shop.test --remove-db --db-name shop --db-user shop")]
pub struct UninstallSiteArgs {
    /// Domain of the site to remove
    pub domain: String,

    /// Document root (defaults to the vhost's DocumentRoot, then <web_root>/<domain>)
    #[arg(long)]
    pub doc_root: Option<PathBuf>,

    /// Drop the database and user too
    #[arg(long)]
    pub remove_db: bool,

    /// Database to drop (defaults to DB_NAME from wp-config.php)
    #[arg(long)]
    pub db_name: Option<String>,

    /// Database user to drop (defaults to DB_USER from wp-config.php)
    #[arg(long)]
    pub db_user: Option<String>,

    /// How to authenticate as the database root user
    #[arg(long, value_enum, default_value_t = RootAuth::Socket)]
    pub root_auth: RootAuth,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

fn path_arg(path: Option<&PathBuf>) -> Option<String> {
    path.map(|path| path.to_string_lossy().into_owned())
}

impl CreateSiteArgs {
    /// Subcommand and flags that reproduce these arguments
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = vec!["create-site".to_string(), self.domain.clone()];
        push_opt(&mut argv, "--doc-root", path_arg(self.doc_root.as_ref()).as_deref());
        push_opt(&mut argv, "--db-name", Some(self.db_name.as_str()));
        push_opt(&mut argv, "--db-user", Some(self.db_user.as_str()));
        push_opt(&mut argv, "--db-password", Some(self.db_password.as_str()));
        push_opt(&mut argv, "--root-auth", Some(value_name(&self.root_auth).as_str()));
        if self.wordpress {
            argv.push("--wordpress".to_string());
        }
        argv
    }
}

impl UninstallSiteArgs {
    /// Subcommand and flags that reproduce these arguments
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = vec!["uninstall-site".to_string(), self.domain.clone()];
        push_opt(&mut argv, "--doc-root", path_arg(self.doc_root.as_ref()).as_deref());
        if self.remove_db {
            argv.push("--remove-db".to_string());
        }
        push_opt(&mut argv, "--db-name", self.db_name.as_deref());
        push_opt(&mut argv, "--db-user", self.db_user.as_deref());
        push_opt(&mut argv, "--root-auth", Some(value_name(&self.root_auth).as_str()));
        if self.yes {
            argv.push("--yes".to_string());
        }
        argv
    }
}
