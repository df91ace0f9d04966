use clap::Parser;

/// Arguments for the list-sites command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List sites:\n    lampkitctl list-sites\n\n\
                  Machine-readable output:\n    lampkitctl list-sites --json")]
pub struct ListSitesArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the list-dbs command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List databases over the local socket:\n    lampkitctl list-dbs\n\n\
                  Use a root password from the environment:\n    DBPW=... lampkitctl list-dbs --db-root-pass-env DBPW")]
pub struct ListDbsArgs {
    /// Environment variable holding the database root password
    #[arg(long, value_name = "VAR")]
    pub db_root_pass_env: Option<String>,

    /// Print JSON instead of one name per line
    #[arg(long)]
    pub json: bool,
}
