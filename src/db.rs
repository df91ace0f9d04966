//! MySQL/MariaDB account and schema management
//!
//! SQL always travels on stdin and passwords through `MYSQL_PWD`, so neither
//! shows up in the process list or in logged argv. Names are validated
//! against [`crate::validate`] before being interpolated.

use std::fmt;

use clap::ValueEnum;
use tracing::{debug, info};

use crate::error::{LampError, Result};
use crate::exec::{CommandRunner, Invocation, run_mutation};
use crate::packages::{Engine, EngineKind};
use crate::session::Session;
use crate::validate::{validate_db_host, validate_identifier, validate_password};

/// Schemas every server ships with
pub const SYSTEM_SCHEMAS: [&str; 4] = ["information_schema", "mysql", "performance_schema", "sys"];

/// Accounts the server manages itself, never offered for removal
pub const HIDDEN_USERS: [&str; 6] = [
    "root",
    "mysql.sys",
    "mysql.session",
    "mysql.infoschema",
    "mariadb.sys",
    "debian-sys-maint",
];

pub const DEFAULT_ROOT_PLUGIN: &str = "caching_sha2_password";

/// Root password for read-only queries when none is given explicitly
pub const ROOT_PASSWORD_ENV: &str = "LAMPKITCTL_DB_ROOT_PASS";

const SHOW_DATABASES: &str = "SHOW DATABASES";
const SELECT_USERS: &str = "SELECT CONCAT(User, '@', Host) FROM mysql.user ORDER BY User, Host";
const DEFAULT_HOST: &str = "localhost";

/// How the tool authenticates as the database root user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RootAuth {
    /// Unix socket auth; works for the OS root user out of the box
    #[default]
    Socket,
    /// Password auth with the session's root password
    Password,
}

/// Root connection for account management
#[derive(Debug, Clone, Default)]
pub struct RootCredentials {
    pub auth: RootAuth,
    pub password: Option<String>,
}

impl RootCredentials {
    pub fn socket() -> Self {
        Self::default()
    }

    pub fn from_session(auth: RootAuth, session: &Session) -> Self {
        Self {
            auth,
            password: session.db_root_password().map(str::to_string),
        }
    }

    fn invocation(&self, sql: String) -> Result<Invocation> {
        let invocation = Invocation::new(["mysql", "-u", "root"]).stdin(sql);
        match (self.auth, &self.password) {
            (RootAuth::Socket, _) => Ok(invocation),
            (RootAuth::Password, Some(password)) => Ok(invocation.env("MYSQL_PWD", password)),
            (RootAuth::Password, None) => Err(LampError::invalid(
                "root authentication",
                "password auth selected but no root password given",
            )),
        }
    }
}

/// A `user@host` account; a bare user means `user@localhost`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbAccount {
    pub user: String,
    pub host: String,
}

impl DbAccount {
    pub fn parse(spec: &str) -> Result<Self> {
        let (user, host) = spec.split_once('@').unwrap_or((spec, DEFAULT_HOST));
        validate_identifier("database user", user)?;
        validate_db_host(host)?;
        Ok(Self {
            user: user.to_string(),
            host: host.to_string(),
        })
    }
}

impl fmt::Display for DbAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}

pub fn create_database_sql(db: &str, user: &str, password: &str) -> String {
    format!(
        "CREATE DATABASE IF NOT EXISTS `{db}`;\n\
         CREATE USER IF NOT EXISTS '{user}'@'localhost' IDENTIFIED BY '{password}';\n\
         GRANT ALL PRIVILEGES ON `{db}`.* TO '{user}'@'localhost';\n\
         FLUSH PRIVILEGES;\n"
    )
}

pub fn drop_database_sql(db: &str, account: &DbAccount) -> String {
    format!(
        "DROP DATABASE IF EXISTS `{db}`;\n\
         DROP USER IF EXISTS '{}'@'{}';\n\
         FLUSH PRIVILEGES;\n",
        account.user, account.host
    )
}

/// `ALTER USER` statement for the engine's root account
pub fn root_password_sql(kind: EngineKind, password: &str, plugin: &str) -> String {
    match kind {
        EngineKind::Mysql => format!(
            "ALTER USER 'root'@'localhost' IDENTIFIED WITH {plugin} BY '{password}';\nFLUSH PRIVILEGES;\n"
        ),
        EngineKind::Mariadb => format!(
            "ALTER USER 'root'@'localhost' IDENTIFIED VIA mysql_native_password USING PASSWORD('{password}');\nFLUSH PRIVILEGES;\n"
        ),
    }
}

/// Create `db` and a `user` with all privileges on it
pub fn create_database_and_user(
    runner: &dyn CommandRunner,
    root: &RootCredentials,
    db: &str,
    user: &str,
    password: &str,
    dry_run: bool,
) -> Result<()> {
    validate_identifier("database name", db)?;
    validate_identifier("database user", user)?;
    validate_password(password)?;
    info!(db, user, dry_run, "create_database_and_user");
    run_mutation(
        runner,
        &root.invocation(create_database_sql(db, user, password))?,
        dry_run,
    )?;
    Ok(())
}

/// Drop `db` and the account `user` (`name` or `name@host`)
pub fn drop_database_and_user(
    runner: &dyn CommandRunner,
    root: &RootCredentials,
    db: &str,
    user: &str,
    dry_run: bool,
) -> Result<()> {
    validate_identifier("database name", db)?;
    let account = DbAccount::parse(user)?;
    info!(db, account = %account, dry_run, "drop_database_and_user");
    run_mutation(runner, &root.invocation(drop_database_sql(db, &account))?, dry_run)?;
    Ok(())
}

/// Set the root password right after installation, over the local socket
pub fn set_root_password(
    runner: &dyn CommandRunner,
    engine: &Engine,
    password: &str,
    plugin: &str,
    dry_run: bool,
) -> Result<()> {
    validate_password(password)?;
    validate_identifier("authentication plugin", plugin)?;
    info!(engine = %engine.kind, plugin, dry_run, "set_root_password");
    let invocation = Invocation::new(["mysql", "--protocol=socket", "-u", "root"])
        .stdin(root_password_sql(engine.kind, password, plugin));
    run_mutation(runner, &invocation, dry_run)?;
    Ok(())
}

/// Non-system schema names from `SHOW DATABASES` batch output, sorted
pub fn parse_database_names(output: &str) -> Vec<String> {
    let mut names: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty() && !SYSTEM_SCHEMAS.contains(name))
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    names
}

/// `user@host` accounts from batch output, server-managed users removed, sorted
pub fn parse_user_accounts(output: &str) -> Vec<String> {
    let mut accounts: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|account| !account.is_empty())
        .filter(|account| {
            let user = account.split('@').next().unwrap_or_default();
            !HIDDEN_USERS.contains(&user)
        })
        .map(str::to_string)
        .collect();
    accounts.sort();
    accounts.dedup();
    accounts
}

/// What a read-only root query lists
#[derive(Debug, Clone, Copy)]
enum Listing {
    Databases,
    Users,
}

impl Listing {
    fn sql(self) -> &'static str {
        match self {
            Listing::Databases => SHOW_DATABASES,
            Listing::Users => SELECT_USERS,
        }
    }

    fn parse(self, output: &str) -> Vec<String> {
        match self {
            Listing::Databases => parse_database_names(output),
            Listing::Users => parse_user_accounts(output),
        }
    }

    fn batch(self, argv: &[&str]) -> Invocation {
        Invocation::new(argv.iter().copied()).args(["-N", "-B", "-e", self.sql()])
    }

    /// Over the socket, then TCP on 127.0.0.1:3306
    fn direct(self, runner: &dyn CommandRunner, password: Option<&str>) -> Result<Vec<String>> {
        let with_password = |invocation: Invocation| match password {
            Some(password) => invocation.env("MYSQL_PWD", password),
            None => invocation,
        };
        let attempts = [
            with_password(self.batch(&["mysql", "--protocol=socket", "-u", "root"])),
            with_password(self.batch(&["mysql", "-h", "127.0.0.1", "-P", "3306", "-u", "root"])),
        ];
        first_success(runner, &attempts).map(|out| self.parse(&out))
    }

    /// Through `sudo -S`: root over the socket, then the Debian maintenance account
    fn with_sudo(self, runner: &dyn CommandRunner, sudo_password: &str) -> Result<Vec<String>> {
        let stdin = format!("{sudo_password}\n");
        let attempts = [
            self.batch(&["sudo", "-S", "mysql", "--protocol=socket", "-u", "root"])
                .stdin(stdin.clone()),
            self.batch(&["sudo", "-S", "mysql", "--defaults-file=/etc/mysql/debian.cnf"])
                .stdin(stdin),
        ];
        first_success(runner, &attempts).map(|out| self.parse(&out))
    }

    fn for_session(
        self,
        runner: &dyn CommandRunner,
        session: &Session,
        explicit: Option<&str>,
    ) -> Result<Vec<String>> {
        let password = listing_password(
            explicit,
            std::env::var(ROOT_PASSWORD_ENV).ok(),
            session,
        );
        match self.direct(runner, password.as_deref()) {
            Ok(items) => Ok(items),
            Err(err) => match session.sudo_password() {
                Some(sudo) => self.with_sudo(runner, sudo),
                None => Err(err),
            },
        }
    }
}

/// Run `attempts` in order; the first successful one answers
fn first_success(runner: &dyn CommandRunner, attempts: &[Invocation]) -> Result<String> {
    let mut last_error = LampError::invalid("database query", "no connection method available");
    for invocation in attempts {
        match runner.run(invocation) {
            Ok(output) if output.success() => return Ok(output.stdout),
            Ok(output) => {
                debug!(cmd = %invocation.display(), status = %output.status_text(), "database query failed");
                last_error = LampError::CommandFailed {
                    command: invocation.display(),
                    status: output.status_text(),
                    output: output.combined(),
                };
            }
            Err(err) => {
                last_error = LampError::CommandSpawnFailed {
                    program: invocation.program().to_string(),
                    reason: err.to_string(),
                };
            }
        }
    }
    Err(last_error)
}

/// Root password for listings: `explicit`, then `env` (from
/// [`ROOT_PASSWORD_ENV`]), then the session's cached password
pub fn listing_password(
    explicit: Option<&str>,
    env: Option<String>,
    session: &Session,
) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| env.filter(|value| !value.is_empty()))
        .or_else(|| session.db_root_password().map(str::to_string))
}

/// List user databases over the socket, then TCP on 127.0.0.1:3306
pub fn list_databases(runner: &dyn CommandRunner, password: Option<&str>) -> Result<Vec<String>> {
    Listing::Databases.direct(runner, password)
}

/// List user databases through `sudo -S`, feeding the sudo password on stdin
pub fn list_databases_with_sudo(
    runner: &dyn CommandRunner,
    sudo_password: &str,
) -> Result<Vec<String>> {
    Listing::Databases.with_sudo(runner, sudo_password)
}

/// Every listing strategy the credentials at hand allow
pub fn list_databases_for_session(
    runner: &dyn CommandRunner,
    session: &Session,
    explicit: Option<&str>,
) -> Result<Vec<String>> {
    Listing::Databases.for_session(runner, session, explicit)
}

/// `user@host` accounts over the socket, then TCP
pub fn list_users(runner: &dyn CommandRunner, password: Option<&str>) -> Result<Vec<String>> {
    Listing::Users.direct(runner, password)
}

pub fn list_users_with_sudo(runner: &dyn CommandRunner, sudo_password: &str) -> Result<Vec<String>> {
    Listing::Users.with_sudo(runner, sudo_password)
}

pub fn list_users_for_session(
    runner: &dyn CommandRunner,
    session: &Session,
    explicit: Option<&str>,
) -> Result<Vec<String>> {
    Listing::Users.for_session(runner, session, explicit)
}
