//! Interactive menu
//!
//! Each entry gathers arguments through the [`Prompter`] and then runs the
//! same command function the CLI uses. A failed action is reported and the
//! menu continues. Installing the stack from the main menu ends the session;
//! a site action blocked by a missing stack may install it and run again.
//! When an action needs root, the equivalent subcommand is relaunched under
//! sudo.

use std::path::PathBuf;

use console::Style;

use crate::cli::{
    CreateSiteArgs, GenerateSslArgs, InstallLampArgs, ListSitesArgs, UninstallSiteArgs,
    WpPermissionsArgs,
};
use crate::commands::{
    Context, create_site, generate_ssl, install_lamp, list, uninstall_site, wp_permissions,
};
use crate::db::{self, RootAuth};
use crate::elevate;
use crate::error::{LampError, Result};
use crate::packages::EngineChoice;
use crate::prompt::Prompter;
use crate::sites::{self, VHost};
use crate::validate::{validate_domain, validate_identifier};
use crate::wordpress::{self, WpConfig};

const MAIN_OPTIONS: [&str; 8] = [
    "Install LAMP server",
    "Create a site",
    "Uninstall site",
    "Set WordPress permissions",
    "Generate SSL certificate",
    "List installed sites",
    "List databases",
    "Exit",
];

const CUSTOM: &str = "Custom...";

/// Outcome of one menu entry
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

type Install = fn(&mut Context<'_>) -> Result<()>;

/// Run the menu until the operator exits
pub fn run(ctx: &mut Context<'_>) -> Result<()> {
    if !ctx.prompter.is_interactive() {
        return Err(LampError::invalid(
            "mode",
            "the menu needs an interactive terminal; run a subcommand instead",
        ));
    }
    let options = owned(&MAIN_OPTIONS);
    loop {
        let choice = ctx.prompter.select("Main > Choose an option", &options, 0)?;
        let outcome = match choice {
            0 => install_flow(ctx),
            1 => create_site_flow(ctx),
            2 => uninstall_site_flow(ctx),
            3 => wp_permissions_flow(ctx),
            4 => generate_ssl_flow(ctx),
            5 => list_sites_flow(ctx),
            6 => list_dbs_flow(ctx),
            _ => Ok(Flow::Exit),
        };
        match outcome {
            Ok(Flow::Exit) => return Ok(()),
            Ok(Flow::Continue) => {}
            Err(err @ LampError::ElevationRequired) => return Err(err),
            Err(err) => report(&err),
        }
    }
}

fn owned(options: &[&str]) -> Vec<String> {
    options.iter().map(|o| (*o).to_string()).collect()
}

fn report(err: &LampError) {
    eprintln!("{} {err}", Style::new().red().bold().apply_to("Error:"));
}

fn warn(message: &str) {
    eprintln!("{} {message}", Style::new().yellow().bold().apply_to("Warning:"));
}

/// Run `action` with `subcommand` as the command line sudo would relaunch
fn with_relaunch<'a, T>(
    ctx: &mut Context<'a>,
    subcommand: &[String],
    action: impl FnOnce(&mut Context<'a>) -> Result<T>,
) -> Result<T> {
    let process: Vec<String> = std::env::args().collect();
    ctx.command_line = Some(elevate::relaunch_argv(&process, subcommand));
    let result = action(ctx);
    ctx.command_line = None;
    result
}

fn install_flow(ctx: &mut Context<'_>) -> Result<Flow> {
    install_stack(ctx)?;
    Ok(Flow::Exit)
}

fn install_stack(ctx: &mut Context<'_>) -> Result<()> {
    let engines = owned(&["Auto", "MySQL", "MariaDB"]);
    let db_engine = match ctx
        .prompter
        .select("Main > Install LAMP server > Database engine", &engines, 0)?
    {
        1 => EngineChoice::Mysql,
        2 => EngineChoice::Mariadb,
        _ => EngineChoice::Auto,
    };
    let wait = ctx
        .prompter
        .confirm("Main > Install LAMP server > Wait for apt lock?", true)?;
    let set_db_root_pass = ctx.prompter.confirm(
        "Main > Install LAMP server > Set database root password now?",
        true,
    )?;
    let args = InstallLampArgs {
        db_engine,
        wait_apt_lock: Some(if wait { ctx.settings.wait_apt_lock } else { 0 }),
        no_refresh: false,
        yes: false,
        reinstall: false,
        set_db_root_pass,
        db_root_pass: None,
        db_root_pass_env: None,
        db_root_plugin: db::DEFAULT_ROOT_PLUGIN.to_string(),
    };
    with_relaunch(ctx, &args.to_argv(), |ctx| install_lamp::run(ctx, &args))
}

/// Offer install-lamp when a site action was blocked by a missing stack
///
/// Returns whether the stack was installed.
fn offer_install(ctx: &mut Context<'_>, err: LampError, install: Install) -> Result<bool> {
    if !matches!(err, LampError::PreflightBlocked { .. }) {
        return Err(err);
    }
    report(&err);
    if !ctx.prompter.confirm("Run install-lamp now?", false)? {
        return Ok(false);
    }
    install(ctx)?;
    Ok(true)
}

/// Run a site action; after an install it offers, the action runs once more
fn run_site_action<'a>(
    ctx: &mut Context<'a>,
    subcommand: &[String],
    action: impl Fn(&mut Context<'a>) -> Result<()>,
    install: Install,
) -> Result<Flow> {
    let Err(err) = with_relaunch(ctx, subcommand, &action) else {
        return Ok(Flow::Continue);
    };
    if offer_install(ctx, err, install)? {
        with_relaunch(ctx, subcommand, &action)?;
    }
    Ok(Flow::Continue)
}

fn create_site_flow(ctx: &mut Context<'_>) -> Result<Flow> {
    let prompter = ctx.prompter;
    let domain = prompter.text("Main > Create a site > Domain", None)?;
    if domain.is_empty() {
        return Ok(Flow::Continue);
    }
    validate_domain(&domain)?;
    let default_root = sites::default_doc_root(&ctx.settings.web_root, &domain);
    let entered = prompter.text(
        "Main > Create a site > Document root",
        Some(&default_root.to_string_lossy()),
    )?;
    let doc_root = if entered.trim().is_empty() {
        default_root
    } else {
        PathBuf::from(entered)
    };
    let db_name = prompter.text("Main > Create a site > Database name", None)?;
    validate_identifier("database name", &db_name)?;
    let db_user = prompter.text("Main > Create a site > Database user", None)?;
    validate_identifier("database user", &db_user)?;
    let db_password = prompter.password("Main > Create a site > Database password")?;
    let wordpress = prompter.confirm("Main > Create a site > Install WordPress?", false)?;

    let args = CreateSiteArgs {
        domain,
        doc_root: Some(doc_root),
        db_name,
        db_user,
        db_password,
        root_auth: RootAuth::Socket,
        wordpress,
    };
    run_site_action(
        ctx,
        &args.to_argv(),
        |ctx| create_site::run(ctx, &args),
        install_stack,
    )
}

/// A configured vhost or a domain typed by hand
enum SiteChoice {
    Existing(VHost),
    Custom(String),
}

fn site_label(vhost: &VHost) -> String {
    let mut label = format!(
        "{}  -  {}",
        vhost.domain,
        vhost.doc_root.as_deref().unwrap_or("(no DocumentRoot)")
    );
    if vhost.ssl {
        label.push_str("  [SSL]");
    }
    label
}

fn choose_site(ctx: &Context<'_>, section: &str) -> Result<Option<SiteChoice>> {
    let vhosts = sites::list_vhosts(&ctx.settings.sites_available);
    let mut options: Vec<String> = vhosts.iter().map(site_label).collect();
    options.push(CUSTOM.to_string());
    let index = ctx
        .prompter
        .select(&format!("Main > {section} > Select a site"), &options, 0)?;
    match vhosts.into_iter().nth(index) {
        Some(vhost) => Ok(Some(SiteChoice::Existing(vhost))),
        None => {
            let domain = ctx
                .prompter
                .text(&format!("Main > {section} > Domain"), None)?;
            Ok((!domain.is_empty()).then_some(SiteChoice::Custom(domain)))
        }
    }
}

/// Pick the database to drop, preselecting `DB_NAME` from `wp-config.php`
fn choose_database(ctx: &mut Context<'_>, preselect: Option<&str>) -> Result<String> {
    let names = match ctx.list_databases(None) {
        Ok(names) if !names.is_empty() => names,
        Ok(_) => return ctx.prompter.text("Main > Uninstall site > Database name", preselect),
        Err(err) => {
            warn(&format!("{err}; falling back to manual database entry"));
            return ctx.prompter.text("Main > Uninstall site > Database name", preselect);
        }
    };
    let default = match preselect {
        Some(name) => names.iter().position(|n| n == name).unwrap_or_else(|| {
            warn(&format!("DB from wp-config.php not found on server: {name}"));
            0
        }),
        None => 0,
    };
    let mut options = names.clone();
    options.push(CUSTOM.to_string());
    let index = ctx
        .prompter
        .select("Main > Uninstall site > Select database", &options, default)?;
    match names.into_iter().nth(index) {
        Some(name) => Ok(name),
        None => ctx.prompter.text("Main > Uninstall site > Database name", None),
    }
}

/// Pick the account to drop, preselecting the `wp-config.php` user
fn choose_user(ctx: &mut Context<'_>, config: &WpConfig) -> Result<String> {
    const PROMPT: &str = "Main > Uninstall site > Database user";
    let wp_account = config.account();
    let accounts = match ctx.list_users() {
        Ok(accounts) if !accounts.is_empty() => accounts,
        Ok(_) => return ctx.prompter.text(PROMPT, wp_account.as_deref()),
        Err(err) => {
            if let Some(account) = wp_account {
                warn(&format!("Could not list DB users. Using wp-config.php user: {account}"));
                return Ok(account);
            }
            warn(&format!("{err}; falling back to manual user entry"));
            return ctx.prompter.text(PROMPT, None);
        }
    };
    let default = wp_account
        .as_deref()
        .and_then(|wanted| {
            accounts.iter().position(|account| account == wanted).or_else(|| {
                let user = config.user.as_deref()?;
                accounts
                    .iter()
                    .position(|account| account.split('@').next() == Some(user))
            })
        })
        .unwrap_or(0);
    let mut options = accounts.clone();
    options.push(CUSTOM.to_string());
    let index = ctx
        .prompter
        .select("Main > Uninstall site > Select database user", &options, default)?;
    match accounts.into_iter().nth(index) {
        Some(account) => Ok(account),
        None => ctx.prompter.text(PROMPT, None),
    }
}

fn uninstall_site_flow(ctx: &mut Context<'_>) -> Result<Flow> {
    let Some(choice) = choose_site(ctx, "Uninstall site")? else {
        return Ok(Flow::Continue);
    };
    let (domain, doc_root) = match choice {
        SiteChoice::Existing(vhost) => (vhost.domain, vhost.doc_root),
        SiteChoice::Custom(domain) => {
            let doc_root = ctx
                .prompter
                .text("Main > Uninstall site > Document root", Some(""))?;
            (domain, (!doc_root.is_empty()).then_some(doc_root))
        }
    };

    let remove_db = ctx
        .prompter
        .confirm("Main > Uninstall site > Also drop the database?", false)?;
    let (mut db_name, mut db_user) = (None, None);
    if remove_db {
        let config = doc_root
            .as_deref()
            .and_then(|root| wordpress::parse_wp_config(root.as_ref()))
            .unwrap_or_default();
        db_name = Some(choose_database(ctx, config.name.as_deref())?);
        db_user = Some(choose_user(ctx, &config)?);
    }

    if !ctx.prompter.confirm(&format!("Remove site {domain}?"), false)?
        || !ctx
            .prompter
            .confirm("This action is destructive. Continue?", false)?
    {
        return Ok(Flow::Continue);
    }
    let args = UninstallSiteArgs {
        domain,
        doc_root: doc_root.map(Into::into),
        remove_db,
        db_name,
        db_user,
        root_auth: RootAuth::Socket,
        yes: true,
    };
    run_site_action(
        ctx,
        &args.to_argv(),
        |ctx| uninstall_site::run(ctx, &args),
        install_stack,
    )
}

fn wp_permissions_flow(ctx: &mut Context<'_>) -> Result<Flow> {
    let Some(choice) = choose_site(ctx, "Set WordPress permissions")? else {
        return Ok(Flow::Continue);
    };
    let doc_root = match choice {
        SiteChoice::Existing(VHost {
            doc_root: Some(doc_root),
            ..
        }) => doc_root,
        SiteChoice::Existing(_) => {
            return Err(LampError::invalid("site", "selected vhost has no DocumentRoot"));
        }
        SiteChoice::Custom(path) => path,
    };
    let args = WpPermissionsArgs {
        doc_root: doc_root.into(),
    };
    run_site_action(
        ctx,
        &args.to_argv(),
        |ctx| wp_permissions::run(ctx, &args),
        install_stack,
    )
}

fn generate_ssl_flow(ctx: &mut Context<'_>) -> Result<Flow> {
    let Some(choice) = choose_site(ctx, "Generate SSL certificate")? else {
        return Ok(Flow::Continue);
    };
    let domain = match choice {
        SiteChoice::Existing(vhost) => {
            if vhost.ssl {
                warn("SSL appears configured for this site");
                if !ctx.prompter.confirm("Re-issue certificate?", false)? {
                    return Ok(Flow::Continue);
                }
            }
            vhost.domain
        }
        SiteChoice::Custom(domain) => domain,
    };
    let args = GenerateSslArgs { domain };
    with_relaunch(ctx, &args.to_argv(), |ctx| generate_ssl::run(ctx, &args))?;
    Ok(Flow::Continue)
}

fn list_sites_flow(ctx: &mut Context<'_>) -> Result<Flow> {
    if !ctx.host.has_command("apache2") || !ctx.host.path_exists(&ctx.settings.sites_available) {
        return Err(LampError::invalid("state", "Apache not installed. No sites to list."));
    }
    list::run_sites(ctx, &ListSitesArgs { json: false })?;
    Ok(Flow::Continue)
}

fn list_dbs_flow(ctx: &mut Context<'_>) -> Result<Flow> {
    let names = ctx.list_databases(None)?;
    if names.is_empty() {
        println!("No databases found.");
    }
    for name in names {
        println!("{name}");
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::CommandOutput;
    use crate::test_fixtures::{FakeRunner, ScriptedPrompter, SiteLayout};
    use std::fs;

    const EXIT: usize = 7;
    const USERS_SQL: &str = "SELECT CONCAT(User, '@', Host) FROM mysql.user ORDER BY User, Host";

    fn socket_query(sql: &str) -> Vec<String> {
        ["mysql", "--protocol=socket", "-u", "root", "-N", "-B", "-e", sql]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    fn blocked() -> LampError {
        LampError::PreflightBlocked {
            failures: vec!["PHP is not installed".to_string()],
        }
    }

    #[test]
    fn test_non_interactive_refuses() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new();
        let host = site.host();
        let prompter = ScriptedPrompter::new().non_interactive();
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);
        assert!(run(&mut ctx).is_err());
    }

    #[test]
    fn test_errors_return_to_menu() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new();
        let host = site.host().without_command("apache2");
        // list sites fails, then exit
        let prompter = ScriptedPrompter::new().with_select(5).with_select(EXIT);
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);
        run(&mut ctx).unwrap();
        assert_eq!(prompter.asked().len(), 2);
    }

    #[test]
    fn test_create_site_flow_builds_args() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new()
            .on(["a2ensite"], CommandOutput::ok(""))
            .on(["systemctl"], CommandOutput::ok(""))
            .on(["mysql"], CommandOutput::ok(""));
        let host = site.host();
        let prompter = ScriptedPrompter::new()
            .with_select(1)
            .with_text("shop.test")
            .with_text("")
            .with_text("shop")
            .with_text("shop_user")
            .with_password("s3cret-pass")
            .with_confirm(false)
            .with_select(EXIT);
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);

        run(&mut ctx).unwrap();

        assert!(site.settings.vhost_available("shop.test").exists());
        assert!(
            fs::read_to_string(&site.settings.hosts_file)
                .unwrap()
                .contains("shop.test")
        );
    }

    #[test]
    fn test_uninstall_flow_preselects_wp_database() {
        let site = SiteLayout::new();
        let doc_root = site.settings.web_root.join("shop.test");
        fs::create_dir_all(&doc_root).unwrap();
        fs::write(
            doc_root.join("wp-config.php"),
            "define('DB_NAME', 'shop');\ndefine('DB_USER', 'shop_user');\n",
        )
        .unwrap();
        sites::write_vhost(&site.settings.sites_available, "shop.test", &doc_root, false).unwrap();
        let runner = FakeRunner::new()
            .on(socket_query("SHOW DATABASES"), CommandOutput::ok("blog\nshop\n"))
            .on(
                socket_query(USERS_SQL),
                CommandOutput::ok("blog@localhost\nshop_user@localhost\n"),
            )
            .on(["mysql", "-u", "root"], CommandOutput::ok(""));
        let host = site.host();
        let prompter = ScriptedPrompter::new()
            .with_select(2)
            .with_select(0)
            .with_confirm(true)
            .with_select(1)
            .with_select(1)
            .with_confirm(true)
            .with_confirm(true)
            .with_select(EXIT);
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);

        run(&mut ctx).unwrap();

        assert!(!doc_root.exists());
        let drop = runner
            .invocations()
            .into_iter()
            .find(|inv| inv.argv == ["mysql", "-u", "root"])
            .unwrap();
        let sql = drop.stdin.unwrap();
        assert!(sql.contains("DROP DATABASE IF EXISTS `shop`;"));
        assert!(sql.contains("DROP USER IF EXISTS 'shop_user'@'localhost';"));
    }

    #[test]
    fn test_choose_database_preselects_wp_config_name() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new().on(["mysql"], CommandOutput::ok("blog\nshop\nsys\n"));
        let host = site.host();
        let prompter = ScriptedPrompter::new();
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);
        assert_eq!(choose_database(&mut ctx, Some("shop")).unwrap(), "shop");
        assert_eq!(choose_database(&mut ctx, Some("gone")).unwrap(), "blog");
    }

    #[test]
    fn test_choose_database_falls_back_to_text() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new().on(["mysql"], CommandOutput::failed(1, "Access denied"));
        let host = site.host();
        let prompter = ScriptedPrompter::new().with_password("sudo-pw");
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);
        // root host: no sudo prompt, manual entry with the wp-config default
        assert_eq!(choose_database(&mut ctx, Some("shop")).unwrap(), "shop");
        assert!(!prompter.asked().contains(&"sudo password".to_string()));
    }

    #[test]
    fn test_uninstall_flow_declined() {
        let site = SiteLayout::new();
        let doc_root = site.settings.web_root.join("shop.test");
        fs::create_dir_all(&doc_root).unwrap();
        sites::write_vhost(&site.settings.sites_available, "shop.test", &doc_root, false).unwrap();
        let runner = FakeRunner::new();
        let host = site.host();
        let prompter = ScriptedPrompter::new()
            .with_select(2)
            .with_select(0)
            .with_confirm(false)
            .with_confirm(false)
            .with_select(EXIT);
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);

        run(&mut ctx).unwrap();
        assert!(doc_root.exists());
        assert!(
            prompter
                .asked()
                .contains(&"Remove site shop.test?".to_string())
        );
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_blocked_site_action_offers_install() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new();
        let host = site.host().without_command("php");
        let prompter = ScriptedPrompter::new()
            .with_select(1)
            .with_text("shop.test")
            .with_text("")
            .with_text("shop")
            .with_text("shop_user")
            .with_password("s3cret-pass")
            .with_confirm(false)
            .with_confirm(false)
            .with_select(EXIT);
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);

        run(&mut ctx).unwrap();
        assert!(prompter.asked().contains(&"Run install-lamp now?".to_string()));
    }

    #[test]
    fn test_choose_user_preselects_wp_account() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new().on(
            ["mysql"],
            CommandOutput::ok("blog@localhost\nroot@localhost\nwpuser@dbhost\nwpuser@localhost\n"),
        );
        let host = site.host();
        let prompter = ScriptedPrompter::new();
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);
        let config = WpConfig {
            user: Some("wpuser".to_string()),
            host: Some("dbhost".to_string()),
            ..WpConfig::default()
        };
        assert_eq!(choose_user(&mut ctx, &config).unwrap(), "wpuser@dbhost");
    }

    #[test]
    fn test_choose_user_falls_back_to_wp_config() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new().on(["mysql"], CommandOutput::failed(1, "Access denied"));
        let host = site.host();
        let prompter = ScriptedPrompter::new();
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);
        let config = WpConfig {
            user: Some("wpuser".to_string()),
            host: Some("dbhost".to_string()),
            ..WpConfig::default()
        };
        assert_eq!(choose_user(&mut ctx, &config).unwrap(), "wpuser@dbhost");
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn test_choose_user_without_wp_config_asks() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new().on(["mysql"], CommandOutput::failed(1, "Access denied"));
        let host = site.host();
        let prompter = ScriptedPrompter::new().with_text("legacy");
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);
        assert_eq!(choose_user(&mut ctx, &WpConfig::default()).unwrap(), "legacy");
    }

    #[test]
    fn test_blocked_action_resumes_after_install() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new();
        let host = site.host();
        let prompter = ScriptedPrompter::new().with_confirm(true);
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);
        let attempts = std::cell::Cell::new(0);
        let subcommand = vec!["wp-permissions".to_string(), "/var/www/shop".to_string()];

        let flow = run_site_action(
            &mut ctx,
            &subcommand,
            |ctx| {
                attempts.set(attempts.get() + 1);
                assert_eq!(ctx.relaunch_command().last(), subcommand.last());
                if attempts.get() == 1 { Err(blocked()) } else { Ok(()) }
            },
            |_| Ok(()),
        )
        .unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(attempts.get(), 2);
        assert!(ctx.command_line.is_none());
    }

    #[test]
    fn test_declined_install_does_not_retry() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new();
        let host = site.host();
        let prompter = ScriptedPrompter::new().with_confirm(false);
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);
        let attempts = std::cell::Cell::new(0);

        let flow = run_site_action(
            &mut ctx,
            &[],
            |_| {
                attempts.set(attempts.get() + 1);
                Err(blocked())
            },
            |_| panic!("install must not run"),
        )
        .unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_failed_install_skips_retry() {
        let site = SiteLayout::new();
        let runner = FakeRunner::new();
        let host = site.host();
        let prompter = ScriptedPrompter::new().with_confirm(true);
        let mut ctx = Context::new(site.settings.clone(), false, &runner, &host, &prompter);
        let attempts = std::cell::Cell::new(0);

        let result = run_site_action(
            &mut ctx,
            &[],
            |_| {
                attempts.set(attempts.get() + 1);
                Err(blocked())
            },
            |_| Err(LampError::invalid("apt", "unreachable mirror")),
        );

        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
    }
}
