//! uninstall-site command

use std::path::PathBuf;

use tracing::{info, warn};

use crate::cli::UninstallSiteArgs;
use crate::commands::Context;
use crate::db::{self, RootAuth, RootCredentials};
use crate::error::{LampError, Result};
use crate::preflight::{CheckContext, Operation};
use crate::sites;
use crate::validate::validate_domain;
use crate::wordpress;

/// Run uninstall-site command
pub fn run(ctx: &mut Context<'_>, args: &UninstallSiteArgs) -> Result<()> {
    let domain = validate_domain(&args.domain)?;
    ctx.require_root()?;
    ctx.preflight(Operation::UninstallSite, &CheckContext::for_domain(domain))?;

    let doc_root = resolve_doc_root(ctx, args);
    // wp-config.php disappears with the document root, so read it first.
    let database = if args.remove_db {
        Some(resolve_database(ctx, args, &doc_root)?)
    } else {
        None
    };

    if !args.yes
        && !ctx.prompter.confirm(
            &format!("Remove site {domain} and delete {}?", doc_root.display()),
            false,
        )?
    {
        println!("Uninstall cancelled.");
        return Ok(());
    }
    info!(domain, doc_root = %doc_root.display(), remove_db = args.remove_db, dry_run = ctx.dry_run, "uninstall_site");

    if ctx.settings.vhost_enabled(domain).exists() {
        sites::disable_site(ctx.runner, domain, ctx.dry_run)?;
    }
    sites::remove_vhost(&ctx.settings.sites_available, domain, ctx.dry_run)?;
    sites::remove_host_entry(&ctx.settings.hosts_file, domain, ctx.dry_run)?;
    sites::remove_web_directory(&doc_root, &ctx.settings.web_root, ctx.dry_run)?;

    if let Some((name, user)) = database {
        let root = match args.root_auth {
            RootAuth::Socket => RootCredentials::socket(),
            RootAuth::Password => RootCredentials {
                auth: RootAuth::Password,
                password: ctx.db_root_password()?,
            },
        };
        db::drop_database_and_user(ctx.runner, &root, &name, &user, ctx.dry_run)?;
    }

    println!("Site {domain} removed.");
    Ok(())
}

/// Explicit flag, then the vhost's `DocumentRoot`, then `<web_root>/<domain>`
fn resolve_doc_root(ctx: &Context<'_>, args: &UninstallSiteArgs) -> PathBuf {
    if let Some(doc_root) = &args.doc_root {
        return doc_root.clone();
    }
    sites::list_vhosts(&ctx.settings.sites_available)
        .into_iter()
        .find(|vhost| vhost.domain == args.domain)
        .and_then(|vhost| vhost.doc_root)
        .map_or_else(
            || sites::default_doc_root(&ctx.settings.web_root, &args.domain),
            PathBuf::from,
        )
}

/// Database and account to drop; flags override `wp-config.php`
fn resolve_database(
    ctx: &mut Context<'_>,
    args: &UninstallSiteArgs,
    doc_root: &std::path::Path,
) -> Result<(String, String)> {
    let config = wordpress::parse_wp_config(doc_root).unwrap_or_default();
    let Some(name) = args.db_name.clone().or(config.name) else {
        warn!(doc_root = %doc_root.display(), "no database settings found");
        return Err(LampError::invalid(
            "database",
            "pass --db-name and --db-user, none found in wp-config.php",
        ));
    };
    let user = match args.db_user.clone().or(config.user) {
        Some(user) => user,
        None => account_named_after(ctx, &name)?,
    };
    Ok((name, user))
}

/// The server account whose user name is the database name
fn account_named_after(ctx: &mut Context<'_>, db_name: &str) -> Result<String> {
    let accounts = ctx.list_users().unwrap_or_else(|err| {
        warn!(error = %err, "could not list database users");
        Vec::new()
    });
    accounts
        .into_iter()
        .find(|account| account.split('@').next() == Some(db_name))
        .ok_or_else(|| {
            LampError::invalid(
                "database user",
                format!("pass --db-user, no account for {db_name} in wp-config.php or on the server"),
            )
        })
}
