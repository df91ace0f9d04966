//! create-site command

use tracing::info;

use crate::cli::CreateSiteArgs;
use crate::commands::Context;
use crate::db::{self, RootAuth, RootCredentials};
use crate::error::Result;
use crate::preflight::{CheckContext, Operation};
use crate::sites;
use crate::validate::{validate_domain, validate_identifier, validate_password};
use crate::wordpress;

/// Run create-site command
pub fn run(ctx: &mut Context<'_>, args: &CreateSiteArgs) -> Result<()> {
    let domain = validate_domain(&args.domain)?;
    validate_identifier("database name", &args.db_name)?;
    validate_identifier("database user", &args.db_user)?;
    validate_password(&args.db_password)?;

    ctx.require_root()?;
    ctx.preflight(Operation::CreateSite, &CheckContext::for_domain(domain))?;

    let doc_root = args
        .doc_root
        .clone()
        .unwrap_or_else(|| sites::default_doc_root(&ctx.settings.web_root, domain));
    info!(domain, doc_root = %doc_root.display(), wordpress = args.wordpress, dry_run = ctx.dry_run, "create_site");

    let root = match args.root_auth {
        RootAuth::Socket => RootCredentials::socket(),
        RootAuth::Password => RootCredentials {
            auth: RootAuth::Password,
            password: ctx.db_root_password()?,
        },
    };

    sites::create_web_directory(&doc_root, ctx.dry_run)?;
    sites::write_vhost(&ctx.settings.sites_available, domain, &doc_root, ctx.dry_run)?;
    sites::enable_site(ctx.runner, domain, ctx.dry_run)?;
    sites::add_host_entry(&ctx.settings.hosts_file, domain, sites::LOOPBACK, ctx.dry_run)?;
    db::create_database_and_user(
        ctx.runner,
        &root,
        &args.db_name,
        &args.db_user,
        &args.db_password,
        ctx.dry_run,
    )?;
    if args.wordpress {
        wordpress::install_wordpress(
            ctx.runner,
            &doc_root,
            &args.db_name,
            &args.db_user,
            &args.db_password,
            ctx.dry_run,
        )?;
    }

    println!("Site {domain} created at {}", doc_root.display());
    Ok(())
}
