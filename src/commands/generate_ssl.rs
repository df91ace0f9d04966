//! generate-ssl command

use tracing::info;

use crate::cli::GenerateSslArgs;
use crate::commands::Context;
use crate::error::Result;
use crate::exec::{Invocation, run_mutation};
use crate::preflight::{CheckContext, Operation};
use crate::validate::validate_domain;

pub fn certbot_invocation(domain: &str) -> Invocation {
    Invocation::new(["certbot", "--apache", "-d", domain])
}

/// Run generate-ssl command
pub fn run(ctx: &mut Context<'_>, args: &GenerateSslArgs) -> Result<()> {
    let domain = validate_domain(&args.domain)?;
    ctx.require_root()?;
    ctx.preflight(Operation::GenerateSsl, &CheckContext::for_domain(domain))?;
    info!(domain, dry_run = ctx.dry_run, "generate_ssl");
    run_mutation(ctx.runner, &certbot_invocation(domain), ctx.dry_run)?;
    println!("Certificate issued for {domain}.");
    Ok(())
}
