//! list-sites and list-dbs commands

use console::Style;

use crate::cli::{ListDbsArgs, ListSitesArgs};
use crate::commands::Context;
use crate::error::{LampError, Result};
use crate::sites::{self, VHost};

/// Run list-sites command
pub fn run_sites(ctx: &mut Context<'_>, args: &ListSitesArgs) -> Result<()> {
    let vhosts = sites::list_vhosts(&ctx.settings.sites_available);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&vhosts)?);
    } else {
        print!("{}", render_sites(&vhosts));
    }
    Ok(())
}

/// Aligned `domain  doc_root  [SSL]` lines
pub fn render_sites(vhosts: &[VHost]) -> String {
    if vhosts.is_empty() {
        return "No sites found.\n".to_string();
    }
    let width = vhosts.iter().map(|v| v.domain.len()).max().unwrap_or_default();
    let mut out = String::new();
    for vhost in vhosts {
        let domain = format!("{:width$}", vhost.domain);
        out.push_str(&format!(
            "{}  {}",
            Style::new().bold().yellow().apply_to(domain),
            vhost.doc_root.as_deref().unwrap_or("(no DocumentRoot)")
        ));
        if vhost.ssl {
            out.push_str(&format!("  {}", Style::new().green().apply_to("[SSL]")));
        }
        out.push('\n');
    }
    out
}

/// Run list-dbs command
pub fn run_dbs(ctx: &mut Context<'_>, args: &ListDbsArgs) -> Result<()> {
    let explicit = match &args.db_root_pass_env {
        Some(var) => Some(
            std::env::var(var)
                .map_err(|_| LampError::invalid("environment variable", var.clone()))?,
        ),
        None => None,
    };
    let names = ctx.list_databases(explicit.as_deref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else if names.is_empty() {
        println!("No databases found.");
    } else {
        for name in &names {
            println!("{name}");
        }
    }
    Ok(())
}
