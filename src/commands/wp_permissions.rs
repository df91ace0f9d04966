//! wp-permissions command

use crate::cli::WpPermissionsArgs;
use crate::commands::Context;
use crate::error::Result;
use crate::preflight::{CheckContext, Operation};
use crate::wordpress::{self, WEB_OWNER};

/// Run wp-permissions command
pub fn run(ctx: &mut Context<'_>, args: &WpPermissionsArgs) -> Result<()> {
    ctx.require_root()?;
    ctx.preflight(
        Operation::WpPermissions,
        &CheckContext::for_doc_root(&args.doc_root),
    )?;
    wordpress::set_permissions(ctx.runner, &args.doc_root, WEB_OWNER, ctx.dry_run)?;
    println!("Permissions reset for {}", args.doc_root.display());
    Ok(())
}
