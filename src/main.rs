//! lampkitctl - LAMP stack provisioning for Ubuntu hosts
//!
//! Installs and upgrades Apache, MySQL or MariaDB and PHP through apt, and
//! manages Apache sites with their databases on the same machine.

use clap::Parser;

mod cli;
mod commands;
mod config;
mod db;
mod elevate;
mod error;
mod exec;
mod locks;
mod logging;
mod orchestrator;
mod packages;
mod preflight;
mod progress;
mod prompt;
mod session;
mod sites;
#[cfg(test)]
mod test_fixtures;
mod validate;
mod wordpress;

use cli::{Cli, Commands};
use commands::Context;
use config::Settings;
use error::{Result, exit};
use exec::SystemRunner;
use preflight::SystemHost;

fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions(args)) = &cli.command {
        return commands::completions::run(args);
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let prompter = prompt::select_prompter(cli.non_interactive);
    let runner = SystemRunner;
    let host = SystemHost;
    let mut ctx = Context::new(settings, cli.dry_run, &runner, &host, prompter.as_ref());

    let result = match &cli.command {
        Some(Commands::InstallLamp(args)) => commands::install_lamp::run(&mut ctx, args),
        Some(Commands::CreateSite(args)) => commands::create_site::run(&mut ctx, args),
        Some(Commands::UninstallSite(args)) => commands::uninstall_site::run(&mut ctx, args),
        Some(Commands::WpPermissions(args)) => commands::wp_permissions::run(&mut ctx, args),
        Some(Commands::GenerateSsl(args)) => commands::generate_ssl::run(&mut ctx, args),
        Some(Commands::ListSites(args)) => commands::list::run_sites(&mut ctx, args),
        Some(Commands::ListDbs(args)) => commands::list::run_dbs(&mut ctx, args),
        Some(Commands::Menu) | None => commands::menu::run(&mut ctx),
        Some(Commands::Completions(_)) => Ok(()),
    };
    ctx.session.clear();
    result
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    let code = match run(cli) {
        Ok(()) => exit::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}
