mod cli;
mod commands;
mod config;
mod resource;
mod runner;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Overrides;
use std::io;
use std::process;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub json: bool,
    pub config: Option<String>,
    pub overrides: Overrides,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        process::exit(report(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        json: cli.json,
        config: cli.config,
        overrides: Overrides {
            api_key: cli.api_key,
            api_secret: cli.api_secret,
            base_url: cli.base_url,
            timeout_secs: cli.timeout,
        },
    };
    log::trace!("verbosity {}", ctx.verbose);

    match cli.command {
        Command::Server(args) => commands::server::run(&ctx, args),
        Command::Webapp(args) => commands::webapp::run(&ctx, args),
        Command::Domain(args) => commands::domain::run(&ctx, args),
        Command::Ssl(args) => commands::ssl::run(&ctx, args),
        Command::Database(args) => commands::database::run(&ctx, args),
        Command::DatabaseUser(args) => commands::account::run_database_user(&ctx, args),
        Command::SystemUser(args) => commands::account::run_system_user(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "rcctl", &mut io::stdout());
            Ok(())
        }
    }
}

/// Print a failed run and return its exit code
fn report(err: &anyhow::Error) -> i32 {
    ui::error(&format!("{err:#}"));
    match err.downcast_ref::<runcloud_api::Error>() {
        Some(api) => {
            let category = api.category();
            if let Some(status) = api.status() {
                log::debug!("HTTP status {status}");
            }
            ui::dim(&format!("{category}: {}", category.advice()));
            category.exit_code()
        }
        None => 1,
    }
}
