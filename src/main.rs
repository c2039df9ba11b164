mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Config file override
    pub config: Option<PathBuf>,
    /// State file override
    pub state: Option<PathBuf>,
}

impl Context {
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => paths::config_file(),
        }
    }

    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state {
            Some(path) => Ok(path.clone()),
            None => paths::state_file(),
        }
    }
}

fn main() -> Result<()> {
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

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
        state: cli.state,
    };
    log::debug!("credctl verbosity {}", ctx.verbose);

    match cli.command {
        Command::Plan(args) => {
            commands::declarative::plan(&ctx, args.target.as_deref(), args.no_refresh)
        }
        Command::Apply(args) => commands::declarative::apply(
            &ctx,
            &commands::declarative::ApplyRequest {
                target: args.target.as_deref(),
                dry_run: args.dry_run,
                yes: args.yes,
                jobs: args.jobs,
                no_refresh: args.no_refresh,
            },
        ),
        Command::Refresh(args) => commands::declarative::refresh(&ctx, args.target.as_deref()),
        Command::Import { address, id } => commands::import::run(&ctx, &address, &id),
        Command::Destroy(args) => {
            commands::declarative::destroy(&ctx, args.target.as_deref(), args.yes, args.jobs)
        }
        Command::Show(args) => commands::show::run(&ctx, args.target.as_deref(), args.json),
        Command::Id(cmd) => commands::id::run(cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "credctl", &mut io::stdout());
            Ok(())
        }
    }
}
