mod cli;
mod commands;
mod config;
mod engine;
mod host;
mod platform;
mod progress;
mod recipe;
mod render;
mod resource;
mod runner;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

use platform::Overrides;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Platform settings from the command line
    pub overrides: Overrides,
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
        overrides: Overrides {
            platform: cli.platform,
            platform_family: cli.platform_family,
        },
    };

    match cli.command {
        Command::Plan(args) => commands::converge::plan(&ctx, args.json),
        Command::Apply(args) => commands::converge::apply(&ctx, args.yes, args.json),
        Command::Facts => commands::facts::run(&ctx),
        Command::Render { source } => commands::render::run(&ctx, &source),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "supervise", &mut io::stdout());
            Ok(())
        }
    }
}
