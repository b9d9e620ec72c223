use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::CONFIG_ENV;

#[derive(Parser)]
#[command(name = "supervise")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Converge a host to run the supervisor process control daemon", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/supervise/config.toml, then /etc/supervise/config.toml)
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Platform to converge for, instead of detecting it
    #[arg(long, global = true)]
    pub platform: Option<String>,

    /// Platform family, instead of deriving it from the platform
    #[arg(long, global = true)]
    pub platform_family: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change, without changing anything
    Plan(PlanArgs),

    /// Converge the host
    Apply(ApplyArgs),

    /// Show detected platform facts and resolved settings
    Facts,

    /// Render a template with the configured variables
    Render {
        /// Template source, e.g. supervisord.conf or debian/supervisor.init
        source: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct PlanArgs {
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Don't ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Print the resulting report as JSON (requires --yes)
    #[arg(long, requires = "yes")]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "supervise",
            "plan",
            "--json",
            "--platform",
            "smartos",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.platform.as_deref(), Some("smartos"));
        assert!(matches!(cli.command, Command::Plan(PlanArgs { json: true })));
    }

    #[test]
    fn test_apply_json_requires_yes() {
        assert!(Cli::try_parse_from(["supervise", "apply", "--json"]).is_err());
        assert!(Cli::try_parse_from(["supervise", "apply", "--json", "--yes"]).is_ok());
    }
}
