//! Plan and apply with console output

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use declarative::{ActionPlan, ExecuteOptions, Host, NoProgress, PlatformFacts, ResourceCollection};

use crate::progress::SpinnerProgress;

use super::differ::{display_plan, print_summary};

/// Options for a console run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Skip the confirmation prompt
    pub yes: bool,
    /// Print the plan as JSON instead of the console view
    pub json: bool,
    pub verbose: bool,
}

fn dry_run(
    collection: &ResourceCollection,
    facts: &PlatformFacts,
    host: &dyn Host,
    verbose: bool,
) -> Result<ActionPlan> {
    let opts = ExecuteOptions {
        dry_run: true,
        verbose,
    };
    Ok(declarative::converge(
        collection,
        facts,
        host,
        &opts,
        &mut NoProgress,
    )?)
}

fn print_json(plan: &ActionPlan) -> Result<()> {
    let json = serde_json::to_string_pretty(plan).context("Failed to serialize plan")?;
    println!("{json}");
    Ok(())
}

/// Show what a run would change without changing anything
pub fn plan(
    collection: &ResourceCollection,
    facts: &PlatformFacts,
    host: &dyn Host,
    opts: &RunOptions,
) -> Result<ActionPlan> {
    let plan = dry_run(collection, facts, host, opts.verbose)?;
    if opts.json {
        print_json(&plan)?;
    } else {
        display_plan(&plan, opts.verbose);
    }
    Ok(plan)
}

/// Converge the host, after showing the plan and asking for confirmation
pub fn apply(
    collection: &ResourceCollection,
    facts: &PlatformFacts,
    host: &dyn Host,
    opts: &RunOptions,
) -> Result<ActionPlan> {
    if !opts.json {
        let preview = dry_run(collection, facts, host, opts.verbose)?;
        display_plan(&preview, opts.verbose);

        if preview.is_not_applicable() || preview.is_noop() {
            return Ok(preview);
        }

        if !opts.yes && !confirm_proceed()? {
            println!();
            println!("  {} Aborted", "✗".red());
            return Ok(preview);
        }
        println!();
    }

    let run_opts = ExecuteOptions {
        dry_run: false,
        verbose: opts.verbose,
    };
    let result = if opts.json {
        declarative::converge(collection, facts, host, &run_opts, &mut NoProgress)
    } else {
        let mut progress = SpinnerProgress::new(opts.verbose);
        let result = declarative::converge(collection, facts, host, &run_opts, &mut progress);
        progress.finish();
        result
    };
    let plan = result?;

    if opts.json {
        print_json(&plan)?;
    } else {
        print_summary(&plan);
    }
    Ok(plan)
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}
