//! Plan display

use colored::{ColoredString, Colorize};
use declarative::{ActionPlan, ChangeKind, ExecuteSummary, Outcome, PlanStep, ResourceState, RunStatus};

fn symbol(outcome: &Outcome) -> ColoredString {
    match outcome {
        Outcome::Applied {
            change: ChangeKind::Create,
        } => "+".green(),
        Outcome::Applied {
            change: ChangeKind::Update,
        } => "~".yellow(),
        Outcome::NoOp => "○".dimmed(),
        Outcome::Skipped { .. } => "⊘".dimmed(),
    }
}

fn state_change(current: Option<&ResourceState>, desired: Option<&ResourceState>) -> String {
    match (current, desired) {
        (Some(ResourceState::Absent), Some(desired)) => format!("(absent) → {desired}"),
        (Some(current), Some(desired)) => format!("{current} → {desired}"),
        _ => String::new(),
    }
}

/// Display a plan; unchanged resources only when verbose
pub fn display_plan(plan: &ActionPlan, verbose: bool) {
    if let RunStatus::NotApplicable { reason } = &plan.status {
        println!();
        println!("  {} Skipping: {reason}", "ℹ".blue());
        return;
    }

    if plan.is_noop() && !verbose {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    let title = if plan.dry_run {
        "Convergence Plan"
    } else {
        "Convergence Report"
    };

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        title.bold()
    );
    println!("│");

    for step in &plan.steps {
        match step {
            PlanStep::Resource(report) => {
                let detail = match &report.outcome {
                    Outcome::Applied { .. } => {
                        state_change(report.current.as_ref(), report.desired.as_ref())
                    }
                    Outcome::Skipped { reason } if verbose => reason.clone(),
                    Outcome::NoOp if verbose => String::new(),
                    _ => continue,
                };
                println!(
                    "│   {} {:<40} {}",
                    symbol(&report.outcome),
                    report.id,
                    detail.dimmed()
                );
            }
            PlanStep::Notification(notification) => {
                println!(
                    "│     {} {} {} {}",
                    "↻".cyan(),
                    notification.target,
                    notification.action,
                    format!("({}, from {})", notification.timing, notification.source).dimmed()
                );
            }
        }
    }

    println!("│");
    println!("├─────────────────────────────────────────────────────┤");
    println!("│ {}", summary_line(&plan.summary()));
    println!("└─────────────────────────────────────────────────────┘");
}

fn summary_line(summary: &ExecuteSummary) -> String {
    format!(
        "Summary: {} changes ({} create, {} update), {} notifications, {} unchanged, {} skipped",
        summary.total_changes().to_string().bold(),
        summary.created.to_string().green(),
        summary.updated.to_string().yellow(),
        summary.notified,
        summary.no_change,
        summary.skipped
    )
}

/// Print the final summary of a real run
pub fn print_summary(plan: &ActionPlan) {
    let summary = plan.summary();
    println!();
    if summary.total_changes() == 0 && summary.notified == 0 {
        println!("  {} Host already converged", "✓".green().bold());
        return;
    }

    println!("  {} Host converged", "✓".green().bold());
    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} resources updated", summary.updated);
    }
    if summary.notified > 0 {
        println!("    • {} notifications fired", summary.notified);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
}
