//! Progress indicators for convergence runs

use colored::Colorize;
use declarative::{NotifyAction, Outcome, ProgressCallback, ResourceReport, Timing};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner with a message
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
        .template("  {spinner:.cyan} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Reports each resource as it converges, above a spinner
pub struct SpinnerProgress {
    pb: ProgressBar,
    verbose: bool,
}

impl SpinnerProgress {
    pub fn new(verbose: bool) -> Self {
        Self {
            pb: spinner("Converging..."),
            verbose,
        }
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

impl ProgressCallback for SpinnerProgress {
    fn on_resource_start(&mut self, id: &str, _description: &str) {
        self.pb.set_message(id.to_string());
    }

    fn on_resource_complete(&mut self, report: &ResourceReport) {
        let line = match &report.outcome {
            Outcome::Applied { change } => {
                format!("  {} {} {}", "✓".green(), report.id, format!("({change})").dimmed())
            }
            Outcome::Skipped { reason } if self.verbose => {
                format!("  {} {} {}", "⊘".dimmed(), report.id, reason.dimmed())
            }
            Outcome::NoOp if self.verbose => format!("  {} {}", "○".dimmed(), report.id),
            _ => return,
        };
        self.pb.println(line);
    }

    fn on_notification(&mut self, target: &str, action: NotifyAction, timing: Timing) {
        self.pb.println(format!(
            "  {} {target} {action} {}",
            "↻".cyan(),
            format!("({timing})").dimmed()
        ));
    }
}
