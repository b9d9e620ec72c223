//! Core types for declarative resource convergence

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current or desired state of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    /// Resource exists/is configured
    Present { details: Option<String> },
    /// Resource does not exist/is not configured
    Absent,
    /// Resource exists but differs from desired
    Modified { from: String, to: String },
    /// State cannot be determined
    Unknown,
}

impl ResourceState {
    /// Present with a details string
    pub fn present(details: impl Into<String>) -> Self {
        Self::Present {
            details: Some(details.into()),
        }
    }

    /// Check if state represents presence
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Check if state represents absence
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present { details: Some(d) } => write!(f, "{d}"),
            Self::Present { details: None } => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
            Self::Modified { from, to } => write!(f, "{from} -> {to}"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// What applying a resource does to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Resource did not exist
    Create,
    /// Resource existed with different attributes
    Update,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Terminal state of one resource in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Outcome {
    /// Guard was false, or the resource only acts when notified
    Skipped { reason: String },
    /// Observed state already matched the desired state
    NoOp,
    /// Resource was (or, in a dry run, would be) changed
    Applied { change: ChangeKind },
}

impl Outcome {
    /// Check if the outcome represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Action triggered on a notification target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyAction {
    Reload,
    Restart,
    Run,
}

impl fmt::Display for NotifyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reload => write!(f, "reload"),
            Self::Restart => write!(f, "restart"),
            Self::Run => write!(f, "run"),
        }
    }
}

/// When a notification fires relative to the main sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    /// In-line, before the next resource is evaluated
    Immediate,
    /// Once, after every resource has been evaluated
    Deferred,
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => write!(f, "immediately"),
            Self::Deferred => write!(f, "delayed"),
        }
    }
}

/// Report for one evaluated resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub id: String,
    pub resource_type: String,
    pub description: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Observed state, absent when the resource was not probed
    pub current: Option<ResourceState>,
    /// Desired state, absent when the resource was not probed
    pub desired: Option<ResourceState>,
}

/// Report for one fired notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReport {
    /// Resource whose change triggered the notification
    pub source: String,
    pub target: String,
    pub action: NotifyAction,
    pub timing: Timing,
}

/// One entry of an action plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "step")]
pub enum PlanStep {
    Resource(ResourceReport),
    Notification(NotificationReport),
}

/// Whether the run converged or was short-circuited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunStatus {
    Converged,
    /// The platform is unsupported and support is not required
    NotApplicable { reason: String },
}

/// Ordered record of what a convergence run did (or would do)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub status: RunStatus,
    pub dry_run: bool,
    pub steps: Vec<PlanStep>,
}

impl ActionPlan {
    pub(crate) fn new(dry_run: bool) -> Self {
        Self {
            status: RunStatus::Converged,
            dry_run,
            steps: Vec::new(),
        }
    }

    pub(crate) fn not_applicable(dry_run: bool, reason: String) -> Self {
        Self {
            status: RunStatus::NotApplicable { reason },
            dry_run,
            steps: Vec::new(),
        }
    }

    /// Reports for every evaluated resource, in order
    pub fn resources(&self) -> impl Iterator<Item = &ResourceReport> {
        self.steps.iter().filter_map(|step| match step {
            PlanStep::Resource(report) => Some(report),
            PlanStep::Notification(_) => None,
        })
    }

    /// Every fired notification, in order
    pub fn notifications(&self) -> impl Iterator<Item = &NotificationReport> {
        self.steps.iter().filter_map(|step| match step {
            PlanStep::Notification(report) => Some(report),
            PlanStep::Resource(_) => None,
        })
    }

    /// Notifications that fired at the end of the run
    pub fn deferred_notifications(&self) -> impl Iterator<Item = &NotificationReport> {
        self.notifications()
            .filter(|n| n.timing == Timing::Deferred)
    }

    /// Ids of resources that changed, in order
    pub fn changed(&self) -> Vec<&str> {
        self.resources()
            .filter(|r| r.outcome.is_change())
            .map(|r| r.id.as_str())
            .collect()
    }

    /// Look up the report for a resource id
    pub fn report(&self, id: &str) -> Option<&ResourceReport> {
        self.resources().find(|r| r.id == id)
    }

    /// True when nothing changed and nothing was notified
    pub fn is_noop(&self) -> bool {
        self.changed().is_empty() && self.notifications().next().is_none()
    }

    /// Check if the run was short-circuited as not applicable
    pub fn is_not_applicable(&self) -> bool {
        matches!(self.status, RunStatus::NotApplicable { .. })
    }

    /// Count outcomes
    pub fn summary(&self) -> ExecuteSummary {
        let mut summary = ExecuteSummary::default();
        for step in &self.steps {
            summary.add_step(step);
        }
        summary
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub no_change: usize,
    pub notified: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.no_change
    }

    /// Add a plan step to the summary
    pub fn add_step(&mut self, step: &PlanStep) {
        match step {
            PlanStep::Resource(report) => match report.outcome {
                Outcome::Skipped { .. } => self.skipped += 1,
                Outcome::NoOp => self.no_change += 1,
                Outcome::Applied {
                    change: ChangeKind::Create,
                } => self.created += 1,
                Outcome::Applied {
                    change: ChangeKind::Update,
                } => self.updated += 1,
            },
            PlanStep::Notification(_) => self.notified += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't make changes, just report what would happen
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, outcome: Outcome) -> PlanStep {
        PlanStep::Resource(ResourceReport {
            id: id.to_string(),
            resource_type: "test".to_string(),
            description: id.to_string(),
            outcome,
            current: None,
            desired: None,
        })
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let mut plan = ActionPlan::new(false);
        plan.steps.push(report(
            "a",
            Outcome::Applied {
                change: ChangeKind::Create,
            },
        ));
        plan.steps.push(report("b", Outcome::NoOp));
        plan.steps.push(report(
            "c",
            Outcome::Skipped {
                reason: "guard".into(),
            },
        ));
        plan.steps.push(PlanStep::Notification(NotificationReport {
            source: "a".into(),
            target: "b".into(),
            action: NotifyAction::Reload,
            timing: Timing::Immediate,
        }));

        let summary = plan.summary();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.no_change, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.notified, 1);
        assert_eq!(summary.total(), 3);
        assert_eq!(plan.changed(), vec!["a"]);
        assert!(!plan.is_noop());
    }

    #[test]
    fn test_plan_serializes_with_tags() {
        let mut plan = ActionPlan::new(true);
        plan.steps.push(report(
            "directory[/etc/sup]",
            Outcome::Applied {
                change: ChangeKind::Create,
            },
        ));
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["status"]["status"], "converged");
        assert_eq!(json["steps"][0]["step"], "resource");
        assert_eq!(json["steps"][0]["outcome"], "applied");
        assert_eq!(json["steps"][0]["change"], "create");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ResourceState::Absent.to_string(), "absent");
        assert_eq!(ResourceState::present("1.2").to_string(), "1.2");
    }
}
