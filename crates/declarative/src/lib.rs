//! # Declarative
//!
//! A convergence engine for declarative host configuration.
//!
//! A run takes an ordered collection of resources, observes each one on the
//! host, applies only what differs from the desired state, and propagates
//! change notifications between resources. A second run on a converged host
//! changes nothing.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something with observable state that can be converged
//!   (directories, templates, packages, services, commands)
//! - **Guard**: A platform precondition; a false guard skips the resource
//! - **NotificationEdge**: "when A changes, trigger an action on B",
//!   either immediately or deferred to the end of the run
//! - **Host**: The collaborators that probe and mutate the machine
//! - **ActionPlan**: The ordered record of what a run did or would do
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     ExecuteOptions, NotifyAction, PlatformFacts, ResourceCollection, SupportPolicy,
//!     Timing, converge_simple,
//! };
//!
//! let mut collection =
//!     ResourceCollection::with_policy(SupportPolicy::new(&["debian", "ubuntu"], true));
//! let conf = collection.add(conf_template);
//! let service = collection.add(supervisor_service);
//! collection.subscribes(&service, &conf, NotifyAction::Restart, Timing::Immediate);
//!
//! let facts = PlatformFacts::new("ubuntu", "debian");
//! let plan = converge_simple(&collection, &facts, &host, &ExecuteOptions::default())?;
//! println!("{} changed", plan.changed().len());
//! ```

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod guard;
pub mod notify;
pub mod planner;
pub mod resource;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::{
    ApplyContext, CommandRunner, FileAttrs, FileService, Host, Installer, NoProgress,
    PackageRequest, PackageService, PathInfo, PathKind, ProgressCallback,
    ServiceAction, ServiceController, ServiceStatus, ServiceSupports, StateProbe,
    TemplateRequest, TemplateService, Variables, content_digest,
};
pub use diff::ResourceDiff;
pub use error::{BoxError, Error, Result};
pub use executor::{converge, converge_simple};
pub use guard::{Guard, PlatformFacts, Support, SupportPolicy};
pub use notify::{NotificationEdge, NotificationQueue};
pub use planner::ResourceCollection;
pub use resource::{BoxedResource, Resource, ResourceExt};
pub use types::{
    ActionPlan, ChangeKind, ExecuteOptions, ExecuteSummary, NotificationReport, NotifyAction,
    Outcome, PlanStep, ResourceReport, ResourceState, RunStatus, Timing,
};
