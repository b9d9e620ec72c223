//! Resource trait for declarative state management
//!
//! A Resource represents something that can be in a certain state,
//! and can be changed to reach a desired state.

use crate::context::ApplyContext;
use crate::guard::Guard;
use crate::types::{ChangeKind, NotifyAction, ResourceState};
use anyhow::Result;
use std::fmt;

/// Core trait for declarative resources
///
/// Every resource in the system implements this trait, which provides:
/// - Identity (id, description, type)
/// - A precondition guard
/// - State detection (current vs desired)
/// - State convergence (apply)
/// - Reactions to notifications from other resources
///
/// Resources never touch the machine directly: probing and mutation go
/// through the collaborators in [`ApplyContext::host`].
///
/// # Example
///
/// ```ignore
/// use declarative::{ApplyContext, ChangeKind, FileAttrs, Resource, ResourceState};
///
/// #[derive(Debug)]
/// struct Directory {
///     path: std::path::PathBuf,
///     attrs: FileAttrs,
/// }
///
/// impl Resource for Directory {
///     fn id(&self) -> String {
///         format!("directory[{}]", self.path.display())
///     }
///
///     fn description(&self) -> String {
///         format!("Directory {}", self.path.display())
///     }
///
///     fn resource_type(&self) -> &'static str {
///         "directory"
///     }
///
///     fn current_state(&self, ctx: &ApplyContext) -> anyhow::Result<ResourceState> {
///         Ok(match ctx.host.path_info(&self.path)? {
///             Some(info) => ResourceState::present(info.attrs.to_string()),
///             None => ResourceState::Absent,
///         })
///     }
///
///     fn desired_state(&self, _ctx: &ApplyContext) -> anyhow::Result<ResourceState> {
///         Ok(ResourceState::present(self.attrs.to_string()))
///     }
///
///     fn apply(&self, change: ChangeKind, ctx: &ApplyContext) -> anyhow::Result<()> {
///         match change {
///             ChangeKind::Create => ctx.host.create_directory(&self.path, &self.attrs, false),
///             ChangeKind::Update => ctx.host.set_attributes(&self.path, &self.attrs),
///         }
///     }
/// }
/// ```
pub trait Resource: fmt::Debug {
    /// Unique identifier for this resource
    ///
    /// Conventionally `type[name]`, e.g. `template[/etc/supervisord.conf]`.
    /// Notification edges refer to resources by this id.
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category, used for grouping in reports
    fn resource_type(&self) -> &'static str;

    /// Precondition evaluated against platform facts before anything else
    fn guard(&self) -> Guard {
        Guard::Always
    }

    /// Passive resources are never converged in the main sequence; they only
    /// act when notified
    fn is_passive(&self) -> bool {
        false
    }

    /// Detect the current state of this resource
    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState>;

    /// Compute the desired state for this resource
    ///
    /// This may consult collaborators (e.g. to render a template or look
    /// up a candidate package version) but must not mutate anything.
    fn desired_state(&self, ctx: &ApplyContext) -> Result<ResourceState>;

    /// Apply changes to reach the desired state
    ///
    /// Only called when current and desired states differ and the run is
    /// not a dry run.
    fn apply(&self, change: ChangeKind, ctx: &ApplyContext) -> Result<()>;

    /// Whether this resource can react to a notification action
    fn supports_notification(&self, _action: NotifyAction) -> bool {
        false
    }

    /// React to a notification
    ///
    /// Only called for actions accepted by [`Resource::supports_notification`]
    /// and never during a dry run.
    fn notify(&self, action: NotifyAction, _ctx: &ApplyContext) -> Result<()> {
        anyhow::bail!("{} cannot {}", self.id(), action)
    }
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;

/// Extension trait for working with resources
pub trait ResourceExt {
    /// Check if the resource's guard passes for these facts
    fn applies_to(&self, facts: &crate::guard::PlatformFacts) -> bool;
}

impl<R: Resource + ?Sized> ResourceExt for R {
    fn applies_to(&self, facts: &crate::guard::PlatformFacts) -> bool {
        self.guard().evaluate(facts)
    }
}
