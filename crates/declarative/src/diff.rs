//! Diff computation for resources

use crate::context::ApplyContext;
use crate::resource::Resource;
use crate::types::{ChangeKind, ResourceState};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A diff between current and desired state of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Current state
    pub current: ResourceState,
    /// Desired state
    pub desired: ResourceState,
}

impl ResourceDiff {
    /// Probe a resource and compute its desired state
    pub fn evaluate(resource: &dyn Resource, ctx: &ApplyContext) -> Result<Self> {
        let current = resource.current_state(ctx)?;
        let desired = resource.desired_state(ctx)?;
        Ok(Self { current, desired })
    }

    /// Check if the resource is already converged
    pub fn is_in_sync(&self) -> bool {
        self.current == self.desired
    }

    /// The change needed to converge, `None` when already in sync
    pub fn change(&self) -> Option<ChangeKind> {
        if self.is_in_sync() {
            None
        } else if self.current.is_absent() {
            Some(ChangeKind::Create)
        } else {
            Some(ChangeKind::Update)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(current: ResourceState, desired: ResourceState) -> ResourceDiff {
        ResourceDiff { current, desired }
    }

    #[test]
    fn test_in_sync_has_no_change() {
        let d = diff(ResourceState::present("755"), ResourceState::present("755"));
        assert!(d.is_in_sync());
        assert_eq!(d.change(), None);
    }

    #[test]
    fn test_absent_is_create() {
        let d = diff(ResourceState::Absent, ResourceState::present("755"));
        assert_eq!(d.change(), Some(ChangeKind::Create));
    }

    #[test]
    fn test_differing_details_is_update() {
        let d = diff(ResourceState::present("700"), ResourceState::present("755"));
        assert_eq!(d.change(), Some(ChangeKind::Update));

        let d = diff(
            ResourceState::Modified {
                from: "file".into(),
                to: "directory".into(),
            },
            ResourceState::present("755"),
        );
        assert_eq!(d.change(), Some(ChangeKind::Update));
    }
}
