//! Resource collection - the ordered input of a convergence run

use crate::error::{Error, Result};
use crate::guard::SupportPolicy;
use crate::notify::NotificationEdge;
use crate::resource::{BoxedResource, Resource};
use crate::types::{NotifyAction, Timing};
use std::collections::HashSet;

/// Ordered resources, the notification edges between them, and the
/// platforms the run supports
#[derive(Debug, Default)]
pub struct ResourceCollection {
    resources: Vec<BoxedResource>,
    edges: Vec<NotificationEdge>,
    policy: SupportPolicy,
}

impl ResourceCollection {
    /// Create a new empty collection that supports every platform
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection restricted by a support policy
    pub fn with_policy(policy: SupportPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Append a resource, returning its id for use in notification edges
    pub fn add(&mut self, resource: impl Resource + 'static) -> String {
        self.add_boxed(Box::new(resource))
    }

    pub fn add_boxed(&mut self, resource: BoxedResource) -> String {
        let id = resource.id();
        self.resources.push(resource);
        id
    }

    /// When `source` changes, trigger `action` on `target`
    pub fn notifies(&mut self, source: &str, target: &str, action: NotifyAction, timing: Timing) {
        self.edges
            .push(NotificationEdge::new(source, target, action, timing));
    }

    /// `subscriber` reacts with `action` when `source` changes
    pub fn subscribes(
        &mut self,
        subscriber: &str,
        source: &str,
        action: NotifyAction,
        timing: Timing,
    ) {
        self.notifies(source, subscriber, action, timing);
    }

    pub fn policy(&self) -> &SupportPolicy {
        &self.policy
    }

    pub fn resources(&self) -> &[BoxedResource] {
        &self.resources
    }

    pub fn edges(&self) -> &[NotificationEdge] {
        &self.edges
    }

    /// Edges triggered by a change of `source`, in declaration order
    pub fn edges_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a NotificationEdge> {
        self.edges.iter().filter(move |e| e.source == source)
    }

    /// Find a resource by id
    pub fn find(&self, id: &str) -> Option<&dyn Resource> {
        self.resources
            .iter()
            .find(|r| r.id() == id)
            .map(|r| r.as_ref())
    }

    /// Ids in declaration order
    pub fn ids(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.id()).collect()
    }

    /// Total number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Check ids are unique and every edge can be delivered
    ///
    /// # Errors
    ///
    /// Returns the first duplicate id, unknown edge endpoint, or action the
    /// target cannot perform.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for resource in &self.resources {
            let id = resource.id();
            if !seen.insert(id.clone()) {
                return Err(Error::DuplicateResource(id));
            }
        }

        for edge in &self.edges {
            if !seen.contains(&edge.source) {
                return Err(Error::UnknownNotificationSource {
                    subscriber: edge.target.clone(),
                    notifier: edge.source.clone(),
                });
            }
            let target = self
                .find(&edge.target)
                .ok_or_else(|| Error::UnknownNotificationTarget {
                    notifier: edge.source.clone(),
                    target: edge.target.clone(),
                })?;
            if !target.supports_notification(edge.action) {
                return Err(Error::UnsupportedNotification {
                    notifier: edge.source.clone(),
                    target: edge.target.clone(),
                    action: edge.action,
                });
            }
        }

        Ok(())
    }
}
