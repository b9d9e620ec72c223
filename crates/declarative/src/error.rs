//! Error types for convergence runs

use crate::types::NotifyAction;
use thiserror::Error;

/// Boxed collaborator error, keeps the full cause chain
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort a convergence run
#[derive(Error, Debug)]
pub enum Error {
    /// The platform is not supported and support is required
    #[error(
        "platform {platform} is not supported; skip by setting support_required to false or use one of: {}",
        supported.join(", ")
    )]
    UnsupportedPlatform {
        platform: String,
        supported: Vec<String>,
    },

    /// A probe, apply or notify call failed
    #[error("{resource}: {source}")]
    Collaborator {
        resource: String,
        #[source]
        source: BoxError,
    },

    /// Two resources share an id
    #[error("duplicate resource: {0}")]
    DuplicateResource(String),

    /// A notification edge references a resource that is not in the run
    #[error("{notifier} notifies unknown resource {target}")]
    UnknownNotificationTarget { notifier: String, target: String },

    /// A subscription references a source that is not in the run
    #[error("{subscriber} subscribes to unknown resource {notifier}")]
    UnknownNotificationSource { subscriber: String, notifier: String },

    /// A notification edge asks a resource for an action it cannot perform
    #[error("{target} does not support {action} (notified by {notifier})")]
    UnsupportedNotification {
        notifier: String,
        target: String,
        action: NotifyAction,
    },
}

impl Error {
    /// Wrap a collaborator failure with the identity of the failing resource
    pub fn collaborator(resource: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Collaborator {
            resource: resource.into(),
            source: source.into(),
        }
    }

    /// Identity of the resource the error is about, if any
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::Collaborator { resource, .. } => Some(resource),
            Self::DuplicateResource(id) => Some(id),
            Self::UnknownNotificationTarget { notifier, .. }
            | Self::UnsupportedNotification { notifier, .. } => Some(notifier),
            Self::UnknownNotificationSource { subscriber, .. } => Some(subscriber),
            Self::UnsupportedPlatform { .. } => None,
        }
    }
}

/// Result type for convergence operations
pub type Result<T> = std::result::Result<T, Error>;
