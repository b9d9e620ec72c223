//! Concrete resources for the supervisor recipe
//!
//! Every resource probes and mutates the machine only through the
//! collaborators in [`ApplyContext::host`], so the same resources run
//! against the real host and against the in-memory one in tests.

pub mod directory;
pub mod execute;
pub mod package;
pub mod service;
pub mod template;

pub use declarative::{
    ApplyContext, ChangeKind, FileAttrs, Guard, NotifyAction, Resource, ResourceState,
};
pub use directory::Directory;
pub use execute::Execute;
pub use package::Package;
pub use service::Service;
pub use template::Template;
