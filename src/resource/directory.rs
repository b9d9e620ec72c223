//! Directory resource - exists with owner, group and mode

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{ApplyContext, ChangeKind, FileAttrs, Guard, Resource, ResourceState};

/// A directory that must exist with the given attributes
#[derive(Debug, Clone)]
pub struct Directory {
    pub path: PathBuf,
    pub attrs: FileAttrs,
    /// Create missing parents too
    pub recursive: bool,
    pub guard: Guard,
}

impl Directory {
    pub fn new(path: impl AsRef<Path>, attrs: FileAttrs) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            attrs,
            recursive: false,
            guard: Guard::Always,
        }
    }

    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }
}

impl Resource for Directory {
    fn id(&self) -> String {
        format!("directory[{}]", self.path.display())
    }

    fn description(&self) -> String {
        format!("Directory {} ({})", self.path.display(), self.attrs)
    }

    fn resource_type(&self) -> &'static str {
        "directory"
    }

    fn guard(&self) -> Guard {
        self.guard.clone()
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(match ctx.host.path_info(&self.path)? {
            Some(info) if info.kind.is_directory() => ResourceState::present(info.attrs.to_string()),
            Some(info) => ResourceState::Modified {
                from: format!("{} {}", info.kind, info.attrs),
                to: format!("directory {}", self.attrs),
            },
            None => ResourceState::Absent,
        })
    }

    fn desired_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(ResourceState::present(self.attrs.to_string()))
    }

    fn apply(&self, change: ChangeKind, ctx: &ApplyContext) -> Result<()> {
        match change {
            ChangeKind::Create => ctx
                .host
                .create_directory(&self.path, &self.attrs, self.recursive),
            ChangeKind::Update => {
                let is_directory = ctx
                    .host
                    .path_info(&self.path)?
                    .is_some_and(|info| info.kind.is_directory());
                if !is_directory {
                    anyhow::bail!("{} exists and is not a directory", self.path.display());
                }
                ctx.host.set_attributes(&self.path, &self.attrs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::testing::FakeHost;
    use declarative::{ExecuteOptions, Outcome, PlatformFacts, ResourceCollection, converge_simple};

    fn converge(resource: Directory, host: &FakeHost) -> declarative::ActionPlan {
        let mut collection = ResourceCollection::new();
        collection.add(resource);
        converge_simple(
            &collection,
            &PlatformFacts::new("ubuntu", "debian"),
            host,
            &ExecuteOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_creates_missing_directory() {
        let host = FakeHost::new();
        let plan = converge(
            Directory::new("/var/log/supervisor", FileAttrs::root(0o755)).recursive(),
            &host,
        );
        assert_eq!(plan.changed(), vec!["directory[/var/log/supervisor]"]);
        assert_eq!(host.calls(), vec!["create_directory /var/log/supervisor"]);
    }

    #[test]
    fn test_fixes_mode_of_existing_directory() {
        let host = FakeHost::new().with_directory("/etc/supervisor.d", FileAttrs::root(0o700));
        let plan = converge(
            Directory::new("/etc/supervisor.d", FileAttrs::root(0o755)),
            &host,
        );
        let report = plan.report("directory[/etc/supervisor.d]").unwrap();
        assert_eq!(
            report.outcome,
            Outcome::Applied {
                change: ChangeKind::Update
            }
        );
        assert_eq!(host.attrs("/etc/supervisor.d"), Some(FileAttrs::root(0o755)));
    }

    #[test]
    fn test_file_in_the_way_is_an_error() {
        let host = FakeHost::new().with_file("/etc/supervisor.d", "oops", FileAttrs::root(0o644));
        let mut collection = ResourceCollection::new();
        collection.add(Directory::new("/etc/supervisor.d", FileAttrs::root(0o755)));

        let err = converge_simple(
            &collection,
            &PlatformFacts::new("ubuntu", "debian"),
            &host,
            &ExecuteOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.resource(), Some("directory[/etc/supervisor.d]"));
        assert!(host.calls().is_empty());
    }
}
