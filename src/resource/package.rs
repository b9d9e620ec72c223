//! Package resource - installed through the system package manager or pip

use anyhow::Result;
use declarative::{Installer, PackageRequest};

use super::{ApplyContext, ChangeKind, Guard, Resource, ResourceState};

/// What convergence means for a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageAction {
    /// Installed at any version (or the pinned one)
    Install,
    /// Installed at the newest available version (or the pinned one)
    Upgrade,
}

/// A package that must be installed
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub installer: Installer,
    pub action: PackageAction,
    /// Exact version to converge to
    pub version: Option<String>,
    pub guard: Guard,
}

impl Package {
    /// A native package, installed at any version
    pub fn system(name: &str) -> Self {
        Self {
            name: name.to_string(),
            installer: Installer::System,
            action: PackageAction::Install,
            version: None,
            guard: Guard::Always,
        }
    }

    /// A pip package, kept at the newest release
    pub fn pip(name: &str) -> Self {
        Self {
            installer: Installer::Pip,
            action: PackageAction::Upgrade,
            ..Self::system(name)
        }
    }

    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn only_if(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    fn request(&self) -> PackageRequest {
        PackageRequest {
            name: self.name.clone(),
            installer: self.installer,
            version: self.version.clone(),
        }
    }
}

impl Resource for Package {
    fn id(&self) -> String {
        match self.installer {
            Installer::System => format!("package[{}]", self.name),
            Installer::Pip => format!("pip_package[{}]", self.name),
        }
    }

    fn description(&self) -> String {
        let verb = match self.action {
            PackageAction::Install => "Install",
            PackageAction::Upgrade => "Upgrade",
        };
        match &self.version {
            Some(version) => format!("{verb} {} {version} ({})", self.name, self.installer),
            None => format!("{verb} {} ({})", self.name, self.installer),
        }
    }

    fn resource_type(&self) -> &'static str {
        "package"
    }

    fn guard(&self) -> Guard {
        self.guard.clone()
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(
            match ctx.host.installed_version(&self.name, self.installer)? {
                Some(version) => ResourceState::present(version),
                None => ResourceState::Absent,
            },
        )
    }

    fn desired_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        if let Some(version) = &self.version {
            return Ok(ResourceState::present(version.as_str()));
        }

        let installed = ctx.host.installed_version(&self.name, self.installer)?;
        let target = match (self.action, installed) {
            (PackageAction::Install, Some(installed)) => Some(installed),
            (PackageAction::Upgrade, installed) => ctx
                .host
                .candidate_version(&self.name, self.installer)?
                .or(installed),
            (PackageAction::Install, None) => {
                ctx.host.candidate_version(&self.name, self.installer)?
            }
        };

        Ok(ResourceState::present(
            target.unwrap_or_else(|| "latest".to_string()),
        ))
    }

    fn apply(&self, change: ChangeKind, ctx: &ApplyContext) -> Result<()> {
        let request = self.request();
        match change {
            ChangeKind::Create => ctx.host.install(&request),
            ChangeKind::Update => ctx.host.upgrade(&request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::testing::FakeHost;
    use declarative::{ExecuteOptions, PlatformFacts, ResourceCollection, converge_simple};

    fn converge(resource: Package, host: &FakeHost) -> declarative::ActionPlan {
        let mut collection = ResourceCollection::new();
        collection.add(resource);
        converge_simple(
            &collection,
            &PlatformFacts::new("smartos", "smartos"),
            host,
            &ExecuteOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_install_leaves_any_installed_version() {
        let host = FakeHost::new()
            .with_package("py27-expat", Installer::System, "2.7.10")
            .with_candidate("py27-expat", Installer::System, "2.7.18");
        let plan = converge(Package::system("py27-expat"), &host);
        assert!(plan.is_noop());
    }

    #[test]
    fn test_install_missing_package() {
        let host = FakeHost::new().with_candidate("py27-expat", Installer::System, "2.7.18");
        let plan = converge(Package::system("py27-expat"), &host);
        assert_eq!(plan.changed(), vec!["package[py27-expat]"]);
        assert_eq!(host.calls(), vec!["install py27-expat"]);
        assert_eq!(
            host.package_version("py27-expat", Installer::System).as_deref(),
            Some("2.7.18")
        );
    }

    #[test]
    fn test_pip_upgrade_to_candidate() {
        let host = FakeHost::new()
            .with_package("supervisor", Installer::Pip, "3.0")
            .with_candidate("supervisor", Installer::Pip, "4.2.5");
        let plan = converge(Package::pip("supervisor"), &host);
        assert_eq!(plan.changed(), vec!["pip_package[supervisor]"]);
        assert_eq!(host.calls(), vec!["upgrade supervisor"]);

        host.clear_calls();
        assert!(converge(Package::pip("supervisor"), &host).is_noop());
    }

    #[test]
    fn test_pinned_version_is_held() {
        let host = FakeHost::new()
            .with_package("supervisor", Installer::Pip, "4.2.5")
            .with_candidate("supervisor", Installer::Pip, "4.2.5");
        let pinned = || Package::pip("supervisor").version(Some("3.0".into()));

        let plan = converge(pinned(), &host);
        assert_eq!(plan.changed().len(), 1);
        assert_eq!(
            host.package_version("supervisor", Installer::Pip).as_deref(),
            Some("3.0")
        );

        host.clear_calls();
        assert!(converge(pinned(), &host).is_noop());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_upgrade_without_known_candidate_keeps_installed() {
        let host = FakeHost::new().with_package("supervisor", Installer::Pip, "4.2.5");
        assert!(converge(Package::pip("supervisor"), &host).is_noop());
    }
}
