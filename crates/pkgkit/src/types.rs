//! Core types for package operations.

use std::fmt;

/// A package manager a backend drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    /// Debian family: `dpkg-query`, `apt-cache`, `apt-get`
    Apt,
    /// RHEL family: `rpm`, `yum`
    Yum,
    /// SmartOS / pkgsrc: `pkg_info`, `pkgin`
    Pkgin,
    /// Python packages: `pip`
    Pip,
}

impl PackageManager {
    /// The system package manager for a platform family, if one is known.
    pub fn for_family(family: &str) -> Option<Self> {
        match family {
            "debian" => Some(Self::Apt),
            "rhel" | "fedora" | "amazon" => Some(Self::Yum),
            "smartos" => Some(Self::Pkgin),
            _ => None,
        }
    }

    /// Separator between name and version in an install argument.
    pub fn version_separator(&self) -> &'static str {
        match self {
            Self::Apt => "=",
            Self::Yum | Self::Pkgin => "-",
            Self::Pip => "==",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apt => write!(f, "apt"),
            Self::Yum => write!(f, "yum"),
            Self::Pkgin => write!(f, "pkgin"),
            Self::Pip => write!(f, "pip"),
        }
    }
}

/// A package to install or upgrade, optionally pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Package name (e.g., "supervisor", "py27-expat")
    pub name: String,
    /// Exact version to install; `None` means the newest available
    pub version: Option<String>,
}

impl Package {
    /// Create an unpinned package.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Pin the package to a version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Argument naming the package for a manager's install command.
    pub fn spec(&self, manager: PackageManager) -> String {
        match &self.version {
            Some(v) => format!("{}{}{v}", self.name, manager.version_separator()),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{} ({v})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_spec_per_manager() {
        let pinned = Package::new("supervisor").with_version("3.0");
        assert_eq!(pinned.spec(PackageManager::Pip), "supervisor==3.0");
        assert_eq!(pinned.spec(PackageManager::Apt), "supervisor=3.0");
        assert_eq!(pinned.spec(PackageManager::Yum), "supervisor-3.0");
        assert_eq!(Package::new("py27-expat").spec(PackageManager::Pkgin), "py27-expat");
    }

    #[test]
    fn test_manager_for_family() {
        assert_eq!(PackageManager::for_family("debian"), Some(PackageManager::Apt));
        assert_eq!(PackageManager::for_family("rhel"), Some(PackageManager::Yum));
        assert_eq!(PackageManager::for_family("smartos"), Some(PackageManager::Pkgin));
        assert_eq!(PackageManager::for_family("arch"), None);
    }
}
