//! RHEL family backend using `rpm` and `yum`.

use crate::backend::{self, Backend};
use crate::error::Result;
use crate::types::{Package, PackageManager};

/// Backend that executes real yum commands.
#[derive(Debug, Default)]
pub struct YumBackend;

impl YumBackend {
    /// Create a new backend.
    pub fn new() -> Self {
        Self
    }
}

impl Backend for YumBackend {
    fn manager(&self) -> PackageManager {
        PackageManager::Yum
    }

    fn is_available(&self) -> bool {
        backend::probe("yum", &["--version"])
    }

    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let output = backend::run("rpm", &["-q", "--qf", "%{VERSION}-%{RELEASE}\n", name])?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }

    fn candidate_version(&self, name: &str) -> Result<Option<String>> {
        let output = backend::run("yum", &["-q", "list", "available", name])?;
        if !output.status.success() {
            // nothing newer than what is installed
            return Ok(None);
        }
        Ok(parse_list_available(&String::from_utf8_lossy(&output.stdout), name))
    }

    fn install(&self, package: &Package) -> Result<()> {
        let spec = package.spec(PackageManager::Yum);
        backend::run_checked(
            PackageManager::Yum,
            "yum",
            &["-y", "install", &spec],
            Some(&package.name),
        )?;
        Ok(())
    }

    fn upgrade(&self, package: &Package) -> Result<()> {
        let spec = package.spec(PackageManager::Yum);
        backend::run_checked(
            PackageManager::Yum,
            "yum",
            &["-y", "upgrade", &spec],
            Some(&package.name),
        )?;
        Ok(())
    }
}

/// Parse `yum list available NAME` output.
///
/// Rows are `name.arch  version-release  repo`; the last matching row wins
/// since yum lists versions oldest first.
pub fn parse_list_available(output: &str, name: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let pkg = cols.next()?;
            let version = cols.next()?;
            let base = pkg.rsplit_once('.').map_or(pkg, |(base, _arch)| base);
            (base == name).then(|| version.to_string())
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_available() {
        let output = "\
Available Packages
python-pip.noarch        7.1.0-1.el7       epel
python-pip.noarch        8.1.2-14.el7      epel
python-pipx.noarch       0.1-1.el7         epel
";
        assert_eq!(
            parse_list_available(output, "python-pip"),
            Some("8.1.2-14.el7".to_string())
        );
    }

    #[test]
    fn test_parse_list_available_missing() {
        assert_eq!(parse_list_available("Available Packages\n", "supervisor"), None);
    }
}
