//! Debian family backend using `dpkg-query`, `apt-cache` and `apt-get`.

use crate::backend::{self, Backend};
use crate::error::Result;
use crate::types::{Package, PackageManager};

/// Backend that executes real apt commands.
#[derive(Debug, Default)]
pub struct AptBackend;

impl AptBackend {
    /// Create a new backend.
    pub fn new() -> Self {
        Self
    }

    fn apt_get(&self, args: &[&str], package: &Package) -> Result<()> {
        let spec = package.spec(PackageManager::Apt);
        let mut full = vec!["-q", "-y", "-o", "Dpkg::Options::=--force-confold"];
        full.extend_from_slice(args);
        full.push(&spec);
        backend::run_checked(PackageManager::Apt, "apt-get", &full, Some(&package.name))?;
        Ok(())
    }
}

impl Backend for AptBackend {
    fn manager(&self) -> PackageManager {
        PackageManager::Apt
    }

    fn is_available(&self) -> bool {
        backend::probe("apt-get", &["--version"])
    }

    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let output = backend::run("dpkg-query", &["-W", "-f=${Status}\t${Version}", name])?;
        if !output.status.success() {
            // dpkg-query exits 1 for packages it has never seen
            return Ok(None);
        }
        Ok(parse_dpkg_status(&String::from_utf8_lossy(&output.stdout)))
    }

    fn candidate_version(&self, name: &str) -> Result<Option<String>> {
        let stdout = backend::run_checked(
            PackageManager::Apt,
            "apt-cache",
            &["policy", name],
            Some(name),
        )?;
        Ok(parse_policy_candidate(&stdout))
    }

    fn install(&self, package: &Package) -> Result<()> {
        self.apt_get(&["install"], package)
    }

    fn upgrade(&self, package: &Package) -> Result<()> {
        self.apt_get(&["install", "--only-upgrade"], package)
    }
}

/// Parse `dpkg-query -W -f='${Status}\t${Version}'` output.
///
/// Only `install ok installed` counts; removed packages keep a version in the
/// database with a `deinstall ok config-files` status.
pub fn parse_dpkg_status(output: &str) -> Option<String> {
    let (status, version) = output.trim().split_once('\t')?;
    if status.trim() != "install ok installed" || version.trim().is_empty() {
        return None;
    }
    Some(version.trim().to_string())
}

/// Extract the `Candidate:` line from `apt-cache policy` output.
pub fn parse_policy_candidate(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Candidate:"))
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "(none)")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dpkg_status_installed() {
        assert_eq!(
            parse_dpkg_status("install ok installed\t3.3.1-1.1"),
            Some("3.3.1-1.1".to_string())
        );
    }

    #[test]
    fn test_parse_dpkg_status_removed() {
        assert_eq!(parse_dpkg_status("deinstall ok config-files\t3.3.1-1.1"), None);
        assert_eq!(parse_dpkg_status(""), None);
    }

    #[test]
    fn test_parse_policy_candidate() {
        let output = "\
supervisor:
  Installed: (none)
  Candidate: 4.2.5-1
  Version table:
     4.2.5-1 500
        500 http://deb.debian.org/debian bookworm/main amd64 Packages
";
        assert_eq!(parse_policy_candidate(output), Some("4.2.5-1".to_string()));
    }

    #[test]
    fn test_parse_policy_candidate_none() {
        let output = "python-expat:\n  Installed: (none)\n  Candidate: (none)\n";
        assert_eq!(parse_policy_candidate(output), None);
        assert_eq!(parse_policy_candidate(""), None);
    }
}
