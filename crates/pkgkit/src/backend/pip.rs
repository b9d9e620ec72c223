//! Python backend using a configured `pip` executable.

use crate::backend::{self, Backend};
use crate::error::Result;
use crate::types::{Package, PackageManager};
use std::path::{Path, PathBuf};

/// Backend that executes a pip binary, e.g. `/usr/bin/pip3`.
#[derive(Debug, Clone)]
pub struct PipBackend {
    pip: String,
}

impl PipBackend {
    /// Use the pip executable at `pip`.
    pub fn new(pip: &Path) -> Self {
        Self {
            pip: pip.display().to_string(),
        }
    }

    /// Path of the pip executable.
    pub fn executable(&self) -> PathBuf {
        PathBuf::from(&self.pip)
    }

    fn pip_install(&self, extra: &[&str], package: &Package) -> Result<()> {
        let spec = package.spec(PackageManager::Pip);
        let mut args = vec!["install", "--disable-pip-version-check", "-q"];
        args.extend_from_slice(extra);
        args.push(&spec);
        backend::run_checked(PackageManager::Pip, &self.pip, &args, Some(&package.name))?;
        Ok(())
    }
}

impl Backend for PipBackend {
    fn manager(&self) -> PackageManager {
        PackageManager::Pip
    }

    fn is_available(&self) -> bool {
        backend::probe(&self.pip, &["--version"])
    }

    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let output = backend::run(&self.pip, &["show", name])?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(parse_show_version(&String::from_utf8_lossy(&output.stdout)))
    }

    fn candidate_version(&self, name: &str) -> Result<Option<String>> {
        let output = backend::run(
            &self.pip,
            &["index", "versions", "--disable-pip-version-check", name],
        )?;
        if !output.status.success() {
            log::debug!("pip index versions {name} failed, no candidate known");
            return Ok(None);
        }
        Ok(parse_index_versions(&String::from_utf8_lossy(&output.stdout), name))
    }

    fn install(&self, package: &Package) -> Result<()> {
        self.pip_install(&[], package)
    }

    fn upgrade(&self, package: &Package) -> Result<()> {
        self.pip_install(&["--upgrade"], package)
    }
}

/// Extract `Version:` from `pip show` output.
pub fn parse_show_version(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Version:"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Extract the newest version from `pip index versions` output, whose first
/// line reads `name (version)`.
pub fn parse_index_versions(output: &str, name: &str) -> Option<String> {
    let line = output.lines().next()?.trim();
    let rest = line.strip_prefix(name)?.trim();
    let version = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(version.trim().to_string())
}
