//! SmartOS / pkgsrc backend using `pkg_info` and `pkgin`.

use crate::backend::{self, Backend};
use crate::error::Result;
use crate::types::{Package, PackageManager};

/// Backend that executes real pkgin commands.
#[derive(Debug, Default)]
pub struct PkginBackend;

impl PkginBackend {
    /// Create a new backend.
    pub fn new() -> Self {
        Self
    }
}

impl Backend for PkginBackend {
    fn manager(&self) -> PackageManager {
        PackageManager::Pkgin
    }

    fn is_available(&self) -> bool {
        backend::probe("pkgin", &["-v"])
    }

    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let output = backend::run("pkg_info", &["-E", name])?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .find_map(|line| split_pkgname(line.trim(), name)))
    }

    fn candidate_version(&self, name: &str) -> Result<Option<String>> {
        let stdout = backend::run_checked(
            PackageManager::Pkgin,
            "pkgin",
            &["-p", "search", &format!("^{name}$")],
            Some(name),
        )?;
        Ok(parse_search(&stdout, name))
    }

    fn install(&self, package: &Package) -> Result<()> {
        let spec = package.spec(PackageManager::Pkgin);
        backend::run_checked(
            PackageManager::Pkgin,
            "pkgin",
            &["-y", "install", &spec],
            Some(&package.name),
        )?;
        Ok(())
    }

    fn upgrade(&self, package: &Package) -> Result<()> {
        // pkgin install upgrades an installed package in place
        self.install(package)
    }
}

/// Split a pkgsrc `name-version` string, returning the version if the name
/// matches exactly.
pub fn split_pkgname(pkgname: &str, name: &str) -> Option<String> {
    let (base, version) = pkgname.rsplit_once('-')?;
    (base == name && !version.is_empty()).then(|| version.to_string())
}

/// Parse `pkgin -p search` output (`name-version;status;comment` rows).
pub fn parse_search(output: &str, name: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let pkgname = line.split(';').next()?.trim();
        split_pkgname(pkgname, name)
    })
}
