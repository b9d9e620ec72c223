use anyhow::{Context, Result, anyhow};
use declarative::{Installer, PackageRequest, PackageService};
use pkgkit::backend::Backend;

use super::SystemHost;

impl SystemHost {
    fn backend(&self, installer: Installer) -> Result<&dyn Backend> {
        let client = self
            .packages
            .as_ref()
            .ok_or_else(|| anyhow!("no package manager for platform family {}", self.family))?;
        Ok(match installer {
            Installer::System => client.system(),
            Installer::Pip => client.pip(),
        })
    }

    pub(super) fn installed(&self, name: &str, installer: Installer) -> Result<Option<String>> {
        let backend = self.backend(installer)?;
        backend
            .installed_version(name)
            .with_context(|| format!("Could not query {} for {name}", backend.manager()))
    }

    pub(super) fn candidate(&self, name: &str, installer: Installer) -> Result<Option<String>> {
        let backend = self.backend(installer)?;
        backend
            .candidate_version(name)
            .with_context(|| format!("Could not query {} for {name}", backend.manager()))
    }
}

fn package(request: &PackageRequest) -> pkgkit::Package {
    let package = pkgkit::Package::new(request.name.as_str());
    match &request.version {
        Some(version) => package.with_version(version.as_str()),
        None => package,
    }
}

impl PackageService for SystemHost {
    fn install(&self, request: &PackageRequest) -> Result<()> {
        let backend = self.backend(request.installer)?;
        let package = package(request);
        log::info!("{}: installing {package}", backend.manager());
        backend.install(&package).map_err(|e| {
            let advice = e.category().advice();
            anyhow::Error::new(e).context(format!("Could not install {package} ({advice})"))
        })
    }

    fn upgrade(&self, request: &PackageRequest) -> Result<()> {
        let backend = self.backend(request.installer)?;
        let package = package(request);
        log::info!("{}: upgrading {package}", backend.manager());
        backend.upgrade(&package).map_err(|e| {
            let advice = e.category().advice();
            anyhow::Error::new(e).context(format!("Could not upgrade {package} ({advice})"))
        })
    }
}
