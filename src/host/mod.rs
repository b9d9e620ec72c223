//! Collaborators backed by the real machine
//!
//! [`SystemHost`] implements every collaborator trait of the engine. Each
//! submodule implements one of them; state probing is spread over the
//! submodules and stitched together here.

mod commands;
mod files;
mod packages;
mod services;
mod templates;

use anyhow::Result;
use declarative::{
    Installer, PathInfo, PlatformFacts, ServiceStatus, ServiceSupports, StateProbe,
};
use std::path::Path;

use crate::config::Settings;
use crate::render::Templates;

pub use services::InitSystem;

/// The machine this process runs on
#[derive(Debug)]
pub struct SystemHost {
    templates: Templates,
    packages: Option<pkgkit::Client>,
    family: String,
    init: InitSystem,
}

impl SystemHost {
    pub fn new(facts: &PlatformFacts, settings: &Settings) -> Self {
        let packages = match pkgkit::Client::for_family(&facts.platform_family, &settings.pip) {
            Ok(client) => {
                if !client.system().is_available() {
                    log::warn!("{} is not usable on this host", client.system().manager());
                }
                if !client.pip().is_available() {
                    log::debug!("{} is not usable yet", settings.pip.display());
                }
                Some(client)
            }
            Err(e) => {
                log::debug!("no package manager: {e}");
                None
            }
        };

        Self {
            templates: Templates::new(settings.template_dir.clone()),
            packages,
            family: facts.platform_family.clone(),
            init: InitSystem::for_family(&facts.platform_family),
        }
    }
}

impl StateProbe for SystemHost {
    fn path_info(&self, path: &Path) -> Result<Option<PathInfo>> {
        files::path_info(path)
    }

    fn file_digest(&self, path: &Path) -> Result<Option<String>> {
        files::file_digest(path)
    }

    fn installed_version(&self, name: &str, installer: Installer) -> Result<Option<String>> {
        self.installed(name, installer)
    }

    fn candidate_version(&self, name: &str, installer: Installer) -> Result<Option<String>> {
        self.candidate(name, installer)
    }

    fn service_status(&self, name: &str, supports: &ServiceSupports) -> Result<ServiceStatus> {
        self.init.status(name, supports)
    }
}
