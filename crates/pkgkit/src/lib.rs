//! # pkgkit
//!
//! Install and query packages through the system package manager of a
//! platform family (apt, yum, pkgin) and through pip.
//!
//! ## Example
//!
//! ```no_run
//! use pkgkit::{Client, Package};
//! use std::path::Path;
//!
//! let client = Client::for_family("debian", Path::new("/usr/bin/pip3")).expect("no package manager");
//!
//! if client.pip().installed_version("supervisor")?.is_none() {
//!     client.pip().install(&Package::new("supervisor").with_version("4.2.5"))?;
//! }
//! # Ok::<(), pkgkit::Error>(())
//! ```
//!
//! Failures are classified from the tool's stderr, see [`ErrorCategory`].
//! Nothing is retried.

#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{Package, PackageManager};

use backend::Backend;
use backend::apt::AptBackend;
use backend::pip::PipBackend;
use backend::pkgin::PkginBackend;
use backend::yum::YumBackend;
use std::path::Path;

/// High-level client over a system backend and a pip backend.
pub struct Client {
    system: Box<dyn Backend>,
    pip: Box<dyn Backend>,
}

impl Client {
    /// Create a client for a platform family, with pip run from the `pip`
    /// executable.
    pub fn for_family(family: &str, pip: &Path) -> Result<Self> {
        let system: Box<dyn Backend> = match PackageManager::for_family(family) {
            Some(PackageManager::Apt) => Box::new(AptBackend::new()),
            Some(PackageManager::Yum) => Box::new(YumBackend::new()),
            Some(PackageManager::Pkgin) => Box::new(PkginBackend::new()),
            Some(PackageManager::Pip) | None => {
                return Err(Error::UnsupportedFamily(family.to_string()));
            }
        };
        log::debug!("using {} for platform family {family}", system.manager());
        Ok(Self {
            system,
            pip: Box::new(PipBackend::new(pip)),
        })
    }

    /// Create a client with custom backends (useful for testing).
    pub fn with_backends(system: Box<dyn Backend>, pip: Box<dyn Backend>) -> Self {
        Self { system, pip }
    }

    /// The system package manager backend.
    pub fn system(&self) -> &dyn Backend {
        self.system.as_ref()
    }

    /// The pip backend.
    pub fn pip(&self) -> &dyn Backend {
        self.pip.as_ref()
    }

    /// Backend for a manager, the system one for anything but pip.
    pub fn backend(&self, manager: PackageManager) -> &dyn Backend {
        match manager {
            PackageManager::Pip => self.pip(),
            _ => self.system(),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("system", &self.system.manager())
            .field("pip", &self.pip.manager())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockBackend {
        installed: Mutex<Vec<String>>,
    }

    impl Backend for MockBackend {
        fn manager(&self) -> PackageManager {
            PackageManager::Pip
        }

        fn is_available(&self) -> bool {
            true
        }

        fn installed_version(&self, name: &str) -> Result<Option<String>> {
            Ok(self
                .installed
                .lock()
                .unwrap()
                .iter()
                .find_map(|spec| spec.strip_prefix(&format!("{name}==")).map(str::to_string)))
        }

        fn candidate_version(&self, _name: &str) -> Result<Option<String>> {
            Ok(Some("4.2.5".to_string()))
        }

        fn install(&self, package: &Package) -> Result<()> {
            self.installed
                .lock()
                .unwrap()
                .push(package.spec(PackageManager::Pip));
            Ok(())
        }

        fn upgrade(&self, package: &Package) -> Result<()> {
            self.install(package)
        }
    }

    #[test]
    fn test_for_family_selects_system_backend() {
        let client = Client::for_family("smartos", Path::new("/opt/local/bin/pip")).unwrap();
        assert_eq!(client.system().manager(), PackageManager::Pkgin);
        assert_eq!(client.pip().manager(), PackageManager::Pip);
        assert_eq!(client.backend(PackageManager::Apt).manager(), PackageManager::Pkgin);
    }

    #[test]
    fn test_for_family_unknown() {
        let err = Client::for_family("arch", Path::new("/usr/bin/pip")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFamily(f) if f == "arch"));
    }

    #[test]
    fn test_with_backends_routes_pip() {
        let client = Client::with_backends(
            Box::new(AptBackend::new()),
            Box::new(MockBackend::default()),
        );
        let pip = client.backend(PackageManager::Pip);
        pip.install(&Package::new("supervisor").with_version("3.0"))
            .unwrap();
        assert_eq!(
            pip.installed_version("supervisor").unwrap(),
            Some("3.0".to_string())
        );
        assert_eq!(pip.installed_version("meld3").unwrap(), None);
    }
}
