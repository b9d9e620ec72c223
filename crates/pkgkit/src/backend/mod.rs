//! Backend abstraction for package managers.
//!
//! The [`Backend`] trait defines the operations a convergence run needs from
//! a package manager, allowing real CLI implementations and mocks for tests.

pub mod apt;
pub mod pip;
pub mod pkgin;
pub mod yum;

use crate::error::{Error, Result};
use crate::types::{Package, PackageManager};
use std::process::{Command, Output};

/// Backend trait for package operations.
pub trait Backend: Send + Sync {
    /// Which package manager this backend drives.
    fn manager(&self) -> PackageManager;

    /// Check if the package manager is usable on this host.
    fn is_available(&self) -> bool;

    /// Installed version of a package, `None` when not installed.
    fn installed_version(&self, name: &str) -> Result<Option<String>>;

    /// Newest installable version, `None` when the package is unknown.
    fn candidate_version(&self, name: &str) -> Result<Option<String>>;

    /// Install a package (pinned version if set).
    fn install(&self, package: &Package) -> Result<()>;

    /// Upgrade a package to its pinned version or the newest available.
    fn upgrade(&self, package: &Package) -> Result<()>;
}

/// Run a command and return its raw output.
pub(crate) fn run(program: &str, args: &[&str]) -> Result<Output> {
    log::debug!("running {program} {}", args.join(" "));
    Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ToolNotFound(program.to_string())
        } else {
            Error::Io(e)
        }
    })
}

/// Run a command and check for success, returning stdout.
pub(crate) fn run_checked(
    manager: PackageManager,
    program: &str,
    args: &[&str],
    package_name: Option<&str>,
) -> Result<String> {
    let output = run(program, args)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::from_output(manager, &stderr, package_name));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Check that a program can be started at all.
pub(crate) fn probe(program: &str, args: &[&str]) -> bool {
    run(program, args).is_ok_and(|o| o.status.success())
}
