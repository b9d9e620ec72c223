//! Apply context and collaborator traits
//!
//! These traits keep the engine free of any knowledge about package
//! managers, template engines or init systems. The binary provides real
//! implementations; tests provide in-memory ones.

use crate::guard::PlatformFacts;
use crate::types::{NotifyAction, ResourceReport, Timing};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Template variables
pub type Variables = BTreeMap<String, String>;

/// Digest used to compare file content with rendered content
pub fn content_digest(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Owner, group and permission bits of a managed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttrs {
    pub owner: String,
    pub group: String,
    pub mode: u32,
}

impl FileAttrs {
    pub fn new(owner: &str, group: &str, mode: u32) -> Self {
        Self {
            owner: owner.to_string(),
            group: group.to_string(),
            mode,
        }
    }

    /// root:root with the given mode
    pub fn root(mode: u32) -> Self {
        Self::new("root", "root", mode)
    }
}

impl fmt::Display for FileAttrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {:o}", self.owner, self.group, self.mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    File,
    Directory,
    Other,
}

impl PathKind {
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
            Self::Other => write!(f, "special file"),
        }
    }
}

/// Observed metadata of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    pub kind: PathKind,
    pub attrs: FileAttrs,
}

/// Which installer manages a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Installer {
    /// The platform's native package manager
    System,
    /// Python's pip
    Pip,
}

impl fmt::Display for Installer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Pip => write!(f, "pip"),
        }
    }
}

/// A package install or upgrade request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    pub name: String,
    pub installer: Installer,
    /// Exact version to converge to, latest when unset
    pub version: Option<String>,
}

/// A template render request
#[derive(Debug, Clone)]
pub struct TemplateRequest<'a> {
    pub source: &'a str,
    pub destination: &'a Path,
    pub variables: &'a Variables,
    pub attrs: &'a FileAttrs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceAction {
    Enable,
    Start,
    Stop,
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enable => write!(f, "enable"),
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// Optional capabilities of a service's control script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSupports {
    pub status: bool,
    pub restart: bool,
    pub reload: bool,
}

/// Observed run state of a service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStatus {
    pub enabled: bool,
    pub running: bool,
}

/// Read-only access to current machine state
pub trait StateProbe {
    /// Metadata for a path, `None` when it does not exist
    fn path_info(&self, path: &Path) -> Result<Option<PathInfo>>;

    /// [`content_digest`] of a file, `None` when it does not exist
    fn file_digest(&self, path: &Path) -> Result<Option<String>>;

    /// Installed version of a package, `None` when not installed
    fn installed_version(&self, name: &str, installer: Installer) -> Result<Option<String>>;

    /// Newest version the installer could install, `None` when unknown
    fn candidate_version(&self, name: &str, installer: Installer) -> Result<Option<String>>;

    /// Whether a service is enabled at boot and currently running
    fn service_status(&self, name: &str, supports: &ServiceSupports) -> Result<ServiceStatus>;
}

/// Package install/upgrade primitives
pub trait PackageService {
    fn install(&self, request: &PackageRequest) -> Result<()>;

    fn upgrade(&self, request: &PackageRequest) -> Result<()>;
}

/// Directory and attribute primitives
pub trait FileService {
    fn create_directory(&self, path: &Path, attrs: &FileAttrs, recursive: bool) -> Result<()>;

    fn set_attributes(&self, path: &Path, attrs: &FileAttrs) -> Result<()>;
}

/// Variable substitution into text files
pub trait TemplateService {
    /// Render a template source to text without writing anything
    fn render_to_string(&self, source: &str, variables: &Variables) -> Result<String>;

    /// Render and write the destination only if content or attributes differ
    ///
    /// Returns whether the destination changed.
    fn render(&self, request: &TemplateRequest<'_>) -> Result<bool>;
}

/// Init system control plane
pub trait ServiceController {
    /// Bring a service to the state implied by `actions`
    fn apply(&self, name: &str, actions: &[ServiceAction], supports: &ServiceSupports)
    -> Result<()>;

    /// Reload or restart a service in response to a notification
    fn notify(&self, name: &str, action: NotifyAction, supports: &ServiceSupports) -> Result<()>;
}

/// Runs one-off commands for execute resources
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<()>;
}

/// Everything a convergence run needs from the machine
pub trait Host:
    StateProbe + PackageService + FileService + TemplateService + ServiceController + CommandRunner
{
}

impl<T> Host for T where
    T: StateProbe
        + PackageService
        + FileService
        + TemplateService
        + ServiceController
        + CommandRunner
{
}

/// Progress callback for convergence runs
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called before a resource is evaluated
    fn on_resource_start(&mut self, id: &str, description: &str);

    /// Called when a resource reaches a terminal state
    fn on_resource_complete(&mut self, report: &ResourceReport);

    /// Called after a notification fired
    fn on_notification(&mut self, target: &str, action: NotifyAction, timing: Timing);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _report: &ResourceReport) {}
    fn on_notification(&mut self, _target: &str, _action: NotifyAction, _timing: Timing) {}
}

/// Context passed to resource probe, apply and notify operations
pub struct ApplyContext<'a> {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
    pub facts: &'a PlatformFacts,
    pub host: &'a dyn Host,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context
    pub fn new(facts: &'a PlatformFacts, host: &'a dyn Host) -> Self {
        Self {
            dry_run: false,
            verbose: false,
            facts,
            host,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
