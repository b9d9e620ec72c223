//! In-memory collaborators and minimal resources for tests
//!
//! [`FakeHost`] implements every collaborator trait over an in-memory model
//! of a machine and records each mutating call, so tests can assert both
//! the resulting state and the exact sequence of side effects.

use crate::context::{
    ApplyContext, CommandRunner, FileAttrs, FileService, Installer, PackageRequest,
    PackageService, PathInfo, PathKind, ServiceAction, ServiceController, ServiceStatus,
    ServiceSupports, StateProbe, TemplateRequest, TemplateService, Variables, content_digest,
};
use crate::guard::Guard;
use crate::resource::Resource;
use crate::types::{ChangeKind, NotifyAction, ResourceState};
use anyhow::{Result, bail};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct FakePath {
    kind: PathKind,
    attrs: FileAttrs,
    content: Option<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    paths: BTreeMap<PathBuf, FakePath>,
    packages: BTreeMap<(Installer, String), String>,
    candidates: BTreeMap<(Installer, String), String>,
    services: BTreeMap<String, ServiceStatus>,
}

/// In-memory machine implementing every collaborator trait
#[derive(Debug, Default)]
pub struct FakeHost {
    state: RefCell<FakeState>,
    calls: RefCell<Vec<String>>,
    fail_on: RefCell<Option<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(self, path: &str, attrs: FileAttrs) -> Self {
        self.state.borrow_mut().paths.insert(
            PathBuf::from(path),
            FakePath {
                kind: PathKind::Directory,
                attrs,
                content: None,
            },
        );
        self
    }

    pub fn with_file(self, path: &str, content: &str, attrs: FileAttrs) -> Self {
        self.state.borrow_mut().paths.insert(
            PathBuf::from(path),
            FakePath {
                kind: PathKind::File,
                attrs,
                content: Some(content.to_string()),
            },
        );
        self
    }

    pub fn with_package(self, name: &str, installer: Installer, version: &str) -> Self {
        self.state
            .borrow_mut()
            .packages
            .insert((installer, name.to_string()), version.to_string());
        self
    }

    pub fn with_candidate(self, name: &str, installer: Installer, version: &str) -> Self {
        self.state
            .borrow_mut()
            .candidates
            .insert((installer, name.to_string()), version.to_string());
        self
    }

    pub fn with_service(self, name: &str, enabled: bool, running: bool) -> Self {
        self.state
            .borrow_mut()
            .services
            .insert(name.to_string(), ServiceStatus { enabled, running });
        self
    }

    /// Make the first mutating call whose record starts with `prefix` fail
    pub fn fail_on(&self, prefix: &str) {
        *self.fail_on.borrow_mut() = Some(prefix.to_string());
    }

    /// Every successful mutating call, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn file_content(&self, path: &str) -> Option<String> {
        self.state
            .borrow()
            .paths
            .get(Path::new(path))
            .and_then(|p| p.content.clone())
    }

    pub fn attrs(&self, path: &str) -> Option<FileAttrs> {
        self.state
            .borrow()
            .paths
            .get(Path::new(path))
            .map(|p| p.attrs.clone())
    }

    pub fn package_version(&self, name: &str, installer: Installer) -> Option<String> {
        self.state
            .borrow()
            .packages
            .get(&(installer, name.to_string()))
            .cloned()
    }

    pub fn service(&self, name: &str) -> ServiceStatus {
        self.state
            .borrow()
            .services
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    fn record(&self, call: String) -> Result<()> {
        let mut fail_on = self.fail_on.borrow_mut();
        if let Some(prefix) = fail_on.as_deref()
            && call.starts_with(prefix)
        {
            *fail_on = None;
            bail!("injected failure: {call}");
        }
        self.calls.borrow_mut().push(call);
        Ok(())
    }

    fn digest(content: &str) -> String {
        content_digest(content.as_bytes())
    }
}

impl StateProbe for FakeHost {
    fn path_info(&self, path: &Path) -> Result<Option<PathInfo>> {
        Ok(self.state.borrow().paths.get(path).map(|p| PathInfo {
            kind: p.kind,
            attrs: p.attrs.clone(),
        }))
    }

    fn file_digest(&self, path: &Path) -> Result<Option<String>> {
        Ok(self
            .state
            .borrow()
            .paths
            .get(path)
            .and_then(|p| p.content.as_deref())
            .map(Self::digest))
    }

    fn installed_version(&self, name: &str, installer: Installer) -> Result<Option<String>> {
        Ok(self.package_version(name, installer))
    }

    fn candidate_version(&self, name: &str, installer: Installer) -> Result<Option<String>> {
        Ok(self
            .state
            .borrow()
            .candidates
            .get(&(installer, name.to_string()))
            .cloned())
    }

    fn service_status(&self, name: &str, _supports: &ServiceSupports) -> Result<ServiceStatus> {
        Ok(self.service(name))
    }
}

impl PackageService for FakeHost {
    fn install(&self, request: &PackageRequest) -> Result<()> {
        self.record(format!("install {}", request.name))?;
        let version = request
            .version
            .clone()
            .or(self.candidate_version(&request.name, request.installer)?)
            .unwrap_or_else(|| "1.0".to_string());
        self.state
            .borrow_mut()
            .packages
            .insert((request.installer, request.name.clone()), version);
        Ok(())
    }

    fn upgrade(&self, request: &PackageRequest) -> Result<()> {
        self.record(format!("upgrade {}", request.name))?;
        let version = request
            .version
            .clone()
            .or(self.candidate_version(&request.name, request.installer)?)
            .unwrap_or_else(|| "1.0".to_string());
        self.state
            .borrow_mut()
            .packages
            .insert((request.installer, request.name.clone()), version);
        Ok(())
    }
}

impl FileService for FakeHost {
    fn create_directory(&self, path: &Path, attrs: &FileAttrs, _recursive: bool) -> Result<()> {
        self.record(format!("create_directory {}", path.display()))?;
        self.state.borrow_mut().paths.insert(
            path.to_path_buf(),
            FakePath {
                kind: PathKind::Directory,
                attrs: attrs.clone(),
                content: None,
            },
        );
        Ok(())
    }

    fn set_attributes(&self, path: &Path, attrs: &FileAttrs) -> Result<()> {
        self.record(format!("set_attributes {}", path.display()))?;
        match self.state.borrow_mut().paths.get_mut(path) {
            Some(entry) => entry.attrs = attrs.clone(),
            None => bail!("no such path: {}", path.display()),
        }
        Ok(())
    }
}

impl TemplateService for FakeHost {
    fn render_to_string(&self, source: &str, variables: &Variables) -> Result<String> {
        let mut out = format!("# {source}\n");
        for (key, value) in variables {
            out.push_str(&format!("{key}={value}\n"));
        }
        Ok(out)
    }

    fn render(&self, request: &TemplateRequest<'_>) -> Result<bool> {
        let content = self.render_to_string(request.source, request.variables)?;
        let unchanged = self
            .state
            .borrow()
            .paths
            .get(request.destination)
            .is_some_and(|p| p.content.as_deref() == Some(content.as_str()) && p.attrs == *request.attrs);
        if unchanged {
            return Ok(false);
        }

        self.record(format!("render {}", request.destination.display()))?;
        self.state.borrow_mut().paths.insert(
            request.destination.to_path_buf(),
            FakePath {
                kind: PathKind::File,
                attrs: request.attrs.clone(),
                content: Some(content),
            },
        );
        Ok(true)
    }
}

impl ServiceController for FakeHost {
    fn apply(
        &self,
        name: &str,
        actions: &[ServiceAction],
        _supports: &ServiceSupports,
    ) -> Result<()> {
        for action in actions {
            self.record(format!("{action} {name}"))?;
            let mut state = self.state.borrow_mut();
            let status = state.services.entry(name.to_string()).or_default();
            match action {
                ServiceAction::Enable => status.enabled = true,
                ServiceAction::Start => status.running = true,
                ServiceAction::Stop => status.running = false,
            }
        }
        Ok(())
    }

    fn notify(&self, name: &str, action: NotifyAction, _supports: &ServiceSupports) -> Result<()> {
        self.record(format!("{action} {name}"))?;
        if action == NotifyAction::Restart {
            self.state
                .borrow_mut()
                .services
                .entry(name.to_string())
                .or_default()
                .running = true;
        }
        Ok(())
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, command: &str) -> Result<()> {
        self.record(format!("run {command}"))
    }
}

/// Minimal directory resource
#[derive(Debug)]
pub struct FakeDirectory {
    pub path: PathBuf,
    pub attrs: FileAttrs,
    pub guard: Guard,
}

impl FakeDirectory {
    pub fn new(path: &str, mode: u32) -> Self {
        Self {
            path: PathBuf::from(path),
            attrs: FileAttrs::root(mode),
            guard: Guard::Always,
        }
    }

    pub fn only_if(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }
}

impl Resource for FakeDirectory {
    fn id(&self) -> String {
        format!("directory[{}]", self.path.display())
    }

    fn description(&self) -> String {
        format!("Directory {}", self.path.display())
    }

    fn resource_type(&self) -> &'static str {
        "directory"
    }

    fn guard(&self) -> Guard {
        self.guard.clone()
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(match ctx.host.path_info(&self.path)? {
            Some(info) => ResourceState::present(info.attrs.to_string()),
            None => ResourceState::Absent,
        })
    }

    fn desired_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(ResourceState::present(self.attrs.to_string()))
    }

    fn apply(&self, change: ChangeKind, ctx: &ApplyContext) -> Result<()> {
        match change {
            ChangeKind::Create => ctx.host.create_directory(&self.path, &self.attrs, false),
            ChangeKind::Update => ctx.host.set_attributes(&self.path, &self.attrs),
        }
    }
}

/// Minimal template resource
#[derive(Debug)]
pub struct FakeTemplate {
    pub path: PathBuf,
    pub source: String,
    pub variables: Variables,
    pub attrs: FileAttrs,
}

impl FakeTemplate {
    pub fn new(path: &str, source: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            source: source.to_string(),
            variables: Variables::new(),
            attrs: FileAttrs::root(0o644),
        }
    }

    pub fn var(mut self, key: &str, value: &str) -> Self {
        self.variables.insert(key.to_string(), value.to_string());
        self
    }
}

impl Resource for FakeTemplate {
    fn id(&self) -> String {
        format!("template[{}]", self.path.display())
    }

    fn description(&self) -> String {
        format!("Render {} to {}", self.source, self.path.display())
    }

    fn resource_type(&self) -> &'static str {
        "template"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(match ctx.host.file_digest(&self.path)? {
            Some(digest) => ResourceState::present(digest),
            None => ResourceState::Absent,
        })
    }

    fn desired_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let content = ctx.host.render_to_string(&self.source, &self.variables)?;
        Ok(ResourceState::present(FakeHost::digest(&content)))
    }

    fn apply(&self, _change: ChangeKind, ctx: &ApplyContext) -> Result<()> {
        ctx.host.render(&TemplateRequest {
            source: &self.source,
            destination: &self.path,
            variables: &self.variables,
            attrs: &self.attrs,
        })?;
        Ok(())
    }
}

/// Minimal enabled-and-running service resource
#[derive(Debug)]
pub struct FakeService {
    pub name: String,
    pub supports: ServiceSupports,
}

impl FakeService {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            supports: ServiceSupports {
                status: true,
                restart: true,
                reload: true,
            },
        }
    }

    fn status_details(status: ServiceStatus) -> String {
        format!("enabled={} running={}", status.enabled, status.running)
    }
}

impl Resource for FakeService {
    fn id(&self) -> String {
        format!("service[{}]", self.name)
    }

    fn description(&self) -> String {
        format!("Enable and start {}", self.name)
    }

    fn resource_type(&self) -> &'static str {
        "service"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let status = ctx.host.service_status(&self.name, &self.supports)?;
        Ok(ResourceState::present(Self::status_details(status)))
    }

    fn desired_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(ResourceState::present(Self::status_details(ServiceStatus {
            enabled: true,
            running: true,
        })))
    }

    fn apply(&self, _change: ChangeKind, ctx: &ApplyContext) -> Result<()> {
        ctx.host.apply(
            &self.name,
            &[ServiceAction::Enable, ServiceAction::Start],
            &self.supports,
        )
    }

    fn supports_notification(&self, action: NotifyAction) -> bool {
        match action {
            NotifyAction::Reload => self.supports.reload,
            NotifyAction::Restart => self.supports.restart,
            NotifyAction::Run => false,
        }
    }

    fn notify(&self, action: NotifyAction, ctx: &ApplyContext) -> Result<()> {
        ctx.host.notify(&self.name, action, &self.supports)
    }
}

/// Passive command, only runs when notified
#[derive(Debug)]
pub struct FakeCommand {
    pub name: String,
    pub command: String,
}

impl FakeCommand {
    pub fn new(name: &str, command: &str) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
        }
    }
}

impl Resource for FakeCommand {
    fn id(&self) -> String {
        format!("execute[{}]", self.name)
    }

    fn description(&self) -> String {
        format!("Run {}", self.command)
    }

    fn resource_type(&self) -> &'static str {
        "execute"
    }

    fn is_passive(&self) -> bool {
        true
    }

    fn current_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(ResourceState::Unknown)
    }

    fn desired_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(ResourceState::Unknown)
    }

    fn apply(&self, _change: ChangeKind, ctx: &ApplyContext) -> Result<()> {
        ctx.host.run(&self.command)
    }

    fn supports_notification(&self, action: NotifyAction) -> bool {
        action == NotifyAction::Run
    }

    fn notify(&self, _action: NotifyAction, ctx: &ApplyContext) -> Result<()> {
        ctx.host.run(&self.command)
    }
}
