//! Template resource - a file rendered from a named template

use anyhow::Result;
use declarative::{TemplateRequest, Variables, content_digest};
use std::path::{Path, PathBuf};

use super::{ApplyContext, ChangeKind, FileAttrs, Guard, Resource, ResourceState};

/// A file whose content is a template rendered with variables
#[derive(Debug, Clone)]
pub struct Template {
    pub path: PathBuf,
    /// Template source name, e.g. `debian/supervisor.init`
    pub source: String,
    pub variables: Variables,
    pub attrs: FileAttrs,
    pub guard: Guard,
}

impl Template {
    pub fn new(path: impl AsRef<Path>, source: &str, attrs: FileAttrs) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            source: source.to_string(),
            variables: Variables::new(),
            attrs,
            guard: Guard::Always,
        }
    }

    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn only_if(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    fn state(digest: &str, attrs: &FileAttrs) -> ResourceState {
        ResourceState::present(format!("{} {attrs}", &digest[..digest.len().min(12)]))
    }
}

impl Resource for Template {
    fn id(&self) -> String {
        format!("template[{}]", self.path.display())
    }

    fn description(&self) -> String {
        format!("Render {} to {}", self.source, self.path.display())
    }

    fn resource_type(&self) -> &'static str {
        "template"
    }

    fn guard(&self) -> Guard {
        self.guard.clone()
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let Some(info) = ctx.host.path_info(&self.path)? else {
            return Ok(ResourceState::Absent);
        };
        match ctx.host.file_digest(&self.path)? {
            Some(digest) => Ok(Self::state(&digest, &info.attrs)),
            None => Ok(ResourceState::Modified {
                from: info.kind.to_string(),
                to: "file".to_string(),
            }),
        }
    }

    fn desired_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let content = ctx.host.render_to_string(&self.source, &self.variables)?;
        Ok(Self::state(
            &content_digest(content.as_bytes()),
            &self.attrs,
        ))
    }

    fn apply(&self, _change: ChangeKind, ctx: &ApplyContext) -> Result<()> {
        let changed = ctx.host.render(&TemplateRequest {
            source: &self.source,
            destination: &self.path,
            variables: &self.variables,
            attrs: &self.attrs,
        })?;
        if !changed {
            log::debug!("{} already up to date at write time", self.path.display());
        }
        Ok(())
    }
}
