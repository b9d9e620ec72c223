use anyhow::{Context, Result};
use declarative::{TemplateRequest, TemplateService, Variables};
use std::fs;
use std::io::Write;
use std::path::Path;

use super::SystemHost;
use super::files::{apply_attrs, path_info};

impl TemplateService for SystemHost {
    fn render_to_string(&self, source: &str, variables: &Variables) -> Result<String> {
        self.templates
            .render(source, variables)
            .with_context(|| format!("Could not render template {source}"))
    }

    fn render(&self, request: &TemplateRequest<'_>) -> Result<bool> {
        let content = self.render_to_string(request.source, request.variables)?;
        let destination = request.destination;

        let same_content = fs::read(destination).is_ok_and(|old| old == content.as_bytes());
        let same_attrs = path_info(destination)?.is_some_and(|info| info.attrs == *request.attrs);
        if same_content && same_attrs {
            return Ok(false);
        }

        if same_content {
            log::debug!("{} content unchanged, fixing attributes", destination.display());
        } else {
            write_atomic(destination, content.as_bytes())?;
        }
        apply_attrs(destination, request.attrs)?;
        Ok(true)
    }
}

/// Replace a file through a temporary sibling and a rename
fn write_atomic(destination: &Path, content: &[u8]) -> Result<()> {
    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Could not create a temporary file in {}", dir.display()))?;
    temp.write_all(content)
        .and_then(|()| temp.as_file().sync_all())
        .with_context(|| format!("Could not write {}", destination.display()))?;
    temp.persist(destination)
        .with_context(|| format!("Could not replace {}", destination.display()))?;
    log::debug!("wrote {} ({} bytes)", destination.display(), content.len());
    Ok(())
}
