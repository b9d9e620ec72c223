//! `render` - print a template as the recipe would write it

use anyhow::{Context as AnyhowContext, Result};

use super::Session;
use crate::Context;
use crate::recipe;
use crate::render::Templates;

pub fn run(ctx: &Context, source: &str) -> Result<()> {
    let session = Session::load(ctx)?;
    let templates = Templates::new(session.settings.template_dir.clone());
    let variables = recipe::all_variables(&session.settings);
    let text = templates.render(source, &variables).with_context(|| {
        let available: Vec<&str> = Templates::builtin_names().collect();
        format!("Could not render {source} (built-in: {})", available.join(", "))
    })?;
    print!("{text}");
    Ok(())
}
