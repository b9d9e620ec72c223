//! `facts` - what a run would be evaluated against

use anyhow::Result;

use super::Session;
use crate::Context;
use crate::host::InitSystem;
use crate::recipe::{self, Layout};
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let session = Session::load(ctx)?;
    let facts = &session.facts;
    let settings = &session.settings;

    ui::header("Platform");
    ui::kv("platform", &facts.platform);
    ui::kv("family", &facts.platform_family);
    ui::kv(
        "version",
        &ui::or_default(facts.platform_version.as_deref(), "unknown"),
    );
    ui::kv("layout", &Layout::for_facts(facts).to_string());
    ui::kv(
        "init system",
        &format!("{:?}", InitSystem::for_family(&facts.platform_family)),
    );
    ui::kv("supported", ui::yes_no(recipe::policy(settings).supports(facts)));

    ui::header("Settings");
    ui::kv(
        "config file",
        &ui::or_default(session.config_path.as_ref().map(|p| p.display()), "(defaults)"),
    );
    ui::kv("conffile", &settings.conffile.display().to_string());
    ui::kv("include dir", &settings.dir.display().to_string());
    ui::kv("log dir", &settings.log_dir.display().to_string());
    ui::kv("python prefix", &settings.python_prefix_dir.display().to_string());
    ui::kv("pip", &settings.pip.display().to_string());
    ui::kv("version", &ui::or_default(settings.version.as_deref(), "latest"));
    ui::kv("inet port", &ui::or_default(settings.inet_port, "disabled"));
    if ctx.verbose > 0 {
        ui::kv("supported platforms", &settings.supported_platforms.join(", "));
        ui::kv("support required", ui::yes_no(settings.support_required));
    }
    Ok(())
}
