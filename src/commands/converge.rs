//! `plan` and `apply`

use anyhow::Result;
use nix::unistd::Uid;

use super::Session;
use crate::Context;
use crate::engine::{self, RunOptions};
use crate::host::SystemHost;
use crate::recipe;
use crate::ui;

fn options(ctx: &Context, yes: bool, json: bool) -> RunOptions {
    RunOptions {
        yes,
        json,
        verbose: ctx.verbose > 0,
    }
}

pub fn plan(ctx: &Context, json: bool) -> Result<()> {
    let session = Session::load(ctx)?;
    let host = SystemHost::new(&session.facts, &session.settings);
    let collection = recipe::build(&session.settings, &session.facts);

    if !json && !ctx.quiet {
        ui::header(&format!("Plan for {}", session.facts));
    }
    engine::plan(&collection, &session.facts, &host, &options(ctx, false, json))?;
    Ok(())
}

pub fn apply(ctx: &Context, yes: bool, json: bool) -> Result<()> {
    let session = Session::load(ctx)?;
    if !Uid::effective().is_root() {
        log::warn!("not running as root; package, file and service changes will likely fail");
    }

    let host = SystemHost::new(&session.facts, &session.settings);
    let collection = recipe::build(&session.settings, &session.facts);

    if !json && !ctx.quiet {
        ui::header(&format!("Converging {}", session.facts));
    }
    engine::apply(&collection, &session.facts, &host, &options(ctx, yes, json))?;
    Ok(())
}
