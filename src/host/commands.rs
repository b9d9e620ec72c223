use anyhow::{Context, Result};
use declarative::CommandRunner;

use super::SystemHost;
use crate::runner;

impl CommandRunner for SystemHost {
    fn run(&self, command: &str) -> Result<()> {
        log::info!("running: {command}");
        let output =
            runner::run_shell(command).with_context(|| format!("Command failed: {command}"))?;
        if !output.is_empty() {
            log::debug!("{output}");
        }
        Ok(())
    }
}
