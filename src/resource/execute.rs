//! Execute resource - a command that runs only when notified

use anyhow::Result;

use super::{ApplyContext, ChangeKind, Guard, NotifyAction, Resource, ResourceState};

/// A named shell command, triggered by a `run` notification
#[derive(Debug, Clone)]
pub struct Execute {
    pub name: String,
    pub command: String,
    pub guard: Guard,
}

impl Execute {
    pub fn new(name: &str, command: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            command: command.into(),
            guard: Guard::Always,
        }
    }
}

impl Resource for Execute {
    fn id(&self) -> String {
        format!("execute[{}]", self.name)
    }

    fn description(&self) -> String {
        format!("Run `{}`", self.command)
    }

    fn resource_type(&self) -> &'static str {
        "execute"
    }

    fn guard(&self) -> Guard {
        self.guard.clone()
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
        log::debug!("running {}: {}", self.id(), self.command);
        ctx.host.run(&self.command)
    }
}
