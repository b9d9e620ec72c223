//! Service resource - enabled at boot and running under the init system

use anyhow::Result;
use declarative::{ServiceAction, ServiceStatus, ServiceSupports};

use super::{ApplyContext, ChangeKind, Guard, NotifyAction, Resource, ResourceState};

/// A service managed through the platform's init system
#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    /// Steady-state actions, e.g. `[Enable, Start]`
    pub actions: Vec<ServiceAction>,
    pub supports: ServiceSupports,
    pub guard: Guard,
}

impl Service {
    pub fn new(name: &str, actions: &[ServiceAction]) -> Self {
        Self {
            name: name.to_string(),
            actions: actions.to_vec(),
            supports: ServiceSupports::default(),
            guard: Guard::Always,
        }
    }

    pub fn supports(mut self, supports: ServiceSupports) -> Self {
        self.supports = supports;
        self
    }

    /// Status the actions converge to, starting from `current`
    fn target(&self, current: ServiceStatus) -> ServiceStatus {
        let mut target = current;
        for action in &self.actions {
            match action {
                ServiceAction::Enable => target.enabled = true,
                ServiceAction::Start => target.running = true,
                ServiceAction::Stop => target.running = false,
            }
        }
        target
    }

    /// Actions still needed to move from `current` to the target
    fn pending(&self, current: ServiceStatus) -> Vec<ServiceAction> {
        self.actions
            .iter()
            .copied()
            .filter(|action| match action {
                ServiceAction::Enable => !current.enabled,
                ServiceAction::Start => !current.running,
                ServiceAction::Stop => current.running,
            })
            .collect()
    }

    fn state(status: ServiceStatus) -> ResourceState {
        ResourceState::present(format!(
            "{}, {}",
            if status.enabled { "enabled" } else { "disabled" },
            if status.running { "running" } else { "stopped" }
        ))
    }
}

impl Resource for Service {
    fn id(&self) -> String {
        format!("service[{}]", self.name)
    }

    fn description(&self) -> String {
        let actions: Vec<String> = self.actions.iter().map(ToString::to_string).collect();
        format!("Service {} ({})", self.name, actions.join(", "))
    }

    fn resource_type(&self) -> &'static str {
        "service"
    }

    fn guard(&self) -> Guard {
        self.guard.clone()
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let status = ctx.host.service_status(&self.name, &self.supports)?;
        Ok(Self::state(status))
    }

    fn desired_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let status = ctx.host.service_status(&self.name, &self.supports)?;
        Ok(Self::state(self.target(status)))
    }

    fn apply(&self, _change: ChangeKind, ctx: &ApplyContext) -> Result<()> {
        let current = ctx.host.service_status(&self.name, &self.supports)?;
        let pending = self.pending(current);
        if pending.is_empty() {
            return Ok(());
        }
        ctx.host.apply(&self.name, &pending, &self.supports)
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
