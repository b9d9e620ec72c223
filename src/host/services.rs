use anyhow::Result;
use declarative::{
    NotifyAction, ServiceAction, ServiceController, ServiceStatus, ServiceSupports,
};
use std::fs;
use std::path::Path;

use super::SystemHost;
use crate::runner;

const INIT_D: &str = "/etc/init.d";

/// Init system of a platform family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitSystem {
    /// SysV scripts registered with update-rc.d
    Debian,
    /// SysV scripts registered with chkconfig
    Redhat,
    /// illumos service management facility
    Smf,
}

impl InitSystem {
    pub fn for_family(family: &str) -> Self {
        match family {
            "smartos" => Self::Smf,
            "rhel" | "fedora" | "amazon" => Self::Redhat,
            _ => Self::Debian,
        }
    }

    pub(super) fn status(self, name: &str, supports: &ServiceSupports) -> Result<ServiceStatus> {
        if self == Self::Smf {
            let state = runner::run_capture("svcs", &["-H", "-o", "state", name]).ok();
            return Ok(parse_svcs_state(state.as_deref().unwrap_or("")));
        }

        let enabled = match self {
            Self::Redhat => runner::run_capture("chkconfig", &["--list", name])
                .is_ok_and(|out| chkconfig_enabled(&out)),
            _ => rc_links_enabled(Path::new("/etc"), name),
        };
        let running = if supports.status {
            runner::run_quiet(&init_script(name), &["status"])
        } else {
            runner::run_quiet("pgrep", &["-f", name])
        };
        Ok(ServiceStatus { enabled, running })
    }

    fn apply(self, name: &str, action: ServiceAction) -> Result<()> {
        let script = init_script(name);
        match (self, action) {
            (Self::Smf, ServiceAction::Enable) => runner::run_checked("svcadm", &["enable", name]),
            (Self::Smf, ServiceAction::Start) => {
                runner::run_checked("svcadm", &["enable", "-t", name])
            }
            (Self::Smf, ServiceAction::Stop) => {
                runner::run_checked("svcadm", &["disable", "-t", name])
            }
            (Self::Debian, ServiceAction::Enable) => {
                runner::run_checked("update-rc.d", &[name, "defaults"])
            }
            (Self::Redhat, ServiceAction::Enable) => {
                runner::run_checked("chkconfig", &["--add", name])?;
                runner::run_checked("chkconfig", &[name, "on"])
            }
            (_, ServiceAction::Start) => runner::run_checked(&script, &["start"]),
            (_, ServiceAction::Stop) => runner::run_checked(&script, &["stop"]),
        }
    }
}

fn init_script(name: &str) -> String {
    format!("{INIT_D}/{name}")
}

/// Whether any multi-user runlevel starts the service
fn rc_links_enabled(etc: &Path, name: &str) -> bool {
    (2..=5).any(|level| {
        let Ok(entries) = fs::read_dir(etc.join(format!("rc{level}.d"))) else {
            return false;
        };
        entries.flatten().any(|entry| {
            let link = entry.file_name();
            let link = link.to_string_lossy();
            link.starts_with('S') && link.get(3..) == Some(name)
        })
    })
}

/// Whether `chkconfig --list` shows the service on in runlevels 2-5
fn chkconfig_enabled(output: &str) -> bool {
    output
        .split_whitespace()
        .filter_map(|field| field.split_once(':'))
        .any(|(level, state)| matches!(level, "2" | "3" | "4" | "5") && state == "on")
}

/// Map an SMF state to enabled/running
fn parse_svcs_state(state: &str) -> ServiceStatus {
    match state.trim() {
        "online" | "degraded" => ServiceStatus {
            enabled: true,
            running: true,
        },
        "offline" | "maintenance" | "uninitialized" => ServiceStatus {
            enabled: true,
            running: false,
        },
        _ => ServiceStatus::default(),
    }
}

impl ServiceController for SystemHost {
    fn apply(
        &self,
        name: &str,
        actions: &[ServiceAction],
        _supports: &ServiceSupports,
    ) -> Result<()> {
        for action in actions {
            log::info!("{action} {name}");
            self.init.apply(name, *action)?;
        }
        Ok(())
    }

    fn notify(&self, name: &str, action: NotifyAction, supports: &ServiceSupports) -> Result<()> {
        log::info!("{action} {name}");
        match (self.init, action) {
            (InitSystem::Smf, NotifyAction::Restart) => {
                runner::run_checked("svcadm", &["restart", name])
            }
            (InitSystem::Smf, NotifyAction::Reload) => {
                runner::run_checked("svcadm", &["refresh", name])
            }
            (_, NotifyAction::Restart) if !supports.restart => {
                self.init.apply(name, ServiceAction::Stop)?;
                self.init.apply(name, ServiceAction::Start)
            }
            (_, NotifyAction::Restart) => runner::run_checked(&init_script(name), &["restart"]),
            (_, NotifyAction::Reload) => runner::run_checked(&init_script(name), &["reload"]),
            (_, NotifyAction::Run) => anyhow::bail!("service {name} cannot be run"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_system_for_family() {
        assert_eq!(InitSystem::for_family("debian"), InitSystem::Debian);
        assert_eq!(InitSystem::for_family("rhel"), InitSystem::Redhat);
        assert_eq!(InitSystem::for_family("smartos"), InitSystem::Smf);
    }

    #[test]
    fn test_rc_links() {
        let etc = tempfile::tempdir().unwrap();
        fs::create_dir(etc.path().join("rc2.d")).unwrap();
        fs::write(etc.path().join("rc2.d/K01supervisor"), "").unwrap();
        assert!(!rc_links_enabled(etc.path(), "supervisor"));

        fs::write(etc.path().join("rc2.d/S01supervisord"), "").unwrap();
        assert!(!rc_links_enabled(etc.path(), "supervisor"));

        fs::write(etc.path().join("rc2.d/S20supervisor"), "").unwrap();
        assert!(rc_links_enabled(etc.path(), "supervisor"));
    }

    #[test]
    fn test_chkconfig_list() {
        assert!(chkconfig_enabled(
            "supervisor     \t0:off\t1:off\t2:on\t3:on\t4:on\t5:on\t6:off"
        ));
        assert!(!chkconfig_enabled(
            "supervisor     \t0:off\t1:off\t2:off\t3:off\t4:off\t5:off\t6:off"
        ));
        assert!(!chkconfig_enabled(""));
    }

    #[test]
    fn test_svcs_states() {
        assert_eq!(
            parse_svcs_state("online\n"),
            ServiceStatus {
                enabled: true,
                running: true
            }
        );
        assert_eq!(
            parse_svcs_state("maintenance"),
            ServiceStatus {
                enabled: true,
                running: false
            }
        );
        assert_eq!(parse_svcs_state("disabled"), ServiceStatus::default());
        assert_eq!(parse_svcs_state(""), ServiceStatus::default());
    }
}
