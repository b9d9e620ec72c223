//! The supervisor recipe
//!
//! Declares everything a host needs to run supervisord: the python package,
//! its directories, the init integration for the platform and the daemon
//! configuration, with the service restarted when its configuration changes.

use declarative::{
    NotifyAction, PlatformFacts, ResourceCollection, ServiceAction, ServiceSupports,
    SupportPolicy, Timing, Variables,
};
use pkgkit::PackageManager;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::host::InitSystem;
use crate::resource::{
    Directory, Execute, FileAttrs, Guard, Package, Resource, Service, Template,
};

const DEFAULT_FILE: &str = "/etc/default/supervisor";
const INIT_SCRIPT: &str = "/etc/init.d/supervisor";
const SMF_DIR: &str = "/opt/local/share/smf/supervisord";
const SMF_IMPORT: &str = "svccfg-import-supervisord";

/// How the daemon is wired into the init system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// An `/etc/init.d` script from the `<template_dir>/supervisor.init` template
    SysV { template_dir: &'static str },
    /// An SMF manifest imported with svccfg
    Smf,
}

impl Layout {
    pub fn for_facts(facts: &PlatformFacts) -> Self {
        match InitSystem::for_family(&facts.platform_family) {
            InitSystem::Smf => Self::Smf,
            InitSystem::Redhat => Self::SysV {
                template_dir: "rhel",
            },
            InitSystem::Debian => Self::SysV {
                template_dir: "debian",
            },
        }
    }

    fn service(self) -> Service {
        match self {
            Self::SysV { .. } => Service::new(
                "supervisor",
                &[ServiceAction::Enable, ServiceAction::Start],
            )
            .supports(ServiceSupports {
                status: true,
                restart: true,
                reload: false,
            }),
            Self::Smf => Service::new("supervisord", &[ServiceAction::Enable]),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SysV { template_dir } => write!(f, "sysv ({template_dir} init script)"),
            Self::Smf => write!(f, "smf manifest"),
        }
    }
}

/// System package providing pip for a platform family
pub fn pip_package(facts: &PlatformFacts) -> Option<&'static str> {
    match PackageManager::for_family(&facts.platform_family)? {
        PackageManager::Apt => Some("python3-pip"),
        PackageManager::Yum => Some("python-pip"),
        PackageManager::Pkgin => Some("py27-pip"),
        PackageManager::Pip => None,
    }
}

/// Platforms the recipe runs on, from configuration
pub fn policy(settings: &Settings) -> SupportPolicy {
    SupportPolicy {
        supported_platforms: settings.supported_platforms.clone(),
        support_required: settings.support_required,
    }
}

fn supervisord(settings: &Settings) -> PathBuf {
    settings.python_prefix_dir.join("bin").join("supervisord")
}

/// Variables of the init script and SMF manifest templates
pub fn init_variables(settings: &Settings) -> Variables {
    let mut variables = Variables::new();
    variables.insert(
        "supervisord".into(),
        supervisord(settings).display().to_string(),
    );
    variables.insert("conffile".into(), settings.conffile.display().to_string());
    variables
}

/// Variables of the supervisord.conf template
pub fn conf_variables(settings: &Settings) -> Variables {
    let mut variables = Variables::new();
    let mut set = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            variables.insert(key.to_string(), value);
        }
    };
    set("inet_port", settings.inet_port.map(|p| p.to_string()));
    set("inet_username", settings.inet_username.clone());
    set("inet_password", settings.inet_password.clone());
    set("supervisord_minfds", Some(settings.minfds.to_string()));
    set("supervisord_minprocs", Some(settings.minprocs.to_string()));
    set("supervisor_version", settings.version.clone());
    set("log_dir", Some(settings.log_dir.display().to_string()));
    set("include_dir", Some(settings.dir.display().to_string()));
    variables
}

/// Every variable any recipe template can use
pub fn all_variables(settings: &Settings) -> Variables {
    let mut variables = conf_variables(settings);
    variables.extend(init_variables(settings));
    variables
}

/// Build the resource collection for one platform
pub fn build(settings: &Settings, facts: &PlatformFacts) -> ResourceCollection {
    let layout = Layout::for_facts(facts);
    log::debug!("recipe layout for {facts}: {layout:?}");

    let mut collection = ResourceCollection::with_policy(policy(settings));
    let dir_attrs = FileAttrs::root(0o755);
    let file_attrs = FileAttrs::root(0o644);

    collection.add(Package::system("py27-expat").only_if(Guard::family("smartos")));
    // pip itself, before anything is installed through it
    if let Some(pip) = pip_package(facts) {
        collection.add(Package::system(pip));
    }
    collection.add(Package::pip("supervisor").version(settings.version.clone()));

    collection.add(Directory::new(&settings.dir, dir_attrs.clone()));
    collection.add(Directory::new(&settings.log_dir, dir_attrs.clone()).recursive());

    collection.add(
        Template::new(DEFAULT_FILE, "debian/supervisor.default", file_attrs.clone())
            .only_if(Guard::family("debian")),
    );

    match layout {
        Layout::SysV { template_dir } => {
            collection.add(
                Template::new(
                    INIT_SCRIPT,
                    &format!("{template_dir}/supervisor.init"),
                    dir_attrs,
                )
                .variables(init_variables(settings)),
            );
        }
        Layout::Smf => {
            let manifest_path = Path::new(SMF_DIR).join("manifest.xml");
            collection.add(Directory::new(SMF_DIR, dir_attrs));

            let manifest = collection.add(
                Template::new(&manifest_path, "manifest.xml", file_attrs.clone())
                    .variables(init_variables(settings)),
            );

            let import = collection.add(Execute::new(
                SMF_IMPORT,
                format!("svccfg import {}", manifest_path.display()),
            ));
            collection.notifies(&manifest, &import, NotifyAction::Run, Timing::Immediate);
        }
    }

    // after the init integration, so a restart always finds the service
    let conf = collection.add(
        Template::new(&settings.conffile, "supervisord.conf", file_attrs)
            .variables(conf_variables(settings)),
    );

    let service = layout.service();
    let reaction = [NotifyAction::Reload, NotifyAction::Restart]
        .into_iter()
        .find(|action| service.supports_notification(*action));
    let service = collection.add(service);
    if let Some(action) = reaction {
        collection.subscribes(&service, &conf, action, Timing::Immediate);
    }

    collection
}
