//! Configuration for the supervisor recipe
//!
//! Loaded from TOML. Every key is optional; paths left unset get defaults
//! for the detected platform family when [`SupervisorConfig::resolve`] runs.

use anyhow::{Context, Result, bail};
use declarative::PlatformFacts;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::Overrides;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "SUPERVISE_CONFIG";

const SYSTEM_CONFIG: &str = "/etc/supervise/config.toml";

/// The complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    /// Overrides of platform detection
    #[serde(default)]
    pub platform: PlatformConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Directory for program definitions included by supervisord.conf
    pub dir: Option<String>,
    pub log_dir: Option<String>,
    pub conffile: Option<String>,

    /// Port of the HTTP control interface; unset disables it
    pub inet_port: Option<u32>,
    pub inet_username: Option<String>,
    pub inet_password: Option<String>,

    pub minfds: u32,
    pub minprocs: u32,

    /// Pin the supervisor package; unset tracks the newest release
    pub version: Option<String>,

    /// Fail on unsupported platforms instead of skipping the run
    pub support_required: bool,
    pub supported_platforms: Vec<String>,

    /// Python installation prefix providing pip and supervisord
    pub python_prefix_dir: Option<String>,

    /// pip executable, `<python_prefix_dir>/bin/pip` when unset
    pub pip: Option<String>,

    /// Directory with `<name>.tmpl` files overriding the built-in templates
    pub template_dir: Option<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            dir: None,
            log_dir: None,
            conffile: None,
            inet_port: None,
            inet_username: None,
            inet_password: None,
            minfds: 1024,
            minprocs: 200,
            version: None,
            support_required: true,
            supported_platforms: vec!["debian".into(), "ubuntu".into(), "smartos".into()],
            python_prefix_dir: None,
            pip: None,
            template_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    pub platform: Option<String>,
    pub platform_family: Option<String>,
}

impl From<PlatformConfig> for Overrides {
    fn from(config: PlatformConfig) -> Self {
        Overrides {
            platform: config.platform,
            platform_family: config.platform_family,
        }
    }
}

/// Configuration with every path resolved for one platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub dir: PathBuf,
    pub log_dir: PathBuf,
    pub conffile: PathBuf,
    pub inet_port: Option<u16>,
    pub inet_username: Option<String>,
    pub inet_password: Option<String>,
    pub minfds: u32,
    pub minprocs: u32,
    pub version: Option<String>,
    pub support_required: bool,
    pub supported_platforms: Vec<String>,
    pub python_prefix_dir: PathBuf,
    pub pip: PathBuf,
    pub template_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration, from `explicit` if given, else the first existing
    /// default location. Returns the file used, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let config = Self::load_file(path)?;
            return Ok((config, Some(path.to_path_buf())));
        }

        for path in default_locations() {
            if path.is_file() {
                let config = Self::load_file(&path)?;
                return Ok((config, Some(path)));
            }
        }

        log::debug!("no config file found, using defaults");
        Ok((Self::default(), None))
    }

    /// Load and validate one config file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(port) = self.supervisor.inet_port
            && !(1..=65535).contains(&port)
        {
            bail!("inet_port must be between 1 and 65535, got {port}");
        }
        if self.supervisor.inet_password.is_some() && self.supervisor.inet_username.is_none() {
            bail!("inet_password is set without inet_username");
        }
        Ok(())
    }
}

impl SupervisorConfig {
    /// Fill in platform-dependent defaults and expand `~`
    ///
    /// Fails when two of the managed paths resolve to the same location.
    pub fn resolve(&self, facts: &PlatformFacts) -> Result<Settings> {
        let smartos = facts.is_family("smartos");
        let etc = if smartos { "/opt/local/etc" } else { "/etc" };
        let prefix = if smartos { "/opt/local" } else { "/usr" };

        let path = |value: &Option<String>, default: String| match value {
            Some(v) => expand(v),
            None => PathBuf::from(default),
        };

        let python_prefix_dir = path(&self.python_prefix_dir, prefix.to_string());
        let pip = match &self.pip {
            Some(pip) => expand(pip),
            None => python_prefix_dir.join("bin").join("pip"),
        };

        let settings = Settings {
            dir: path(&self.dir, format!("{etc}/supervisor.d")),
            log_dir: path(&self.log_dir, "/var/log/supervisor".to_string()),
            conffile: path(&self.conffile, format!("{etc}/supervisord.conf")),
            inet_port: self.inet_port.and_then(|p| u16::try_from(p).ok()),
            inet_username: self.inet_username.clone(),
            inet_password: self.inet_password.clone(),
            minfds: self.minfds,
            minprocs: self.minprocs,
            version: self.version.clone(),
            support_required: self.support_required,
            supported_platforms: self.supported_platforms.clone(),
            python_prefix_dir,
            pip,
            template_dir: self.template_dir.as_deref().map(expand),
        };
        settings.check_paths()?;
        Ok(settings)
    }
}

impl Settings {
    fn check_paths(&self) -> Result<()> {
        let paths = [
            ("dir", &self.dir),
            ("log_dir", &self.log_dir),
            ("conffile", &self.conffile),
        ];
        for (i, (key, path)) in paths.iter().enumerate() {
            if let Some((other, _)) = paths[i + 1..].iter().find(|(_, p)| p == path) {
                bail!("{key} and {other} both resolve to {}", path.display());
            }
        }
        Ok(())
    }
}

/// Config files tried in order when none is given explicitly
pub fn default_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("supervise").join("config.toml"));
    }
    locations.push(PathBuf::from(SYSTEM_CONFIG));
    locations
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ubuntu() -> PlatformFacts {
        PlatformFacts::new("ubuntu", "debian")
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());

        let settings = config.supervisor.resolve(&ubuntu()).unwrap();
        assert_eq!(settings.dir, PathBuf::from("/etc/supervisor.d"));
        assert_eq!(settings.conffile, PathBuf::from("/etc/supervisord.conf"));
        assert_eq!(settings.log_dir, PathBuf::from("/var/log/supervisor"));
        assert_eq!(settings.python_prefix_dir, PathBuf::from("/usr"));
        assert_eq!(settings.pip, PathBuf::from("/usr/bin/pip"));
        assert_eq!(settings.minfds, 1024);
        assert_eq!(settings.minprocs, 200);
        assert!(settings.support_required);
        assert_eq!(settings.supported_platforms, vec!["debian", "ubuntu", "smartos"]);
        assert_eq!(settings.inet_port, None);
    }

    #[test]
    fn test_smartos_defaults() {
        let settings = SupervisorConfig::default()
            .resolve(&PlatformFacts::new("smartos", "smartos"))
            .unwrap();
        assert_eq!(settings.conffile, PathBuf::from("/opt/local/etc/supervisord.conf"));
        assert_eq!(settings.dir, PathBuf::from("/opt/local/etc/supervisor.d"));
        assert_eq!(settings.python_prefix_dir, PathBuf::from("/opt/local"));
        assert_eq!(settings.pip, PathBuf::from("/opt/local/bin/pip"));
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
[supervisor]
inet_port = 9001
inet_username = "admin"
inet_password = "secret"
version = "3.0"
support_required = false
supported_platforms = ["debian", "ubuntu", "centos"]
conffile = "/srv/supervisord.conf"
pip = "/usr/bin/pip3"

[platform]
platform = "centos"
"#,
        )
        .unwrap();

        let settings = config.supervisor.resolve(&ubuntu()).unwrap();
        assert_eq!(settings.inet_port, Some(9001));
        assert_eq!(settings.pip, PathBuf::from("/usr/bin/pip3"));
        assert_eq!(settings.version.as_deref(), Some("3.0"));
        assert!(!settings.support_required);
        assert_eq!(settings.conffile, PathBuf::from("/srv/supervisord.conf"));
        assert_eq!(config.platform.platform.as_deref(), Some("centos"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = Config::parse("[supervisor]\ninet_port = 70000\n").unwrap_err();
        assert!(err.to_string().contains("inet_port"));

        assert!(Config::parse("[supervisor]\ninet_port = 0\n").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::parse("[supervisor]\ninet_prot = 9001\n").is_err());
    }

    #[test]
    fn test_password_requires_username() {
        assert!(Config::parse("[supervisor]\ninet_password = \"x\"\n").is_err());
    }

    #[test]
    fn test_tilde_expanded() {
        let config = Config::parse("[supervisor]\nlog_dir = \"~/logs\"\n").unwrap();
        let settings = config.supervisor.resolve(&ubuntu()).unwrap();
        assert!(!settings.log_dir.to_string_lossy().starts_with('~'));
        assert!(settings.log_dir.ends_with("logs"));
    }

    #[test]
    fn test_colliding_paths_rejected() {
        let config = Config::parse("[supervisor]\ndir = \"/var/log/supervisor\"\n").unwrap();
        let err = config.supervisor.resolve(&ubuntu()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "dir and log_dir both resolve to /var/log/supervisor"
        );

        let config = Config::parse("[supervisor]\nconffile = \"~/x\"\nlog_dir = \"~/x\"\n").unwrap();
        let err = config.supervisor.resolve(&ubuntu()).unwrap_err();
        assert!(err.to_string().starts_with("log_dir and conffile both resolve to"));
    }

    #[test]
    fn test_load_explicit_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[supervisor]\nminfds = 4096").unwrap();

        let (config, used) = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.supervisor.minfds, 4096);
        assert_eq!(used.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_file_error_names_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[supervisor").unwrap();

        let err = Config::load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains(&file.path().display().to_string()));
    }
}
