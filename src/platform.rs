//! Platform detection
//!
//! Produces the [`PlatformFacts`] a run is evaluated against, from
//! `/etc/os-release` on Linux and `/etc/release` on SmartOS, with optional
//! overrides from the command line or config.

use anyhow::{Context, Result};
use declarative::PlatformFacts;
use std::fs;
use std::path::Path;

use crate::runner;

const OS_RELEASE: &str = "/etc/os-release";
const SUNOS_RELEASE: &str = "/etc/release";

/// Explicit platform settings that bypass detection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub platform: Option<String>,
    pub platform_family: Option<String>,
}

impl Overrides {
    /// Prefer values from `self`, fall back to `other`
    pub fn or(self, other: Overrides) -> Overrides {
        Overrides {
            platform: self.platform.or(other.platform),
            platform_family: self.platform_family.or(other.platform_family),
        }
    }
}

/// Fields of os-release(5) we care about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub id_like: Vec<String>,
    pub version_id: Option<String>,
}

/// Detect the platform of the running host
pub fn detect(overrides: &Overrides) -> Result<PlatformFacts> {
    if let Some(platform) = &overrides.platform {
        let family = overrides
            .platform_family
            .clone()
            .unwrap_or_else(|| family_for(platform, &[]));
        log::debug!("platform overridden: {platform} ({family})");
        return Ok(PlatformFacts::new(platform.as_str(), family));
    }

    let mut facts = detect_host()?;
    if let Some(family) = &overrides.platform_family {
        facts.platform_family = family.clone();
    }
    log::debug!("detected platform: {facts}");
    Ok(facts)
}

fn detect_host() -> Result<PlatformFacts> {
    let sysname = runner::run_capture("uname", &["-s"]).unwrap_or_default();
    if sysname == "SunOS" && Path::new(SUNOS_RELEASE).exists() {
        let content = fs::read_to_string(SUNOS_RELEASE)
            .with_context(|| format!("Could not read {SUNOS_RELEASE}"))?;
        if let Some(facts) = parse_sunos_release(&content) {
            return Ok(facts);
        }
    }

    let content =
        fs::read_to_string(OS_RELEASE).with_context(|| format!("Could not read {OS_RELEASE}"))?;
    Ok(facts_from_os_release(&parse_os_release(&content)))
}

/// Parse the KEY=value lines of os-release(5)
pub fn parse_os_release(content: &str) -> OsRelease {
    let mut release = OsRelease::default();
    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        match key {
            "ID" => release.id = value.to_lowercase(),
            "ID_LIKE" => {
                release.id_like = value.split_whitespace().map(str::to_lowercase).collect();
            }
            "VERSION_ID" if !value.is_empty() => release.version_id = Some(value.to_string()),
            _ => {}
        }
    }
    release
}

pub fn facts_from_os_release(release: &OsRelease) -> PlatformFacts {
    let id = if release.id.is_empty() {
        "linux"
    } else {
        release.id.as_str()
    };
    let facts = PlatformFacts::new(id, family_for(id, &release.id_like));
    match &release.version_id {
        Some(version) => facts.with_version(version.as_str()),
        None => facts,
    }
}

/// Recognise SmartOS from the first line of /etc/release
pub fn parse_sunos_release(content: &str) -> Option<PlatformFacts> {
    let line = content.lines().find(|l| !l.trim().is_empty())?;
    let mut words = line.split_whitespace();
    words.find(|w| w.eq_ignore_ascii_case("smartos"))?;
    let facts = PlatformFacts::new("smartos", "smartos");
    Some(match words.next() {
        Some(version) => facts.with_version(version),
        None => facts,
    })
}

/// Map a platform id to its family
pub fn family_for(id: &str, id_like: &[String]) -> String {
    let known = |candidate: &str| match candidate {
        "debian" | "ubuntu" | "linuxmint" | "raspbian" => Some("debian"),
        "rhel" | "redhat" | "centos" | "amazon" | "scientific" | "oracle" | "ol" | "rocky"
        | "almalinux" => Some("rhel"),
        "fedora" => Some("fedora"),
        "smartos" => Some("smartos"),
        _ => None,
    };

    known(id)
        .or_else(|| id_like.iter().find_map(|like| known(like.as_str())))
        .unwrap_or(id)
        .to_string()
}
