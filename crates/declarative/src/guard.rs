//! Platform facts, per-resource precondition guards and the run-level
//! support policy

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only description of the machine being converged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFacts {
    /// Distribution id, e.g. "ubuntu", "centos", "smartos"
    pub platform: String,
    /// Family sharing packaging and init conventions, e.g. "debian", "rhel"
    pub platform_family: String,
    #[serde(default)]
    pub platform_version: Option<String>,
}

impl PlatformFacts {
    pub fn new(platform: impl Into<String>, platform_family: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            platform_family: platform_family.into(),
            platform_version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.platform_version = Some(version.into());
        self
    }

    /// Check the platform family
    pub fn is_family(&self, family: &str) -> bool {
        self.platform_family == family
    }
}

impl fmt::Display for PlatformFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} family)", self.platform, self.platform_family)?;
        if let Some(version) = &self.platform_version {
            write!(f, " {version}")?;
        }
        Ok(())
    }
}

/// Precondition deciding whether a resource takes part in a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Guard {
    #[default]
    Always,
    /// Only on one of these platform families
    PlatformFamily(Vec<String>),
    /// Only on one of these platforms
    Platform(Vec<String>),
    /// Everywhere except these platforms
    NotPlatform(Vec<String>),
}

impl Guard {
    pub fn family(family: &str) -> Self {
        Self::PlatformFamily(vec![family.to_string()])
    }

    /// Evaluate against platform facts
    pub fn evaluate(&self, facts: &PlatformFacts) -> bool {
        match self {
            Self::Always => true,
            Self::PlatformFamily(families) => families.iter().any(|f| facts.is_family(f)),
            Self::Platform(platforms) => platforms.iter().any(|p| *p == facts.platform),
            Self::NotPlatform(platforms) => !platforms.iter().any(|p| *p == facts.platform),
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::PlatformFamily(v) => write!(f, "only on platform family {}", v.join("|")),
            Self::Platform(v) => write!(f, "only on platform {}", v.join("|")),
            Self::NotPlatform(v) => write!(f, "not on platform {}", v.join("|")),
        }
    }
}

/// Which platforms a run supports and what happens on the others
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportPolicy {
    /// Empty means every platform is supported
    pub supported_platforms: Vec<String>,
    /// Unsupported platforms abort the run instead of skipping it
    pub support_required: bool,
}

/// Result of checking a support policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Support {
    Supported,
    NotApplicable { reason: String },
}

impl SupportPolicy {
    pub fn new(supported_platforms: &[&str], support_required: bool) -> Self {
        Self {
            supported_platforms: supported_platforms.iter().map(|p| p.to_string()).collect(),
            support_required,
        }
    }

    /// Check if a platform is in the supported set
    pub fn supports(&self, facts: &PlatformFacts) -> bool {
        self.supported_platforms.is_empty()
            || self.supported_platforms.iter().any(|p| *p == facts.platform)
    }

    /// Decide whether a run on this platform proceeds, is skipped, or fails
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedPlatform` when the platform is unsupported
    /// and support is required.
    pub fn check(&self, facts: &PlatformFacts) -> Result<Support> {
        if self.supports(facts) {
            return Ok(Support::Supported);
        }

        if self.support_required {
            return Err(Error::UnsupportedPlatform {
                platform: facts.platform.clone(),
                supported: self.supported_platforms.clone(),
            });
        }

        Ok(Support::NotApplicable {
            reason: format!(
                "platform {} not supported and support_required set to false",
                facts.platform
            ),
        })
    }
}
