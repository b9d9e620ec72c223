//! Command handlers

pub mod converge;
pub mod facts;
pub mod render;

use anyhow::{Context as _, Result};
use declarative::PlatformFacts;
use std::path::PathBuf;

use crate::Context;
use crate::config::{Config, Settings};
use crate::platform;

/// Configuration and platform facts a command runs against
pub struct Session {
    pub facts: PlatformFacts,
    pub settings: Settings,
    pub config_path: Option<PathBuf>,
}

impl Session {
    /// Load configuration and detect the platform
    pub fn load(ctx: &Context) -> Result<Self> {
        let (config, config_path) = Config::load(ctx.config.as_deref())?;
        match &config_path {
            Some(path) => log::info!("using config {}", path.display()),
            None => log::info!("no config file, using defaults"),
        }

        let overrides = ctx.overrides.clone().or(config.platform.clone().into());
        let facts = platform::detect(&overrides)?;
        let settings = config
            .supervisor
            .resolve(&facts)
            .with_context(|| match &config_path {
                Some(path) => format!("Invalid config file: {}", path.display()),
                None => "Invalid default configuration".to_string(),
            })?;

        Ok(Self {
            facts,
            settings,
            config_path,
        })
    }
}
