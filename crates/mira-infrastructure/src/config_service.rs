//! Configuration service implementation.
//!
//! Loads `ClientConfig` from `~/.config/mira/config.toml` and applies
//! environment overrides on top. A missing file means defaults.

use crate::paths::MiraPaths;
use mira_core::config::ClientConfig;
use mira_core::error::{MiraError, Result};
use std::path::{Path, PathBuf};

pub const ENV_BASE_URL: &str = "MIRA_BASE_URL";
pub const ENV_USER_ID: &str = "MIRA_USER_ID";
pub const ENV_LICENSE_ID: &str = "MIRA_LICENSE_ID";
pub const ENV_TIMEOUT_SECS: &str = "MIRA_TIMEOUT_SECS";

/// Loads the client configuration from a TOML file plus environment.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the default config file location.
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: MiraPaths::config_file()?,
        })
    }

    /// Uses an explicit config file (e.g. from `--config`).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Defaults < config file < process environment.
    pub fn load(&self) -> Result<ClientConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Same as `load`, reading overrides through `lookup` instead of the process environment.
    pub fn load_with_env<F>(&self, lookup: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, lookup)?;
        Ok(config)
    }

    fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[ConfigService] No config file at {}, using defaults",
                self.path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        tracing::info!("[ConfigService] Loaded config from {}", self.path.display());
        Ok(config)
    }
}

fn apply_env_overrides<F>(config: &mut ClientConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup(ENV_BASE_URL) {
        config.base_url = base_url;
    }
    if let Some(user_id) = lookup(ENV_USER_ID) {
        config.user_id = user_id;
    }
    if let Some(license_id) = lookup(ENV_LICENSE_ID) {
        config.license_id = license_id;
    }
    if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
        config.request_timeout_secs = timeout.trim().parse().map_err(|_| {
            MiraError::config(format!("{} must be a number of seconds, got '{}'", ENV_TIMEOUT_SECS, timeout))
        })?;
    }
    Ok(())
}
