//! Path management for mira configuration files.
//!
//! ```text
//! ~/.config/mira/              # Config directory
//! ├── config.toml              # Client configuration
//! └── logs/                    # Application logs
//!     └── mira.log.YYYY-MM-DD
//! ```

use mira_core::config::ClientConfig;
use mira_core::error::{MiraError, Result};
use std::path::PathBuf;

const APP_DIR: &str = "mira";

pub struct MiraPaths;

impl MiraPaths {
    /// Returns the mira configuration directory (e.g. `~/.config/mira/`).
    ///
    /// # Errors
    ///
    /// Returns `MiraError::Config` when the platform config directory cannot be determined.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| MiraError::config("Cannot find config directory"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Log directory: `log_dir` from the config when set, otherwise `<config_dir>/logs`.
    pub fn logs_dir(config: &ClientConfig) -> Result<PathBuf> {
        match &config.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("logs")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_is_inside_config_dir() {
        if let (Ok(dir), Ok(file)) = (MiraPaths::config_dir(), MiraPaths::config_file()) {
            assert!(dir.ends_with(APP_DIR));
            assert_eq!(file, dir.join("config.toml"));
        }
    }

    #[test]
    fn test_logs_dir_prefers_configured_dir() {
        let config = ClientConfig {
            log_dir: Some(PathBuf::from("/tmp/mira-logs")),
            ..ClientConfig::default()
        };
        assert_eq!(
            MiraPaths::logs_dir(&config).unwrap(),
            PathBuf::from("/tmp/mira-logs")
        );
    }
}
