//! Client configuration model.
//!
//! Loading (file, environment, flags) lives in `mira-infrastructure`;
//! this module only defines the shape and the defaults.

use crate::error::{MiraError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_USER_ID: &str = "default_user";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin serving the assistant backend
    pub base_url: String,
    pub user_id: String,
    pub license_id: String,
    /// Per-request timeout applied to every backend call
    pub request_timeout_secs: u64,
    pub reveal: RevealConfig,
    pub audio: AudioConfig,
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            license_id: String::new(),
            request_timeout_secs: 30,
            reveal: RevealConfig::default(),
            audio: AudioConfig::default(),
            log_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Rejects settings the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(MiraError::config("base_url must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(MiraError::config("request_timeout_secs must be greater than 0"));
        }
        if self.reveal.chunk_chars == 0 {
            return Err(MiraError::config("reveal.chunk_chars must be greater than 0"));
        }
        Ok(())
    }
}

/// Resolves a server-relative path (e.g. `/static/images/a.png`) against `base_url`.
///
/// Absolute `http(s)://` URLs are returned untouched.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Progressive reveal cadence.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RevealConfig {
    pub interval_ms: u64,
    pub chunk_chars: usize,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            interval_ms: 15,
            chunk_chars: 3,
        }
    }
}

impl RevealConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AudioConfig {
    /// Clip played back instead of the microphone
    pub clip_path: Option<PathBuf>,
}
