pub mod audio_device;
pub mod config_service;
pub mod http_client;
pub mod microphone;
pub mod paths;
pub mod tab_state_repository;

pub use crate::audio_device::FileAudioDevice;
pub use crate::config_service::ConfigService;
pub use crate::http_client::HttpAssistantClient;
#[cfg(feature = "microphone")]
pub use crate::microphone::MicrophoneDevice;
pub use crate::paths::MiraPaths;
pub use crate::tab_state_repository::{TabStateRepository, TabStateStore};
