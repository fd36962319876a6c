//! File-backed audio input device.
//!
//! Plays back a prepared clip instead of the microphone: opening the device
//! reads the file at `audio.clip_path` and finishing the capture hands its
//! bytes to the transcription upload. Used for scripted sessions and on
//! builds without the `microphone` feature.

use mira_core::audio::{AudioCapture, AudioDevice, AudioFormat, RecordedAudio};
use mira_core::error::{MiraError, Result};
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileAudioDevice {
    clip_path: Option<PathBuf>,
}

impl FileAudioDevice {
    pub fn new(clip_path: Option<PathBuf>) -> Self {
        Self { clip_path }
    }
}

impl AudioDevice for FileAudioDevice {
    fn open(&self) -> Result<Box<dyn AudioCapture>> {
        let Some(path) = &self.clip_path else {
            return Err(MiraError::Permission(
                "No microphone available and no audio.clip_path configured".to_string(),
            ));
        };

        let buffer = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MiraError::Permission(format!(
                "No audio input device at {}",
                path.display()
            )),
            _ => MiraError::from(e),
        })?;

        tracing::debug!(
            "[AudioDevice] Opened {} ({} bytes)",
            path.display(),
            buffer.len()
        );
        Ok(Box::new(FileCapture {
            audio: RecordedAudio::new(buffer, AudioFormat::from_path(path)),
        }))
    }
}

struct FileCapture {
    audio: RecordedAudio,
}

impl AudioCapture for FileCapture {
    fn finish(self: Box<Self>) -> Result<RecordedAudio> {
        Ok(self.audio)
    }
}
