//! Audio input boundary.
//!
//! The recorder in `mira-interaction` drives these traits; the concrete
//! devices live in `mira-infrastructure`.

use crate::error::Result;
use std::path::Path;

/// Container of a finished recording, as announced to the transcription upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Webm,
    Wav,
}

impl AudioFormat {
    /// Guesses the format from a file extension, defaulting to WebM.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("wav") => Self::Wav,
            _ => Self::Webm,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Webm => "recording.webm",
            Self::Wav => "recording.wav",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Webm => "audio/webm",
            Self::Wav => "audio/wav",
        }
    }
}

/// A finished recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

impl RecordedAudio {
    pub fn new(bytes: Vec<u8>, format: AudioFormat) -> Self {
        Self { bytes, format }
    }
}

/// A source of recorded audio.
pub trait AudioDevice: Send + Sync {
    /// Acquires the input device and starts capturing.
    ///
    /// Fails with `MiraError::Permission` when access is denied or no
    /// device is available.
    fn open(&self) -> Result<Box<dyn AudioCapture>>;
}

/// A capture in progress. Dropping it releases the device.
pub trait AudioCapture: Send {
    /// Finalizes the captured audio into a single buffer and releases the device.
    fn finish(self: Box<Self>) -> Result<RecordedAudio>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(AudioFormat::from_path(Path::new("q.WAV")), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_path(Path::new("q.webm")), AudioFormat::Webm);
        assert_eq!(AudioFormat::from_path(Path::new("clip")), AudioFormat::Webm);
        assert_eq!(AudioFormat::Wav.mime(), "audio/wav");
    }
}
