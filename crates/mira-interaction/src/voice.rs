//! Voice capture.
//!
//! The recorder is a two-state machine, idle and recording. Starting
//! acquires the audio device and, when a tick callback is set, runs a
//! once-per-second elapsed-time counter until the recording stops.

use mira_core::audio::{AudioCapture, AudioDevice, RecordedAudio};
use mira_core::error::Result;
use std::sync::Arc;
use std::time::Duration;
use strum::Display;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RecorderState {
    Idle,
    Recording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A recording was already running; nothing changed.
    AlreadyRecording,
}

/// Receives the formatted elapsed time once per second.
pub type TickCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Formats an elapsed duration as zero-padded `mm:ss`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub struct VoiceRecorder {
    device: Arc<dyn AudioDevice>,
    capture: Option<Box<dyn AudioCapture>>,
    started_at: Option<Instant>,
    ticker: Option<CancellationToken>,
    on_tick: Option<TickCallback>,
}

impl VoiceRecorder {
    pub fn new(device: Arc<dyn AudioDevice>) -> Self {
        Self {
            device,
            capture: None,
            started_at: None,
            ticker: None,
            on_tick: None,
        }
    }

    pub fn with_ticker(mut self, on_tick: TickCallback) -> Self {
        self.on_tick = Some(on_tick);
        self
    }

    pub fn state(&self) -> RecorderState {
        if self.capture.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    /// Time since recording started; zero while idle.
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    /// Acquires the device and starts recording.
    ///
    /// # Errors
    ///
    /// Returns `MiraError::Permission` when the device is denied or missing;
    /// the recorder stays idle.
    pub fn start(&mut self) -> Result<StartOutcome> {
        if self.capture.is_some() {
            tracing::debug!("[Voice] Already recording, ignoring start");
            return Ok(StartOutcome::AlreadyRecording);
        }

        let capture = self.device.open()?;
        let started_at = Instant::now();
        self.capture = Some(capture);
        self.started_at = Some(started_at);

        if let Some(on_tick) = self.on_tick.clone() {
            let cancel = CancellationToken::new();
            tokio::spawn(run_ticker(started_at, on_tick, cancel.clone()));
            self.ticker = Some(cancel);
        }

        tracing::info!("[Voice] Recording started");
        Ok(StartOutcome::Started)
    }

    /// Stops recording and returns the captured audio.
    ///
    /// Returns `Ok(None)` when no recording was running. The device is
    /// released even if finalizing fails.
    pub fn stop(&mut self) -> Result<Option<RecordedAudio>> {
        let Some(capture) = self.capture.take() else {
            return Ok(None);
        };
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        let elapsed = self.elapsed();
        self.started_at = None;

        let audio = capture.finish()?;
        tracing::info!(
            "[Voice] Recording stopped after {} ({} bytes, {:?})",
            format_elapsed(elapsed),
            audio.bytes.len(),
            audio.format
        );
        Ok(Some(audio))
    }
}

async fn run_ticker(started_at: Instant, on_tick: TickCallback, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => on_tick(&format_elapsed(started_at.elapsed())),
        }
    }
}
