//! Microphone input device.
//!
//! Capture runs on a dedicated thread that owns the input stream, since a
//! stream cannot move between threads on every platform. Samples are
//! collected as 16-bit PCM and encoded as WAV when the capture finishes.
//!
//! The device itself needs the `microphone` feature (it links the system
//! audio libraries); WAV encoding is always available.

use mira_core::error::{MiraError, Result};
use std::io::Cursor;

#[cfg(feature = "microphone")]
pub use device::MicrophoneDevice;

/// Encodes interleaved 16-bit samples as a WAV file.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(wav_error)?;
        for &sample in samples {
            writer.write_sample(sample).map_err(wav_error)?;
        }
        writer.finalize().map_err(wav_error)?;
    }
    Ok(cursor.into_inner())
}

fn wav_error(e: hound::Error) -> MiraError {
    MiraError::internal(format!("Failed to encode WAV: {e}"))
}

#[cfg(feature = "microphone")]
mod device {
    use super::encode_wav;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
    use mira_core::audio::{AudioCapture, AudioDevice, AudioFormat, RecordedAudio};
    use mira_core::error::{MiraError, Result};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::thread::JoinHandle;

    type SampleBuffer = Arc<Mutex<Vec<i16>>>;

    /// The host's default input device.
    #[derive(Debug, Default, Clone)]
    pub struct MicrophoneDevice;

    impl MicrophoneDevice {
        pub fn new() -> Self {
            Self
        }
    }

    impl AudioDevice for MicrophoneDevice {
        fn open(&self) -> Result<Box<dyn AudioCapture>> {
            let samples: SampleBuffer = Arc::new(Mutex::new(Vec::new()));
            let (ready_tx, ready_rx) = mpsc::channel::<Result<(u32, u16)>>();
            let (stop_tx, stop_rx) = mpsc::channel::<()>();

            let buffer = samples.clone();
            let worker = std::thread::Builder::new()
                .name("mira-microphone".to_string())
                .spawn(move || {
                    let stream = match start_stream(buffer) {
                        Ok((stream, format)) => {
                            let _ = ready_tx.send(Ok(format));
                            stream
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    // Returns on finish() or when the capture is dropped.
                    let _ = stop_rx.recv();
                    drop(stream);
                })?;

            let (sample_rate, channels) = ready_rx
                .recv()
                .map_err(|_| MiraError::internal("Microphone thread exited before starting"))??;

            tracing::debug!(
                "[Microphone] Capturing at {} Hz, {} channel(s)",
                sample_rate,
                channels
            );
            Ok(Box::new(MicrophoneCapture {
                samples,
                sample_rate,
                channels,
                stop: stop_tx,
                worker,
            }))
        }
    }

    struct MicrophoneCapture {
        samples: SampleBuffer,
        sample_rate: u32,
        channels: u16,
        stop: mpsc::Sender<()>,
        worker: JoinHandle<()>,
    }

    impl AudioCapture for MicrophoneCapture {
        fn finish(self: Box<Self>) -> Result<RecordedAudio> {
            let MicrophoneCapture {
                samples,
                sample_rate,
                channels,
                stop,
                worker,
            } = *self;

            let _ = stop.send(());
            worker
                .join()
                .map_err(|_| MiraError::internal("Microphone thread panicked"))?;

            let samples = std::mem::take(
                &mut *samples
                    .lock()
                    .map_err(|_| MiraError::internal("Microphone buffer poisoned"))?,
            );
            let bytes = encode_wav(&samples, sample_rate, channels)?;
            Ok(RecordedAudio::new(bytes, AudioFormat::Wav))
        }
    }

    fn permission(message: impl std::fmt::Display) -> MiraError {
        MiraError::Permission(message.to_string())
    }

    fn start_stream(buffer: SampleBuffer) -> Result<(Stream, (u32, u16))> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| permission("No microphone available"))?;
        let supported = device
            .default_input_config()
            .map_err(|e| permission(format!("Microphone unavailable: {e}")))?;
        let config: StreamConfig = supported.config();

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, buffer)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, buffer)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, buffer)?,
            other => {
                return Err(permission(format!(
                    "Unsupported microphone sample format {other:?}"
                )));
            }
        };
        stream
            .play()
            .map_err(|e| permission(format!("Failed to start microphone: {e}")))?;

        Ok((stream, (config.sample_rate.0, config.channels)))
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        buffer: SampleBuffer,
    ) -> Result<Stream>
    where
        T: SizedSample,
        i16: FromSample<T>,
    {
        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut samples) = buffer.lock() {
                        samples.extend(data.iter().map(|&s| i16::from_sample(s)));
                    }
                },
                |e| tracing::warn!("[Microphone] Stream error: {}", e),
                None,
            )
            .map_err(|e| permission(format!("Failed to open microphone: {e}")))
    }
}
