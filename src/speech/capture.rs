//! Microphone capture
//!
//! Records one utterance at a time from the default input device. The
//! device is probed once at startup so a missing microphone fails fast;
//! each recording re-opens it, because cpal streams cannot cross threads.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::speech::endpoint::{Endpoint, UtteranceDetector};
use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Ambient noise sampling window before listening starts
const CALIBRATION: Duration = Duration::from_millis(500);

/// Poll cadence while recording
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Limits applied to a single recording
#[derive(Debug, Clone, Copy)]
pub struct RecordLimits {
    /// Give up when no speech starts within this window
    pub onset_timeout: Duration,
    /// Hard cap on utterance length once speech has started
    pub phrase_limit: Duration,
}

/// Captures utterances from the default input device
pub struct Microphone {
    config: StreamConfig,
}

impl Microphone {
    /// Probe the default input device for 16kHz mono capture
    ///
    /// # Errors
    ///
    /// Returns an error if no input device is available or none supports
    /// mono capture at 16kHz.
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(format!("failed to query input configs: {e}")))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no mono 16kHz input config found".to_string()))?;

        let config = supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config();
        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone ready"
        );
        Ok(Self { config })
    }

    /// Record a single utterance, blocking until it completes
    ///
    /// Samples ambient noise for half a second to calibrate the endpoint
    /// detector, then waits for speech. Returns `None` when no speech
    /// starts within the onset timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture stream cannot be opened.
    pub fn record_utterance(&self, limits: RecordLimits) -> Result<Option<Vec<f32>>> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("input device disappeared".to_string()))?;

        let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let sink = Arc::clone(&buffer);

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = sink.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(format!("failed to build input stream: {e}")))?;
        stream
            .play()
            .map_err(|e| Error::Audio(format!("failed to start capture: {e}")))?;

        std::thread::sleep(CALIBRATION);
        let ambient = take_samples(&buffer);
        let mut detector = UtteranceDetector::calibrated(&ambient);

        let started = Instant::now();
        let outcome = loop {
            std::thread::sleep(POLL_INTERVAL);
            let chunk = take_samples(&buffer);

            if let Endpoint::Complete(samples) = detector.feed(&chunk) {
                break Some(samples);
            }

            if detector.speech_started() {
                if detector.speech_duration() >= limits.phrase_limit {
                    tracing::debug!("phrase limit reached");
                    break Some(detector.take_speech());
                }
            } else if started.elapsed() >= limits.onset_timeout {
                tracing::debug!("no speech within onset timeout");
                break None;
            }
        };

        drop(stream);
        Ok(outcome)
    }

    /// Capture raw audio for `duration`, reporting per-second levels
    ///
    /// Used by the microphone diagnostic; `on_second` receives the elapsed
    /// second count, RMS level, and peak level of that second's samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture stream cannot be opened.
    pub fn monitor<F>(&self, duration: Duration, mut on_second: F) -> Result<()>
    where
        F: FnMut(u64, f32, f32),
    {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("input device disappeared".to_string()))?;

        let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let sink = Arc::clone(&buffer);

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = sink.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(format!("failed to build input stream: {e}")))?;
        stream
            .play()
            .map_err(|e| Error::Audio(format!("failed to start capture: {e}")))?;

        let seconds = duration.as_secs().max(1);
        for elapsed in 1..=seconds {
            std::thread::sleep(Duration::from_secs(1));
            let chunk = take_samples(&buffer);
            let rms = rms_level(&chunk);
            let peak = chunk.iter().fold(0.0_f32, |max, s| max.max(s.abs()));
            on_second(elapsed, rms, peak);
        }

        drop(stream);
        Ok(())
    }
}

/// Drain the shared capture buffer
fn take_samples(buffer: &Arc<Mutex<Vec<f32>>>) -> Vec<f32> {
    buffer
        .lock()
        .map(|mut buf| std::mem::take(&mut *buf))
        .unwrap_or_default()
}

#[allow(clippy::cast_precision_loss)]
fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Encode f32 samples as a 16-bit PCM mono WAV file in memory
///
/// # Errors
///
/// Returns an error if WAV encoding fails.
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Audio(format!("failed to create WAV writer: {e}")))?;
        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(value)
                .map_err(|e| Error::Audio(format!("failed to write WAV sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| Error::Audio(format!("failed to finalize WAV: {e}")))?;
    }

    Ok(cursor.into_inner())
}
