//! Audio playback to speakers
//!
//! Plays synthesized MP3 speech on the default output device. Like
//! capture, the device is probed once at startup and re-opened per play
//! call so the non-`Send` stream stays on the calling thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Plays synthesized speech on the default output device
pub struct Speaker {
    config: StreamConfig,
}

impl Speaker {
    /// Probe the default output device, preferring mono at 24kHz
    ///
    /// # Errors
    ///
    /// Returns an error if no output device is available or no usable
    /// config exists.
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let mut configs: Vec<_> = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(format!("failed to query output configs: {e}")))?
            .filter(|c| {
                c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .collect();
        // Prefer mono so samples map 1:1; fall back to fewer channels first
        configs.sort_by_key(cpal::SupportedStreamConfigRange::channels);

        let supported = configs
            .into_iter()
            .next()
            .ok_or_else(|| Error::Audio("no 24kHz output config found".to_string()))?;
        let config = supported
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            channels = config.channels,
            "speaker ready"
        );
        Ok(Self { config })
    }

    /// Decode MP3 audio and play it, blocking until finished
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the output stream cannot be
    /// opened.
    pub fn play_mp3(&self, mp3_data: &[u8]) -> Result<()> {
        let samples = decode_mp3(mp3_data)?;
        self.play(&samples)
    }

    /// Play mono f32 samples, blocking until finished
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be opened.
    pub fn play(&self, samples: &[f32]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("output device disappeared".to_string()))?;

        let channels = usize::from(self.config.channels);
        let source = Arc::new(samples.to_vec());
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let cb_source = Arc::clone(&source);
        let cb_position = Arc::clone(&position);
        let cb_finished = Arc::clone(&finished);

        let stream = device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = cb_position.load(Ordering::Relaxed);
                    for frame in data.chunks_mut(channels) {
                        let sample = if pos < cb_source.len() {
                            let s = cb_source[pos];
                            pos += 1;
                            s
                        } else {
                            cb_finished.store(true, Ordering::Relaxed);
                            0.0
                        };
                        // Duplicate the mono sample across all channels
                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                    }
                    cb_position.store(pos, Ordering::Relaxed);
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(format!("failed to build output stream: {e}")))?;
        stream
            .play()
            .map_err(|e| Error::Audio(format!("failed to start playback: {e}")))?;

        let duration_ms = (source.len() as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
        let timeout = Duration::from_millis(duration_ms + 500);
        let started = Instant::now();
        while !finished.load(Ordering::Relaxed) {
            if started.elapsed() > timeout {
                tracing::warn!("playback timed out waiting for completion");
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        // Give the device a moment to drain its last buffer
        std::thread::sleep(Duration::from_millis(100));
        drop(stream);

        tracing::debug!(samples = source.len(), "playback complete");
        Ok(())
    }
}

/// Decode MP3 bytes to mono f32 samples
///
/// Stereo frames are averaged down to mono.
fn decode_mp3(data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(data);
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 2 {
                    for pair in frame.data.chunks(2) {
                        let left = f32::from(pair[0]) / 32768.0;
                        let right = f32::from(*pair.get(1).unwrap_or(&pair[0])) / 32768.0;
                        samples.push(f32::midpoint(left, right));
                    }
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}
