//! Utterance endpointing
//!
//! Energy-based voice activity detection over a live sample stream: wait
//! for speech onset, accumulate until a trailing silence window closes the
//! utterance. The detection threshold is calibrated against ambient noise
//! sampled just before listening, with a floor for quiet rooms.

use std::time::Duration;

use crate::speech::capture::SAMPLE_RATE;

/// Energy floor used when the room is effectively silent
const MIN_ENERGY_THRESHOLD: f32 = 0.03;

/// Headroom multiplier applied to the calibrated ambient level
const AMBIENT_HEADROOM: f32 = 2.0;

/// Minimum accumulated speech for a segment to count (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that closes an utterance (0.5s at 16kHz)
const TRAILING_SILENCE_SAMPLES: usize = 8000;

/// Detector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for speech onset
    Waiting,
    /// Speech in progress, accumulating samples
    Capturing,
}

/// Result of feeding a chunk to the detector
#[derive(Debug)]
pub enum Endpoint {
    /// Utterance still open
    Pending,
    /// Utterance closed by trailing silence; contains all samples since
    /// onset, trailing silence included
    Complete(Vec<f32>),
}

/// Segments a single utterance out of a live sample stream
pub struct UtteranceDetector {
    threshold: f32,
    state: State,
    speech: Vec<f32>,
    trailing_silence: usize,
}

impl UtteranceDetector {
    /// Create a detector with its threshold raised above ambient noise
    #[must_use]
    pub fn calibrated(ambient: &[f32]) -> Self {
        let threshold = (rms_energy(ambient) * AMBIENT_HEADROOM).max(MIN_ENERGY_THRESHOLD);
        tracing::debug!(threshold, "utterance detector calibrated");
        Self {
            threshold,
            state: State::Waiting,
            speech: Vec::new(),
            trailing_silence: 0,
        }
    }

    /// Feed a chunk of samples, advancing the state machine
    pub fn feed(&mut self, samples: &[f32]) -> Endpoint {
        if samples.is_empty() {
            return Endpoint::Pending;
        }
        let is_speech = rms_energy(samples) > self.threshold;

        match self.state {
            State::Waiting => {
                if is_speech {
                    tracing::trace!("speech onset");
                    self.state = State::Capturing;
                    self.speech.extend_from_slice(samples);
                    self.trailing_silence = 0;
                }
            }
            State::Capturing => {
                self.speech.extend_from_slice(samples);
                if is_speech {
                    self.trailing_silence = 0;
                } else {
                    self.trailing_silence += samples.len();
                }

                if self.trailing_silence > TRAILING_SILENCE_SAMPLES
                    && self.speech.len() > MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(samples = self.speech.len(), "utterance complete");
                    return Endpoint::Complete(self.take_speech());
                }
            }
        }

        Endpoint::Pending
    }

    /// Whether speech onset has been seen
    #[must_use]
    pub fn speech_started(&self) -> bool {
        self.state == State::Capturing
    }

    /// Wall-clock length of the speech captured so far
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn speech_duration(&self) -> Duration {
        Duration::from_secs_f64(self.speech.len() as f64 / f64::from(SAMPLE_RATE))
    }

    /// Take the captured speech, resetting the detector
    pub fn take_speech(&mut self) -> Vec<f32> {
        self.state = State::Waiting;
        self.trailing_silence = 0;
        std::mem::take(&mut self.speech)
    }
}

/// RMS energy of a sample block
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
