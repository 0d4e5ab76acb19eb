//! Speech input and output
//!
//! [`Voice`] couples the microphone, endpointer, recognizer, synthesizer,
//! and speaker behind the [`Speech`] trait so the rest of the crate (and
//! its tests) can talk and listen without caring about audio hardware.
//!
//! Both directions are serialized: one utterance is recorded at a time and
//! one line is spoken at a time. The mutexes are fair, so a handler
//! sub-dialogue and the session loop alternate microphone turns in arrival
//! order.

mod capture;
mod endpoint;
mod playback;
mod stt;
mod tts;

pub use capture::{Microphone, RecordLimits, SAMPLE_RATE, samples_to_wav};
pub use endpoint::{Endpoint, UtteranceDetector};
pub use playback::Speaker;
pub use stt::Transcriber;
pub use tts::Synthesizer;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::SpeechConfig;
use crate::{Error, Result};

/// Spoken notice when the recognizer is unreachable
const NETWORK_NOTICE: &str = "Network problem when trying to recognize speech.";

/// Spoken conversation surface
///
/// `listen` returns a lower-cased transcript, or an empty string when
/// nothing usable was heard. Neither operation surfaces an error; failures
/// are logged and reduced to silence.
#[async_trait]
pub trait Speech: Send + Sync {
    /// Speak a line aloud, blocking until playback completes
    async fn speak(&self, text: &str);

    /// Record and transcribe one utterance
    async fn listen(&self) -> String;
}

/// Live speech stack talking to real audio devices
pub struct Voice {
    mic: Arc<Microphone>,
    speaker: Arc<Speaker>,
    transcriber: Transcriber,
    synthesizer: Synthesizer,
    limits: RecordLimits,
    /// One microphone turn at a time
    mic_serial: Mutex<()>,
    /// One spoken line at a time, so two voices never overlap
    speak_serial: Mutex<()>,
}

impl Voice {
    /// Bring up the speech stack
    ///
    /// Probes both audio devices and validates the API configuration, so a
    /// misconfigured stack fails at startup rather than mid-conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if either audio device is unavailable or the API
    /// key is missing.
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let mic = Arc::new(Microphone::open()?);
        let speaker = Arc::new(Speaker::open()?);
        let transcriber =
            Transcriber::new(config.api_key.clone(), config.stt_model.clone())?;
        let synthesizer = Synthesizer::new(
            config.api_key.clone(),
            config.tts_model.clone(),
            config.tts_voice.clone(),
        )?;

        Ok(Self {
            mic,
            speaker,
            transcriber,
            synthesizer,
            limits: RecordLimits {
                onset_timeout: Duration::from_secs(config.listen_timeout_secs),
                phrase_limit: Duration::from_secs(config.phrase_time_limit_secs),
            },
            mic_serial: Mutex::new(()),
            speak_serial: Mutex::new(()),
        })
    }
}

#[async_trait]
impl Speech for Voice {
    async fn speak(&self, text: &str) {
        let _turn = self.speak_serial.lock().await;
        println!("Assistant: {text}");
        tracing::debug!(text, "speaking");

        let audio = match self.synthesizer.synthesize(text).await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis failed");
                return;
            }
        };

        let speaker = Arc::clone(&self.speaker);
        match tokio::task::spawn_blocking(move || speaker.play_mp3(&audio)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "audio playback failed"),
            Err(e) => tracing::warn!(error = %e, "playback task failed"),
        }
    }

    async fn listen(&self) -> String {
        let _turn = self.mic_serial.lock().await;

        let mic = Arc::clone(&self.mic);
        let limits = self.limits;
        let recorded = tokio::task::spawn_blocking(move || mic.record_utterance(limits)).await;

        let samples = match recorded {
            Ok(Ok(Some(samples))) => samples,
            // Silence until the onset timeout
            Ok(Ok(None)) => return String::new(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "utterance capture failed");
                return String::new();
            }
            Err(e) => {
                tracing::warn!(error = %e, "capture task failed");
                return String::new();
            }
        };

        let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::warn!(error = %e, "WAV encoding failed");
                return String::new();
            }
        };

        match self.transcriber.transcribe(wav).await {
            Ok(text) => {
                let text = text.trim().to_lowercase();
                if text.is_empty() {
                    tracing::debug!("transcription came back empty");
                } else {
                    tracing::info!(heard = %text, "utterance recognized");
                }
                text
            }
            Err(Error::Http(e)) if e.is_connect() => {
                // The recognizer is unreachable rather than merely slow;
                // tell the user instead of silently looping
                tracing::warn!(error = %e, "recognizer unreachable");
                self.speak(NETWORK_NOTICE).await;
                String::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                String::new()
            }
        }
    }
}
