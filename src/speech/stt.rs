//! Speech-to-text client
//!
//! Uploads recorded WAV audio to an OpenAI-compatible transcription
//! endpoint and returns the recognized text.

use serde::Deserialize;

use crate::{Error, Result};

/// Default transcription endpoint
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Response from the transcription API
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes recorded speech over HTTP
pub struct Transcriber {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl Transcriber {
    /// Create a transcriber against the default endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT.to_string(), api_key, model)
    }

    /// Create a transcriber against a custom endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty.
    pub fn with_endpoint(endpoint: String, api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "speech API key required for transcription".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API answers with a
    /// non-success status.
    pub async fn transcribe(&self, wav_data: Vec<u8>) -> Result<String> {
        tracing::debug!(audio_bytes = wav_data.len(), "starting transcription");

        let part = reqwest::multipart::Part::bytes(wav_data)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Stt(format!("failed to build audio part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("transcription API error {status}: {body}")));
        }

        let result: TranscriptionResponse = response.json().await?;
        tracing::debug!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        assert!(Transcriber::new(String::new(), "whisper-1".to_string()).is_err());
    }

    #[test]
    fn accepts_custom_endpoint() {
        let transcriber = Transcriber::with_endpoint(
            "http://localhost:9000/transcribe".to_string(),
            "key".to_string(),
            "whisper-1".to_string(),
        );
        assert!(transcriber.is_ok());
    }

    #[test]
    fn parses_transcription_response() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"text":"what time is it"}"#).expect("valid payload");
        assert_eq!(parsed.text, "what time is it");
    }
}
