//! Text-to-speech client
//!
//! Sends text to an OpenAI-compatible speech endpoint and returns the
//! synthesized MP3 bytes.

use crate::{Error, Result};

/// Default synthesis endpoint
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/audio/speech";

/// Synthesizes speech from text over HTTP
pub struct Synthesizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    voice: String,
}

impl Synthesizer {
    /// Create a synthesizer against the default endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty.
    pub fn new(api_key: String, model: String, voice: String) -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT.to_string(), api_key, model, voice)
    }

    /// Create a synthesizer against a custom endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty.
    pub fn with_endpoint(
        endpoint: String,
        api_key: String,
        model: String,
        voice: String,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "speech API key required for synthesis".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            voice,
        })
    }

    /// Synthesize text, returning MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API answers with a
    /// non-success status.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
        }

        tracing::debug!(chars = text.len(), "starting synthesis");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&SpeechRequest {
                model: &self.model,
                input: text,
                voice: &self.voice,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "synthesis API error");
            return Err(Error::Tts(format!("synthesis API error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        assert!(Synthesizer::new(String::new(), "tts-1".to_string(), "alloy".to_string()).is_err());
    }

    #[test]
    fn accepts_custom_endpoint() {
        let synthesizer = Synthesizer::with_endpoint(
            "http://localhost:9000/speech".to_string(),
            "key".to_string(),
            "tts-1".to_string(),
            "alloy".to_string(),
        );
        assert!(synthesizer.is_ok());
    }
}
