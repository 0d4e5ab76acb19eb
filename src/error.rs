//! Error types for the valet assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Weather service answered with an application-level error
    #[error("weather service error: {0}")]
    WeatherService(String),

    /// A service answered with an unusable payload
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Reminder scheduling error
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// SMTP transport error
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Email address parse error
    #[error("address error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Email message construction error
    #[error("message error: {0}")]
    Mail(#[from] lettre::error::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
