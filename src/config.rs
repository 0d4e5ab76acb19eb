//! Configuration management for the assistant
//!
//! All settings come from the process environment; the binary loads an
//! optional `.env` file before parsing. Configuration is read once at
//! startup and immutable afterwards.

use secrecy::SecretString;

use crate::{Error, Result};

/// Default assistant display name
const DEFAULT_NAME: &str = "Ava";

/// Default SMTP relay host
const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";

/// Default SMTP submission port (STARTTLS)
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default seconds to wait for speech onset
const DEFAULT_LISTEN_TIMEOUT_SECS: u64 = 5;

/// Default cap on a single utterance, in seconds
const DEFAULT_PHRASE_TIME_LIMIT_SECS: u64 = 8;

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Display name, used in greetings and the `hey <name>` trigger
    pub name: String,

    /// OpenWeatherMap API key; weather lookups are disabled without it
    pub owm_api_key: Option<String>,

    /// Outgoing email settings
    pub email: EmailConfig,

    /// Speech stack settings
    pub speech: SpeechConfig,
}

/// Outgoing email (SMTP submission) settings
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP relay host
    pub server: String,

    /// SMTP submission port
    pub port: u16,

    /// Sender address, also used as the AUTH username
    pub address: Option<String>,

    /// AUTH password (an app password for most providers)
    pub password: Option<SecretString>,
}

/// Speech recognition and synthesis settings
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// API key for the speech endpoints
    pub api_key: String,

    /// Transcription model
    pub stt_model: String,

    /// Synthesis model
    pub tts_model: String,

    /// Synthesis voice identifier
    pub tts_voice: String,

    /// Seconds to wait for speech onset before giving up
    pub listen_timeout_secs: u64,

    /// Hard cap on a single utterance, in seconds
    pub phrase_time_limit_secs: u64,
}

impl AssistantConfig {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is missing, or if a numeric
    /// variable (`SMTP_PORT`, listen tuning) is set but unparseable.
    pub fn from_env() -> Result<Self> {
        let name =
            std::env::var("ASSISTANT_NAME").unwrap_or_else(|_| DEFAULT_NAME.to_string());

        let owm_api_key = std::env::var("OWM_API_KEY").ok().filter(|k| !k.is_empty());

        let email = EmailConfig {
            server: std::env::var("SMTP_SERVER")
                .unwrap_or_else(|_| DEFAULT_SMTP_SERVER.to_string()),
            port: parse_env("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            address: std::env::var("EMAIL_ADDRESS").ok().filter(|v| !v.is_empty()),
            password: std::env::var("EMAIL_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty())
                .map(SecretString::from),
        };

        let speech = SpeechConfig {
            api_key: std::env::var("OPENAI_API_KEY").map_err(|_| {
                Error::Config("OPENAI_API_KEY is required for the speech stack".to_string())
            })?,
            stt_model: std::env::var("STT_MODEL").unwrap_or_else(|_| "whisper-1".to_string()),
            tts_model: std::env::var("TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            tts_voice: std::env::var("TTS_VOICE").unwrap_or_else(|_| "alloy".to_string()),
            listen_timeout_secs: parse_env("LISTEN_TIMEOUT_SECS", DEFAULT_LISTEN_TIMEOUT_SECS)?,
            phrase_time_limit_secs: parse_env(
                "PHRASE_TIME_LIMIT_SECS",
                DEFAULT_PHRASE_TIME_LIMIT_SECS,
            )?,
        };

        Ok(Self { name, owm_api_key, email, speech })
    }
}

impl EmailConfig {
    /// Whether both credentials needed for sending are present
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.address.is_some() && self.password.is_some()
    }
}

/// Parse a numeric environment variable, erroring when set but invalid
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{name}: {e}"))),
        Err(_) => Ok(default),
    }
}
