//! Valet - a voice-driven personal assistant
//!
//! Listens continuously on the default microphone, classifies short
//! English utterances into a small fixed set of intents, and answers by
//! speaking and/or performing a side effect (weather lookup, reminder,
//! email, web search).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 Session loop                     │
//! │   listen → stop-word check → spawn handler task  │
//! └───────┬──────────────────────────┬───────────────┘
//!         │                          │
//! ┌───────▼────────┐        ┌────────▼───────────────┐
//! │  Speech stack  │        │  Intent classification │
//! │  mic / STT     │        │  + handlers            │
//! │  TTS / speaker │        │  weather │ reminder    │
//! └────────────────┘        │  email │ search │ ...  │
//!                           └────────┬───────────────┘
//!                                    │
//!                           ┌────────▼───────────────┐
//!                           │  Reminder scheduler    │
//!                           │  (min-heap + timer)    │
//!                           └────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod intent;
pub mod scheduler;
pub mod session;
pub mod speech;
pub mod timeparse;
pub mod tools;

pub use config::AssistantConfig;
pub use error::{Error, Result};
pub use handlers::Dispatcher;
pub use intent::Intent;
pub use scheduler::ReminderScheduler;
pub use session::Session;
pub use speech::{Speech, Voice};
