//! Outward service clients
//!
//! Typed clients for the external services intents call into: weather,
//! web lookups, and email submission. Each client owns its endpoint and
//! timeout; handlers translate their results into spoken lines.

pub mod email;
pub mod search;
pub mod weather;

pub use email::Mailer;
pub use search::SearchClient;
pub use weather::{Conditions, WeatherClient};
