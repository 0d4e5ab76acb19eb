//! Current weather via OpenWeatherMap

use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Default OpenWeatherMap current-weather endpoint
const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Request timeout for weather lookups
const TIMEOUT: Duration = Duration::from_secs(8);

/// Current conditions for one city
#[derive(Debug, Clone, PartialEq)]
pub struct Conditions {
    /// Short description, e.g. "haze"
    pub description: String,
    /// Temperature in degrees Celsius
    pub temp: f64,
}

/// Successful response payload
///
/// Only parsed after the `cod` envelope check passes, so missing fields
/// here indicate a malformed answer rather than an application error.
#[derive(Debug, Deserialize)]
struct WeatherReport {
    main: ReportMain,
    weather: Vec<ReportEntry>,
}

#[derive(Debug, Deserialize)]
struct ReportMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ReportEntry {
    description: String,
}

/// Fetches current conditions for a city
pub struct WeatherClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl WeatherClient {
    /// Create a client with the given API key
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT.to_string(), api_key)
    }

    /// Create a client against a custom endpoint
    #[must_use]
    pub fn with_endpoint(endpoint: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    /// Fetch current conditions for `city`
    ///
    /// # Errors
    ///
    /// Returns [`Error::WeatherService`] when the service answers with an
    /// application-level error (`cod != 200`), and transport or payload
    /// errors otherwise.
    pub async fn current(&self, city: &str) -> Result<Conditions> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .timeout(TIMEOUT)
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;
        parse_conditions(body)
    }
}

/// Check the response envelope and extract the fields we speak
///
/// `cod` is a number on success but a string on errors, so it is checked
/// loosely before the payload is parsed strictly.
fn parse_conditions(body: serde_json::Value) -> Result<Conditions> {
    if body.get("cod").and_then(serde_json::Value::as_i64) != Some(200) {
        let message = body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        return Err(Error::WeatherService(message));
    }

    let report: WeatherReport = serde_json::from_value(body)?;
    let description = report
        .weather
        .into_iter()
        .next()
        .map(|entry| entry.description)
        .ok_or_else(|| Error::UnexpectedResponse("weather list is empty".to_string()))?;

    Ok(Conditions {
        description,
        temp: report.main.temp,
    })
}
