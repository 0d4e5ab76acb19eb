//! Intent handlers
//!
//! [`Dispatcher`] maps a classified intent to the logic that performs it
//! and speaks the result. Every handler is a boundary: no error escapes to
//! the session loop, and every failure path ends in a spoken line (or
//! deliberate silence for an abandoned follow-up). Line formatting lives in
//! free functions so the exact spoken text is testable without hardware.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use futures::FutureExt;

use crate::Error;
use crate::config::AssistantConfig;
use crate::intent::{self, Intent, Power, ReminderSlot};
use crate::scheduler::{ReminderCallback, ReminderScheduler};
use crate::speech::Speech;
use crate::tools::{Conditions, Mailer, SearchClient, WeatherClient};

/// Routes classified utterances to their handlers
pub struct Dispatcher {
    name: String,
    speech: Arc<dyn Speech>,
    scheduler: Arc<ReminderScheduler>,
    weather: Option<WeatherClient>,
    search: SearchClient,
    mailer: Option<Mailer>,
}

impl Dispatcher {
    /// Build a dispatcher from the assistant configuration
    ///
    /// Intents whose configuration is missing (weather key, email
    /// credentials) stay routable but answer with a spoken notice.
    #[must_use]
    pub fn new(
        config: &AssistantConfig,
        speech: Arc<dyn Speech>,
        scheduler: Arc<ReminderScheduler>,
    ) -> Self {
        Self::with_clients(
            config.name.clone(),
            speech,
            scheduler,
            config.owm_api_key.clone().map(WeatherClient::new),
            SearchClient::new(),
            Mailer::from_config(&config.email),
        )
    }

    /// Build a dispatcher with explicit service clients
    #[must_use]
    pub fn with_clients(
        name: String,
        speech: Arc<dyn Speech>,
        scheduler: Arc<ReminderScheduler>,
        weather: Option<WeatherClient>,
        search: SearchClient,
        mailer: Option<Mailer>,
    ) -> Self {
        Self {
            name,
            speech,
            scheduler,
            weather,
            search,
            mailer,
        }
    }

    /// Classify one utterance and run its handler
    ///
    /// An empty utterance is a no-op: no speech, no side effect.
    pub async fn handle(&self, utterance: &str) {
        if utterance.trim().is_empty() {
            return;
        }

        let intent = intent::classify(utterance, &self.name);
        tracing::debug!(utterance, ?intent, "dispatching");

        match intent {
            Intent::Greeting => {
                self.speak(&format!("Hello, I'm {}. How can I help you?", self.name))
                    .await;
            }
            Intent::CurrentTime => self.speak(&time_line(Local::now().naive_local())).await,
            Intent::CurrentDate => self.speak(&date_line(Local::now().naive_local())).await,
            Intent::Weather { city } => self.handle_weather(city).await,
            Intent::Reminder(slot) => self.handle_reminder(slot).await,
            Intent::Email => self.handle_email().await,
            Intent::SmartHome { power, target } => self.handle_smart_home(power, &target).await,
            Intent::Search { query } => self.handle_search(query).await,
            Intent::Unknown => {
                self.speak(
                    "Sorry, I didn't understand. Try 'time', 'weather in <city>', \
                     'remind me to ... at ...', or 'search for ...'.",
                )
                .await;
            }
        }
    }

    async fn handle_weather(&self, city: String) {
        let Some(city) = self.require_slot(city, "Which city?").await else {
            return;
        };

        let Some(client) = &self.weather else {
            self.speak("Weather API key not configured. Put OWM_API_KEY in .env.")
                .await;
            return;
        };

        match client.current(&city).await {
            Ok(conditions) => self.speak(&weather_line(&city, &conditions)).await,
            Err(Error::WeatherService(message)) => {
                self.speak(&format!("Weather service error: {message}")).await;
            }
            Err(e) => {
                tracing::warn!(city = %city, error = %e, "weather lookup failed");
                self.speak("Failed to fetch weather.").await;
            }
        }
    }

    async fn handle_reminder(&self, slot: ReminderSlot) {
        match slot {
            ReminderSlot::Scheduled { task, when } => {
                let speech = Arc::clone(&self.speech);
                let line = format!("Reminder: {task}");
                let callback: ReminderCallback =
                    Box::new(move || async move { speech.speak(&line).await }.boxed());

                match self.scheduler.schedule(when, task.clone(), callback) {
                    Ok(_) => {
                        self.speak(&reminder_confirmation(&task, when.naive_local()))
                            .await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to schedule reminder");
                        self.speak("Failed to set reminder.").await;
                    }
                }
            }
            ReminderSlot::Unparseable => {
                self.speak(
                    "Sorry, I couldn't parse the time. Say like 'remind me to call mom \
                     at 18:30' or 'at 6 pm'.",
                )
                .await;
            }
            ReminderSlot::MissingTime => {
                self.speak("Tell me when to remind you, for example 'remind me to X at 6 pm'.")
                    .await;
            }
        }
    }

    async fn handle_email(&self) {
        let Some(mailer) = &self.mailer else {
            self.speak("Email config not set in environment.").await;
            return;
        };

        // Empty answers are accepted as-is; the relay decides what it takes
        let to = self
            .ask("Who should I send the email to? Provide email address.")
            .await;
        let subject = self.ask("What is the subject?").await;
        let body = self.ask("What is the message?").await;

        match mailer.send(&to, &subject, &body).await {
            Ok(()) => self.speak("Email sent.").await,
            Err(e) => {
                tracing::error!(error = %e, "email submission failed");
                self.speak("Failed to send email. Check configuration.").await;
            }
        }
    }

    async fn handle_smart_home(&self, power: Power, target: &str) {
        tracing::info!(%power, target, "smart home request");
        self.speak(
            "Smart home: request received. (This is a placeholder; integrate your \
             device API here.)",
        )
        .await;
    }

    async fn handle_search(&self, query: String) {
        let Some(query) = self
            .require_slot(query, "What would you like me to search for?")
            .await
        else {
            return;
        };

        self.speak("Searching.").await;

        match self.search.instant_answer(&query).await {
            Ok(Some(answer)) => self.speak(&answer).await,
            Ok(None) => match self.search.wikipedia_summary(&query).await {
                Ok(Some(summary)) => self.speak(&summary).await,
                Ok(None) => self.speak("No concise answer found.").await,
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "wikipedia fallback failed");
                    self.speak("No concise answer found.").await;
                }
            },
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "instant answer lookup failed");
                self.speak("Search error.").await;
            }
        }
    }

    /// Use the slot if filled, otherwise prompt once for it
    ///
    /// Gives up silently when the follow-up answer is also empty.
    async fn require_slot(&self, slot: String, prompt: &str) -> Option<String> {
        let slot = slot.trim().to_string();
        if !slot.is_empty() {
            return Some(slot);
        }

        let answer = self.ask(prompt).await;
        if answer.is_empty() {
            tracing::debug!(prompt, "follow-up went unanswered");
            None
        } else {
            Some(answer)
        }
    }

    /// One prompt-then-listen sub-dialogue turn
    async fn ask(&self, prompt: &str) -> String {
        self.speech.speak(prompt).await;
        self.speech.listen().await.trim().to_string()
    }

    async fn speak(&self, text: &str) {
        self.speech.speak(text).await;
    }
}

/// Spoken line for the current clock time
#[must_use]
pub fn time_line(now: NaiveDateTime) -> String {
    now.format("The time is %I:%M %p.").to_string()
}

/// Spoken line for today's date
#[must_use]
pub fn date_line(now: NaiveDateTime) -> String {
    now.format("Today is %A, %B %d, %Y.").to_string()
}

/// Spoken line for current weather conditions
#[must_use]
pub fn weather_line(city: &str, conditions: &Conditions) -> String {
    format!(
        "{}: {}. Temperature {}°C.",
        capitalize_first(city),
        conditions.description,
        conditions.temp
    )
}

/// Spoken confirmation for a scheduled reminder, 12-hour clock
#[must_use]
pub fn reminder_confirmation(task: &str, when: NaiveDateTime) -> String {
    format!(
        "Okay, I will remind you to {task} at {}.",
        when.format("%I:%M %p")
    )
}

/// Upper-case the first character, leaving the rest untouched
fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
