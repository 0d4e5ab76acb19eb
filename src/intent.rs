//! Utterance classification
//!
//! Maps a recognized utterance to a tagged intent with its slot filled.
//! Matching is rank-ordered and first-match-wins; the order is part of the
//! contract because triggers overlap ("what is the weather" matches both
//! the weather and search triggers, and weather must win).

use chrono::{DateTime, Local};

use crate::timeparse;

/// Words that end the session, checked before any intent matching
const STOP_WORDS: [&str; 3] = ["stop", "exit", "quit"];

/// Power state for smart-home requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    On,
    Off,
}

impl std::fmt::Display for Power {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

/// Outcome of reminder slot extraction
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderSlot {
    /// Task plus a resolved future instant
    Scheduled {
        task: String,
        when: DateTime<Local>,
    },
    /// An " at " part was present but not readable as a clock time
    Unparseable,
    /// The utterance had no " at " part
    MissingTime,
}

/// A classified utterance
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Salutation addressed to the assistant
    Greeting,
    /// Ask for the current clock time
    CurrentTime,
    /// Ask for today's date
    CurrentDate,
    /// Weather lookup; an empty city triggers a follow-up prompt
    Weather { city: String },
    /// Set a one-shot reminder
    Reminder(ReminderSlot),
    /// Compose and send an email via a three-turn sub-dialogue
    Email,
    /// Toggle a device; acknowledged with a spoken stub
    SmartHome { power: Power, target: String },
    /// Knowledge lookup
    Search { query: String },
    /// Nothing matched
    Unknown,
}

/// Whether the utterance asks the assistant to shut down
///
/// Checked by the session loop before classification, so a stop word wins
/// over every ranked intent.
#[must_use]
pub fn wants_shutdown(utterance: &str) -> bool {
    STOP_WORDS.iter().any(|word| utterance.contains(word))
}

/// Classify a lower-cased utterance
///
/// `name` is the assistant's display name, matched in greetings like
/// "hey ava". Classification performs no side effects; handlers own all
/// speech and I/O.
#[must_use]
pub fn classify(utterance: &str, name: &str) -> Intent {
    let text = utterance.trim();
    if text.is_empty() {
        return Intent::Unknown;
    }

    let hey_name = format!("hey {}", name.to_lowercase());
    let greetings = ["hello", "hi", hey_name.as_str(), "hey"];
    if greetings.iter().any(|greeting| text.contains(greeting)) {
        return Intent::Greeting;
    }

    if text.contains("time") {
        return Intent::CurrentTime;
    }

    if text.contains("date") {
        return Intent::CurrentDate;
    }

    if text.contains("weather") {
        return Intent::Weather { city: extract_city(text) };
    }

    if text.contains("remind me") {
        return Intent::Reminder(extract_reminder(text));
    }

    if text.starts_with("send email") || text.contains("send an email") {
        return Intent::Email;
    }

    if text.contains("turn on") {
        return Intent::SmartHome {
            power: Power::On,
            target: extract_tail(text, "turn on"),
        };
    }
    if text.contains("turn off") {
        return Intent::SmartHome {
            power: Power::Off,
            target: extract_tail(text, "turn off"),
        };
    }

    if text.contains("search for")
        || text.contains("who is")
        || text.contains("what is")
        || text.starts_with("search")
    {
        return Intent::Search { query: extract_query(text) };
    }

    Intent::Unknown
}

/// City slot: drop the trigger words and keep the rest
///
/// Deliberately naive, matching long-standing behavior: "what's the
/// weather like" extracts "what's the  like".
fn extract_city(text: &str) -> String {
    text.replace("weather in", "")
        .replace("weather", "")
        .trim()
        .to_string()
}

/// Reminder slot: task before the last " at ", clock phrase after it
fn extract_reminder(text: &str) -> ReminderSlot {
    let Some((task_part, time_part)) = text.rsplit_once(" at ") else {
        return ReminderSlot::MissingTime;
    };

    match timeparse::next_occurrence(time_part.trim()) {
        Some(when) => ReminderSlot::Scheduled {
            task: strip_task_prefix(task_part),
            when,
        },
        None => ReminderSlot::Unparseable,
    }
}

/// Strip the leading "remind me to" (or bare "remind me") from a task
fn strip_task_prefix(text: &str) -> String {
    let text = text.trim();
    match text.split_once("remind me to") {
        Some((_, rest)) => rest.trim().to_string(),
        None => text.trim_start_matches("remind me").trim().to_string(),
    }
}

/// Query slot: only the "search for" trigger is removed
fn extract_query(text: &str) -> String {
    text.replace("search for", "").trim().to_string()
}

/// Everything after the first occurrence of `verb`
fn extract_tail(text: &str, verb: &str) -> String {
    text.find(verb)
        .map_or_else(String::new, |pos| text[pos + verb.len()..].trim().to_string())
}
