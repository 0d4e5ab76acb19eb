//! Session loop tests
//!
//! The scripted speech surface stands in for the microphone and speaker;
//! the loop must route utterances, skip silence, honor stop words before
//! classification, and drop pending reminders on exit.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as TimeDelta, Local};
use valet::handlers::Dispatcher;
use valet::scheduler::ReminderScheduler;
use valet::session::Session;
use valet::speech::Speech;
use valet::tools::SearchClient;

mod common;
use common::ScriptedSpeech;

fn session(speech: &Arc<ScriptedSpeech>, scheduler: &Arc<ReminderScheduler>) -> Session {
    let surface: Arc<dyn Speech> = Arc::clone(speech) as Arc<dyn Speech>;
    let dispatcher = Arc::new(Dispatcher::with_clients(
        "Ava".to_string(),
        Arc::clone(&surface),
        Arc::clone(scheduler),
        None,
        SearchClient::new(),
        None,
    ));
    Session::new("Ava".to_string(), surface, scheduler.clone(), dispatcher)
}

/// Let spawned handler tasks run to completion
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn routes_utterances_until_stop_word() {
    let speech = Arc::new(ScriptedSpeech::hearing(&["hello", "", "stop"]));
    let scheduler = Arc::new(ReminderScheduler::new());

    session(&speech, &scheduler).run().await;
    settle().await;

    let spoken = speech.spoken();
    assert_eq!(spoken[0], "Hello, Ava starting. Say 'stop' to exit.");
    assert!(
        spoken.contains(&"Hello, I'm Ava. How can I help you?".to_string()),
        "{spoken:?}"
    );
    assert!(spoken.contains(&"Shutting down. Bye.".to_string()), "{spoken:?}");
}

#[tokio::test]
async fn stop_word_beats_ranked_intents() {
    // "stop the timer" would classify as a time request; the stop check
    // runs first and ends the session instead
    let speech = Arc::new(ScriptedSpeech::hearing(&["stop the timer"]));
    let scheduler = Arc::new(ReminderScheduler::new());

    session(&speech, &scheduler).run().await;
    settle().await;

    let spoken = speech.spoken();
    assert!(spoken.contains(&"Shutting down. Bye.".to_string()), "{spoken:?}");
    assert!(
        !spoken.iter().any(|line| line.starts_with("The time is ")),
        "{spoken:?}"
    );
}

#[tokio::test]
async fn silence_keeps_the_loop_quiet() {
    let speech = Arc::new(ScriptedSpeech::hearing(&["", "   ", "exit"]));
    let scheduler = Arc::new(ReminderScheduler::new());

    session(&speech, &scheduler).run().await;
    settle().await;

    // Startup line and goodbye only; silence never reaches a handler
    assert_eq!(
        speech.spoken(),
        vec![
            "Hello, Ava starting. Say 'stop' to exit.",
            "Shutting down. Bye."
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn exit_drops_pending_reminders() {
    let soon = (Local::now() + TimeDelta::minutes(2)).format("%H:%M");
    let reminder = format!("remind me to stretch at {soon}");
    let speech = Arc::new(ScriptedSpeech::hearing(&[reminder.as_str(), "stop"]));
    let scheduler = Arc::new(ReminderScheduler::new());

    session(&speech, &scheduler).run().await;
    settle().await;

    // Well past the reminder's deadline; the callback must never fire
    tokio::time::sleep(Duration::from_secs(600)).await;
    settle().await;

    let spoken = speech.spoken();
    assert!(
        !spoken.iter().any(|line| line.starts_with("Reminder:")),
        "{spoken:?}"
    );
    assert_eq!(scheduler.pending(), 0);
}
