//! End-to-end reminder tests under virtual time
//!
//! A reminder spoken to the dispatcher must fire its callback exactly once
//! at the parsed wall-clock instant, speaking through the same surface the
//! session uses.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as TimeDelta, Local};
use valet::handlers::Dispatcher;
use valet::scheduler::ReminderScheduler;
use valet::speech::Speech;
use valet::tools::SearchClient;

mod common;
use common::ScriptedSpeech;

fn dispatcher(speech: &Arc<ScriptedSpeech>, scheduler: &Arc<ReminderScheduler>) -> Dispatcher {
    let surface: Arc<dyn Speech> = Arc::clone(speech) as Arc<dyn Speech>;
    Dispatcher::with_clients(
        "Ava".to_string(),
        surface,
        Arc::clone(scheduler),
        None,
        SearchClient::new(),
        None,
    )
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn reminder_fires_exactly_once_at_its_instant() {
    let speech = Arc::new(ScriptedSpeech::silent());
    let scheduler = Arc::new(ReminderScheduler::new());

    let soon = (Local::now() + TimeDelta::minutes(2)).format("%H:%M");
    dispatcher(&speech, &scheduler)
        .handle(&format!("remind me to call mom at {soon}"))
        .await;
    assert_eq!(scheduler.pending(), 1);

    // Before the deadline: confirmed, not fired
    tokio::time::sleep(Duration::from_secs(30)).await;
    settle().await;
    let fired = |log: &[String]| {
        log.iter()
            .filter(|line| line.as_str() == "Reminder: call mom")
            .count()
    };
    assert_eq!(fired(&speech.spoken()), 0);

    // Past the deadline: fired once
    tokio::time::sleep(Duration::from_secs(300)).await;
    settle().await;
    assert_eq!(fired(&speech.spoken()), 1);
    assert_eq!(scheduler.pending(), 0);

    // Much later: still once
    tokio::time::sleep(Duration::from_secs(3600)).await;
    settle().await;
    assert_eq!(fired(&speech.spoken()), 1);
}

#[tokio::test(start_paused = true)]
async fn two_reminders_fire_independently() {
    let speech = Arc::new(ScriptedSpeech::silent());
    let scheduler = Arc::new(ReminderScheduler::new());
    let dispatcher = dispatcher(&speech, &scheduler);

    let first = (Local::now() + TimeDelta::minutes(2)).format("%H:%M");
    let second = (Local::now() + TimeDelta::minutes(4)).format("%H:%M");
    dispatcher.handle(&format!("remind me to stretch at {first}")).await;
    dispatcher
        .handle(&format!("remind me to drink water at {second}"))
        .await;
    assert_eq!(scheduler.pending(), 2);

    tokio::time::sleep(Duration::from_secs(600)).await;
    settle().await;

    let spoken = speech.spoken();
    assert!(spoken.contains(&"Reminder: stretch".to_string()), "{spoken:?}");
    assert!(spoken.contains(&"Reminder: drink water".to_string()), "{spoken:?}");
    assert_eq!(scheduler.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_silences_scheduled_reminders() {
    let speech = Arc::new(ScriptedSpeech::silent());
    let scheduler = Arc::new(ReminderScheduler::new());

    let soon = (Local::now() + TimeDelta::minutes(2)).format("%H:%M");
    dispatcher(&speech, &scheduler)
        .handle(&format!("remind me to stretch at {soon}"))
        .await;
    assert_eq!(scheduler.pending(), 1);

    scheduler.shutdown();
    tokio::time::sleep(Duration::from_secs(600)).await;
    settle().await;

    let spoken = speech.spoken();
    assert!(
        !spoken.iter().any(|line| line.starts_with("Reminder:")),
        "{spoken:?}"
    );
    assert_eq!(scheduler.pending(), 0);
}
