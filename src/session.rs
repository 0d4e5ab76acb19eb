//! The assistant session loop
//!
//! Listens for utterances, checks stop words before classification, and
//! runs each handler on its own task so a slow weather call or SMTP
//! exchange never blocks the next microphone turn. Every exit path shuts
//! the scheduler down without waiting; pending reminders are dropped.

use std::sync::Arc;

use crate::handlers::Dispatcher;
use crate::intent;
use crate::scheduler::ReminderScheduler;
use crate::speech::Speech;

/// A running assistant session
pub struct Session {
    name: String,
    speech: Arc<dyn Speech>,
    scheduler: Arc<ReminderScheduler>,
    dispatcher: Arc<Dispatcher>,
}

impl Session {
    /// Assemble a session from its parts
    #[must_use]
    pub fn new(
        name: String,
        speech: Arc<dyn Speech>,
        scheduler: Arc<ReminderScheduler>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            name,
            speech,
            scheduler,
            dispatcher,
        }
    }

    /// Run the listen loop until a stop word or terminal interrupt
    pub async fn run(&self) {
        self.speech
            .speak(&format!("Hello, {} starting. Say 'stop' to exit.", self.name))
            .await;

        loop {
            tokio::select! {
                utterance = self.speech.listen() => {
                    if utterance.trim().is_empty() {
                        continue;
                    }

                    // Stop words win over every ranked intent
                    if intent::wants_shutdown(&utterance) {
                        tracing::info!(utterance, "stop word heard");
                        self.speech.speak("Shutting down. Bye.").await;
                        break;
                    }

                    let dispatcher = Arc::clone(&self.dispatcher);
                    tokio::spawn(async move {
                        dispatcher.handle(&utterance).await;
                    });
                }
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "interrupt handler failed");
                    }
                    self.speech.speak("Interrupted. Exiting.").await;
                    break;
                }
            }
        }

        self.scheduler.shutdown();
        tracing::info!("session ended");
    }
}
