//! Shared test utilities

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use valet::speech::Speech;

/// Scripted speech surface: listens from a fixed script and records every
/// spoken line. Once the script runs out, `listen` returns silence.
pub struct ScriptedSpeech {
    replies: Mutex<VecDeque<String>>,
    spoken: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedSpeech {
    /// A surface that will answer `listen` with these utterances in order
    #[must_use]
    pub fn hearing(script: &[&str]) -> Self {
        Self {
            replies: Mutex::new(script.iter().map(ToString::to_string).collect()),
            spoken: Mutex::new(Vec::new()),
        }
    }

    /// A surface that only ever hears silence
    #[must_use]
    pub fn silent() -> Self {
        Self::hearing(&[])
    }

    /// Everything spoken so far, in order
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().expect("spoken log poisoned").clone()
    }
}

#[async_trait]
impl Speech for ScriptedSpeech {
    async fn speak(&self, text: &str) {
        self.spoken
            .lock()
            .expect("spoken log poisoned")
            .push(text.to_string());
    }

    async fn listen(&self) -> String {
        self.replies
            .lock()
            .expect("reply script poisoned")
            .pop_front()
            .unwrap_or_default()
    }
}
