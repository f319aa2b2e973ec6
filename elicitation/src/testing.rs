//! Scripted backend used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::generator::{GenerationError, GenerationRequest, Profile, TextGenerator};

/// Replays queued responses per profile and records every prompt it sees.
/// An exhausted queue answers with a contract error.
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    fast: Mutex<VecDeque<Result<String, GenerationError>>>,
    slow: Mutex<VecDeque<Result<String, GenerationError>>>,
    fast_calls: AtomicUsize,
    slow_calls: AtomicUsize,
    prompts: Mutex<Vec<(Profile, String)>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn push_fast(&self, r: Result<String, GenerationError>) {
        self.fast.lock().unwrap().push_back(r);
    }

    pub(crate) fn push_slow(&self, r: Result<String, GenerationError>) {
        self.slow.lock().unwrap().push_back(r);
    }

    pub(crate) fn fast_calls(&self) -> usize {
        self.fast_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn slow_calls(&self) -> usize {
        self.slow_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.fast_calls() + self.slow_calls()
    }

    pub(crate) fn prompts(&self, profile: Profile) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| *p == profile)
            .map(|(_, s)| s.clone())
            .collect()
    }
}

impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .unwrap()
            .push((request.profile, request.prompt.to_string()));

        let next = match request.profile {
            Profile::Fast => {
                self.fast_calls.fetch_add(1, Ordering::SeqCst);
                self.fast.lock().unwrap().pop_front()
            }
            Profile::Slow => {
                self.slow_calls.fetch_add(1, Ordering::SeqCst);
                self.slow.lock().unwrap().pop_front()
            }
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        next.unwrap_or_else(|| Err(GenerationError::Contract("script exhausted".into())))
    }
}
