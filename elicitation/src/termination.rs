//! Hard-cap termination, evaluated before any backend call.

use tracing::warn;

use crate::model::Answer;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Transcript reached the configured answer cap.
    HardCap,
    /// The synthesizer judged the brief complete.
    SynthesizerDone,
}

impl TerminationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationReason::HardCap => "hard_cap",
            TerminationReason::SynthesizerDone => "synthesizer_done",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TerminationPolicy {
    hard_cap: usize,
}

impl TerminationPolicy {
    pub fn new(hard_cap: usize) -> Self {
        Self { hard_cap }
    }

    pub fn hard_cap(&self) -> usize {
        self.hard_cap
    }

    /// `Some(HardCap)` once `answered >= hard_cap`; otherwise the synthesizer decides.
    pub fn evaluate(&self, answered: usize) -> Option<TerminationReason> {
        (answered >= self.hard_cap).then_some(TerminationReason::HardCap)
    }

    /// Drops entries beyond the cap so downstream never sees an over-long transcript.
    pub fn clamp(&self, mut transcript: Vec<Answer>) -> Vec<Answer> {
        if transcript.len() > self.hard_cap {
            warn!(
                received = transcript.len(),
                hard_cap = self.hard_cap,
                "transcript exceeds hard cap; truncating"
            );
            transcript.truncate(self.hard_cap);
        }
        transcript
    }
}
