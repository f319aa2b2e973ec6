//! Adaptive elicitation engine.
//!
//! Turns a short seed topic into a complete content brief by asking the user
//! bounded batches of yes/no questions synthesized by a generative backend.
//!
//! The client owns the answer transcript and resubmits it in full on every
//! call; the server keeps only the immutable [`SeedRecord`](model::SeedRecord)
//! and an optional research cache. Entry point: [`ElicitationEngine`].
//!
//! ```no_run
//! # use elicitation::{ElicitationEngine, EngineConfig, FileJobQueue, MemorySeedStore};
//! # async fn demo(generator: ai_llm_service::LlmServiceProfiles) -> Result<(), elicitation::ElicitationError> {
//! let cfg = EngineConfig::default();
//! let jobs = FileJobQueue::new(cfg.data_dir.join("jobs"));
//! let engine = ElicitationEngine::new(generator, MemorySeedStore::default(), jobs, cfg);
//!
//! let seed = engine.start_session(vec!["ウォーターサーバー".into()]).await?;
//! let step = engine.next_step(&seed.session_id, Vec::new()).await?;
//! println!("done = {}", step.is_done());
//! # Ok(()) }
//! ```

pub mod config;
pub mod engine;
pub mod errors;
pub mod final_synth;
pub mod generator;
pub mod jobs;
pub mod model;
pub mod research;
pub mod store;
pub mod synthesizer;
pub mod termination;
pub mod title;

mod prompt;
mod sanitize;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use engine::ElicitationEngine;
pub use errors::{ElicitationError, StoreError};
pub use generator::{GenerationError, GenerationRequest, Profile, TextGenerator};
pub use jobs::{DocumentJob, FileJobQueue, JobTicket};
pub use model::{
    Answer, Decision, FinalBrief, NextStepOutcome, Question, QuestionBatch, SeedRecord,
    StepResult, TargetLength, Topic, TopicResearch,
};
pub use store::{ConfiguredStore, FileSeedStore, MemorySeedStore, SeedStore};
pub use title::{normalize_title, normalize_title_for_year};
