//! Session protocol: start, next step, finalize.
//!
//! Stateless per call. Everything needed to decide the next step comes from
//! the submitted transcript plus the immutable seed; the only write during
//! `next_step` is the one-time research cache entry.

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::errors::{ElicitationError, ElicitationResult};
use crate::final_synth::FinalSynthesizer;
use crate::generator::TextGenerator;
use crate::jobs::{FileJobQueue, JobTicket};
use crate::model::{Answer, FinalBrief, NextStepOutcome, SeedRecord, StepResult, Topic, TopicResearch};
use crate::research::TopicResearcher;
use crate::store::SeedStore;
use crate::synthesizer::BatchQuestionSynthesizer;
use crate::termination::{TerminationPolicy, TerminationReason};
use crate::title::normalize_title;

pub struct ElicitationEngine<G, S> {
    generator: G,
    store: S,
    jobs: FileJobQueue,
    cfg: EngineConfig,
    policy: TerminationPolicy,
    researcher: TopicResearcher,
    synthesizer: BatchQuestionSynthesizer,
    final_synth: FinalSynthesizer,
}

impl<G: TextGenerator, S: SeedStore> ElicitationEngine<G, S> {
    pub fn new(generator: G, store: S, jobs: FileJobQueue, cfg: EngineConfig) -> Self {
        Self {
            policy: TerminationPolicy::new(cfg.hard_cap),
            researcher: TopicResearcher::new(cfg.call_timeout),
            synthesizer: BatchQuestionSynthesizer::new(cfg.clone()),
            final_synth: FinalSynthesizer::new(cfg.title_count, cfg.call_timeout),
            generator,
            store,
            jobs,
            cfg,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Validates the topic and persists a new seed record.
    #[instrument(skip_all)]
    pub async fn start_session(&self, topic: Vec<String>) -> ElicitationResult<SeedRecord> {
        let topic = Topic::parse(topic)?;
        let seed = SeedRecord {
            session_id: Uuid::new_v4().to_string(),
            topic,
            created_at: Utc::now(),
        };
        self.store.insert_seed(&seed).await?;
        info!(session_id = %seed.session_id, topic = %seed.topic.joined(), "session started");
        Ok(seed)
    }

    /// Next question batch, or the final brief once the session terminates.
    ///
    /// Backend failures never surface here; only a bad id, an unknown
    /// session, or a storage failure do.
    #[instrument(skip(self, transcript), fields(answered = transcript.len()))]
    pub async fn next_step(
        &self,
        session_id: &str,
        transcript: Vec<Answer>,
    ) -> ElicitationResult<NextStepOutcome> {
        let seed = self.load_seed(session_id).await?;
        let transcript = self.policy.clamp(transcript);

        let (skeleton, reason) = if self.policy.evaluate(transcript.len()).is_some() {
            (
                self.synthesizer.cap_skeleton(&seed.topic),
                TerminationReason::HardCap,
            )
        } else {
            let enrichment = self.enrichment(&seed, transcript.len()).await;
            match self
                .synthesizer
                .next_step(&self.generator, &seed.topic, &transcript, enrichment.as_ref())
                .await
            {
                StepResult::Continue(questions) => {
                    debug!(batch = questions.len(), "returning question batch");
                    return Ok(NextStepOutcome::Continue { questions });
                }
                StepResult::Done(skeleton) => (skeleton, TerminationReason::SynthesizerDone),
            }
        };

        info!(reason = reason.as_str(), "session terminated");
        let brief = self
            .final_synth
            .synthesize(&self.generator, &seed.topic, &transcript, &skeleton)
            .await;
        Ok(NextStepOutcome::Done {
            final_brief: Box::new(brief),
        })
    }

    /// Validates an accepted brief and hands it to the document queue.
    #[instrument(skip(self, brief, transcript))]
    pub async fn finalize(
        &self,
        session_id: &str,
        mut brief: FinalBrief,
        transcript: Vec<Answer>,
    ) -> ElicitationResult<JobTicket> {
        let seed = self.load_seed(session_id).await?;

        if brief.title_candidates.len() != self.cfg.title_count {
            return Err(ElicitationError::InvalidInput(format!(
                "finalBrief must carry exactly {} title candidates, got {}",
                self.cfg.title_count,
                brief.title_candidates.len()
            )));
        }
        if brief.title_candidates.iter().any(|t| t.trim().is_empty()) {
            return Err(ElicitationError::InvalidInput(
                "title candidates must be non-empty".into(),
            ));
        }
        let selected = normalize_title(brief.selected_title.trim());
        if selected.is_empty() {
            return Err(ElicitationError::InvalidInput(
                "selectedTitle must be non-empty".into(),
            ));
        }
        brief.selected_title = selected;

        let transcript = self.policy.clamp(transcript);
        let ticket = self
            .jobs
            .enqueue(&seed.session_id, seed.topic, brief, transcript)
            .await?;
        Ok(ticket)
    }

    async fn load_seed(&self, session_id: &str) -> ElicitationResult<SeedRecord> {
        let id = Uuid::parse_str(session_id.trim()).map_err(|_| {
            ElicitationError::InvalidInput(format!("malformed sessionId `{session_id}`"))
        })?;
        let id = id.to_string();
        self.store
            .load_seed(&id)
            .await?
            .ok_or(ElicitationError::SessionNotFound(id))
    }

    /// Cached research, or a fresh one stored for later calls. `None` outside the research phase.
    async fn enrichment(&self, seed: &SeedRecord, answered: usize) -> Option<TopicResearch> {
        if answered >= self.cfg.research_phase_limit {
            return None;
        }

        match self.store.load_research(&seed.session_id).await {
            Ok(Some(cached)) => {
                debug!("research cache hit");
                return (!cached.is_empty()).then_some(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "research cache unreadable; researching again"),
        }

        let research = self.researcher.research(&self.generator, &seed.topic).await;
        // empty results are cached too, so research runs at most once
        if let Err(e) = self.store.store_research(&seed.session_id, &research).await {
            warn!(error = %e, "failed to cache topic research");
        }
        (!research.is_empty()).then_some(research)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Profile;
    use crate::model::Decision;
    use crate::store::MemorySeedStore;
    use crate::testing::ScriptedGenerator;

    const BATCH: &str = r#"{"done":false,"questions":[{"text":"比較表を入れますか？","category":"構成"},{"text":"初心者向けですか？","category":"読者層"}]}"#;

    fn engine(dir: &std::path::Path) -> ElicitationEngine<ScriptedGenerator, MemorySeedStore> {
        let cfg = EngineConfig {
            data_dir: dir.to_path_buf(),
            ..Default::default()
        };
        ElicitationEngine::new(
            ScriptedGenerator::new(),
            MemorySeedStore::default(),
            FileJobQueue::new(dir.join("jobs")),
            cfg,
        )
    }

    fn answers(n: usize) -> Vec<Answer> {
        (0..n)
            .map(|i| Answer {
                question_id: format!("q{i}"),
                question_text: format!("質問{i}ですか？"),
                category: if i % 3 == 0 { "読者層" } else { "構成" }.into(),
                decision: if i % 2 == 0 { Decision::Yes } else { Decision::No },
                order: i as u32,
            })
            .collect()
    }

    fn brief_of(outcome: NextStepOutcome) -> FinalBrief {
        match outcome {
            NextStepOutcome::Done { final_brief } => *final_brief,
            other => panic!("expected done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_session_validates_topic() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());

        let err = e.start_session(vec!["  ".into()]).await.unwrap_err();
        assert!(matches!(err, ElicitationError::InvalidInput(_)));

        let seed = e.start_session(vec!["ウォーターサーバー".into()]).await.unwrap();
        assert!(Uuid::parse_str(&seed.session_id).is_ok());
        assert_eq!(seed.topic.primary(), "ウォーターサーバー");
    }

    #[tokio::test]
    async fn unknown_and_malformed_sessions_are_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());

        let err = e.next_step("not-a-uuid", vec![]).await.unwrap_err();
        assert!(matches!(err, ElicitationError::InvalidInput(_)));

        let err = e
            .next_step(&Uuid::new_v4().to_string(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ElicitationError::SessionNotFound(_)));
        assert!(err.is_client_error());
        assert_eq!(e.generator().total_calls(), 0);
    }

    #[tokio::test]
    async fn hard_cap_terminates_without_next_step_call() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let seed = e.start_session(vec!["格安SIM".into()]).await.unwrap();

        for n in [30, 37] {
            let brief = brief_of(e.next_step(&seed.session_id, answers(n)).await.unwrap());
            assert_eq!(brief.title_candidates.len(), 6);
            assert_eq!(brief.totals.answer_count, 30);
            assert_eq!(
                brief.totals.yes_count + brief.totals.no_count,
                brief.totals.answer_count
            );
        }
        assert_eq!(e.generator().fast_calls(), 0);
    }

    #[tokio::test]
    async fn research_runs_once_and_replay_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let seed = e.start_session(vec!["脱毛サロン".into()]).await.unwrap();

        let g = e.generator();
        g.push_fast(Ok(r#"{"related":["料金"],"competitor":["Aサロン"]}"#.into()));
        g.push_fast(Ok(BATCH.into()));
        g.push_fast(Ok(BATCH.into()));

        let t = answers(2);
        let first = e.next_step(&seed.session_id, t.clone()).await.unwrap();
        let second = e.next_step(&seed.session_id, t).await.unwrap();
        assert!(!first.is_done());
        assert!(!second.is_done());

        // research + two next-step calls
        assert_eq!(g.fast_calls(), 3);
        let prompts = g.prompts(Profile::Fast);
        assert!(prompts[1].contains("Aサロン"));
        assert!(prompts[2].contains("Aサロン"));
    }

    #[tokio::test]
    async fn failed_research_is_cached_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let seed = e.start_session(vec!["脱毛サロン".into()]).await.unwrap();

        let g = e.generator();
        g.push_fast(Ok("no json".into()));
        g.push_fast(Ok(BATCH.into()));
        g.push_fast(Ok(BATCH.into()));

        e.next_step(&seed.session_id, vec![]).await.unwrap();
        e.next_step(&seed.session_id, answers(2)).await.unwrap();
        assert_eq!(g.fast_calls(), 3);
    }

    #[tokio::test]
    async fn research_is_skipped_after_the_early_phase() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let seed = e.start_session(vec!["転職".into()]).await.unwrap();

        e.generator().push_fast(Ok(BATCH.into()));
        let out = e.next_step(&seed.session_id, answers(15)).await.unwrap();
        assert!(!out.is_done());
        assert_eq!(e.generator().fast_calls(), 1);
    }

    #[tokio::test]
    async fn backend_outage_still_makes_progress() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let seed = e.start_session(vec!["転職".into()]).await.unwrap();

        match e.next_step(&seed.session_id, answers(20)).await.unwrap() {
            NextStepOutcome::Continue { questions } => assert!(!questions.is_empty()),
            other => panic!("{other:?}"),
        }
    }

    #[tokio::test]
    async fn synthesizer_done_produces_final_brief() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let seed = e.start_session(vec!["転職".into()]).await.unwrap();

        let g = e.generator();
        g.push_fast(Ok(r#"{"done":true,"title":"2022年版 転職ガイド","targetLength":4000}"#.into()));
        g.push_slow(Ok("要約".into()));
        g.push_slow(Ok(r#"{"titles":["A","B","C","D","E","F","G"]}"#.into()));

        let brief = brief_of(e.next_step(&seed.session_id, answers(20)).await.unwrap());
        assert_eq!(brief.summary, "要約");
        assert_eq!(brief.title_candidates.len(), 6);
        assert_eq!(brief.selected_title, brief.title_candidates[0]);
        assert!(brief.selected_title.starts_with(&crate::title::current_year().to_string()));
        assert_eq!(u32::from(brief.target_length), 4000);
    }

    #[tokio::test]
    async fn finalize_validates_and_enqueues() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let seed = e.start_session(vec!["格安SIM".into()]).await.unwrap();
        let brief = brief_of(e.next_step(&seed.session_id, answers(30)).await.unwrap());

        let mut short = brief.clone();
        short.title_candidates.pop();
        assert!(matches!(
            e.finalize(&seed.session_id, short, answers(30)).await,
            Err(ElicitationError::InvalidInput(_))
        ));

        let mut blank = brief.clone();
        blank.selected_title = "  ".into();
        assert!(e.finalize(&seed.session_id, blank, vec![]).await.is_err());

        let mut stale = brief.clone();
        stale.selected_title = "【2019年最新】格安SIM比較".into();
        let ticket = e
            .finalize(&seed.session_id, stale, answers(30))
            .await
            .unwrap();
        let job = FileJobQueue::new(dir.path().join("jobs"))
            .load(&ticket.job_id)
            .await
            .unwrap()
            .unwrap();
        let y = crate::title::current_year();
        assert_eq!(job.brief.selected_title, format!("【{y}年最新版】格安SIM比較"));
        assert_eq!(job.session_id, seed.session_id);
    }
}
