//! Batch question synthesis: next batch of yes/no questions, or a done skeleton.
//!
//! Every attempt issues a fresh backend call bounded by the configured
//! timeout. When the attempt budget runs out, a templated local result is
//! returned instead, so [`BatchQuestionSynthesizer::next_step`] never fails.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::generator::{GenerationError, GenerationRequest, Profile, TextGenerator, generate_bounded};
use crate::model::{
    Answer, FinalBriefSkeleton, Question, QuestionBatch, StepResult, TargetLength, Topic,
    TopicResearch,
};
use crate::prompt::{SYSTEM_JSON, build_next_step_prompt};
use crate::sanitize::{collapse_line_breaks, comparison_key, extract_json_object};
use crate::termination::TerminationPolicy;
use crate::title::{current_year, default_title, normalize_title};

/// Category assigned when the backend leaves it blank.
pub const DEFAULT_CATEGORY: &str = "general";

/// Number of templated questions in a fallback batch.
pub const FALLBACK_BATCH_LEN: usize = 3;

/// Clarifying questions used when the backend is unusable. `{topic}` is the primary keyword.
const FALLBACK_TEMPLATES: &[(&str, &str)] = &[
    ("{topic}について初心者向けの内容にしますか？", "読者層"),
    ("{topic}の料金や費用の比較を含めますか？", "構成"),
    ("{topic}のメリットとデメリットを両方紹介しますか？", "構成"),
    ("{topic}の具体的な選び方を解説しますか？", "構成"),
    ("{topic}の利用者の口コミや体験談を入れますか？", "信頼性"),
    ("{topic}の最新動向に触れますか？", "鮮度"),
    ("{topic}でよくある失敗や注意点を取り上げますか？", "構成"),
    ("{topic}について専門的な用語を使っても良いですか？", "トーン"),
    ("{topic}のおすすめランキングを載せますか？", "構成"),
];

#[derive(Debug, Clone)]
pub struct BatchQuestionSynthesizer {
    cfg: EngineConfig,
    policy: TerminationPolicy,
}

impl BatchQuestionSynthesizer {
    pub fn new(cfg: EngineConfig) -> Self {
        let policy = TerminationPolicy::new(cfg.hard_cap);
        Self { cfg, policy }
    }

    /// Next batch or done skeleton for `transcript`. Never fails.
    ///
    /// At or over the hard cap the backend is not consulted.
    #[instrument(skip_all, fields(topic = %topic.primary(), answered = transcript.len()))]
    pub async fn next_step<G: TextGenerator>(
        &self,
        generator: &G,
        topic: &Topic,
        transcript: &[Answer],
        enrichment: Option<&TopicResearch>,
    ) -> StepResult {
        if self.policy.evaluate(transcript.len()).is_some() {
            return StepResult::Done(self.cap_skeleton(topic));
        }

        let limit = self.cfg.batch_limit(transcript.len());
        let prompt =
            build_next_step_prompt(topic, transcript, enrichment, limit, self.cfg.hard_cap);
        let attempts = self.cfg.max_attempts.max(1);

        for attempt in 1..=attempts {
            let request = GenerationRequest {
                profile: Profile::Fast,
                system: Some(SYSTEM_JSON),
                prompt: &prompt,
                json: true,
            };
            let outcome = match generate_bounded(generator, request, self.cfg.call_timeout).await {
                Ok(raw) => parse_step(&raw, transcript, limit),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(step) => {
                    debug!(attempt, "next step synthesized");
                    return step;
                }
                Err(e) => {
                    warn!(attempt, max_attempts = attempts, error = %e, "next-step attempt failed");
                    if !e.is_retryable() {
                        break;
                    }
                }
            }
        }

        warn!("using templated fallback batch");
        self.fallback(topic, transcript)
    }

    /// Skeleton used when the hard cap ends the session.
    pub fn cap_skeleton(&self, topic: &Topic) -> FinalBriefSkeleton {
        info!(hard_cap = self.cfg.hard_cap, "hard cap reached");
        FinalBriefSkeleton {
            title: default_title(topic.primary(), current_year()),
            target_length: self.cfg.default_target_length,
        }
    }

    /// Deterministic local result: templated questions under the cap, a skeleton otherwise.
    pub fn fallback(&self, topic: &Topic, transcript: &[Answer]) -> StepResult {
        let limit = self.cfg.batch_limit(transcript.len());
        let questions = fallback_questions(topic, transcript, limit.min(FALLBACK_BATCH_LEN));
        match QuestionBatch::new(questions, limit) {
            Some(batch) => StepResult::Continue(batch),
            None => StepResult::Done(self.cap_skeleton(topic)),
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Parsing                                                                   */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    questions: Vec<RawQuestion>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "targetLength", alias = "target_length")]
    target_length: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawQuestion {
    Full {
        text: String,
        #[serde(default)]
        category: String,
    },
    Text(String),
}

impl RawQuestion {
    fn into_parts(self) -> (String, String) {
        match self {
            RawQuestion::Full { text, category } => (text, category),
            RawQuestion::Text(text) => (text, String::new()),
        }
    }
}

/// Applies the payload contract to one raw backend response.
pub(crate) fn parse_step(
    raw: &str,
    transcript: &[Answer],
    limit: usize,
) -> Result<StepResult, GenerationError> {
    let json = extract_json_object(raw);
    let step: RawStep = serde_json::from_str(&json)
        .map_err(|e| GenerationError::Contract(format!("step payload: {e}")))?;

    if step.done {
        let title = step
            .title
            .map(|t| normalize_title(&collapse_line_breaks(&t)))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GenerationError::Contract("done without title".into()))?;
        let target_length = step
            .target_length
            .as_ref()
            .and_then(length_value)
            .map(TargetLength::nearest)
            .ok_or_else(|| GenerationError::Contract("done without targetLength".into()))?;
        return Ok(StepResult::Done(FinalBriefSkeleton {
            title,
            target_length,
        }));
    }

    let mut seen: HashSet<String> = transcript
        .iter()
        .map(|a| comparison_key(&collapse_line_breaks(&a.question_text)))
        .collect();

    let questions: Vec<Question> = step
        .questions
        .into_iter()
        .map(RawQuestion::into_parts)
        .filter_map(|(text, category)| {
            let text = collapse_line_breaks(&text);
            if text.is_empty() || !seen.insert(comparison_key(&text)) {
                return None;
            }
            let category = collapse_line_breaks(&category);
            Some(Question {
                id: Uuid::new_v4().to_string(),
                text,
                category: if category.is_empty() {
                    DEFAULT_CATEGORY.to_string()
                } else {
                    category
                },
            })
        })
        .collect();

    QuestionBatch::new(questions, limit)
        .map(StepResult::Continue)
        .ok_or_else(|| GenerationError::Contract("no usable questions in batch".into()))
}

/// Accepts `6000`, `6000.0`, or `"6000"`.
fn length_value(v: &Value) -> Option<u32> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then(|| n.min(u32::MAX as f64) as u32)
}

/* ------------------------------------------------------------------------- */
/* Fallback                                                                  */
/* ------------------------------------------------------------------------- */

/// Picks `count` templates, rotating by transcript length. Templates not yet
/// asked come first; already-asked ones top the batch up to `count`.
fn fallback_questions(topic: &Topic, transcript: &[Answer], count: usize) -> Vec<Question> {
    let asked: HashSet<String> = transcript
        .iter()
        .map(|a| comparison_key(&a.question_text))
        .collect();

    let start = transcript.len() % FALLBACK_TEMPLATES.len();
    let rotated: Vec<(String, &str)> = FALLBACK_TEMPLATES
        .iter()
        .cycle()
        .skip(start)
        .take(FALLBACK_TEMPLATES.len())
        .map(|(tpl, cat)| (tpl.replace("{topic}", topic.primary()), *cat))
        .collect();

    let (fresh, repeats): (Vec<&(String, &str)>, Vec<&(String, &str)>) = rotated
        .iter()
        .partition(|(text, _)| !asked.contains(&comparison_key(text)));

    fresh
        .into_iter()
        .chain(repeats)
        .take(count)
        .map(|(text, category)| Question {
            id: Uuid::new_v4().to_string(),
            text: text.clone(),
            category: (*category).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Decision;
    use crate::testing::ScriptedGenerator;
    use ai_llm_service::AiLlmError;
    use ai_llm_service::error_handler::ConfigError;

    fn topic() -> Topic {
        Topic::parse(vec!["ウォーターサーバー".into()]).unwrap()
    }

    fn answers(n: usize) -> Vec<Answer> {
        (0..n)
            .map(|i| Answer {
                question_id: format!("q{i}"),
                question_text: format!("質問{i}ですか？"),
                category: "構成".into(),
                decision: if i % 2 == 0 { Decision::Yes } else { Decision::No },
                order: i as u32,
            })
            .collect()
    }

    fn synth() -> BatchQuestionSynthesizer {
        BatchQuestionSynthesizer::new(EngineConfig::default())
    }

    fn batch(step: StepResult) -> QuestionBatch {
        match step {
            StepResult::Continue(b) => b,
            StepResult::Done(s) => panic!("expected batch, got done: {s:?}"),
        }
    }

    #[tokio::test]
    async fn hard_cap_short_circuits_without_backend_call() {
        let generator = ScriptedGenerator::new();
        generator.push_fast(Ok(r#"{"done":false,"questions":[{"text":"x","category":"c"}]}"#.into()));

        for n in [30, 31, 45] {
            let step = synth().next_step(&generator, &topic(), &answers(n), None).await;
            match step {
                StepResult::Done(s) => {
                    assert_eq!(s.title, default_title("ウォーターサーバー", current_year()));
                    assert_eq!(s.target_length, TargetLength::Medium);
                }
                other => panic!("expected done, got {other:?}"),
            }
        }
        assert_eq!(generator.total_calls(), 0);
    }

    #[tokio::test]
    async fn each_retry_issues_a_fresh_backend_call() {
        let generator = ScriptedGenerator::new();
        generator.push_fast(Ok("garbage".into()));
        generator.push_fast(Ok(r#"{"done":false,"questions":[]}"#.into()));
        generator.push_fast(Ok(
            r#"{"done":false,"questions":[{"text":"比較表を入れますか？","category":"構成"}]}"#.into(),
        ));

        let b = batch(synth().next_step(&generator, &topic(), &[], None).await);
        assert_eq!(b.len(), 1);
        assert_eq!(b.questions()[0].text, "比較表を入れますか？");
        assert_eq!(generator.fast_calls(), 3);
    }

    #[tokio::test]
    async fn exhausted_attempts_fall_back_to_templates() {
        let generator = ScriptedGenerator::new();
        for _ in 0..3 {
            generator.push_fast(Ok(String::new()));
        }

        let b = batch(synth().next_step(&generator, &topic(), &answers(4), None).await);
        assert_eq!(b.len(), FALLBACK_BATCH_LEN);
        assert!(b.questions().iter().all(|q| q.text.contains("ウォーターサーバー")));
        assert!(b.questions().iter().all(|q| !q.text.contains('\n')));
        assert_eq!(generator.fast_calls(), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_early() {
        let generator = ScriptedGenerator::new();
        generator.push_fast(Err(GenerationError::Backend(AiLlmError::Config(
            ConfigError::MissingVar("OPENAI_API_KEY"),
        ))));

        let step = synth().next_step(&generator, &topic(), &[], None).await;
        assert!(matches!(step, StepResult::Continue(_)));
        assert_eq!(generator.fast_calls(), 1);
    }

    #[tokio::test]
    async fn fallback_respects_remaining_budget() {
        let generator = ScriptedGenerator::new();
        let b = batch(synth().next_step(&generator, &topic(), &answers(29), None).await);
        assert_eq!(b.len(), 1);
    }

    #[tokio::test]
    async fn enrichment_reaches_the_prompt() {
        let generator = ScriptedGenerator::new();
        generator.push_fast(Ok(r#"{"done":false,"questions":["水の種類を比較しますか？"]}"#.into()));
        let research = TopicResearch {
            competitor: vec!["プレミアムウォーター".into()],
            ..Default::default()
        };

        let b = batch(
            synth()
                .next_step(&generator, &topic(), &[], Some(&research))
                .await,
        );
        assert_eq!(b.questions()[0].category, DEFAULT_CATEGORY);
        assert!(generator.prompts(Profile::Fast)[0].contains("プレミアムウォーター"));
    }

    #[test]
    fn questions_are_single_line_and_deduplicated() {
        let raw = r#"Here you go:
```json
{"done": false, "questions": [
  {"text": "初心者\n向けですか？", "category": " 読者層 "},
  {"text": "初心者向けですか？", "category": "読者層"},
  {"text": "質問0ですか？", "category": "x"},
  {"text": "\n \n", "category": "x"},
  {"text": "口コミを載せますか？", "category": ""}
]}
```"#;
        let b = match parse_step(raw, &answers(1), 8).unwrap() {
            StepResult::Continue(b) => b,
            other => panic!("{other:?}"),
        };
        let texts: Vec<&str> = b.questions().iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, ["初心者向けですか？", "口コミを載せますか？"]);
        assert_eq!(b.questions()[0].category, "読者層");
        assert_eq!(b.questions()[1].category, DEFAULT_CATEGORY);
        assert_ne!(b.questions()[0].id, b.questions()[1].id);
    }

    #[test]
    fn batch_that_empties_after_cleanup_is_a_contract_error() {
        let raw = r#"{"done":false,"questions":[{"text":"\r\n","category":"a"},{"text":"質問0ですか？"}]}"#;
        assert!(matches!(
            parse_step(raw, &answers(1), 8),
            Err(GenerationError::Contract(_))
        ));
    }

    #[test]
    fn batch_is_clipped_to_limit() {
        let qs: Vec<String> = (0..10).map(|i| format!("{{\"text\":\"q{i}\"}}")).collect();
        let raw = format!("{{\"done\":false,\"questions\":[{}]}}", qs.join(","));
        assert_eq!(batch(parse_step(&raw, &[], 8).unwrap()).len(), 8);
        assert_eq!(batch(parse_step(&raw, &[], 2).unwrap()).len(), 2);
    }

    #[test]
    fn done_payload_snaps_length_and_normalizes_title() {
        let raw = r#"{"done":true,"title":"【2020年最新】ウォーターサーバー比較","targetLength":"7100"}"#;
        match parse_step(raw, &[], 8).unwrap() {
            StepResult::Done(s) => {
                let y = current_year();
                assert_eq!(s.title, format!("【{y}年最新版】ウォーターサーバー比較"));
                assert_eq!(s.target_length, TargetLength::Long);
            }
            other => panic!("{other:?}"),
        }

        assert!(parse_step(r#"{"done":true,"title":"  ","targetLength":6000}"#, &[], 8).is_err());
        assert!(parse_step(r#"{"done":true,"title":"t"}"#, &[], 8).is_err());
    }

    #[test]
    fn fallback_skips_already_asked_templates() {
        let t = topic();
        let first = fallback_questions(&t, &[], 3);
        let asked: Vec<Answer> = first
            .iter()
            .map(|q| Answer {
                question_id: q.id.clone(),
                question_text: q.text.clone(),
                category: q.category.clone(),
                decision: Decision::Yes,
                order: 0,
            })
            .collect();
        let second = fallback_questions(&t, &asked, 3);
        assert_eq!(second.len(), 3);
        for q in &second {
            assert!(first.iter().all(|f| f.text != q.text));
        }
    }

    #[test]
    fn fallback_tops_up_when_most_templates_were_asked() {
        let t = topic();
        let asked: Vec<Answer> = FALLBACK_TEMPLATES
            .iter()
            .take(FALLBACK_TEMPLATES.len() - 1)
            .enumerate()
            .map(|(i, (tpl, cat))| Answer {
                question_id: format!("q{i}"),
                question_text: tpl.replace("{topic}", t.primary()),
                category: (*cat).to_string(),
                decision: Decision::No,
                order: i as u32,
            })
            .collect();

        for limit in [1, 2, 3, 8] {
            let batch = fallback_questions(&t, &asked, limit.min(FALLBACK_BATCH_LEN));
            assert_eq!(batch.len(), limit.min(FALLBACK_BATCH_LEN));
            let last = FALLBACK_TEMPLATES[FALLBACK_TEMPLATES.len() - 1]
                .0
                .replace("{topic}", t.primary());
            assert_eq!(batch[0].text, last);
            let distinct: HashSet<&str> = batch.iter().map(|q| q.text.as_str()).collect();
            assert_eq!(distinct.len(), batch.len());
        }
    }
}
