//! Data model shared by the engine and the HTTP surface.
//!
//! Wire names are camelCase. The transcript is owned by the client; nothing
//! in here is mutated after construction except through explicit builders.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::errors::ElicitationError;

/// Maximum keywords accepted in a seed topic.
pub const MAX_TOPIC_KEYWORDS: usize = 10;
/// Maximum characters per topic keyword.
pub const MAX_KEYWORD_CHARS: usize = 100;

/* ------------------------------------------------------------------------- */
/* Seed                                                                      */
/* ------------------------------------------------------------------------- */

/// Ordered, non-empty list of topic keywords; the first one is primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct Topic(Vec<String>);

impl TryFrom<Vec<String>> for Topic {
    type Error = ElicitationError;

    fn try_from(raw: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<Topic> for Vec<String> {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

impl Topic {
    /// Validates raw keywords: trims, drops blanks, enforces count/length limits.
    ///
    /// # Errors
    /// [`ElicitationError::InvalidInput`] if nothing usable remains or a limit is exceeded.
    pub fn parse(raw: Vec<String>) -> Result<Self, ElicitationError> {
        let keywords: Vec<String> = raw
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            return Err(ElicitationError::InvalidInput(
                "topic must contain at least one non-blank keyword".into(),
            ));
        }
        if keywords.len() > MAX_TOPIC_KEYWORDS {
            return Err(ElicitationError::InvalidInput(format!(
                "topic accepts at most {MAX_TOPIC_KEYWORDS} keywords, got {}",
                keywords.len()
            )));
        }
        if let Some(k) = keywords
            .iter()
            .find(|k| k.chars().count() > MAX_KEYWORD_CHARS)
        {
            return Err(ElicitationError::InvalidInput(format!(
                "keyword exceeds {MAX_KEYWORD_CHARS} characters: {}…",
                k.chars().take(20).collect::<String>()
            )));
        }

        Ok(Self(keywords))
    }

    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    pub fn keywords(&self) -> &[String] {
        &self.0
    }

    /// Keywords joined for prompts, e.g. `"a, b, c"`.
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

/// Immutable per-session record, created once by `StartSession`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRecord {
    pub session_id: String,
    pub topic: Topic,
    pub created_at: DateTime<Utc>,
}

/* ------------------------------------------------------------------------- */
/* Transcript                                                                */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Yes,
    No,
}

impl Decision {
    pub fn is_yes(self) -> bool {
        matches!(self, Decision::Yes)
    }

    pub fn label(self) -> &'static str {
        match self {
            Decision::Yes => "yes",
            Decision::No => "no",
        }
    }
}

/// One answered question. `question_text` is a denormalized copy of what was asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub question_text: String,
    #[serde(default)]
    pub category: String,
    pub decision: Decision,
    #[serde(default)]
    pub order: u32,
}

/* ------------------------------------------------------------------------- */
/* Questions                                                                 */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub category: String,
}

/// 1..=8 questions produced by a single synthesizer call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuestionBatch(Vec<Question>);

impl QuestionBatch {
    /// Wraps `questions`, truncating to `limit` (itself capped at 8).
    /// Returns `None` when nothing is left.
    pub fn new(mut questions: Vec<Question>, limit: usize) -> Option<Self> {
        questions.truncate(limit.min(crate::config::MAX_BATCH_SIZE));
        (!questions.is_empty()).then_some(Self(questions))
    }

    pub fn questions(&self) -> &[Question] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/* ------------------------------------------------------------------------- */
/* Research                                                                  */
/* ------------------------------------------------------------------------- */

/// Classified keyword lists used as grounding for early question batches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicResearch {
    pub related: Vec<String>,
    pub target: Vec<String>,
    #[serde(alias = "long_tail")]
    pub long_tail: Vec<String>,
    pub competitor: Vec<String>,
}

impl TopicResearch {
    pub fn is_empty(&self) -> bool {
        self.related.is_empty()
            && self.target.is_empty()
            && self.long_tail.is_empty()
            && self.competitor.is_empty()
    }

    /// All four categories concatenated, in declaration order.
    pub fn merged(&self) -> Vec<&str> {
        self.related
            .iter()
            .chain(&self.target)
            .chain(&self.long_tail)
            .chain(&self.competitor)
            .map(String::as_str)
            .collect()
    }
}

/* ------------------------------------------------------------------------- */
/* Brief                                                                     */
/* ------------------------------------------------------------------------- */

/// Allowed document lengths (characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TargetLength {
    Brief,
    Short,
    Medium,
    Long,
    Extended,
}

impl TargetLength {
    pub const ALL: [TargetLength; 5] = [
        TargetLength::Brief,
        TargetLength::Short,
        TargetLength::Medium,
        TargetLength::Long,
        TargetLength::Extended,
    ];

    pub fn chars(self) -> u32 {
        match self {
            TargetLength::Brief => 2000,
            TargetLength::Short => 4000,
            TargetLength::Medium => 6000,
            TargetLength::Long => 8000,
            TargetLength::Extended => 10000,
        }
    }

    /// Nearest allowed length; ties resolve to the shorter one.
    pub fn nearest(value: u32) -> Self {
        let mut best = TargetLength::Brief;
        for candidate in Self::ALL {
            if candidate.chars().abs_diff(value) < best.chars().abs_diff(value) {
                best = candidate;
            }
        }
        best
    }
}

impl TryFrom<u32> for TargetLength {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|t| t.chars() == value)
            .ok_or_else(|| format!("unsupported target length {value}"))
    }
}

impl From<TargetLength> for u32 {
    fn from(t: TargetLength) -> u32 {
        t.chars()
    }
}

/// What the synthesizer decides at termination, before the final fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalBriefSkeleton {
    /// Already normalized.
    pub title: String,
    pub target_length: TargetLength,
}

/// Answers sharing one category label, in transcript order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category: String,
    pub answers: Vec<Answer>,
    pub yes_count: usize,
    pub no_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerTotals {
    pub answer_count: usize,
    pub yes_count: usize,
    pub no_count: usize,
}

/// Terminal artifact of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalBrief {
    pub title_candidates: Vec<String>,
    pub selected_title: String,
    pub target_length: TargetLength,
    pub summary: String,
    pub categorized_answers: Vec<CategoryGroup>,
    pub totals: AnswerTotals,
}

/* ------------------------------------------------------------------------- */
/* Step results                                                              */
/* ------------------------------------------------------------------------- */

/// Outcome of the batch synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Continue(QuestionBatch),
    Done(FinalBriefSkeleton),
}

/// Outcome of one `NextStep` protocol call.
///
/// Serialized as `{"done": false, "questions": [...]}` or
/// `{"done": true, "finalBrief": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStepOutcome {
    Continue { questions: QuestionBatch },
    Done { final_brief: Box<FinalBrief> },
}

impl NextStepOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, NextStepOutcome::Done { .. })
    }
}

impl Serialize for NextStepOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("NextStepOutcome", 2)?;
        match self {
            NextStepOutcome::Continue { questions } => {
                s.serialize_field("done", &false)?;
                s.serialize_field("questions", questions)?;
            }
            NextStepOutcome::Done { final_brief } => {
                s.serialize_field("done", &true)?;
                s.serialize_field("finalBrief", final_brief)?;
            }
        }
        s.end()
    }
}
