//! Terminal fan-out: summary, title candidates, categorized answers.
//!
//! Summary and titles are requested concurrently; categorization is local.
//! Each backend artifact falls back on its own, so one failing never blocks
//! the other and the brief is always complete.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::generator::{GenerationError, GenerationRequest, Profile, TextGenerator, generate_bounded};
use crate::model::{
    Answer, AnswerTotals, CategoryGroup, FinalBrief, FinalBriefSkeleton, Topic,
};
use crate::prompt::{SYSTEM_JSON, SYSTEM_PROSE, build_summary_prompt, build_titles_prompt};
use crate::sanitize::{collapse_line_breaks, comparison_key, extract_json_array, extract_json_object};
use crate::synthesizer::DEFAULT_CATEGORY;
use crate::title::{current_year, default_title, normalize_title_for_year};

#[derive(Debug, Clone)]
pub struct FinalSynthesizer {
    title_count: usize,
    timeout: Duration,
}

impl FinalSynthesizer {
    pub fn new(title_count: usize, timeout: Duration) -> Self {
        Self {
            title_count,
            timeout,
        }
    }

    /// Builds the final brief. Never fails.
    #[instrument(skip_all, fields(topic = %topic.primary(), answered = transcript.len()))]
    pub async fn synthesize<G: TextGenerator>(
        &self,
        generator: &G,
        topic: &Topic,
        transcript: &[Answer],
        skeleton: &FinalBriefSkeleton,
    ) -> FinalBrief {
        let year = current_year();
        let summary_prompt = build_summary_prompt(topic, transcript, &skeleton.title);
        let titles_prompt = build_titles_prompt(topic, transcript, self.title_count, year);

        let (summary, titles) = tokio::join!(
            self.request(generator, &summary_prompt, SYSTEM_PROSE, false),
            self.request(generator, &titles_prompt, SYSTEM_JSON, true),
        );

        let (categorized_answers, totals) = categorize(transcript);

        let summary = summary
            .map(|s| s.trim().to_string())
            .and_then(|s| {
                if s.is_empty() {
                    Err(GenerationError::Contract("empty summary".into()))
                } else {
                    Ok(s)
                }
            })
            .unwrap_or_else(|e| {
                warn!(error = %e, "summary failed; using fallback");
                fallback_summary(topic, &totals)
            });

        let backend_titles = titles.and_then(|raw| parse_titles(&raw)).unwrap_or_else(|e| {
            warn!(error = %e, "title synthesis failed; padding with default titles");
            Vec::new()
        });

        let mut candidates = Vec::with_capacity(backend_titles.len() + 1);
        candidates.push(skeleton.title.clone());
        candidates.extend(backend_titles);
        let title_candidates =
            finalize_titles(candidates, topic.primary(), year, self.title_count);
        let selected_title = title_candidates
            .first()
            .cloned()
            .unwrap_or_else(|| default_title(topic.primary(), year));

        info!(
            titles = title_candidates.len(),
            categories = categorized_answers.len(),
            answers = totals.answer_count,
            "final brief produced"
        );

        FinalBrief {
            title_candidates,
            selected_title,
            target_length: skeleton.target_length,
            summary,
            categorized_answers,
            totals,
        }
    }

    async fn request<G: TextGenerator>(
        &self,
        generator: &G,
        prompt: &str,
        system: &str,
        json: bool,
    ) -> Result<String, GenerationError> {
        let request = GenerationRequest {
            profile: Profile::Slow,
            system: Some(system),
            prompt,
            json,
        };
        generate_bounded(generator, request, self.timeout).await
    }
}

fn fallback_summary(topic: &Topic, totals: &AnswerTotals) -> String {
    format!(
        "「{}」について{}件の回答（はい{}件、いいえ{}件）をもとに記事の構成と切り口を決定しました。",
        topic.primary(),
        totals.answer_count,
        totals.yes_count,
        totals.no_count
    )
}

/* ------------------------------------------------------------------------- */
/* Titles                                                                    */
/* ------------------------------------------------------------------------- */

#[derive(Deserialize)]
struct TitlesPayload {
    titles: Vec<String>,
}

/// `{"titles": [..]}`, then a bare array, then one title per line.
pub(crate) fn parse_titles(raw: &str) -> Result<Vec<String>, GenerationError> {
    let object = extract_json_object(raw);
    if let Ok(p) = serde_json::from_str::<TitlesPayload>(&object) {
        return non_empty(p.titles);
    }
    if let Some(list) =
        extract_json_array(raw).and_then(|a| serde_json::from_str::<Vec<String>>(&a).ok())
    {
        return non_empty(list);
    }
    if object.trim_start().starts_with('{') {
        return Err(GenerationError::Contract("titles payload is not usable".into()));
    }

    let lines = raw
        .lines()
        .map(strip_list_marker)
        .filter(|l| !l.is_empty() && !l.starts_with("```"))
        .map(str::to_string)
        .collect();
    non_empty(lines)
}

fn non_empty(titles: Vec<String>) -> Result<Vec<String>, GenerationError> {
    if titles.iter().all(|t| t.trim().is_empty()) {
        Err(GenerationError::Contract("no titles returned".into()))
    } else {
        Ok(titles)
    }
}

/// Strips `1.`, `2)`, `-`, `*`, `・` prefixes from a line.
fn strip_list_marker(line: &str) -> &str {
    let t = line.trim();
    let rest = t.trim_start_matches(|c: char| c.is_ascii_digit());
    let t = if rest.len() < t.len() {
        rest.strip_prefix('.')
            .or_else(|| rest.strip_prefix(')'))
            .unwrap_or(t)
    } else {
        t
    };
    t.trim_start_matches(['-', '*', '・'])
        .trim()
        .trim_matches('"')
}

/// Cleans, normalizes, de-duplicates, truncates, and pads to exactly `count`.
pub fn finalize_titles(candidates: Vec<String>, primary: &str, year: i32, count: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = candidates
        .into_iter()
        .map(|t| normalize_title_for_year(&collapse_line_breaks(&t), year))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(comparison_key(t)))
        .take(count)
        .collect();

    let pad = default_title(primary, year);
    out.resize(count, pad);
    out
}

/* ------------------------------------------------------------------------- */
/* Categorization                                                            */
/* ------------------------------------------------------------------------- */

/// Groups answers by category in order of first appearance, with tallies.
pub fn categorize(transcript: &[Answer]) -> (Vec<CategoryGroup>, AnswerTotals) {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut totals = AnswerTotals::default();

    for answer in transcript {
        let label = answer.category.trim();
        let label = if label.is_empty() {
            DEFAULT_CATEGORY
        } else {
            label
        };

        let idx = match groups.iter().position(|g| g.category == label) {
            Some(i) => i,
            None => {
                groups.push(CategoryGroup {
                    category: label.to_string(),
                    answers: Vec::new(),
                    yes_count: 0,
                    no_count: 0,
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[idx];
        group.answers.push(answer.clone());
        totals.answer_count += 1;
        if answer.decision.is_yes() {
            group.yes_count += 1;
            totals.yes_count += 1;
        } else {
            group.no_count += 1;
            totals.no_count += 1;
        }
    }

    (groups, totals)
}
