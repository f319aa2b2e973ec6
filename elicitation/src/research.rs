//! Early-phase keyword enrichment.
//!
//! One backend call per session at most. Any failure yields an empty
//! [`TopicResearch`]; the caller never sees an error from here.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::generator::{GenerationError, GenerationRequest, Profile, TextGenerator, generate_bounded};
use crate::model::{Topic, TopicResearch};
use crate::prompt::{SYSTEM_JSON, build_research_prompt};
use crate::sanitize::{collapse_line_breaks, comparison_key, extract_json_object};

/// Entries kept per keyword list.
const MAX_ENTRIES_PER_LIST: usize = 12;

#[derive(Debug, Clone)]
pub struct TopicResearcher {
    timeout: Duration,
}

impl TopicResearcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runs the enrichment request. Soft-fails to an empty result.
    #[instrument(skip_all, fields(topic = %topic.primary()))]
    pub async fn research<G: TextGenerator>(&self, generator: &G, topic: &Topic) -> TopicResearch {
        let prompt = build_research_prompt(topic);
        let request = GenerationRequest {
            profile: Profile::Fast,
            system: Some(SYSTEM_JSON),
            prompt: &prompt,
            json: true,
        };

        let outcome = match generate_bounded(generator, request, self.timeout).await {
            Ok(raw) => parse_research(&raw),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(research) => {
                debug!(
                    keywords = research.merged().len(),
                    "topic research completed"
                );
                research
            }
            Err(e) => {
                warn!(error = %e, "topic research failed; continuing without enrichment");
                TopicResearch::default()
            }
        }
    }
}

/// Decodes and cleans the research payload. All-empty lists count as failure.
pub(crate) fn parse_research(raw: &str) -> Result<TopicResearch, GenerationError> {
    let json = extract_json_object(raw);
    let parsed: TopicResearch = serde_json::from_str(&json)
        .map_err(|e| GenerationError::Contract(format!("research payload: {e}")))?;

    let research = TopicResearch {
        related: clean_list(parsed.related),
        target: clean_list(parsed.target),
        long_tail: clean_list(parsed.long_tail),
        competitor: clean_list(parsed.competitor),
    };
    if research.is_empty() {
        return Err(GenerationError::Contract(
            "research payload has no keywords".into(),
        ));
    }
    Ok(research)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| collapse_line_breaks(&s))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(comparison_key(s)))
        .take(MAX_ENTRIES_PER_LIST)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    fn topic() -> Topic {
        Topic::parse(vec!["脱毛サロン".into()]).unwrap()
    }

    #[tokio::test]
    async fn parses_fenced_payload_and_cleans_lists() {
        let generator = ScriptedGenerator::new();
        generator.push_fast(Ok(
            "```json\n{\"related\":[\"料金\",\" 料金 \",\"\"],\"longTail\":[\"脱毛サロン\\n安い\"],\"competitor\":[\"A社\"]}\n```"
                .into(),
        ));

        let r = TopicResearcher::new(Duration::from_secs(5))
            .research(&generator, &topic())
            .await;
        assert_eq!(r.related, ["料金"]);
        assert_eq!(r.long_tail, ["脱毛サロン安い"]);
        assert_eq!(r.competitor, ["A社"]);
        assert!(r.target.is_empty());
        assert_eq!(generator.fast_calls(), 1);
    }

    #[tokio::test]
    async fn failures_become_empty_research() {
        let generator = ScriptedGenerator::new();
        generator.push_fast(Ok("not json at all".into()));
        let researcher = TopicResearcher::new(Duration::from_secs(5));
        assert!(researcher.research(&generator, &topic()).await.is_empty());

        generator.push_fast(Ok("{\"related\":[],\"target\":[\"  \"]}".into()));
        assert!(researcher.research(&generator, &topic()).await.is_empty());

        // exhausted script surfaces as a contract error
        assert!(researcher.research(&generator, &topic()).await.is_empty());
        assert_eq!(generator.fast_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_silent() {
        let generator = ScriptedGenerator::new().with_delay(Duration::from_secs(60));
        generator.push_fast(Ok("{\"related\":[\"x\"]}".into()));
        let r = TopicResearcher::new(Duration::from_secs(1))
            .research(&generator, &topic())
            .await;
        assert!(r.is_empty());
    }
}
