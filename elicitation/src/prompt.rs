//! Prompt builders for research, question batches, summary, and titles.
//!
//! Keep prompts compact; every JSON shape the parsers expect is spelled out
//! verbatim so the backend has a concrete target.

use crate::model::{Answer, Topic, TopicResearch};

pub(crate) const SYSTEM_JSON: &str = "You are an editorial strategist who plans Japanese web content. \
Reply with a single JSON object and nothing else.";

pub(crate) const SYSTEM_PROSE: &str = "You are an editorial strategist who plans Japanese web content. \
Reply in Japanese plain text without Markdown.";

/// Transcript as numbered question/answer pairs.
pub(crate) fn render_transcript(transcript: &[Answer]) -> String {
    if transcript.is_empty() {
        return "(no answers yet)\n".to_string();
    }
    let mut s = String::new();
    for (i, a) in transcript.iter().enumerate() {
        let category = if a.category.trim().is_empty() {
            "general"
        } else {
            a.category.trim()
        };
        s.push_str(&format!(
            "{}. [{}] Q: {} / A: {}\n",
            i + 1,
            category,
            a.question_text.trim(),
            a.decision.label()
        ));
    }
    s
}

pub(crate) fn build_research_prompt(topic: &Topic) -> String {
    let mut s = String::new();
    s.push_str("Expand the seed topic below into keyword research for an article.\n");
    s.push_str("\n# Seed topic\n");
    s.push_str(&topic.joined());
    s.push_str("\n\n# Output\n");
    s.push_str(
        "{\"related\": [..], \"target\": [..], \"longTail\": [..], \"competitor\": [..]}\n",
    );
    s.push_str("- related: keywords closely associated with the topic\n");
    s.push_str("- target: reader segments or intents\n");
    s.push_str("- longTail: multi-word search phrases\n");
    s.push_str("- competitor: brands, services or products readers compare\n");
    s.push_str("- At most 8 short Japanese entries per list.\n");
    s
}

pub(crate) fn build_next_step_prompt(
    topic: &Topic,
    transcript: &[Answer],
    enrichment: Option<&TopicResearch>,
    batch_limit: usize,
    hard_cap: usize,
) -> String {
    let mut s = String::new();
    s.push_str(
        "We are narrowing down a content brief by asking the user yes/no questions.\n",
    );
    s.push_str("\n# Seed topic\n");
    s.push_str(&topic.joined());
    s.push_str("\n\n# Answers so far\n");
    s.push_str(&render_transcript(transcript));

    if let Some(research) = enrichment.filter(|r| !r.is_empty()) {
        s.push_str("\n# Keyword research (grounding only, never quote it as a question)\n");
        s.push_str(&research.merged().join(", "));
        s.push('\n');
    }

    s.push_str(&format!(
        "\n# Budget\n{} of at most {} questions answered.\n",
        transcript.len(),
        hard_cap
    ));

    s.push_str("\n# Output\nEither more questions:\n");
    s.push_str(&format!(
        "{{\"done\": false, \"questions\": [{{\"text\": \"..\", \"category\": \"..\"}}]}} with 1 to {batch_limit} questions\n"
    ));
    s.push_str("or, when the brief is specific enough:\n");
    s.push_str("{\"done\": true, \"title\": \"..\", \"targetLength\": 2000|4000|6000|8000|10000}\n");
    s.push_str("\n# Instructions\n");
    s.push_str("- Every question must be answerable with yes or no and fit on one line.\n");
    s.push_str("- Never repeat a question that was already answered.\n");
    s.push_str("- category is a short Japanese label such as 読者層, 構成, トーン.\n");
    s
}

pub(crate) fn build_summary_prompt(topic: &Topic, transcript: &[Answer], title: &str) -> String {
    let mut s = String::new();
    s.push_str("Explain how the user's answers shaped the content brief.\n");
    s.push_str("\n# Seed topic\n");
    s.push_str(&topic.joined());
    s.push_str("\n\n# Working title\n");
    s.push_str(title);
    s.push_str("\n\n# Answers\n");
    s.push_str(&render_transcript(transcript));
    s.push_str("\n# Instructions\n");
    s.push_str("- Link specific answers to specific content decisions, e.g. \"because you answered X to Y, the brief includes Z\".\n");
    s.push_str("- 3 to 6 sentences.\n");
    s
}

pub(crate) fn build_titles_prompt(
    topic: &Topic,
    transcript: &[Answer],
    count: usize,
    year: i32,
) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "Propose exactly {count} Japanese article titles for the brief below.\n"
    ));
    s.push_str("\n# Seed topic\n");
    s.push_str(&topic.joined());
    s.push_str("\n\n# Answers\n");
    s.push_str(&render_transcript(transcript));
    s.push_str("\n# Output\n{\"titles\": [\"..\", ..]}\n");
    s.push_str("\n# Instructions\n");
    s.push_str("- Each title takes a different angle: comparison, buyer's guide, authority, beginner, pitfalls, case study.\n");
    s.push_str(&format!(
        "- When a year fits, use {year} (for example 【{year}年最新版】).\n"
    ));
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Decision;

    fn answer(text: &str, category: &str, decision: Decision) -> Answer {
        Answer {
            question_id: "q".into(),
            question_text: text.into(),
            category: category.into(),
            decision,
            order: 0,
        }
    }

    #[test]
    fn transcript_renders_as_numbered_pairs() {
        let t = vec![
            answer("初心者向けですか？", "読者層", Decision::Yes),
            answer("料金比較を入れますか？", "", Decision::No),
        ];
        let out = render_transcript(&t);
        assert!(out.contains("1. [読者層] Q: 初心者向けですか？ / A: yes"));
        assert!(out.contains("2. [general] Q: 料金比較を入れますか？ / A: no"));
        assert_eq!(render_transcript(&[]), "(no answers yet)\n");
    }

    #[test]
    fn enrichment_is_included_only_when_present() {
        let topic = Topic::parse(vec!["格安SIM".into()]).unwrap();
        let research = TopicResearch {
            related: vec!["通信速度".into()],
            competitor: vec!["楽天モバイル".into()],
            ..Default::default()
        };
        let with = build_next_step_prompt(&topic, &[], Some(&research), 8, 30);
        assert!(with.contains("通信速度, 楽天モバイル"));

        let without = build_next_step_prompt(&topic, &[], Some(&TopicResearch::default()), 8, 30);
        assert!(!without.contains("Keyword research"));
        assert!(without.contains("with 1 to 8 questions"));
    }
}
