//! Helpers for turning untrusted model output into clean, single-line text
//! and decodable JSON.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LINE_BREAK_RUN: Regex = Regex::new(r"[ \t\u{3000}]*[\r\n]+[ \t\u{3000}\r\n]*").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Removes every line break together with the whitespace around it, then trims.
///
/// Guarantees a single-line result.
pub(crate) fn collapse_line_breaks(s: &str) -> String {
    LINE_BREAK_RUN.replace_all(s, "").trim().to_string()
}

/// Key used to detect repeated questions/titles: whitespace-free, lowercase.
pub(crate) fn comparison_key(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, "").to_lowercase()
}

/// Trims common code-fence wrappers around JSON.
pub(crate) fn cleanup_json_like(s: &str) -> String {
    let mut t = s.trim().to_string();
    if t.starts_with("```") {
        t = t
            .trim_start_matches("```json")
            .trim_start_matches("```JSON")
            .trim_start_matches("```")
            .to_string();
        if let Some(pos) = t.rfind("```") {
            t.truncate(pos);
        }
    }
    t.trim().to_string()
}

/// Returns the outermost `{ ... }` span of `s`, or the cleaned text as-is.
///
/// Models tend to wrap the payload in prose ("Here is the JSON: {...}").
pub(crate) fn extract_json_object(s: &str) -> String {
    let clean = cleanup_json_like(s);
    match (clean.find('{'), clean.rfind('}')) {
        (Some(start), Some(end)) if start < end => clean[start..=end].to_string(),
        _ => clean,
    }
}

/// Same as [`extract_json_object`] for a top-level `[ ... ]` array.
pub(crate) fn extract_json_array(s: &str) -> Option<String> {
    let clean = cleanup_json_like(s);
    match (clean.find('['), clean.rfind(']')) {
        (Some(start), Some(end)) if start < end => Some(clean[start..=end].to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_breaks_collapse_to_nothing() {
        assert_eq!(collapse_line_breaks("初心者向け\nですか？"), "初心者向けですか？");
        assert_eq!(collapse_line_breaks("  a  \r\n  \n b \n"), "ab");
        assert_eq!(collapse_line_breaks("keep inner spaces"), "keep inner spaces");
        assert_eq!(collapse_line_breaks("\n\n \n"), "");
    }

    #[test]
    fn comparison_ignores_spacing_and_case() {
        assert_eq!(comparison_key("Is It  Cheap ?"), comparison_key("is it cheap?"));
    }

    #[test]
    fn fences_and_prose_are_stripped() {
        let raw = "```json\n{\"done\": false}\n```";
        assert_eq!(cleanup_json_like(raw), "{\"done\": false}");
        assert_eq!(
            extract_json_object("Sure! Here it is: {\"a\": {\"b\": 1}} hope it helps"),
            "{\"a\": {\"b\": 1}}"
        );
        assert_eq!(extract_json_object("no json"), "no json");
        assert_eq!(
            extract_json_array("titles:\n[\"a\", \"b\"]").as_deref(),
            Some("[\"a\", \"b\"]")
        );
        assert!(extract_json_array("none").is_none());
    }
}
