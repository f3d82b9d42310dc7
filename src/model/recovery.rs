//! Recovers a structured value from model output that was asked to be pure JSON
//! but may arrive fenced in markdown or surrounded by prose.
//!
//! Recovery is deliberately shallow: direct parse, then fence stripping, then the
//! outermost bracket slice. No token repair, no defaulting of missing fields.

use log::{debug, warn};
use serde::de::DeserializeOwned;

use super::assessment::AssessmentItem;

/// Parses `raw` as `T`, trying each recovery step in order.
pub fn recover_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let unfenced = strip_code_fence(trimmed);
    if unfenced != trimmed {
        if let Ok(value) = serde_json::from_str(unfenced) {
            debug!("Recovered JSON after stripping code fence");
            return Some(value);
        }
    }

    let slice = bracket_slice(trimmed)?;
    match serde_json::from_str(slice) {
        Ok(value) => {
            debug!("Recovered JSON from embedded bracket slice");
            Some(value)
        }
        Err(e) => {
            warn!("JSON recovery failed: {}", e);
            None
        }
    }
}

/// Parses and validates a quiz record. Invalid records are `None`, same as
/// unparseable ones.
pub fn parse_assessment_item(raw: &str) -> Option<AssessmentItem> {
    let item: AssessmentItem = recover_json(raw)?;
    if item.is_valid() {
        Some(item)
    } else {
        warn!(
            "Rejected assessment item: {} options, correct answer index {}",
            item.options.len(),
            item.correct_answer
        );
        None
    }
}

/// Removes a leading ```` ``` ```` / ```` ```json ```` line and a trailing ```` ``` ````.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag, if any, up to the end of the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// From the first `{` or `[` to the last matching closer, inclusive.
fn bracket_slice(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = match text.as_bytes()[start] {
        b'{' => '}',
        _ => ']',
    };
    let end = text.rfind(closer)?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = r#"{"question":"Q","options":["A","B","C","D"],"correctAnswer":2,"explanation":"E"}"#;

    fn expected() -> AssessmentItem {
        AssessmentItem {
            id: None,
            question: "Q".to_string(),
            options: vec!["A", "B", "C", "D"].into_iter().map(String::from).collect(),
            correct_answer: 2,
            explanation: "E".to_string(),
        }
    }

    #[test]
    fn parses_plain_json_with_surrounding_whitespace() {
        let item = parse_assessment_item(&format!("\n  {}  \n", VALID)).unwrap();
        assert_eq!(item, expected());
        assert_eq!(item.options.len(), 4);
        assert!(item.is_correct(2));
    }

    #[test]
    fn keeps_identifier_when_present() {
        let raw = r#"{"id":7,"question":"Q","options":["A","B","C","D"],"correctAnswer":0,"explanation":"E"}"#;
        assert_eq!(parse_assessment_item(raw).unwrap().id, Some(7));
    }

    #[test]
    fn recovers_from_json_tagged_fence() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert_eq!(parse_assessment_item(&fenced), Some(expected()));
    }

    #[test]
    fn recovers_from_untagged_fence() {
        let fenced = format!("```\n{}\n```\n", VALID);
        assert_eq!(parse_assessment_item(&fenced), Some(expected()));
    }

    #[test]
    fn recovers_object_embedded_in_prose() {
        let chatty = format!("Sure! {} Hope that helps", VALID);
        assert_eq!(parse_assessment_item(&chatty), Some(expected()));
    }

    #[test]
    fn recovers_fenced_block_inside_prose() {
        let chatty = format!("Here is your question:\n```json\n{}\n```\nGood luck!", VALID);
        assert_eq!(parse_assessment_item(&chatty), Some(expected()));
    }

    #[test]
    fn rejects_three_options_instead_of_padding() {
        let raw = r#"{"question":"Q","options":["A","B","C"],"correctAnswer":1,"explanation":"E"}"#;
        assert_eq!(parse_assessment_item(raw), None);
    }

    #[test]
    fn rejects_out_of_range_answer() {
        let raw = r#"{"question":"Q","options":["A","B","C","D"],"correctAnswer":5,"explanation":"E"}"#;
        assert_eq!(parse_assessment_item(raw), None);
    }

    #[test]
    fn rejects_non_numeric_answer() {
        let raw = r#"{"question":"Q","options":["A","B","C","D"],"correctAnswer":"B","explanation":"E"}"#;
        assert_eq!(parse_assessment_item(raw), None);
    }

    #[test]
    fn rejects_negative_answer() {
        let raw = r#"{"question":"Q","options":["A","B","C","D"],"correctAnswer":-1,"explanation":"E"}"#;
        assert_eq!(parse_assessment_item(raw), None);
    }

    #[test]
    fn rejects_missing_fields() {
        let raw = r#"{"question":"Q","options":["A","B","C","D"]}"#;
        assert_eq!(parse_assessment_item(raw), None);
    }

    #[test]
    fn garbage_and_empty_input_are_none() {
        for raw in ["", "   ", "no json here", "{ broken", "} backwards {", "```json\n```"] {
            assert_eq!(parse_assessment_item(raw), None, "input: {:?}", raw);
        }
    }

    #[test]
    fn array_slice_is_recovered_for_array_targets() {
        let raw = "Options follow: [\"A\", \"B\"] end";
        let parsed: Option<Vec<String>> = recover_json(raw);
        assert_eq!(parsed, Some(vec!["A".to_string(), "B".to_string()]));
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = format!("Sure! ```json\n{}\n```", VALID);
        assert_eq!(parse_assessment_item(&raw), parse_assessment_item(&raw));
    }
}
