//! Lenient JSON extraction from an LLM reply: strip fenced code blocks if
//! present, otherwise fall back to the first `{...}` span in the text.

use regex::Regex;
use std::sync::LazyLock;

static FIRST_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Extract the JSON payload from a reply that may be wrapped in a fenced
/// code block, surrounded by prose, or bare.
pub fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let json_start = start + "```json".len();
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let json_start = start + 3;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    if let Some(m) = FIRST_OBJECT.find(trimmed) {
        return m.as_str();
    }

    trimmed
}

/// Parse the extracted block as a [`serde_json::Value`], surfacing a
/// `CoreError::ParseError` on failure.
pub fn parse_json_block(text: &str) -> lawagent_core::Result<serde_json::Value> {
    let block = extract_json_block(text);
    serde_json::from_str(block).map_err(|e| lawagent_core::CoreError::parse(format!("could not parse JSON reply: {e}\nraw: {text}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_json_fence() {
        let text = "Here is the plan:\n```json\n{\"domain\": \"labor\"}\n```";
        assert_eq!(extract_json_block(text), r#"{"domain": "labor"}"#);
    }

    #[test]
    fn extracts_from_bare_fence() {
        let text = "```\n{\"domain\": \"labor\"}\n```";
        assert_eq!(extract_json_block(text), r#"{"domain": "labor"}"#);
    }

    #[test]
    fn extracts_first_object_from_surrounding_prose() {
        let text = "Sure, here's my answer: {\"domain\": \"family\", \"intent\": \"qa_retrieval\"} Hope that helps!";
        assert_eq!(extract_json_block(text), r#"{"domain": "family", "intent": "qa_retrieval"}"#);
    }

    #[test]
    fn falls_back_to_raw_text_when_no_object_present() {
        assert_eq!(extract_json_block("no json here"), "no json here");
    }

    #[test]
    fn parse_json_block_surfaces_parse_error_on_garbage() {
        let result = parse_json_block("not json at all and no braces");
        assert!(result.is_err());
    }

    #[test]
    fn parse_json_block_succeeds_on_fenced_object() {
        let value = parse_json_block("```json\n{\"is_acceptable\": true, \"feedback\": \"\"}\n```").unwrap();
        assert_eq!(value["is_acceptable"], true);
    }
}
