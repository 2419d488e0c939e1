//! JSON extraction utilities for parsing LLM responses.
//!
//! Models rarely return bare JSON. Responses arrive wrapped in markdown
//! fences, preceded by chatter, or followed by an explanation. This module
//! extracts the JSON object an agent asked for and reports a typed error
//! that always carries the raw response text.
//!
//! # Extraction Strategies
//!
//! 1. The interior of a ```` ```json ```` fenced block, when one exists.
//! 2. Otherwise the inclusive span from the first `{` to the last `}`.
//!
//! # Example
//!
//! ```
//! use prompt_forge::utils::json_extraction::parse_json_object;
//!
//! let response = "Here is the result: {\"name\": \"example\", \"value\": 42} Enjoy!";
//! let object = parse_json_object(response).unwrap();
//! assert_eq!(object["value"], 42);
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum number of characters of the raw response shown in error messages.
const PREVIEW_CHARS: usize = 120;

/// Error type for JSON extraction failures.
///
/// Every variant carries the complete raw response so callers can log it
/// verbatim.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("No JSON object found in response. Content starts with: '{}'", preview(.raw))]
    NoJsonFound { raw: String },

    #[error("Malformed JSON in response: {message}")]
    MalformedJson { message: String, raw: String },

    #[error("Response JSON is not an object. Content starts with: '{}'", preview(.raw))]
    NotAnObject { raw: String },
}

impl ParseError {
    /// The raw response text that failed to parse.
    pub fn raw(&self) -> &str {
        match self {
            ParseError::NoJsonFound { raw }
            | ParseError::MalformedJson { raw, .. }
            | ParseError::NotAnObject { raw } => raw,
        }
    }
}

fn preview(raw: &str) -> String {
    raw.trim().chars().take(PREVIEW_CHARS).collect()
}

fn json_fence_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").ok())
        .as_ref()
}

/// Extract the interior of the first ```` ```json ```` fenced block.
///
/// Returns `None` when no complete fenced block is present.
pub fn extract_from_json_code_block(content: &str) -> Option<&str> {
    json_fence_regex()?
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Locate the inclusive span from the first `{` to the last `}`.
pub fn find_object_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&content[start..=end])
}

/// Parse a JSON object out of a raw LLM response.
///
/// # Errors
///
/// - [`ParseError::NoJsonFound`] when neither a fenced block nor a brace span exists.
/// - [`ParseError::MalformedJson`] when the candidate text is not valid JSON.
/// - [`ParseError::NotAnObject`] when the candidate is valid JSON but not an object.
pub fn parse_json_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let candidate = extract_from_json_code_block(raw)
        .or_else(|| find_object_span(raw))
        .ok_or_else(|| ParseError::NoJsonFound {
            raw: raw.to_string(),
        })?;

    let value: Value =
        serde_json::from_str(candidate).map_err(|e| ParseError::MalformedJson {
            message: e.to_string(),
            raw: raw.to_string(),
        })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ParseError::NotAnObject {
            raw: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json() {
        let object = parse_json_object(r#"{"key": "value"}"#).expect("should parse");
        assert_eq!(object["key"], "value");
    }

    #[test]
    fn test_json_code_block() {
        let input = r#"Here is the response:
```json
{"key": "value"}
```
Hope this helps!"#;
        let object = parse_json_object(input).expect("should parse fenced block");
        assert_eq!(object["key"], "value");
    }

    #[test]
    fn test_fenced_bare_and_surrounded_parse_identically() {
        let bare = r#"{"a": 1, "b": [1, 2]}"#;
        let fenced = format!("```json\n{}\n```", bare);
        let surrounded = format!("Sure! {} Let me know.", bare);

        let expected = parse_json_object(bare).expect("bare");
        assert_eq!(parse_json_object(&fenced).expect("fenced"), expected);
        assert_eq!(parse_json_object(&surrounded).expect("surrounded"), expected);
    }

    #[test]
    fn test_fence_takes_priority_over_braces() {
        let input = "Preamble {not json}\n```json\n{\"x\": true}\n```";
        let object = parse_json_object(input).expect("fenced block wins");
        assert_eq!(object["x"], true);
    }

    #[test]
    fn test_nested_json() {
        let input = r#"{"outer": {"inner": "value"}, "list": [1, 2, 3]}"#;
        let object = parse_json_object(input).expect("should parse");
        assert_eq!(object["outer"]["inner"], "value");
    }

    #[test]
    fn test_not_json_at_all() {
        let err = parse_json_object("not json at all").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonFound { .. }));
        assert_eq!(err.raw(), "not json at all");
    }

    #[test]
    fn test_malformed_json_carries_raw() {
        let raw = r#"Result: {"key": "value",}"#;
        let err = parse_json_object(raw).unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson { .. }));
        assert_eq!(err.raw(), raw);
    }

    #[test]
    fn test_array_in_fence_is_not_an_object() {
        let err = parse_json_object("```json\n[1, 2, 3]\n```").unwrap_err();
        assert!(matches!(err, ParseError::NotAnObject { .. }));
    }

    #[test]
    fn test_reversed_braces() {
        let err = parse_json_object("} before {").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonFound { .. }));
    }

    #[test]
    fn test_unclosed_fence_falls_back_to_braces() {
        let input = "```json\n{\"open\": 1}";
        let object = parse_json_object(input).expect("brace span fallback");
        assert_eq!(object["open"], 1);
    }

    #[test]
    fn test_error_preview_is_bounded() {
        let raw = "x".repeat(500);
        let message = parse_json_object(&raw).unwrap_err().to_string();
        assert!(message.len() < 300);
    }
}
