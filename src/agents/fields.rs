//! Alias-aware field readers for parsed model answers.
//!
//! Models name the same field differently depending on the instruction
//! (`technical_tips` for images, `writing_strategy` for text, ...). Each
//! reader takes the list of accepted names and returns the first present,
//! non-null value.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::package::{as_string_list, as_string_map, Example};

/// Names under which tips are returned.
pub const TIPS_ALIASES: &[&str] = &["technical_tips", "writing_strategy", "video_techniques", "tips"];

/// Names under which variable explanations are returned.
pub const EXPLANATION_ALIASES: &[&str] = &["variables_explanation", "variable_explanations"];

/// Names under which example lists are returned.
pub const EXAMPLE_ALIASES: &[&str] = &["example_prompts", "examples"];

/// First non-null value among `aliases`.
pub fn first_field<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| object.get(*alias))
        .find(|value| !value.is_null())
}

/// Non-empty trimmed string field.
pub fn string_field(object: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    first_field(object, aliases)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String or list-of-strings field; lists are joined with `", "`.
pub fn joined_string_field(object: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    match first_field(object, aliases)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        list @ Value::Array(_) => {
            let items = as_string_list(list);
            (!items.is_empty()).then(|| items.join(", "))
        }
        _ => None,
    }
}

/// List of strings; a single string counts as a one-item list.
pub fn string_list_field(object: &Map<String, Value>, aliases: &[&str]) -> Vec<String> {
    first_field(object, aliases)
        .map(as_string_list)
        .unwrap_or_default()
}

/// String map with scalar values stringified.
pub fn string_map_field(object: &Map<String, Value>, aliases: &[&str]) -> BTreeMap<String, String> {
    first_field(object, aliases)
        .map(as_string_map)
        .unwrap_or_default()
}

/// Example list in either accepted shape.
pub fn examples_field(object: &Map<String, Value>, aliases: &[&str]) -> Vec<Example> {
    first_field(object, aliases)
        .map(Example::list_from_value)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_first_alias_wins_and_nulls_skipped() {
        let obj = object(json!({"technical_tips": null, "writing_strategy": ["a"], "tips": ["b"]}));
        assert_eq!(string_list_field(&obj, TIPS_ALIASES), vec!["a".to_string()]);
    }

    #[test]
    fn test_joined_string_field() {
        let obj = object(json!({"style": ["noir", "grainy"]}));
        assert_eq!(joined_string_field(&obj, &["style"]).as_deref(), Some("noir, grainy"));
        let obj = object(json!({"style": "  soft  "}));
        assert_eq!(joined_string_field(&obj, &["style"]).as_deref(), Some("soft"));
        let obj = object(json!({"style": 3}));
        assert_eq!(joined_string_field(&obj, &["style"]), None);
    }

    #[test]
    fn test_string_field_rejects_blank() {
        let obj = object(json!({"template": "   "}));
        assert_eq!(string_field(&obj, &["template"]), None);
    }

    #[test]
    fn test_examples_field_mixed() {
        let obj = object(json!({"examples": ["one", {"variables": {"A": "x"}, "prompt": "two"}, 7]}));
        let examples = examples_field(&obj, EXAMPLE_ALIASES);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1].text(), "two");
    }
}
