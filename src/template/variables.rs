//! Placeholder discovery for prompt templates.
//!
//! A template variable is written as `[NAME]`. Names are case-sensitive and
//! may contain spaces or punctuation, but never brackets. For nested brackets
//! the innermost content wins, so `[[X]]` yields `X`.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

fn placeholder_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\[\]]+)\]").ok()).as_ref()
}

/// A single placeholder occurrence in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Variable name without brackets.
    pub name: &'a str,
    /// Byte span of the bracketed token, brackets included.
    pub span: Range<usize>,
}

/// Find every placeholder occurrence in template order.
pub fn placeholders(template: &str) -> Vec<Placeholder<'_>> {
    let Some(re) = placeholder_regex() else {
        return Vec::new();
    };
    re.captures_iter(template)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some(Placeholder {
                name: name.as_str(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Extract the distinct variable names used by a template.
pub fn extract_variables(template: &str) -> BTreeSet<String> {
    placeholders(template)
        .into_iter()
        .map(|p| p.name.to_string())
        .collect()
}

/// Render a variable name as its bracketed placeholder token.
pub fn placeholder_token(name: &str) -> String {
    format!("[{}]", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_simple_variables() {
        let vars = extract_variables("A [SUBJECT] in [STYLE] style, lit by [LIGHTING]");
        assert_eq!(vars, set(&["SUBJECT", "STYLE", "LIGHTING"]));
    }

    #[test]
    fn test_duplicates_collapse() {
        let vars = extract_variables("[A] and [A] and [B]");
        assert_eq!(vars, set(&["A", "B"]));
    }

    #[test]
    fn test_case_sensitive() {
        let vars = extract_variables("[Subject] [SUBJECT]");
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_nested_brackets_match_innermost() {
        assert_eq!(extract_variables("[[X]]"), set(&["X"]));
    }

    #[test]
    fn test_empty_brackets_ignored() {
        assert!(extract_variables("nothing [] here").is_empty());
        assert!(extract_variables("no placeholders").is_empty());
    }

    #[test]
    fn test_names_with_spaces() {
        assert_eq!(extract_variables("a [main subject]"), set(&["main subject"]));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let template = "A [SUBJECT] with [MOOD] under [SKY]";
        let once = extract_variables(template);
        let rebuilt: String = once
            .iter()
            .map(|v| placeholder_token(v))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(extract_variables(&rebuilt), once);
    }

    #[test]
    fn test_placeholder_spans() {
        let found = placeholders("x [A] y [B]");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "A");
        assert_eq!(found[0].span, 2..5);
        assert_eq!(found[1].span, 8..11);
    }
}
