//! Format-string rendering for configured instruction templates.
//!
//! Instruction templates use the `{name}` placeholder syntax, with `{{` and
//! `}}` as escapes for literal braces. Brace content that is not a bare
//! identifier (such as an inline JSON example) is copied through unchanged,
//! so prompt authors rarely need to escape anything.

use crate::prompts::ConfigError;

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render a named instruction template with the given values.
///
/// Values not referenced by the template are ignored.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownPlaceholder`] when the template references an
/// identifier placeholder that has no value.
pub fn render(
    template_key: &str,
    template: &str,
    values: &[(&str, &str)],
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(idx) = rest.find(|c| c == '{' || c == '}') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('{') {
            if let Some(close) = tail[1..].find('}') {
                let inner = &tail[1..1 + close];
                if is_identifier(inner) {
                    let value = values
                        .iter()
                        .find(|(name, _)| *name == inner)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| ConfigError::UnknownPlaceholder {
                            template: template_key.to_string(),
                            placeholder: inner.to_string(),
                        })?;
                    out.push_str(value);
                    rest = &tail[close + 2..];
                    continue;
                }
            }
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Collect the identifier placeholders referenced by a template, in order.
pub fn referenced_placeholders(template: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(idx) = rest.find(|c| c == '{' || c == '}') {
        let tail = &rest[idx..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('{') {
            if let Some(close) = tail[1..].find('}') {
                let inner = &tail[1..1 + close];
                if is_identifier(inner) {
                    if !found.iter().any(|f| f == inner) {
                        found.push(inner.to_string());
                    }
                    rest = &tail[close + 2..];
                    continue;
                }
            }
        }
        rest = &tail[1..];
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_substitution() {
        let out = render("k", "Topic: {topic}, style {style}.", &[("topic", "cats"), ("style", "noir")])
            .expect("should render");
        assert_eq!(out, "Topic: cats, style noir.");
    }

    #[test]
    fn test_escaped_braces() {
        let out = render("k", "Return {{\"title\": \"{topic}\"}}", &[("topic", "x")])
            .expect("should render");
        assert_eq!(out, "Return {\"title\": \"x\"}");
    }

    #[test]
    fn test_unknown_placeholder_is_an_error() {
        let err = render("agent_x", "Hello {missing}", &[]).unwrap_err();
        match err {
            ConfigError::UnknownPlaceholder {
                template,
                placeholder,
            } => {
                assert_eq!(template, "agent_x");
                assert_eq!(placeholder, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_identifier_braces_copied_literally() {
        let template = "Output as JSON: {\"a\": 1, \"b\": [2]} for {topic}";
        let out = render("k", template, &[("topic", "t")]).expect("should render");
        assert_eq!(out, "Output as JSON: {\"a\": 1, \"b\": [2]} for t");
    }

    #[test]
    fn test_unbalanced_braces() {
        let out = render("k", "open { only and close } only", &[]).expect("should render");
        assert_eq!(out, "open { only and close } only");
    }

    #[test]
    fn test_extra_values_ignored() {
        let out = render("k", "plain", &[("unused", "v")]).expect("should render");
        assert_eq!(out, "plain");
    }

    #[test]
    fn test_value_braces_not_reinterpreted() {
        let out = render("k", "{a}", &[("a", "{b}")]).expect("should render");
        assert_eq!(out, "{b}");
    }

    #[test]
    fn test_referenced_placeholders() {
        let found = referenced_placeholders("{a} {{b}} {c} {\"json\": 1} {a}");
        assert_eq!(found, vec!["a".to_string(), "c".to_string()]);
    }
}
