//! Regex fallback for recovering variable values from a filled example.
//!
//! Given a template such as `A [SUBJECT] in [STYLE] style` and a filled
//! example `A dragon in watercolor style`, each variable's value is located
//! by the literal template text around its placeholder. The flank before a
//! placeholder is at most [`BEFORE_FLANK_CHARS`] characters, the flank after
//! it at most [`AFTER_FLANK_CHARS`], and both stop at neighbouring
//! placeholders. Matching is case-insensitive and whitespace-tolerant.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use super::variables::{placeholder_token, placeholders, Placeholder};

/// Maximum characters of literal text used before a placeholder.
pub const BEFORE_FLANK_CHARS: usize = 30;
/// Maximum characters of literal text used after a placeholder.
pub const AFTER_FLANK_CHARS: usize = 15;

fn last_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let skip = count - n;
    match s.char_indices().nth(skip) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

fn first_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Escape literal text for a regex, letting any whitespace run match `\s+`.
fn flank_pattern(flank: &str) -> String {
    let mut pattern = String::new();
    let mut in_space = false;
    let mut word = String::new();

    for c in flank.chars() {
        if c.is_whitespace() {
            if !word.is_empty() {
                pattern.push_str(&regex::escape(&word));
                word.clear();
            }
            if !in_space {
                pattern.push_str(r"\s+");
                in_space = true;
            }
        } else {
            in_space = false;
            word.push(c);
        }
    }
    if !word.is_empty() {
        pattern.push_str(&regex::escape(&word));
    }
    pattern
}

fn clean_value(raw: &str) -> Option<String> {
    let value = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn build_pattern(template: &str, all: &[Placeholder<'_>], position: usize) -> Option<String> {
    let current = &all[position];

    let before_start = if position == 0 {
        0
    } else {
        all[position - 1].span.end
    };
    let after_end = all
        .get(position + 1)
        .map(|next| next.span.start)
        .unwrap_or(template.len());

    let before_full = &template[before_start..current.span.start];
    let after_full = &template[current.span.end..after_end];

    let before = last_chars(before_full, BEFORE_FLANK_CHARS);
    let after = first_chars(after_full, AFTER_FLANK_CHARS);

    let at_template_start = before_start == 0 && before.len() == before_full.len();
    let at_template_end = after_end == template.len() && after.len() == after_full.len();

    // Adjacent placeholders cannot be told apart.
    if (before.is_empty() && !at_template_start) || (after.is_empty() && !at_template_end) {
        return None;
    }

    let mut pattern = String::from("(?is)");
    if at_template_start {
        pattern.push('^');
        pattern.push_str(r"\s*");
    }
    pattern.push_str(&flank_pattern(before));
    pattern.push_str("(.+?)");
    pattern.push_str(&flank_pattern(after));
    if at_template_end {
        pattern.push_str(r"\s*$");
    }
    Some(pattern)
}

/// Recover variable values from a filled example using template flanks.
///
/// Variables whose value cannot be located are omitted. Never panics.
pub fn fallback_extract_values(
    template: &str,
    variables: &BTreeSet<String>,
    example: &str,
) -> BTreeMap<String, String> {
    let all = placeholders(template);
    let mut extracted = BTreeMap::new();

    for variable in variables {
        let token = placeholder_token(variable);
        let Some(position) = all
            .iter()
            .position(|p| &template[p.span.clone()] == token)
        else {
            continue;
        };

        let Some(pattern) = build_pattern(template, &all, position) else {
            tracing::debug!(variable = %variable, "Adjacent placeholders, skipping fallback extraction");
            continue;
        };

        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };

        if let Some(value) = re
            .captures(example.trim())
            .and_then(|caps| caps.get(1))
            .and_then(|m| clean_value(m.as_str()))
        {
            extracted.insert(variable.clone(), value);
        }
    }

    extracted
}
