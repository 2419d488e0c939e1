//! Heuristic scoring of generated examples.
//!
//! Each example starts at 10 points and loses points for generic filler
//! terms, unfilled placeholders, bad length, near-duplicates of earlier
//! examples, and repeated words. The score is not clamped and is meant as a
//! diagnostic signal, not a gate.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::package::Example;
use crate::template::placeholder_token;

/// Starting score for every example.
pub const BASE_SCORE: i32 = 10;

/// Similarity above which an example counts as a near-duplicate.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

const MIN_WORDS: usize = 10;
const MAX_WORDS: usize = 100;
const MAX_GENERIC_PENALTY: i32 = 5;
const MAX_SIMILARITY_PENALTY: i32 = 4;
const MAX_REPETITION_PENALTY: i32 = 3;

/// Filler terms that make an example read as generic AI output.
pub const GENERIC_AI_TERMS: &[&str] = &[
    "beautiful",
    "stunning",
    "amazing",
    "high quality",
    "high-quality",
    "detailed",
    "intricate",
    "professional",
    "perfect",
    "exquisite",
    "4k",
    "8k",
    "ultra hd",
    "ultra-detailed",
    "masterpiece",
    "trending on artstation",
    "award winning",
    "breathtaking",
    "photorealistic",
    "hyperrealistic",
    "cinematic",
];

/// Diagnostic result for one example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleValidationResult {
    /// Zero-based position in the batch.
    pub index: usize,
    /// The example text that was checked.
    pub example: String,
    /// Human-readable findings.
    pub issues: Vec<String>,
    /// Remaining score; may be negative.
    pub score: i32,
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Jaccard similarity of the lowercase whitespace-separated word sets.
///
/// Symmetric; identical inputs (including two empty inputs) score 1.0.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let set_a = word_set(a);
    let set_b = word_set(b);

    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

fn repetitive_words(text: &str) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    // raw tokens, punctuation included, like `word_set`
    for word in text.split_whitespace().map(str::to_lowercase) {
        if word.chars().count() > 3 {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut repeated: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 2)
        .map(|(word, _)| word)
        .collect();
    repeated.sort();
    repeated
}

/// Score a batch of example texts against the template variables.
///
/// Similarity is only checked against earlier examples, so the result
/// depends on input order.
pub fn validate_texts(examples: &[&str], variables: &BTreeSet<String>) -> Vec<ExampleValidationResult> {
    let mut results = Vec::with_capacity(examples.len());

    for (index, example) in examples.iter().enumerate() {
        let mut issues = Vec::new();
        let mut score = BASE_SCORE;
        let lower = example.to_lowercase();

        let generic: Vec<&str> = GENERIC_AI_TERMS
            .iter()
            .copied()
            .filter(|term| lower.contains(term))
            .collect();
        for term in &generic {
            issues.push(format!("Generic AI term: '{}'", term));
        }
        score -= (generic.len() as i32).min(MAX_GENERIC_PENALTY);

        for variable in variables {
            let token = placeholder_token(variable);
            if example.contains(&token) {
                issues.push(format!("Unfilled variable: {}", token));
                score -= 2;
            }
        }

        let word_count = example.split_whitespace().count();
        if word_count < MIN_WORDS {
            issues.push("Example too short".to_string());
            score -= 2;
        } else if word_count > MAX_WORDS {
            issues.push("Example excessively long".to_string());
            score -= 1;
        }

        for (earlier_index, earlier) in examples[..index].iter().enumerate() {
            let similarity = jaccard_similarity(example, earlier);
            if similarity > SIMILARITY_THRESHOLD {
                issues.push(format!(
                    "Too similar to example {} (similarity {:.2})",
                    earlier_index + 1,
                    similarity
                ));
                score -= ((similarity * 6.0).floor() as i32).min(MAX_SIMILARITY_PENALTY);
            }
        }

        let repeated = repetitive_words(example);
        if !repeated.is_empty() {
            issues.push(format!("Repetitive words: {}", repeated.join(", ")));
            score -= (repeated.len() as i32).min(MAX_REPETITION_PENALTY);
        }

        results.push(ExampleValidationResult {
            index,
            example: example.to_string(),
            issues,
            score,
        });
    }

    results
}

/// Score package examples against the template variables.
pub fn validate_examples(
    examples: &[Example],
    variables: &BTreeSet<String>,
) -> Vec<ExampleValidationResult> {
    let texts: Vec<&str> = examples.iter().map(Example::text).collect();
    validate_texts(&texts, variables)
}

/// Mean score of a validation batch, or `None` for an empty batch.
pub fn average_score(results: &[ExampleValidationResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    let total: i32 = results.iter().map(|r| r.score).sum();
    Some(total as f64 / results.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str =
        "A lighthouse keeper feeding gulls on a windswept pier during a grey autumn morning";

    fn no_vars() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn test_clean_example_keeps_full_score() {
        let results = validate_texts(&[CLEAN], &no_vars());
        assert_eq!(results[0].score, BASE_SCORE);
        assert!(results[0].issues.is_empty());
    }

    #[test]
    fn test_generic_terms_penalized_and_capped() {
        let text = format!("{} beautiful stunning amazing detailed intricate perfect 4k", CLEAN);
        let results = validate_texts(&[text.as_str()], &no_vars());
        assert_eq!(results[0].score, BASE_SCORE - 5);
        assert_eq!(
            results[0]
                .issues
                .iter()
                .filter(|i| i.starts_with("Generic AI term"))
                .count(),
            7
        );
    }

    #[test]
    fn test_appending_generic_terms_never_raises_score() {
        let base = validate_texts(&[CLEAN], &no_vars())[0].score;
        let mut text = CLEAN.to_string();
        let mut previous = base;
        for term in ["masterpiece", "breathtaking", "photorealistic"] {
            text.push(' ');
            text.push_str(term);
            let score = validate_texts(&[text.as_str()], &no_vars())[0].score;
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn test_unfilled_variable() {
        let vars: BTreeSet<String> = ["SUBJECT".to_string()].into_iter().collect();
        let text = "A lighthouse keeper feeding [SUBJECT] on a windswept pier in grey autumn light";
        let results = validate_texts(&[text], &vars);
        assert_eq!(results[0].score, BASE_SCORE - 2);
        assert!(results[0].issues[0].contains("[SUBJECT]"));
    }

    #[test]
    fn test_length_checks() {
        let short = validate_texts(&["Too short"], &no_vars());
        assert_eq!(short[0].score, BASE_SCORE - 2);
        assert_eq!(short[0].issues, vec!["Example too short".to_string()]);

        let long_text = (0..120).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let long = validate_texts(&[long_text.as_str()], &no_vars());
        assert_eq!(long[0].score, BASE_SCORE - 1);
    }

    #[test]
    fn test_similarity_checked_against_earlier_only() {
        let results = validate_texts(&[CLEAN, CLEAN], &no_vars());
        assert_eq!(results[0].score, BASE_SCORE);
        // identical text: similarity 1.0, penalty min(4, 6)
        assert_eq!(results[1].score, BASE_SCORE - 4);
        assert!(results[1].issues[0].contains("example 1"));
        assert!(results[1].issues[0].contains("1.00"));
    }

    #[test]
    fn test_repetitive_words() {
        let text = "storm storm storm over the harbour while sailors watch every storm wave rolling";
        let results = validate_texts(&[text], &no_vars());
        assert_eq!(results[0].score, BASE_SCORE - 1);
        assert!(results[0].issues[0].contains("storm"));
    }

    #[test]
    fn test_repetition_counts_tokens_with_punctuation() {
        let text = "storm storm, storm. over the harbour while sailors watch the grey wave rolling";
        let results = validate_texts(&[text], &no_vars());
        assert_eq!(results[0].score, BASE_SCORE);
        assert!(results[0].issues.is_empty());
    }

    #[test]
    fn test_score_not_clamped() {
        let text = "[A] [B] [C] [D] [E] [F]";
        let vars: BTreeSet<String> = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let results = validate_texts(&[text], &vars);
        assert!(results[0].score < 0);
    }

    #[test]
    fn test_jaccard_properties() {
        let a = "red fox in snow";
        let b = "blue fox on snow";
        assert_eq!(jaccard_similarity(a, b), jaccard_similarity(b, a));
        assert_eq!(jaccard_similarity(a, a), 1.0);
        assert_eq!(jaccard_similarity("", ""), 1.0);
        assert_eq!(jaccard_similarity("a", ""), 0.0);
        assert!((jaccard_similarity(a, b) - 2.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_package_examples() {
        let examples = vec![Example::from(CLEAN), Example::Structured {
            variables: Default::default(),
            prompt: "Short one".to_string(),
        }];
        let results = validate_examples(&examples, &no_vars());
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].example, "Short one");
        assert_eq!(average_score(&results), Some(9.0));
        assert_eq!(average_score(&[]), None);
    }
}
