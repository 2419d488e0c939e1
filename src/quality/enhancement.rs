//! Package-level marketplace checks that run after generation.
//!
//! These are the non-LLM halves of the quality enhancement stage: counting
//! examples, spotting abstract (mood-driven) examples, and summarising a
//! batch of enhanced packages. The LLM-backed fixes live in
//! [`crate::agents::enhancer`].

use serde::{Deserialize, Serialize};

use crate::package::{Example, PromptPackage};

pub const MIN_EXAMPLES: usize = 8;
pub const RECOMMENDED_EXAMPLES: usize = 9;
pub const MIN_ABSTRACT_EXAMPLES: usize = 2;

/// Phrases that mark an example as abstract or conceptual.
pub const ABSTRACT_KEYWORDS: &[&str] = &[
    "sense of",
    "feeling of",
    "essence of",
    "weight of",
    "spirit of",
    "melancholic",
    "ethereal",
    "transcendent",
    "ephemeral",
    "nostalgic",
    "forgotten",
    "oppressive",
    "liberating",
    "haunting",
    "evocative",
    "abstract",
    "conceptual",
    "mood",
    "atmosphere",
    "emotion",
];

/// Result of the example count check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleCountCheck {
    pub is_valid: bool,
    pub current_count: usize,
    pub required_count: usize,
    pub recommended_count: usize,
    /// Missing examples; zero when the minimum is met.
    pub deficit: usize,
}

/// Count usable examples against the marketplace minimum.
pub fn check_example_count(package: &PromptPackage) -> ExampleCountCheck {
    let current_count = package.examples.iter().filter(|e| !e.is_empty()).count();
    ExampleCountCheck {
        is_valid: current_count >= MIN_EXAMPLES,
        current_count,
        required_count: MIN_EXAMPLES,
        recommended_count: RECOMMENDED_EXAMPLES,
        deficit: MIN_EXAMPLES.saturating_sub(current_count),
    }
}

/// Result of the abstract example check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractCheck {
    pub has_abstract: bool,
    pub abstract_count: usize,
    pub abstract_indices: Vec<usize>,
    pub required_count: usize,
}

fn example_search_text(example: &Example) -> String {
    match example {
        Example::Text(text) => text.to_lowercase(),
        Example::Structured { variables, prompt } => {
            if prompt.trim().is_empty() {
                variables
                    .values()
                    .map(|v| v.to_lowercase())
                    .collect::<Vec<_>>()
                    .join(" ")
            } else {
                prompt.to_lowercase()
            }
        }
    }
}

/// Whether an example reads as abstract or mood-driven.
pub fn is_abstract_example(example: &Example) -> bool {
    let text = example_search_text(example);
    ABSTRACT_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// Find the abstract examples in a package.
pub fn check_abstract_examples(package: &PromptPackage) -> AbstractCheck {
    let abstract_indices: Vec<usize> = package
        .examples
        .iter()
        .enumerate()
        .filter(|(_, example)| is_abstract_example(example))
        .map(|(index, _)| index)
        .collect();

    AbstractCheck {
        has_abstract: abstract_indices.len() >= MIN_ABSTRACT_EXAMPLES,
        abstract_count: abstract_indices.len(),
        abstract_indices,
        required_count: MIN_ABSTRACT_EXAMPLES,
    }
}

/// Summary counters over a batch of enhanced packages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementStats {
    pub total: usize,
    pub titles_fixed: usize,
    pub examples_flagged: usize,
    pub abstract_injected: usize,
}

impl EnhancementStats {
    /// Count one enhanced package.
    pub fn record(&mut self, package: &PromptPackage) {
        self.total += 1;
        if package.original_topic.is_some() {
            self.titles_fixed += 1;
        }
        if package.needs_more_examples.is_some_and(|n| n > 0) {
            self.examples_flagged += 1;
        }
        if package.abstract_examples_injected.is_some_and(|n| n > 0) {
            self.abstract_injected += 1;
        }
    }
}
