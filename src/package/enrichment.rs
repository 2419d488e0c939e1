//! Optional enrichments attached to a package by later stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Example;

/// Marketplace title check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleValidation {
    /// True when no issue was found.
    pub is_valid: bool,
    /// Machine-readable issue codes.
    pub issues: Vec<TitleIssue>,
    /// Word count of the cleaned title.
    pub word_count: usize,
    /// Whether a known descriptor word appears.
    pub has_descriptor: bool,
    /// Whether a known format/type word appears.
    pub has_format_type: bool,
    /// Score in `0.0..=1.0`.
    pub score: f64,
    /// Human suggestions, one per issue.
    pub suggestions: Vec<String>,
    /// The title as given.
    pub original_title: String,
}

/// Title issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleIssue {
    TooShort,
    TooLong,
    MissingDescriptor,
    MissingFormatType,
}

impl TitleIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleIssue::TooShort => "too_short",
            TitleIssue::TooLong => "too_long",
            TitleIssue::MissingDescriptor => "missing_descriptor",
            TitleIssue::MissingFormatType => "missing_format_type",
        }
    }
}

impl std::fmt::Display for TitleIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Testing guide shipped with a package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestGuidance {
    pub test_instructions: Vec<String>,
    pub quality_checklist: Vec<String>,
    pub common_issues: Vec<String>,
}

/// The model's critique of its own reverse-engineered template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelfEvaluation {
    /// Overall score on a 0-10 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    /// Remaining fields as returned by the model.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Copy-paste block for marketplace submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptbaseReady {
    pub title: String,
    pub description: String,
    pub template: String,
    pub example_prompts: Vec<Example>,
}

/// Variable values recovered from one example.
pub type QuickCopyExample = BTreeMap<String, String>;
