//! Quick-copy post-processing for marketplace submission.
//!
//! Recovers the variable values used by each example and builds the
//! `promptbase_ready` block a seller pastes into the listing form.

use crate::agents::VariableExtractorAgent;
use crate::package::{Example, PromptPackage, PromptbaseReady, QuickCopyExample, FULL_PACKAGE_EXAMPLES};
use crate::template::fallback_extract_values;

/// Marketplace minimum for template variables.
pub const MIN_MARKETPLACE_VARIABLES: usize = 4;

/// What post-processing did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickCopySummary {
    /// Examples with at least one recovered value.
    pub extracted: usize,
    /// Values recovered by the model rather than the regex fallback.
    pub model_extracted: usize,
    /// The template has fewer variables than the marketplace accepts.
    pub low_variable_count: bool,
    /// Nothing to do: no examples or no variables.
    pub skipped: bool,
}

async fn example_values(
    package: &PromptPackage,
    example: &Example,
    extractor: Option<&VariableExtractorAgent>,
) -> (QuickCopyExample, bool) {
    match example {
        Example::Structured { variables, .. } if !variables.is_empty() => (
            variables
                .iter()
                .filter(|(name, value)| package.variables().contains(*name) && !value.trim().is_empty())
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            false,
        ),
        _ => {
            if let Some(extractor) = extractor {
                let values = extractor.extract(package.variables(), example.text()).await;
                if !values.is_empty() {
                    return (values, true);
                }
            }
            (
                fallback_extract_values(package.template(), package.variables(), example.text()),
                false,
            )
        }
    }
}

/// Add `quick_copy_examples` and `promptbase_ready` to a package.
///
/// With an extractor ("smart" mode) text examples are sent to the model
/// first; the regex fallback is used whenever it returns nothing.
pub async fn add_quick_copy(
    package: &mut PromptPackage,
    extractor: Option<&VariableExtractorAgent>,
) -> QuickCopySummary {
    let mut summary = QuickCopySummary::default();
    if package.examples.is_empty() || package.variables().is_empty() {
        summary.skipped = true;
        return summary;
    }

    let mut quick_copy = Vec::new();
    for example in &package.examples {
        let (values, from_model) = example_values(package, example, extractor).await;
        if values.is_empty() {
            continue;
        }
        if from_model {
            summary.model_extracted += 1;
        }
        quick_copy.push(values);
    }
    summary.extracted = quick_copy.len();

    let variable_count = package.variables().len();
    if variable_count < MIN_MARKETPLACE_VARIABLES {
        summary.low_variable_count = true;
        tracing::warn!(
            variables = variable_count,
            minimum = MIN_MARKETPLACE_VARIABLES,
            "Template has fewer variables than the marketplace minimum"
        );
    }

    package.quick_copy_examples = Some(quick_copy);
    package.promptbase_ready = Some(PromptbaseReady {
        title: package.topic.clone(),
        description: package
            .commercial_description
            .clone()
            .unwrap_or_else(|| package.description.clone()),
        template: package.template().to_string(),
        example_prompts: package
            .examples
            .iter()
            .take(FULL_PACKAGE_EXAMPLES)
            .cloned()
            .collect(),
    });

    summary
}
