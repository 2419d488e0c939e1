//! Example Agent: generates and maintains filled example prompts.
//!
//! None of these operations touch the template. Existing examples are sent
//! back to the model as negative context so new ones differ from them.

use std::collections::BTreeSet;

use super::context::AgentContext;
use super::error::{AgentError, AgentResult};
use super::fields::{examples_field, string_field};
use crate::package::{Example, PromptPackage};
use crate::template::ContractViolation;

/// Maintenance operations on a package's example list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleAction {
    /// Add examples until the list holds `target_total`.
    Complete { target_total: usize },
    /// Replace the example at `index` with a fresh one.
    RegenerateOne { index: usize },
}

/// Example Agent for example generation and maintenance.
pub struct ExampleAgent {
    context: AgentContext,
}

impl std::fmt::Debug for ExampleAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExampleAgent").finish_non_exhaustive()
    }
}

fn variables_text(variables: &BTreeSet<String>) -> String {
    variables
        .iter()
        .map(|v| format!("[{}]", v))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ExampleAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "examples";

    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    /// Ask for exactly `count` structured examples.
    ///
    /// The parsed list is returned as is; a different count is logged as a
    /// contract violation but not corrected here.
    pub async fn generate(
        &self,
        template: &str,
        variables: &BTreeSet<String>,
        count: usize,
    ) -> AgentResult<Vec<Example>> {
        tracing::info!(agent = Self::AGENT_NAME, count, "Generating examples");

        let num_examples = count.to_string();
        let variables = variables_text(variables);
        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "agent_generate_examples",
                &[
                    ("num_examples", num_examples.as_str()),
                    ("prompt_template", template),
                    ("variables", variables.as_str()),
                ],
                None,
            )
            .await?;

        let examples = examples_field(&object, &["examples", "example_prompts"]);
        if examples.len() != count {
            let violation = ContractViolation::ExampleCount {
                expected: count,
                produced: examples.len(),
            };
            tracing::warn!(agent = Self::AGENT_NAME, %violation, "Unexpected example count");
        }
        Ok(examples)
    }

    /// Apply a maintenance action and return the new example list.
    ///
    /// # Errors
    ///
    /// - `AgentError::InvalidArgument` for an out-of-range index (no call made).
    /// - `AgentError::MissingField` when the replacement is empty.
    pub async fn manage(
        &self,
        package: &PromptPackage,
        action: ExampleAction,
    ) -> AgentResult<Vec<Example>> {
        match action {
            ExampleAction::Complete { target_total } => {
                self.complete_examples(package, target_total).await
            }
            ExampleAction::RegenerateOne { index } => self.regenerate_one(package, index).await,
        }
    }

    async fn complete_examples(
        &self,
        package: &PromptPackage,
        target_total: usize,
    ) -> AgentResult<Vec<Example>> {
        let mut examples = package.examples.clone();
        if examples.len() >= target_total {
            tracing::debug!(agent = Self::AGENT_NAME, "Example list already complete");
            return Ok(examples);
        }

        let missing = target_total - examples.len();
        tracing::info!(agent = Self::AGENT_NAME, missing, "Completing examples");

        let count = missing.to_string();
        let variables = package.variables_text();
        let existing = package.examples_json();
        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "agent_complete_examples",
                &[
                    ("count", count.as_str()),
                    ("prompt_template", package.template()),
                    ("variables", variables.as_str()),
                    ("existing_examples", existing.as_str()),
                ],
                None,
            )
            .await?;

        let new_examples = examples_field(&object, &["new_examples", "examples"]);
        examples.extend(new_examples.into_iter().take(missing));
        Ok(examples)
    }

    async fn regenerate_one(&self, package: &PromptPackage, index: usize) -> AgentResult<Vec<Example>> {
        let Some(target) = package.examples.get(index) else {
            return Err(AgentError::InvalidArgument(format!(
                "example index {} out of range for {} examples",
                index,
                package.examples.len()
            )));
        };
        tracing::info!(agent = Self::AGENT_NAME, index, "Regenerating example");

        let existing = package.examples_json();
        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "agent_regenerate_example",
                &[
                    ("prompt_template", package.template()),
                    ("existing_examples", existing.as_str()),
                    ("example_to_replace", target.text()),
                ],
                None,
            )
            .await?;

        let replacement = string_field(&object, &["new_example", "example"])
            .ok_or_else(|| AgentError::MissingField("new_example".to_string()))?;

        let mut examples = package.examples.clone();
        examples[index] = Example::Text(replacement);
        Ok(examples)
    }
}
