//! Enhancer Agent: model-backed marketplace fixes.
//!
//! Title fixing always produces a title: when the model cannot help, the
//! deterministic [`simple_title_fix`] is used. Abstract example injection
//! returns the new examples for the caller to merge.

use serde::{Deserialize, Serialize};

use super::context::AgentContext;
use super::error::{AgentError, AgentResult};
use super::fields::{examples_field, string_field};
use crate::package::{Example, PromptPackage, TitleValidation};
use crate::quality::title::{simple_title_fix, validate_title, DESCRIPTORS, FORMAT_TYPES};

/// How a title was fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleFixMethod {
    Model,
    Fallback,
}

/// A repaired title and its validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleFix {
    pub title: String,
    pub method: TitleFixMethod,
    pub validation: TitleValidation,
}

/// Enhancer Agent.
pub struct EnhancerAgent {
    context: AgentContext,
}

impl std::fmt::Debug for EnhancerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancerAgent").finish_non_exhaustive()
    }
}

impl EnhancerAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "enhancer";

    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    /// Fix a package title to the marketplace pattern.
    pub async fn fix_title(&self, package: &PromptPackage) -> TitleFix {
        let validation = validate_title(&package.topic);

        match self.model_title_fix(package, &validation).await {
            Ok(title) => {
                let validation = validate_title(&title);
                tracing::info!(
                    agent = Self::AGENT_NAME,
                    from = %package.topic,
                    to = %title,
                    "Title fixed"
                );
                TitleFix {
                    title,
                    method: TitleFixMethod::Model,
                    validation,
                }
            }
            Err(err) => {
                let title = simple_title_fix(&package.topic);
                tracing::warn!(
                    agent = Self::AGENT_NAME,
                    error = %err,
                    fallback = %title,
                    "Title fix failed, using fallback"
                );
                TitleFix {
                    validation: validate_title(&title),
                    title,
                    method: TitleFixMethod::Fallback,
                }
            }
        }
    }

    async fn model_title_fix(
        &self,
        package: &PromptPackage,
        validation: &TitleValidation,
    ) -> AgentResult<String> {
        let issues = validation
            .issues
            .iter()
            .map(|i| i.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let context = format!(
            "CONTEXT: {} template for {}. Template: {}",
            package.content_type,
            package.platform,
            package.template()
        );
        let descriptors = DESCRIPTORS[..10].join(", ");
        let format_types = FORMAT_TYPES[..10].join(", ");

        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "title_fix_prompt",
                &[
                    ("title", package.topic.as_str()),
                    ("issues", issues.as_str()),
                    ("context", context.as_str()),
                    ("descriptors", descriptors.as_str()),
                    ("format_types", format_types.as_str()),
                ],
                None,
            )
            .await?;

        string_field(&object, &["fixed_title", "title"])
            .map(|t| t.trim_matches('"').trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AgentError::MissingField("fixed_title".to_string()))
    }

    /// Ask for `count` abstract, mood-driven examples.
    pub async fn inject_abstract_examples(
        &self,
        package: &PromptPackage,
        count: usize,
    ) -> AgentResult<Vec<Example>> {
        tracing::info!(agent = Self::AGENT_NAME, count, "Requesting abstract examples");

        let count_text = count.to_string();
        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "abstract_examples_prompt",
                &[
                    ("count", count_text.as_str()),
                    ("prompt_template", package.template()),
                    ("topic", package.topic.as_str()),
                ],
                None,
            )
            .await?;

        let mut examples = examples_field(&object, &["abstract_examples", "examples"]);
        examples.truncate(count);
        if examples.is_empty() {
            return Err(AgentError::MissingField("abstract_examples".to_string()));
        }
        Ok(examples)
    }
}
