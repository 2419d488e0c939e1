//! Categorizer Agent: assigns one marketplace category.
//!
//! The model answers in free text; the first configured category whose
//! lowercase name appears in the lowercase answer wins.

use super::context::AgentContext;
use super::error::AgentResult;
use crate::package::PromptPackage;

/// Category used when nothing matches.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Pick the first category mentioned in `response`.
pub fn match_category(response: &str, categories: &[String]) -> Option<String> {
    let lower = response.to_lowercase();
    categories
        .iter()
        .find(|category| lower.contains(&category.to_lowercase()))
        .cloned()
}

/// Categorizer Agent.
pub struct CategorizerAgent {
    context: AgentContext,
}

impl std::fmt::Debug for CategorizerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategorizerAgent").finish_non_exhaustive()
    }
}

impl CategorizerAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "categorizer";

    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    /// Categorize a package.
    ///
    /// With no configured categories this returns [`UNCATEGORIZED`] without
    /// calling the model.
    pub async fn categorize(&self, package: &PromptPackage) -> AgentResult<String> {
        let categories = self.context.prompts().categories();
        if categories.is_empty() {
            tracing::warn!(agent = Self::AGENT_NAME, "No categories configured");
            return Ok(UNCATEGORIZED.to_string());
        }

        let category_list = categories
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");
        let description = package
            .commercial_description
            .as_deref()
            .unwrap_or(package.description.as_str());

        let response = self
            .context
            .complete_text(
                "agent_categorize_prompt",
                &[
                    ("prompt_title", package.topic.as_str()),
                    ("prompt_description", description),
                    ("prompt_template", package.template()),
                    ("category_list", category_list.as_str()),
                ],
            )
            .await?;

        let category = match_category(&response, categories).unwrap_or_else(|| {
            tracing::warn!(
                agent = Self::AGENT_NAME,
                response = %response,
                "Response matched no category"
            );
            UNCATEGORIZED.to_string()
        });
        tracing::info!(agent = Self::AGENT_NAME, %category, "Categorized");
        Ok(category)
    }
}
