//! Description Agent: writes the commercial marketplace description.

use super::context::AgentContext;
use super::error::AgentResult;
use crate::package::PromptPackage;

/// Used when the description cannot be generated.
pub const FALLBACK_DESCRIPTION: &str =
    "Professional AI Prompt Template. Easy to use and high quality.";

/// Description Agent that writes sales copy for a package.
pub struct DescriptionAgent {
    context: AgentContext,
}

impl std::fmt::Debug for DescriptionAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptionAgent").finish_non_exhaustive()
    }
}

impl DescriptionAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "describer";

    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    /// Write a description; returns the trimmed free text.
    pub async fn describe(&self, package: &PromptPackage) -> AgentResult<String> {
        tracing::info!(agent = Self::AGENT_NAME, topic = %package.topic, "Writing description");

        let content_type = package.content_type.as_str().to_lowercase();
        let use_cases = if package.use_case.trim().is_empty() {
            "general creative work"
        } else {
            package.use_case.trim()
        };

        let text = self
            .context
            .complete_text(
                "product_description_prompt",
                &[
                    ("content_type", content_type.as_str()),
                    ("topic", package.topic.as_str()),
                    ("use_cases", use_cases),
                ],
            )
            .await?;
        Ok(text.trim_matches('"').trim().to_string())
    }
}
