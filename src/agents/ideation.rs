//! Ideation Agent: proposes prompt concepts and reads market trends.
//!
//! Concepts feed [`GeneratorAgent`](super::generator::GeneratorAgent)
//! through [`PromptConcept::to_brief`]. Market data is supplied by the
//! caller as text; nothing is fetched here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::AgentContext;
use super::error::AgentResult;
use super::fields::string_field;
use super::generator::GenerationBrief;
use crate::package::ContentType;

/// A proposed prompt product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptConcept {
    pub title: String,
    pub content_type: ContentType,
    pub style: String,
    pub use_case: String,
    pub rationale: String,
}

impl PromptConcept {
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let title = string_field(object, &["title", "topic", "name"])?;
        let content_type = string_field(object, &["content_type", "type"])
            .and_then(|t| t.parse().ok())
            .unwrap_or_default();
        Some(Self {
            title,
            content_type,
            style: string_field(object, &["style"]).unwrap_or_default(),
            use_case: string_field(object, &["use_case"]).unwrap_or_default(),
            rationale: string_field(object, &["rationale", "why"]).unwrap_or_default(),
        })
    }

    /// A generation brief for this concept on `platform`.
    pub fn to_brief(&self, platform: impl Into<String>) -> GenerationBrief {
        GenerationBrief::new(self.title.clone(), self.content_type, platform)
            .with_style(self.style.clone())
            .with_use_case(self.use_case.clone())
    }
}

/// A market trend read from supplied data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub name: String,
    pub evidence: String,
    pub suggested_prompt: String,
}

impl Trend {
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            name: string_field(object, &["name", "trend"])?,
            evidence: string_field(object, &["evidence"]).unwrap_or_default(),
            suggested_prompt: string_field(object, &["suggested_prompt"]).unwrap_or_default(),
        })
    }
}

/// Ideation Agent.
pub struct IdeationAgent {
    context: AgentContext,
}

impl std::fmt::Debug for IdeationAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdeationAgent").finish_non_exhaustive()
    }
}

impl IdeationAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "ideation";

    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    /// Propose concepts for a theme. Malformed entries are skipped.
    pub async fn generate_concepts(
        &self,
        theme: &str,
        market_analysis: &str,
    ) -> AgentResult<Vec<PromptConcept>> {
        tracing::info!(agent = Self::AGENT_NAME, theme, "Generating concepts");

        let analysis = if market_analysis.trim().is_empty() {
            "(none provided)"
        } else {
            market_analysis
        };
        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "idea_generation_meta_prompt",
                &[("theme", theme), ("market_analysis", analysis)],
                None,
            )
            .await?;

        let concepts: Vec<PromptConcept> = object
            .get("concepts")
            .or_else(|| object.get("ideas"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(PromptConcept::from_value).collect())
            .unwrap_or_default();

        tracing::info!(agent = Self::AGENT_NAME, count = concepts.len(), "Concepts generated");
        Ok(concepts)
    }

    /// Read trends from caller-supplied market data.
    pub async fn analyze_trends(&self, market_data: &str) -> AgentResult<Vec<Trend>> {
        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "trend_analysis_prompt",
                &[("market_data", market_data)],
                None,
            )
            .await?;

        Ok(object
            .get("trends")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Trend::from_value).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct MockLlmProvider {
        response: String,
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
            Ok(GenerationResponse {
                id: "mock-id".to_string(),
                model: "mock-model".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(self.response.clone()),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage::default(),
            })
        }
    }

    fn agent(response: &str) -> IdeationAgent {
        IdeationAgent::new(AgentContext::with_builtin_prompts(Arc::new(MockLlmProvider {
            response: response.to_string(),
        })))
    }

    #[tokio::test]
    async fn test_generate_concepts_skips_malformed() {
        let concepts = agent(
            r#"{"concepts": [
                {"title": "Retro Travel Posters", "content_type": "image", "style": "risograph", "use_case": "Wall art"},
                {"style": "no title"},
                {"title": "Cold Email Openers", "content_type": "TEXT"}
            ]}"#,
        )
        .generate_concepts("nostalgia", "")
        .await
        .expect("concepts");

        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[1].content_type, ContentType::Text);

        let brief = concepts[0].to_brief("Midjourney");
        assert_eq!(brief.topic, "Retro Travel Posters");
        assert_eq!(brief.style, "risograph");
        assert_eq!(brief.content_type, ContentType::Image);
    }

    #[tokio::test]
    async fn test_analyze_trends() {
        let trends = agent(r#"{"trends": [{"name": "Claymation", "evidence": "3 of top 10"}]}"#)
            .analyze_trends("top sellers: ...")
            .await
            .expect("trends");
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].name, "Claymation");
        assert!(trends[0].suggested_prompt.is_empty());
    }
}
