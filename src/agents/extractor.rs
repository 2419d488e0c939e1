//! Variable Extractor Agent: recovers variable values from a filled prompt.
//!
//! Extraction is best-effort. Every failure (missing instruction template,
//! completion error, unparseable answer) yields an empty map, so callers can
//! fall back to [`crate::template::fallback_extract_values`].

use std::collections::{BTreeMap, BTreeSet};

use super::context::AgentContext;
use crate::package::as_string_map;

/// Variable Extractor Agent.
pub struct VariableExtractorAgent {
    context: AgentContext,
}

impl std::fmt::Debug for VariableExtractorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableExtractorAgent").finish_non_exhaustive()
    }
}

impl VariableExtractorAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "variable_extractor";

    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    /// Extract values for `variables` from `text`.
    ///
    /// Only requested variables with non-empty values are returned.
    pub async fn extract(
        &self,
        variables: &BTreeSet<String>,
        text: &str,
    ) -> BTreeMap<String, String> {
        if variables.is_empty() || text.trim().is_empty() {
            return BTreeMap::new();
        }

        let variable_list = variables.iter().cloned().collect::<Vec<_>>().join(", ");
        let result = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "variable_extraction_prompt",
                &[("variables", variable_list.as_str()), ("text", text)],
                None,
            )
            .await;

        match result {
            Ok(object) => {
                let values = as_string_map(&serde_json::Value::Object(object));
                values
                    .into_iter()
                    .filter(|(name, value)| variables.contains(name) && !value.trim().is_empty())
                    .map(|(name, value)| (name, value.trim().to_string()))
                    .collect()
            }
            Err(err) => {
                tracing::warn!(agent = Self::AGENT_NAME, error = %err, "Variable extraction failed");
                BTreeMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};
    use crate::prompts::PromptsConfig;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct MockLlmProvider {
        response: Result<String, String>,
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
            let content = self
                .response
                .clone()
                .map_err(LlmError::RequestFailed)?;
            Ok(GenerationResponse {
                id: "mock-id".to_string(),
                model: "mock-model".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(content),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage::default(),
            })
        }
    }

    fn vars() -> BTreeSet<String> {
        ["SUBJECT", "STYLE"].iter().map(|s| s.to_string()).collect()
    }

    fn agent(response: Result<&str, &str>) -> VariableExtractorAgent {
        let provider = Arc::new(MockLlmProvider {
            response: response.map(str::to_string).map_err(str::to_string),
        });
        VariableExtractorAgent::new(AgentContext::with_builtin_prompts(provider))
    }

    #[tokio::test]
    async fn test_extract_filters_unknown_and_empty() {
        let agent = agent(Ok(r#"{"SUBJECT": " dragon ", "STYLE": "", "EXTRA": "x"}"#));
        let values = agent.extract(&vars(), "A dragon in watercolor style").await;
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("SUBJECT").map(String::as_str), Some("dragon"));
    }

    #[tokio::test]
    async fn test_extract_failures_yield_empty_map() {
        let agent_err = agent(Err("connection refused"));
        assert!(agent_err.extract(&vars(), "text").await.is_empty());

        let agent_bad = agent(Ok("no json here"));
        assert!(agent_bad.extract(&vars(), "text").await.is_empty());

        let provider = Arc::new(MockLlmProvider {
            response: Ok("{}".to_string()),
        });
        let missing_config = VariableExtractorAgent::new(AgentContext::new(
            provider,
            Arc::new(PromptsConfig::empty()),
        ));
        assert!(missing_config.extract(&vars(), "text").await.is_empty());
    }
}
