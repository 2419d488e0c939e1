//! Evaluator Agent: scores a package against the marketplace rubric.
//!
//! The answer is returned as an [`Evaluation`] without validating the rubric
//! shape; callers compare `total_score` (0-100) against their threshold.

use super::context::AgentContext;
use super::error::AgentResult;
use crate::package::{Evaluation, PromptPackage};

/// Evaluator Agent that runs the compliance rubric.
pub struct EvaluatorAgent {
    context: AgentContext,
}

impl std::fmt::Debug for EvaluatorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorAgent").finish_non_exhaustive()
    }
}

/// Examples formatted as a numbered list.
fn numbered_examples(package: &PromptPackage) -> String {
    if package.examples.is_empty() {
        return "(no examples yet)".to_string();
    }
    package
        .examples
        .iter()
        .enumerate()
        .map(|(i, example)| format!("{}. {}", i + 1, example.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

impl EvaluatorAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "evaluator";

    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    /// Evaluate a package.
    pub async fn evaluate(&self, package: &PromptPackage) -> AgentResult<Evaluation> {
        tracing::info!(agent = Self::AGENT_NAME, topic = %package.topic, "Evaluating compliance");

        let examples = numbered_examples(package);
        let description = package
            .commercial_description
            .as_deref()
            .unwrap_or(package.description.as_str());

        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "agent_quality_evaluation",
                &[
                    ("prompt_title", package.topic.as_str()),
                    ("prompt_template", package.template()),
                    ("variable_examples", examples.as_str()),
                    ("commercial_description", description),
                ],
                None,
            )
            .await?;

        let evaluation = Evaluation::from_object(object);
        match evaluation.total_score {
            Some(score) => tracing::info!(agent = Self::AGENT_NAME, score, "Evaluation complete"),
            None => tracing::warn!(agent = Self::AGENT_NAME, "Evaluation has no total_score"),
        }
        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentError;
    use crate::error::LlmError;
    use crate::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};
    use crate::package::{ContentType, Example};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct MockLlmProvider {
        response: Mutex<String>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
            self.prompts
                .lock()
                .expect("lock not poisoned")
                .push(request.user_text());
            Ok(GenerationResponse {
                id: "mock-id".to_string(),
                model: "mock-model".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(self.response.lock().expect("lock not poisoned").clone()),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage::default(),
            })
        }
    }

    fn agent(response: &str) -> (EvaluatorAgent, Arc<MockLlmProvider>) {
        let provider = Arc::new(MockLlmProvider {
            response: Mutex::new(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        });
        (
            EvaluatorAgent::new(AgentContext::with_builtin_prompts(provider.clone())),
            provider,
        )
    }

    fn package() -> PromptPackage {
        let mut package = PromptPackage::new(
            "Moody Harbor Photography",
            ContentType::Image,
            "Midjourney",
            "",
            "",
            "A [BOAT] in a harbor at [TIME]",
        );
        package.examples = vec![Example::from("A trawler in a harbor at dawn")];
        package.description = "Harbor scenes".to_string();
        package
    }

    #[tokio::test]
    async fn test_evaluate_parses_rubric() {
        let (agent, provider) = agent(
            r#"{"scores": {"clarity": 18, "originality": {"score": 15}}, "total_score": 82,
                "priority_improvements": ["Add lighting variable"]}"#,
        );
        let evaluation = agent.evaluate(&package()).await.expect("evaluation should succeed");

        assert_eq!(evaluation.total_score, Some(82.0));
        assert_eq!(evaluation.scores.get("originality"), Some(&15.0));
        assert_eq!(evaluation.priority_improvements.len(), 1);

        let prompts = provider.prompts.lock().expect("lock not poisoned");
        assert!(prompts[0].contains("1. A trawler in a harbor at dawn"));
        assert!(prompts[0].contains("Harbor scenes"));
    }

    #[tokio::test]
    async fn test_missing_total_score_is_none() {
        let (agent, _) = agent(r#"{"scores": {}}"#);
        let evaluation = agent.evaluate(&package()).await.expect("evaluation should succeed");
        assert_eq!(evaluation.total_score, None);
        assert_eq!(evaluation.score(), 0.0);
    }

    #[tokio::test]
    async fn test_unparseable_evaluation() {
        let (agent, _) = agent("The prompt looks great!");
        let err = agent.evaluate(&package()).await.unwrap_err();
        assert!(matches!(err, AgentError::UnparseableResponse(_)));
    }
}
