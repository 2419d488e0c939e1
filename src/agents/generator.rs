//! Generator Agent: creates a new prompt package from a topic brief.
//!
//! The instruction is chosen by content type (`image_meta_prompt`,
//! `text_meta_prompt`, `video_meta_prompt`) so each platform family gets its
//! own rubric. The variable set is always derived from the returned
//! template, never taken from the model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::context::AgentContext;
use super::error::{AgentError, AgentResult};
use super::fields::{
    examples_field, string_field, string_list_field, string_map_field, EXAMPLE_ALIASES,
    EXPLANATION_ALIASES, TIPS_ALIASES,
};
use crate::package::{ContentType, PromptPackage};

/// What the user asked to be generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationBrief {
    pub topic: String,
    pub content_type: ContentType,
    pub platform: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub use_case: String,
    /// Prompts shown to the model for inspiration.
    #[serde(default)]
    pub reference_examples: Vec<String>,
}

impl GenerationBrief {
    pub fn new(
        topic: impl Into<String>,
        content_type: ContentType,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            content_type,
            platform: platform.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_use_case(mut self, use_case: impl Into<String>) -> Self {
        self.use_case = use_case.into();
        self
    }

    pub fn with_reference_examples(mut self, examples: Vec<String>) -> Self {
        self.reference_examples = examples;
        self
    }

    fn reference_block(&self) -> String {
        let examples: Vec<&str> = self
            .reference_examples
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .collect();
        if examples.is_empty() {
            return String::new();
        }
        let mut block = String::from("REFERENCE EXAMPLES (for inspiration only, do not copy):\n");
        for example in examples {
            block.push_str("- ");
            block.push_str(example);
            block.push('\n');
        }
        block
    }
}

/// Copy the descriptive fields every package-producing answer shares.
pub(crate) fn apply_common_fields(package: &mut PromptPackage, object: &Map<String, Value>) {
    package.variable_explanations = string_map_field(object, EXPLANATION_ALIASES);
    package.examples = examples_field(object, EXAMPLE_ALIASES);
    package.tips = string_list_field(object, TIPS_ALIASES);
    if let Some(description) = string_field(object, &["description"]) {
        package.description = description;
    }
    if let Some(instructions) = string_field(object, &["instructions"]) {
        package.instructions = instructions;
    }
}

/// Generator Agent that drafts a template package from a brief.
pub struct GeneratorAgent {
    context: AgentContext,
}

impl std::fmt::Debug for GeneratorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorAgent").finish_non_exhaustive()
    }
}

impl GeneratorAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "generator";

    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    /// Generate the initial package for a brief.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::MissingField` when the answer has no template.
    pub async fn generate(&self, brief: &GenerationBrief) -> AgentResult<PromptPackage> {
        tracing::info!(
            agent = Self::AGENT_NAME,
            topic = %brief.topic,
            content_type = %brief.content_type,
            "Generating initial prompt"
        );

        let reference = brief.reference_block();
        let key = brief.content_type.meta_prompt_key();
        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                &key,
                &[
                    ("model_platform", brief.platform.as_str()),
                    ("topic", brief.topic.as_str()),
                    ("style", brief.style.as_str()),
                    ("use_case", brief.use_case.as_str()),
                    ("reference_examples", reference.as_str()),
                ],
                None,
            )
            .await?;

        let template = string_field(&object, &["template", "prompt_template"])
            .ok_or_else(|| AgentError::MissingField("template".to_string()))?;

        let mut package = PromptPackage::new(
            brief.topic.clone(),
            brief.content_type,
            brief.platform.clone(),
            brief.style.clone(),
            brief.use_case.clone(),
            template,
        );
        apply_common_fields(&mut package, &object);
        package.input_source = Some("brief".to_string());

        tracing::info!(
            agent = Self::AGENT_NAME,
            variables = package.variables().len(),
            examples = package.examples.len(),
            "Initial prompt generated"
        );
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct MockLlmProvider {
        response: Mutex<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockLlmProvider {
        fn new(response: impl Into<String>) -> Self {
            Self {
                response: Mutex::new(response.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
            self.prompts
                .lock()
                .expect("lock not poisoned")
                .push(request.user_text());
            let content = self.response.lock().expect("lock not poisoned").clone();
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

    #[tokio::test]
    async fn test_generate_image_package() {
        let response = r#"Sure! ```json
{
  "template": "A [SUBJECT] drifting through [SETTING], [PALETTE] tones, shot on [CAMERA]",
  "variables_explanation": {"SUBJECT": "Main subject", "SETTING": "Where"},
  "example_prompts": ["A whale drifting through clouds, teal tones, shot on 35mm"],
  "technical_tips": ["Use --ar 3:2"],
  "description": "Dreamy drift scenes",
  "instructions": "Fill the variables"
}
```"#;
        let provider = Arc::new(MockLlmProvider::new(response));
        let agent = GeneratorAgent::new(AgentContext::with_builtin_prompts(provider.clone()));

        let brief = GenerationBrief::new("Dreamy Drift Scenes", ContentType::Image, "Midjourney")
            .with_style("surreal")
            .with_reference_examples(vec!["a fish in the sky".to_string()]);
        let package = agent.generate(&brief).await.expect("generation should succeed");

        assert_eq!(package.variables().len(), 4);
        assert!(package.variables().contains("CAMERA"));
        assert_eq!(package.tips, vec!["Use --ar 3:2".to_string()]);
        assert_eq!(package.examples.len(), 1);
        assert_eq!(package.variable_explanations.len(), 2);
        assert_eq!(package.description, "Dreamy drift scenes");

        let prompts = provider.prompts.lock().expect("lock not poisoned");
        assert!(prompts[0].contains("Midjourney"));
        assert!(prompts[0].contains("a fish in the sky"));
    }

    #[tokio::test]
    async fn test_text_package_reads_writing_strategy() {
        let response = r#"{"template": "Write for [AUDIENCE]", "writing_strategy": ["Be concise"]}"#;
        let agent = GeneratorAgent::new(AgentContext::with_builtin_prompts(Arc::new(
            MockLlmProvider::new(response),
        )));
        let brief = GenerationBrief::new("Newsletter", ContentType::Text, "ChatGPT");
        let package = agent.generate(&brief).await.expect("generation should succeed");
        assert_eq!(package.tips, vec!["Be concise".to_string()]);
        assert_eq!(package.content_type, ContentType::Text);
    }

    #[tokio::test]
    async fn test_missing_template_is_error() {
        let agent = GeneratorAgent::new(AgentContext::with_builtin_prompts(Arc::new(
            MockLlmProvider::new(r#"{"description": "no template"}"#),
        )));
        let brief = GenerationBrief::new("X", ContentType::Video, "Sora");
        let err = agent.generate(&brief).await.unwrap_err();
        assert!(matches!(err, AgentError::MissingField(ref f) if f == "template"));
    }

    #[tokio::test]
    async fn test_unparseable_response() {
        let agent = GeneratorAgent::new(AgentContext::with_builtin_prompts(Arc::new(
            MockLlmProvider::new("I cannot help with that"),
        )));
        let brief = GenerationBrief::new("X", ContentType::Image, "DALL-E");
        let err = agent.generate(&brief).await.unwrap_err();
        assert!(matches!(err, AgentError::UnparseableResponse(_)));
    }
}
