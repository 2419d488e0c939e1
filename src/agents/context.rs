//! Shared call path for every agent.
//!
//! An [`AgentContext`] bundles the completion client, the instruction
//! templates and the sampling parameters. Agents render a named template,
//! call [`AgentContext::complete`] and parse the answer; no agent retries.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use super::error::AgentResult;
use crate::error::LlmError;
use crate::llm::{
    GenerationRequest, GenerationResponse, ImageAttachment, LlmProvider, Message,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::prompts::PromptsConfig;
use crate::utils::parse_json_object;

/// Sampling parameters and limits applied to every call.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Model identifier; empty uses the client's default model.
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub top_k: u32,
    /// Wall-clock limit for one completion call.
    pub request_timeout: Duration,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.7,
            max_tokens: 8192,
            top_p: 0.95,
            top_k: 40,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl SamplingConfig {
    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Sets the maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Completion client, instruction templates and sampling for one workflow.
#[derive(Clone)]
pub struct AgentContext {
    llm_client: Arc<dyn LlmProvider>,
    prompts: Arc<PromptsConfig>,
    sampling: SamplingConfig,
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("sampling", &self.sampling)
            .finish_non_exhaustive()
    }
}

impl AgentContext {
    /// Creates a context with default sampling.
    pub fn new(llm_client: Arc<dyn LlmProvider>, prompts: Arc<PromptsConfig>) -> Self {
        Self {
            llm_client,
            prompts,
            sampling: SamplingConfig::default(),
        }
    }

    /// Creates a context with the built-in instruction templates.
    pub fn with_builtin_prompts(llm_client: Arc<dyn LlmProvider>) -> Self {
        Self::new(llm_client, Arc::new(PromptsConfig::builtin()))
    }

    /// Replaces the sampling parameters.
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    /// A copy of this context that calls a different model.
    pub fn for_model(&self, model: impl Into<String>) -> Self {
        let mut context = self.clone();
        context.sampling.model = model.into();
        context
    }

    pub fn prompts(&self) -> &PromptsConfig {
        &self.prompts
    }

    pub fn sampling(&self) -> &SamplingConfig {
        &self.sampling
    }

    /// Render a named instruction template.
    pub fn render(&self, key: &str, values: &[(&str, &str)]) -> AgentResult<String> {
        Ok(self.prompts.render(key, values)?)
    }

    /// Send one prompt (with an optional image) and return the answer text.
    ///
    /// # Errors
    ///
    /// Client errors are returned unchanged. In addition:
    /// - [`LlmError::Timeout`] when the call exceeds the request timeout.
    /// - [`LlmError::NoCandidates`] when the response has no choices.
    /// - [`LlmError::Blocked`] for safety or recitation stops.
    /// - [`LlmError::EmptyContent`] when the answer has no text.
    pub async fn complete(
        &self,
        prompt: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<String, LlmError> {
        let mut message = Message::user(prompt);
        if let Some(image) = image {
            message = message.with_image(image.clone());
        }

        let request = GenerationRequest::new(self.sampling.model.clone(), vec![message])
            .with_temperature(self.sampling.temperature)
            .with_max_tokens(self.sampling.max_tokens)
            .with_top_p(self.sampling.top_p)
            .with_top_k(self.sampling.top_k);

        tracing::debug!(
            model = %self.sampling.model,
            prompt_chars = prompt.len(),
            has_image = image.is_some(),
            "Calling completion client"
        );

        let timeout = self.sampling.request_timeout;
        let response = tokio::time::timeout(timeout, self.llm_client.generate(request))
            .await
            .map_err(|_| LlmError::Timeout {
                seconds: timeout.as_secs(),
            })??;

        response_text(response)
    }

    /// Render `key`, call the model and parse a JSON object from the answer.
    ///
    /// Parse failures are logged with the complete raw answer.
    pub async fn complete_json(
        &self,
        agent: &str,
        key: &str,
        values: &[(&str, &str)],
        image: Option<&ImageAttachment>,
    ) -> AgentResult<Map<String, Value>> {
        let prompt = self.render(key, values)?;
        let raw = self.complete(&prompt, image).await?;
        parse_json_object(&raw).map_err(|err| {
            tracing::error!(agent, error = %err, raw = %err.raw(), "Unparseable model response");
            err.into()
        })
    }

    /// Render `key`, call the model and return the trimmed answer text.
    pub async fn complete_text(&self, key: &str, values: &[(&str, &str)]) -> AgentResult<String> {
        let prompt = self.render(key, values)?;
        let raw = self.complete(&prompt, None).await?;
        Ok(raw.trim().to_string())
    }
}

/// Reduce a response to its text, mapping stop reasons to errors.
fn response_text(response: GenerationResponse) -> Result<String, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::NoCandidates)?;

    match choice.finish_reason.to_lowercase().as_str() {
        "content_filter" | "safety" => {
            return Err(LlmError::Blocked("blocked due to safety concerns".to_string()))
        }
        "recitation" => {
            return Err(LlmError::Blocked("blocked due to recitation check".to_string()))
        }
        _ => {}
    }

    if choice.message.content.trim().is_empty() {
        return Err(LlmError::EmptyContent {
            finish_reason: choice.finish_reason,
        });
    }

    Ok(choice.message.content)
}
