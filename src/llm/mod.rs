//! LLM integration for prompt-forge.
//!
//! Every agent talks to a model through the [`LlmProvider`] trait. The
//! production implementation is [`LiteLlmClient`], which speaks the
//! OpenAI-compatible chat completion protocol used by LiteLLM proxies and
//! OpenRouter.
//!
//! ```ignore
//! use prompt_forge::llm::{LiteLlmClient, GenerationRequest, Message, ImageAttachment};
//!
//! let client = LiteLlmClient::from_env()?;
//! let request = GenerationRequest::new(
//!     "",
//!     vec![Message::user("Describe this image").with_image(image)],
//! )
//! .with_temperature(0.7);
//! let response = client.generate(request).await?;
//! ```

pub mod litellm;

pub use litellm::{
    Choice, GenerationRequest, GenerationResponse, ImageAttachment, LiteLlmClient, LlmProvider,
    Message, Usage, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS,
};
