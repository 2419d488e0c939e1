//! Error types shared across prompt-forge subsystems.
//!
//! Defines the error types that cross module boundaries:
//! - LLM completion failures (transport, API, safety blocks, timeouts)
//! - Prompt package schema failures (unknown fields, invalid documents)
//!
//! Subsystem-local errors live next to their subsystem
//! (`prompts::ConfigError`, `utils::json_extraction::ParseError`,
//! `agents::AgentError`, `storage::StorageError`).

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: OPENROUTER_API_KEY or LITELLM_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("Missing API base URL: LITELLM_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("The model returned no candidates.")]
    NoCandidates,

    #[error("The model response was {0}.")]
    Blocked(String),

    #[error("The model returned no text content. Finish reason: {finish_reason}")]
    EmptyContent { finish_reason: String },

    #[error("LLM request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when reading or patching a prompt package document.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Unknown package field '{0}'")]
    UnknownField(String),

    #[error("Field '{0}' cannot be updated")]
    ReadOnlyField(String),

    #[error("Invalid package document: {0}")]
    InvalidDocument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
