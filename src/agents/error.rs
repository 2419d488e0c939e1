//! Error types for the prompt-forge agents.
//!
//! Every agent returns [`AgentResult`]; failures are values and never
//! panic across the agent boundary.

use thiserror::Error;

use crate::error::LlmError;
use crate::prompts::ConfigError;
use crate::template::ContractViolation;
use crate::utils::ParseError;

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The instruction template is missing or could not be rendered.
    /// No model call was made.
    #[error("Agent configuration error: {0}")]
    MissingConfig(#[from] ConfigError),

    /// The completion client failed (transport, API, block, timeout).
    #[error("LLM error: {0}")]
    Completion(#[from] LlmError),

    /// The model answer did not contain a usable JSON object.
    #[error("Failed to parse LLM response: {0}")]
    UnparseableResponse(#[from] ParseError),

    /// The model broke a contract that could not be recovered locally.
    #[error("Contract violation: {0}")]
    Contract(#[from] ContractViolation),

    /// The caller passed an argument the agent cannot act on.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The parsed answer lacks a field the agent needs.
    #[error("LLM response is missing field '{0}'")]
    MissingField(String),
}

impl AgentError {
    /// Raw model text for parse failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AgentError::UnparseableResponse(err) => Some(err.raw()),
            _ => None,
        }
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
