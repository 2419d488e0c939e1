//! prompt-forge: LLM pipeline for marketplace prompt templates.
//!
//! This library generates prompt templates from a topic, an existing prompt
//! or an image, then evaluates, refines and enriches them into packages
//! ready for a prompt marketplace.

// Core modules
pub mod agents;
pub mod cli;
pub mod error;
pub mod llm;
pub mod package;
pub mod pipeline;
pub mod prompts;
pub mod quality;
pub mod storage;
pub mod template;
pub mod utils;

// Re-export commonly used error types
pub use error::{LlmError, PackageError};
