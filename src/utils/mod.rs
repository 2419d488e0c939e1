//! Shared utility functions for prompt-forge.
//!
//! This module provides common utilities used across multiple modules,
//! including JSON extraction from LLM responses.

pub mod json_extraction;

pub use json_extraction::{
    extract_from_json_code_block, find_object_span, parse_json_object, ParseError,
};
