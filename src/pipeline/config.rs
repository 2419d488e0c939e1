//! Workflow configuration.
//!
//! Sampling parameters, thresholds and loop limits for one workflow run.
//! Values come from [`Default`], optionally overridden by a YAML file and by
//! `PROMPT_FORGE_*` environment variables, in that order.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agents::SamplingConfig;
use crate::package::FULL_PACKAGE_EXAMPLES;
use crate::pipeline::gap_fill::DEFAULT_MAX_ROUNDS;

/// Errors that can occur while loading workflow settings.
#[derive(Debug, Error)]
pub enum WorkflowConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// The settings file could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid YAML for this structure.
    #[error("Invalid settings file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Settings for a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Model for generation agents; empty uses the client default.
    pub generator_model: String,
    /// Model for the evaluator; empty uses the client default.
    pub evaluator_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub top_k: u32,
    /// Per-call timeout in seconds.
    pub request_timeout_secs: u64,
    /// Evaluation total (0-100) below which the draft is refined once.
    pub compliance_threshold: f64,
    /// Evaluation total (0-100) that ends the quality loop.
    pub quality_threshold: f64,
    /// Improvement passes the quality loop may make.
    pub max_iterations: usize,
    /// Examples generated for a full package.
    pub example_count: usize,
    /// Top-up rounds for short example lists.
    pub gap_fill_rounds: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            generator_model: String::new(),
            evaluator_model: String::new(),
            temperature: 0.7,
            max_tokens: 8192,
            top_p: 0.95,
            top_k: 40,
            request_timeout_secs: 120,
            compliance_threshold: 70.0,
            quality_threshold: 75.0,
            max_iterations: 3,
            example_count: FULL_PACKAGE_EXAMPLES,
            gap_fill_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl WorkflowConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from defaults and environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PROMPT_FORGE_GENERATOR_MODEL`, `PROMPT_FORGE_EVALUATOR_MODEL`
    /// - `PROMPT_FORGE_TEMPERATURE`, `PROMPT_FORGE_MAX_TOKENS`,
    ///   `PROMPT_FORGE_TOP_P`, `PROMPT_FORGE_TOP_K`
    /// - `PROMPT_FORGE_TIMEOUT_SECS`
    /// - `PROMPT_FORGE_COMPLIANCE_THRESHOLD`, `PROMPT_FORGE_QUALITY_THRESHOLD`
    /// - `PROMPT_FORGE_MAX_ITERATIONS`, `PROMPT_FORGE_EXAMPLE_COUNT`
    pub fn from_env() -> Result<Self, WorkflowConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Load a YAML settings file; missing keys keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, WorkflowConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| WorkflowConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&path.display().to_string(), &content)
    }

    /// Parse YAML settings; `source` names the input in errors.
    pub fn from_yaml_str(source: &str, yaml: &str) -> Result<Self, WorkflowConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| WorkflowConfigError::Parse {
            path: source.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PROMPT_FORGE_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, WorkflowConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("PROMPT_FORGE_GENERATOR_MODEL") {
            self.generator_model = val;
        }
        if let Some(val) = lookup("PROMPT_FORGE_EVALUATOR_MODEL") {
            self.evaluator_model = val;
        }
        if let Some(val) = lookup("PROMPT_FORGE_TEMPERATURE") {
            self.temperature = parse_env_value(&val, "PROMPT_FORGE_TEMPERATURE")?;
        }
        if let Some(val) = lookup("PROMPT_FORGE_MAX_TOKENS") {
            self.max_tokens = parse_env_value(&val, "PROMPT_FORGE_MAX_TOKENS")?;
        }
        if let Some(val) = lookup("PROMPT_FORGE_TOP_P") {
            self.top_p = parse_env_value(&val, "PROMPT_FORGE_TOP_P")?;
        }
        if let Some(val) = lookup("PROMPT_FORGE_TOP_K") {
            self.top_k = parse_env_value(&val, "PROMPT_FORGE_TOP_K")?;
        }
        if let Some(val) = lookup("PROMPT_FORGE_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env_value(&val, "PROMPT_FORGE_TIMEOUT_SECS")?;
        }
        if let Some(val) = lookup("PROMPT_FORGE_COMPLIANCE_THRESHOLD") {
            self.compliance_threshold = parse_env_value(&val, "PROMPT_FORGE_COMPLIANCE_THRESHOLD")?;
        }
        if let Some(val) = lookup("PROMPT_FORGE_QUALITY_THRESHOLD") {
            self.quality_threshold = parse_env_value(&val, "PROMPT_FORGE_QUALITY_THRESHOLD")?;
        }
        if let Some(val) = lookup("PROMPT_FORGE_MAX_ITERATIONS") {
            self.max_iterations = parse_env_value(&val, "PROMPT_FORGE_MAX_ITERATIONS")?;
        }
        if let Some(val) = lookup("PROMPT_FORGE_EXAMPLE_COUNT") {
            self.example_count = parse_env_value(&val, "PROMPT_FORGE_EXAMPLE_COUNT")?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), WorkflowConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(WorkflowConfigError::ValidationFailed(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(WorkflowConfigError::ValidationFailed(
                "top_p must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(WorkflowConfigError::ValidationFailed(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(WorkflowConfigError::ValidationFailed(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        for (name, value) in [
            ("compliance_threshold", self.compliance_threshold),
            ("quality_threshold", self.quality_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(WorkflowConfigError::ValidationFailed(format!(
                    "{} must be between 0 and 100",
                    name
                )));
            }
        }
        if self.example_count == 0 {
            return Err(WorkflowConfigError::ValidationFailed(
                "example_count must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Sampling for generation agents.
    pub fn generator_sampling(&self) -> SamplingConfig {
        self.sampling(&self.generator_model)
    }

    /// Sampling for the evaluator.
    pub fn evaluator_sampling(&self) -> SamplingConfig {
        self.sampling(&self.evaluator_model)
    }

    fn sampling(&self, model: &str) -> SamplingConfig {
        SamplingConfig {
            model: model.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            top_k: self.top_k,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Builder method to set the generator model.
    pub fn with_generator_model(mut self, model: impl Into<String>) -> Self {
        self.generator_model = model.into();
        self
    }

    /// Builder method to set the evaluator model.
    pub fn with_evaluator_model(mut self, model: impl Into<String>) -> Self {
        self.evaluator_model = model.into();
        self
    }

    /// Builder method to set temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Builder method to set the compliance threshold.
    pub fn with_compliance_threshold(mut self, threshold: f64) -> Self {
        self.compliance_threshold = threshold;
        self
    }

    /// Builder method to set the quality threshold.
    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    /// Builder method to set max iterations.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Builder method to set the example count.
    pub fn with_example_count(mut self, count: usize) -> Self {
        self.example_count = count;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, WorkflowConfigError> {
    value.trim().parse().map_err(|_| WorkflowConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}
