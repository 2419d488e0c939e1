//! Instruction template configuration.
//!
//! [`PromptsConfig`] is the flat, string-keyed store of instruction templates
//! that agents render before calling the model, plus the category list used
//! by the categorizer. It starts from the built-in [`defaults`] and layers
//! YAML files over them key by key.
//!
//! # YAML layout
//!
//! ```yaml
//! image_meta_prompt: |
//!   You are a prompt engineer for {model_platform} ...
//! prompt_categories:
//!   - Photography
//!   - Logos & Icons
//! ```
//!
//! Top-level string values become templates, `prompt_categories` replaces
//! the category list, and non-string values are ignored.

pub mod defaults;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value as YamlValue;
use thiserror::Error;

use crate::template::render;

/// YAML key holding the category list.
pub const CATEGORIES_KEY: &str = "prompt_categories";

/// Template keys every agent in the forge relies on.
pub const REQUIRED_KEYS: &[&str] = &[
    "image_meta_prompt",
    "text_meta_prompt",
    "video_meta_prompt",
    "reverse_engineer_meta_prompt",
    "reverse_engineer_image_prompt",
    "agent_quality_evaluation",
    "agent_refine_prompt",
    "agent_improve_prompt",
    "agent_additional_examples",
    "agent_generate_examples",
    "agent_complete_examples",
    "agent_regenerate_example",
    "product_description_prompt",
    "agent_categorize_prompt",
    "variable_extraction_prompt",
    "title_fix_prompt",
    "abstract_examples_prompt",
    "idea_generation_meta_prompt",
    "trend_analysis_prompt",
];

/// Errors that can occur while loading or using instruction templates.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No '{0}' prompt found in configuration")]
    MissingTemplate(String),

    #[error("Configuration is missing required prompts: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("Prompt '{template}' references unknown placeholder '{{{placeholder}}}'")]
    UnknownPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },
}

/// Named instruction templates plus the category vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptsConfig {
    templates: BTreeMap<String, String>,
    categories: Vec<String>,
    sources: Vec<PathBuf>,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptsConfig {
    /// Configuration holding only the built-in templates and categories.
    pub fn builtin() -> Self {
        Self {
            templates: defaults::BUILTIN_TEMPLATES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            categories: defaults::PROMPT_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            sources: Vec::new(),
        }
    }

    /// Configuration with no templates and no categories.
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
            categories: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Load built-in defaults overlaid with each YAML file in order.
    ///
    /// Later files win. The merged result is validated against
    /// [`REQUIRED_KEYS`].
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut config = Self::builtin();
        for path in paths {
            config.merge_file(path)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Overlay a single YAML file.
    pub fn merge_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path_str.clone(),
            source,
        })?;

        self.merge_yaml_str(&path_str, &content)?;
        self.sources.push(path.to_path_buf());
        tracing::debug!(path = %path_str, "Loaded prompt configuration");
        Ok(())
    }

    /// Overlay YAML text. `source` names the origin in error messages.
    pub fn merge_yaml_str(&mut self, source: &str, yaml: &str) -> Result<(), ConfigError> {
        let document: YamlValue =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
                path: source.to_string(),
                message: e.to_string(),
            })?;

        let mapping = match document {
            YamlValue::Mapping(mapping) => mapping,
            YamlValue::Null => return Ok(()),
            _ => {
                return Err(ConfigError::Parse {
                    path: source.to_string(),
                    message: "top level must be a mapping".to_string(),
                })
            }
        };

        for (key, value) in mapping {
            let Some(key) = key.as_str() else {
                continue;
            };

            if key == CATEGORIES_KEY {
                let YamlValue::Sequence(items) = value else {
                    return Err(ConfigError::Parse {
                        path: source.to_string(),
                        message: format!("'{}' must be a list of strings", CATEGORIES_KEY),
                    });
                };
                self.categories = items
                    .into_iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect();
                continue;
            }

            match value {
                YamlValue::String(text) => {
                    self.templates.insert(key.to_string(), text);
                }
                _ => {
                    tracing::debug!(key = %key, "Ignoring non-template configuration key");
                }
            }
        }

        Ok(())
    }

    /// Check that every required template is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|key| !self.templates.contains_key(**key))
            .map(|key| key.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys(missing))
        }
    }

    /// Look up a template.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Look up a template that must exist.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingTemplate(key.to_string()))
    }

    /// Render a named template with the given values.
    pub fn render(&self, key: &str, values: &[(&str, &str)]) -> Result<String, ConfigError> {
        let template = self.require(key)?;
        render::render(key, template, values)
    }

    /// Insert or replace a template.
    pub fn set(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(key.into(), template.into());
    }

    /// Remove a template.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.templates.remove(key)
    }

    /// Builder-style template override.
    pub fn with_template(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.set(key, template);
        self
    }

    /// Replace the category list.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Categories offered to the categorizer.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Names of all configured templates.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Files merged into this configuration, in load order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}
