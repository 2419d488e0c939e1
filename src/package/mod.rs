//! The prompt package: the record every pipeline stage enriches.
//!
//! A [`PromptPackage`] is created by the first generation or
//! reverse-engineering agent and threaded by value through the remaining
//! stages. Its JSON form is the boundary artifact handed to storage and to
//! files on disk: the core keys are always present, enrichments are omitted
//! until a stage computes them.
//!
//! The `variables` set is derived state. It always equals the placeholders of
//! `template`, which is why both are private and the template can only be
//! replaced through [`PromptPackage::set_template`].

pub mod enrichment;
pub mod evaluation;

pub use enrichment::{
    PromptbaseReady, QuickCopyExample, SelfEvaluation, TestGuidance, TitleIssue, TitleValidation,
};
pub use evaluation::{as_number, as_string_list, Evaluation};

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PackageError;
use crate::quality::examples::ExampleValidationResult;
use crate::template::extract_variables;

/// Current package document version.
pub const SCHEMA_VERSION: u32 = 2;

/// Number of examples a full package carries.
pub const FULL_PACKAGE_EXAMPLES: usize = 9;

/// Keys always present in a package document.
pub const REQUIRED_FIELDS: &[&str] = &[
    "topic",
    "content_type",
    "platform",
    "style",
    "use_case",
    "template",
    "variables",
    "variable_explanations",
    "examples",
    "tips",
    "description",
    "instructions",
];

/// Keys that may be patched through [`PromptPackage::apply_updates`].
pub const UPDATABLE_FIELDS: &[&str] = &[
    "stage",
    "topic",
    "content_type",
    "platform",
    "style",
    "use_case",
    "template",
    "variable_explanations",
    "examples",
    "tips",
    "description",
    "instructions",
    "evaluation",
    "title_validation",
    "test_guidance",
    "category",
    "commercial_description",
    "enhancement_log",
    "self_evaluation",
    "quick_copy_examples",
    "promptbase_ready",
    "original_template",
    "original_topic",
    "input_source",
    "prompt_metadata",
    "needs_more_examples",
    "abstract_examples_injected",
    "example_validation",
    "improvement_changes",
    "improvement_rationale",
];

/// Keys derived by the package itself.
pub const READ_ONLY_FIELDS: &[&str] = &["schema_version", "variables"];

/// The kind of content a template produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    #[serde(alias = "image", alias = "IMAGE")]
    Image,
    #[serde(alias = "text", alias = "TEXT")]
    Text,
    #[serde(alias = "video", alias = "VIDEO")]
    Video,
}

impl ContentType {
    /// Returns all content types.
    pub fn all() -> [ContentType; 3] {
        [ContentType::Image, ContentType::Text, ContentType::Video]
    }

    /// Display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Image => "Image",
            ContentType::Text => "Text",
            ContentType::Video => "Video",
        }
    }

    /// Configuration key of the generation instruction for this type.
    pub fn meta_prompt_key(&self) -> String {
        format!("{}_meta_prompt", self.as_str().to_lowercase())
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(ContentType::Image),
            "text" => Ok(ContentType::Text),
            "video" => Ok(ContentType::Video),
            other => Err(format!(
                "Unknown content type '{}', expected image/text/video",
                other
            )),
        }
    }
}

/// How far a package has progressed through the pipeline.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PackageStage {
    #[default]
    Draft,
    Evaluated,
    Refined,
    WithExamples,
    Described,
    Categorized,
    Enhanced,
}

impl PackageStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStage::Draft => "draft",
            PackageStage::Evaluated => "evaluated",
            PackageStage::Refined => "refined",
            PackageStage::WithExamples => "with_examples",
            PackageStage::Described => "described",
            PackageStage::Categorized => "categorized",
            PackageStage::Enhanced => "enhanced",
        }
    }
}

impl std::fmt::Display for PackageStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filled example: either plain prompt text or the structured form with
/// the chosen variable values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Example {
    Text(String),
    Structured {
        #[serde(default)]
        variables: BTreeMap<String, String>,
        #[serde(default)]
        prompt: String,
    },
}

impl Example {
    /// The filled prompt text.
    pub fn text(&self) -> &str {
        match self {
            Example::Text(text) => text,
            Example::Structured { prompt, .. } => prompt,
        }
    }

    /// Variable values, for structured examples.
    pub fn variables(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Example::Text(_) => None,
            Example::Structured { variables, .. } => Some(variables),
        }
    }

    /// Whether the example carries any content.
    pub fn is_empty(&self) -> bool {
        match self {
            Example::Text(text) => text.trim().is_empty(),
            Example::Structured { variables, prompt } => {
                prompt.trim().is_empty() && variables.is_empty()
            }
        }
    }

    /// Lenient conversion from a model-produced JSON value.
    ///
    /// Strings become text examples; objects become structured examples with
    /// scalar variable values stringified. Anything else is rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.trim().is_empty() => Some(Example::Text(text.clone())),
            Value::Object(object) => {
                let prompt = object
                    .get("prompt")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let variables = object
                    .get("variables")
                    .and_then(Value::as_object)
                    .map(|vars| {
                        vars.iter()
                            .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
                            .collect()
                    })
                    .unwrap_or_default();
                let example = Example::Structured { variables, prompt };
                (!example.is_empty()).then_some(example)
            }
            _ => None,
        }
    }

    /// Convert a list of model-produced values, dropping unusable entries.
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(Example::from_value).collect())
            .unwrap_or_default()
    }
}

impl From<&str> for Example {
    fn from(text: &str) -> Self {
        Example::Text(text.to_string())
    }
}

impl From<String> for Example {
    fn from(text: String) -> Self {
        Example::Text(text)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a string-to-string map, stringifying scalar values.
pub fn as_string_map(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|object| {
            object
                .iter()
                .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
                .collect()
        })
        .unwrap_or_default()
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A marketplace prompt template and everything learned about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPackage {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub stage: PackageStage,

    pub topic: String,
    pub content_type: ContentType,
    pub platform: String,
    pub style: String,
    pub use_case: String,
    template: String,
    variables: BTreeSet<String>,
    pub variable_explanations: BTreeMap<String, String>,
    pub examples: Vec<Example>,
    pub tips: Vec<String>,
    pub description: String,
    pub instructions: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_validation: Option<TitleValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_guidance: Option<TestGuidance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhancement_log: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_evaluation: Option<SelfEvaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_copy_examples: Option<Vec<QuickCopyExample>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promptbase_ready: Option<PromptbaseReady>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_more_examples: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_examples_injected: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_validation: Option<Vec<ExampleValidationResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_changes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_rationale: Option<String>,
}

impl PromptPackage {
    /// Create a draft package; `variables` is derived from `template`.
    pub fn new(
        topic: impl Into<String>,
        content_type: ContentType,
        platform: impl Into<String>,
        style: impl Into<String>,
        use_case: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            schema_version: SCHEMA_VERSION,
            stage: PackageStage::Draft,
            topic: topic.into(),
            content_type,
            platform: platform.into(),
            style: style.into(),
            use_case: use_case.into(),
            template,
            variables,
            variable_explanations: BTreeMap::new(),
            examples: Vec::new(),
            tips: Vec::new(),
            description: String::new(),
            instructions: String::new(),
            evaluation: None,
            title_validation: None,
            test_guidance: None,
            category: None,
            commercial_description: None,
            enhancement_log: None,
            self_evaluation: None,
            quick_copy_examples: None,
            promptbase_ready: None,
            original_template: None,
            original_topic: None,
            input_source: None,
            prompt_metadata: None,
            needs_more_examples: None,
            abstract_examples_injected: None,
            example_validation: None,
            improvement_changes: None,
            improvement_rationale: None,
        }
    }

    /// The prompt template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Distinct placeholders of the template.
    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    /// Replace the template and recompute its variables.
    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
        self.variables = extract_variables(&self.template);
    }

    /// Move the stage forward; never moves it back.
    pub fn advance_stage(&mut self, stage: PackageStage) {
        if stage > self.stage {
            self.stage = stage;
        }
    }

    /// Variables joined for inclusion in an instruction.
    pub fn variables_text(&self) -> String {
        self.variables
            .iter()
            .map(|v| format!("[{}]", v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Example texts as a pretty JSON list for inclusion in an instruction.
    pub fn examples_json(&self) -> String {
        serde_json::to_string_pretty(&self.examples).unwrap_or_else(|_| "[]".to_string())
    }

    /// Serialize to the boundary JSON document.
    pub fn to_value(&self) -> Result<Value, PackageError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse a boundary JSON document.
    ///
    /// `variables` is recomputed from `template`, and documents written
    /// before versioning are upgraded to the current schema version.
    pub fn from_value(value: Value) -> Result<Self, PackageError> {
        let Value::Object(object) = value else {
            return Err(PackageError::InvalidDocument(
                "package document must be a JSON object".to_string(),
            ));
        };

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !object.contains_key(*field) && *field != "variables")
            .collect();
        if !missing.is_empty() {
            return Err(PackageError::InvalidDocument(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let mut object = object;
        object
            .entry("variables")
            .or_insert_with(|| Value::Array(Vec::new()));

        let mut package: PromptPackage = serde_json::from_value(Value::Object(object))
            .map_err(|e| PackageError::InvalidDocument(e.to_string()))?;
        let template = std::mem::take(&mut package.template);
        package.set_template(template);
        package.schema_version = SCHEMA_VERSION;
        Ok(package)
    }

    /// Parse a boundary JSON document from text.
    pub fn from_json_str(json: &str) -> Result<Self, PackageError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Merge top-level keys into the document and re-validate it.
    ///
    /// Unknown keys and derived keys are rejected; the package is left
    /// untouched on error.
    pub fn apply_updates(&mut self, updates: &Map<String, Value>) -> Result<(), PackageError> {
        for key in updates.keys() {
            if READ_ONLY_FIELDS.contains(&key.as_str()) {
                return Err(PackageError::ReadOnlyField(key.clone()));
            }
            if !UPDATABLE_FIELDS.contains(&key.as_str()) {
                return Err(PackageError::UnknownField(key.clone()));
            }
        }

        let Value::Object(mut document) = self.to_value()? else {
            return Err(PackageError::InvalidDocument(
                "package did not serialize to an object".to_string(),
            ));
        };
        for (key, value) in updates {
            if value.is_null() {
                document.remove(key);
            } else {
                document.insert(key.clone(), value.clone());
            }
        }

        *self = Self::from_value(Value::Object(document))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PromptPackage {
        let mut package = PromptPackage::new(
            "Ethereal Forest Portraits",
            ContentType::Image,
            "Midjourney",
            "Soft watercolor",
            "Book covers",
            "A portrait of [SUBJECT] in a forest, [MOOD] lighting",
        );
        package.examples = vec![Example::from("A portrait of an elf in a forest, misty lighting")];
        package
    }

    #[test]
    fn test_new_derives_variables() {
        let package = sample();
        let expected: BTreeSet<String> = ["MOOD", "SUBJECT"].iter().map(|s| s.to_string()).collect();
        assert_eq!(package.variables(), &expected);
        assert_eq!(package.stage, PackageStage::Draft);
        assert_eq!(package.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_set_template_recomputes_variables() {
        let mut package = sample();
        package.set_template("Only [ONE]");
        assert_eq!(package.variables().len(), 1);
        assert!(package.variables().contains("ONE"));
    }

    #[test]
    fn test_required_keys_always_serialized() {
        let value = sample().to_value().expect("serialize");
        let object = value.as_object().expect("object");
        for key in REQUIRED_FIELDS {
            assert!(object.contains_key(*key), "missing {key}");
        }
        assert!(!object.contains_key("evaluation"));
        assert!(!object.contains_key("category"));
        assert_eq!(object["variables"], json!(["MOOD", "SUBJECT"]));
    }

    #[test]
    fn test_from_value_recomputes_stale_variables() {
        let mut value = sample().to_value().expect("serialize");
        value["variables"] = json!(["STALE"]);
        let package = PromptPackage::from_value(value).expect("parse");
        assert!(package.variables().contains("SUBJECT"));
        assert!(!package.variables().contains("STALE"));
    }

    #[test]
    fn test_from_value_rejects_missing_fields() {
        let err = PromptPackage::from_value(json!({"topic": "x"})).unwrap_err();
        assert!(matches!(err, PackageError::InvalidDocument(_)));
    }

    #[test]
    fn test_legacy_document_upgraded() {
        let legacy = json!({
            "topic": "Old", "content_type": "image", "platform": "DALL-E",
            "style": "", "use_case": "", "template": "A [X]",
            "variables": ["X"], "variable_explanations": {},
            "examples": ["A cat", {"variables": {"X": "dog"}, "prompt": "A dog"}],
            "tips": [], "description": "", "instructions": ""
        });
        let package = PromptPackage::from_value(legacy).expect("parse legacy");
        assert_eq!(package.schema_version, SCHEMA_VERSION);
        assert_eq!(package.content_type, ContentType::Image);
        assert_eq!(package.examples.len(), 2);
        assert_eq!(package.examples[1].text(), "A dog");
    }

    #[test]
    fn test_apply_updates_merges_fields() {
        let mut package = sample();
        let updates = json!({"category": "Photography", "template": "New [A] and [B]"});
        package
            .apply_updates(updates.as_object().expect("object"))
            .expect("update");
        assert_eq!(package.category.as_deref(), Some("Photography"));
        assert_eq!(package.variables().len(), 2);
    }

    #[test]
    fn test_apply_updates_rejects_unknown_and_read_only() {
        let mut package = sample();
        let before = package.clone();

        let err = package
            .apply_updates(json!({"bogus": 1}).as_object().expect("object"))
            .unwrap_err();
        assert!(matches!(err, PackageError::UnknownField(_)));

        let err = package
            .apply_updates(json!({"variables": ["X"]}).as_object().expect("object"))
            .unwrap_err();
        assert!(matches!(err, PackageError::ReadOnlyField(_)));

        let err = package
            .apply_updates(json!({"examples": 5}).as_object().expect("object"))
            .unwrap_err();
        assert!(matches!(err, PackageError::InvalidDocument(_)));
        assert_eq!(package, before);
    }

    #[test]
    fn test_stage_only_advances() {
        let mut package = sample();
        package.advance_stage(PackageStage::Described);
        package.advance_stage(PackageStage::Evaluated);
        assert_eq!(package.stage, PackageStage::Described);
    }

    #[test]
    fn test_example_from_value() {
        assert_eq!(Example::from_value(&json!("text")), Some(Example::from("text")));
        assert_eq!(Example::from_value(&json!("  ")), None);
        assert_eq!(Example::from_value(&json!(42)), None);

        let structured = Example::from_value(&json!({"variables": {"N": 3}, "prompt": "p"}))
            .expect("structured");
        assert_eq!(structured.variables().and_then(|v| v.get("N")).map(String::as_str), Some("3"));
    }

    #[test]
    fn test_content_type_parsing() {
        assert_eq!("VIDEO".parse::<ContentType>(), Ok(ContentType::Video));
        assert!("audio".parse::<ContentType>().is_err());
        assert_eq!(ContentType::Text.meta_prompt_key(), "text_meta_prompt");
    }
}
