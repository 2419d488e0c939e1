//! Reverse Engineer Agent: builds a package from an existing prompt or an
//! image.
//!
//! Both entry points ask the model to critique its own template in the same
//! call. When the self-evaluation scores below
//! [`SELF_EVALUATION_THRESHOLD`] and an `improved_template` is present, the
//! improved version replaces the first draft.

use serde_json::{Map, Value};

use super::context::AgentContext;
use super::error::{AgentError, AgentResult};
use super::fields::{joined_string_field, string_field};
use super::generator::apply_common_fields;
use crate::llm::ImageAttachment;
use crate::package::{as_number, ContentType, PromptPackage, SelfEvaluation};

/// Self-evaluation score (0-10) below which the improved template is used.
pub const SELF_EVALUATION_THRESHOLD: f64 = 7.0;

const DEFAULT_TOPIC: &str = "Untitled Prompt Template";

/// Parse the model's self-evaluation block, if any.
fn parse_self_evaluation(object: &Map<String, Value>) -> Option<SelfEvaluation> {
    let Value::Object(details) = object.get("self_evaluation")? else {
        return None;
    };
    let mut details = details.clone();
    let overall_score = details.remove("overall_score").as_ref().and_then(as_number);
    Some(SelfEvaluation {
        overall_score,
        details,
    })
}

/// Pick the draft template, substituting the improved one when the
/// self-evaluation asks for it.
fn select_template(
    object: &Map<String, Value>,
    draft: Option<String>,
    self_evaluation: Option<&SelfEvaluation>,
) -> Option<String> {
    let low_score = self_evaluation
        .and_then(|e| e.overall_score)
        .is_some_and(|score| score < SELF_EVALUATION_THRESHOLD);

    if low_score {
        if let Some(improved) = string_field(object, &["improved_template"]) {
            tracing::info!(
                score = self_evaluation.and_then(|e| e.overall_score),
                "Self-evaluation below threshold, using improved template"
            );
            return Some(improved);
        }
    }
    draft
}

/// Reverse Engineer Agent that turns prompts and images into packages.
pub struct ReverseEngineerAgent {
    context: AgentContext,
}

impl std::fmt::Debug for ReverseEngineerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReverseEngineerAgent").finish_non_exhaustive()
    }
}

impl ReverseEngineerAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "reverse_engineer";

    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    /// Reverse-engineer a package from raw prompt text.
    ///
    /// The model's enhanced template is used when given; otherwise the input
    /// text becomes the template. The input is always kept as
    /// `original_template`, and the caller's content type and platform win
    /// over anything the model says.
    pub async fn analyze_template(
        &self,
        template_text: &str,
        content_type: ContentType,
        platform: &str,
    ) -> AgentResult<PromptPackage> {
        if template_text.trim().is_empty() {
            return Err(AgentError::InvalidArgument(
                "template text is empty".to_string(),
            ));
        }
        tracing::info!(agent = Self::AGENT_NAME, %content_type, "Analyzing template");

        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "reverse_engineer_meta_prompt",
                &[("template", template_text)],
                None,
            )
            .await?;

        let self_evaluation = parse_self_evaluation(&object);
        let draft = string_field(&object, &["template", "enhanced_template"])
            .or_else(|| Some(template_text.trim().to_string()));
        let template = select_template(&object, draft, self_evaluation.as_ref())
            .unwrap_or_else(|| template_text.trim().to_string());

        let mut package = PromptPackage::new(
            string_field(&object, &["topic", "title"]).unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            content_type,
            platform,
            joined_string_field(&object, &["style"]).unwrap_or_default(),
            string_field(&object, &["use_case"]).unwrap_or_default(),
            template,
        );
        apply_common_fields(&mut package, &object);
        package.original_template = Some(template_text.to_string());
        package.self_evaluation = self_evaluation;
        package.input_source = Some("template".to_string());

        tracing::info!(
            agent = Self::AGENT_NAME,
            topic = %package.topic,
            variables = package.variables().len(),
            "Template analyzed"
        );
        Ok(package)
    }

    /// Reverse-engineer an image template from an image.
    ///
    /// `additional_context` is free text from the user; it may be empty.
    pub async fn from_image(
        &self,
        image: &ImageAttachment,
        additional_context: &str,
        platform: &str,
    ) -> AgentResult<PromptPackage> {
        tracing::info!(
            agent = Self::AGENT_NAME,
            mime_type = %image.mime_type,
            bytes = image.data.len(),
            "Analyzing image"
        );

        let context_block = if additional_context.trim().is_empty() {
            String::new()
        } else {
            format!("ADDITIONAL CONTEXT FROM THE USER:\n{}", additional_context.trim())
        };
        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "reverse_engineer_image_prompt",
                &[("additional_context", context_block.as_str())],
                Some(image),
            )
            .await?;

        let self_evaluation = parse_self_evaluation(&object);
        let draft = string_field(&object, &["template", "prompt_template"]);
        let template = select_template(&object, draft, self_evaluation.as_ref())
            .ok_or_else(|| AgentError::MissingField("template".to_string()))?;

        let mut package = PromptPackage::new(
            string_field(&object, &["topic", "title"]).unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            ContentType::Image,
            platform,
            joined_string_field(&object, &["style"]).unwrap_or_default(),
            string_field(&object, &["use_case"]).unwrap_or_default(),
            template,
        );
        apply_common_fields(&mut package, &object);
        package.self_evaluation = self_evaluation;
        package.input_source = Some("image".to_string());

        Ok(package)
    }
}
