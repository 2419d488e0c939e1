//! Refiner Agent: rewrites a template from evaluation feedback.
//!
//! Both operations are variable-preserving. The rewritten template passes
//! through [`reconcile`]; if its placeholder set differs from the input's,
//! the input template is kept and the violation is reported alongside the
//! result instead of as an error.

use serde::{Deserialize, Serialize};

use super::context::AgentContext;
use super::error::{AgentError, AgentResult};
use super::fields::{examples_field, string_field, string_list_field};
use crate::package::{Evaluation, Example, PackageStage, PromptPackage, FULL_PACKAGE_EXAMPLES};
use crate::pipeline::gap_fill::{fill_gap, DEFAULT_MAX_ROUNDS};
use crate::template::{reconcile, ContractViolation, Reconciled};

/// Configuration for the Refiner Agent.
#[derive(Debug, Clone)]
pub struct RefinerConfig {
    /// Examples an improved package must carry.
    pub target_examples: usize,
    /// Top-up rounds when the model returns too few examples.
    pub gap_fill_rounds: usize,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            target_examples: FULL_PACKAGE_EXAMPLES,
            gap_fill_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl RefinerConfig {
    pub fn with_target_examples(mut self, count: usize) -> Self {
        self.target_examples = count;
        self
    }

    pub fn with_gap_fill_rounds(mut self, rounds: usize) -> Self {
        self.gap_fill_rounds = rounds;
        self
    }
}

/// Result of an improvement pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    /// Template to keep after the variable check.
    pub template: String,
    /// Set when the model's template was rejected.
    #[serde(skip)]
    pub violation: Option<ContractViolation>,
    /// Examples, padded and truncated to the target count when possible.
    pub examples: Vec<Example>,
    pub changes_made: Vec<String>,
    pub rationale: String,
}

impl Improvement {
    /// A copy of `package` with this improvement applied.
    pub fn apply_to(&self, package: &PromptPackage) -> PromptPackage {
        let mut improved = package.clone();
        improved.set_template(self.template.clone());
        improved.examples = self.examples.clone();
        improved.improvement_changes = Some(self.changes_made.clone());
        improved.improvement_rationale = Some(self.rationale.clone());
        improved.evaluation = None;
        improved.advance_stage(PackageStage::Refined);
        improved
    }
}

/// Refiner Agent for single refinements and quality-loop improvements.
pub struct RefinerAgent {
    context: AgentContext,
    config: RefinerConfig,
}

impl std::fmt::Debug for RefinerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefinerAgent")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RefinerAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "refiner";

    pub fn new(context: AgentContext, config: RefinerConfig) -> Self {
        Self { context, config }
    }

    pub fn with_defaults(context: AgentContext) -> Self {
        Self::new(context, RefinerConfig::default())
    }

    /// Single refinement pass driven by an evaluation.
    ///
    /// An answer without `improved_template` keeps the current template and
    /// reports a [`ContractViolation::MissingRewrite`].
    pub async fn refine(
        &self,
        package: &PromptPackage,
        evaluation: &Evaluation,
    ) -> AgentResult<Reconciled> {
        tracing::info!(
            agent = Self::AGENT_NAME,
            score = evaluation.score(),
            "Refining prompt"
        );

        let total_score = format!("{}", evaluation.score());
        let improvements = evaluation.improvements_text();
        let variables = package.variables_text();
        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "agent_refine_prompt",
                &[
                    ("prompt_template", package.template()),
                    ("total_score", total_score.as_str()),
                    ("priority_improvements", improvements.as_str()),
                    ("variables", variables.as_str()),
                ],
                None,
            )
            .await?;

        let Some(produced) = string_field(&object, &["improved_template"]) else {
            let violation = ContractViolation::MissingRewrite {
                field: "improved_template".to_string(),
            };
            tracing::warn!(agent = Self::AGENT_NAME, %violation, "Keeping current template");
            return Ok(Reconciled::kept(package.template(), violation));
        };

        Ok(reconcile(package.variables(), &produced, package.template()))
    }

    /// Improvement pass used by the quality loop.
    ///
    /// Returns the improved template, a full set of examples, and the
    /// model's change list and rationale. When the model returns fewer
    /// examples than the target, the list is topped up with
    /// `agent_additional_examples`; top-up failures are logged and leave the
    /// list short.
    pub async fn improve(
        &self,
        package: &PromptPackage,
        evaluation: &Evaluation,
    ) -> AgentResult<Improvement> {
        tracing::info!(
            agent = Self::AGENT_NAME,
            score = evaluation.score(),
            "Improving prompt"
        );

        let variables = package.variables_text();
        let examples = package.examples_json();
        let total_score = format!("{}", evaluation.score());
        let improvements = evaluation.improvements_text();
        let num_examples = self.config.target_examples.to_string();

        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "agent_improve_prompt",
                &[
                    ("prompt_template", package.template()),
                    ("variables", variables.as_str()),
                    ("examples", examples.as_str()),
                    ("total_score", total_score.as_str()),
                    ("priority_improvements", improvements.as_str()),
                    ("num_examples", num_examples.as_str()),
                ],
                None,
            )
            .await?;

        let produced = string_field(&object, &["improved_template", "template"])
            .ok_or_else(|| AgentError::MissingField("improved_template".to_string()))?;
        let reconciled = reconcile(package.variables(), &produced, package.template());

        let mut new_examples = examples_field(&object, &["examples", "example_prompts"]);
        if new_examples.is_empty() {
            new_examples = package.examples.clone();
        }

        let target = self.config.target_examples;
        let template = reconciled.template.as_str();
        let filled = fill_gap(
            new_examples,
            target,
            self.config.gap_fill_rounds,
            |missing, existing| {
                let existing = serde_json::to_string_pretty(existing)
                    .unwrap_or_else(|_| "[]".to_string());
                let variables = variables.clone();
                async move {
                    self.additional_examples(template, &variables, missing, &existing)
                        .await
                }
            },
        )
        .await;

        if let Some(err) = &filled.error {
            tracing::warn!(agent = Self::AGENT_NAME, error = %err, "Example top-up failed");
        }
        if !filled.is_complete(target) {
            let violation = ContractViolation::ExampleCount {
                expected: target,
                produced: filled.items.len(),
            };
            tracing::warn!(agent = Self::AGENT_NAME, %violation, "Improved package is short of examples");
        }

        Ok(Improvement {
            template: reconciled.template,
            violation: reconciled.violation,
            examples: filled.items,
            changes_made: string_list_field(&object, &["changes_made", "changes"]),
            rationale: string_field(&object, &["rationale"]).unwrap_or_default(),
        })
    }

    async fn additional_examples(
        &self,
        template: &str,
        variables: &str,
        count: usize,
        existing: &str,
    ) -> AgentResult<Vec<Example>> {
        let count = count.to_string();
        let object = self
            .context
            .complete_json(
                Self::AGENT_NAME,
                "agent_additional_examples",
                &[
                    ("count", count.as_str()),
                    ("prompt_template", template),
                    ("variables", variables),
                    ("existing_examples", existing),
                ],
                None,
            )
            .await?;
        Ok(examples_field(
            &object,
            &["examples", "additional_examples", "new_examples"],
        ))
    }
}
