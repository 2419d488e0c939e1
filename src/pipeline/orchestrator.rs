//! Workflow orchestrator: the end-to-end pipeline as an event stream.
//!
//! A run is a strictly sequential chain of agent calls. Each step yields a
//! `running` event before it executes and another carrying a package
//! snapshot once it is done; the stream ends with a single `completed` or
//! `error` event. Dropping the stream stops the run before the next step.
//! Nothing is persisted here.

use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::agents::{
    generate_test_guidance, AgentContext, CategorizerAgent, DescriptionAgent, EnhancerAgent,
    EvaluatorAgent, ExampleAgent, GenerationBrief, GeneratorAgent, RefinerAgent, RefinerConfig,
    ReverseEngineerAgent, FALLBACK_DESCRIPTION, UNCATEGORIZED,
};
use crate::llm::{ImageAttachment, LlmProvider};
use crate::package::{ContentType, PackageStage, PromptPackage};
use crate::prompts::PromptsConfig;
use crate::quality::examples::{average_score, validate_examples};
use crate::quality::title::{validate_title, TITLE_SCORE_THRESHOLD};

use super::config::WorkflowConfig;
use super::enhance::enhance_package;
use super::events::{EventStatus, WorkflowEvent, WorkflowStep};
use super::quality_loop::QualityLoop;
use super::WorkflowError;

/// What a run starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowRequest {
    /// Generate a new template from a brief.
    Generate(GenerationBrief),
    /// Reverse-engineer a package from existing prompt text.
    ReverseTemplate {
        template: String,
        content_type: ContentType,
        platform: String,
    },
    /// Reverse-engineer an image template from an image.
    ReverseImage {
        image: ImageAttachment,
        additional_context: String,
        platform: String,
    },
}

impl WorkflowRequest {
    /// The first step this request runs.
    pub fn initial_step(&self) -> WorkflowStep {
        match self {
            WorkflowRequest::Generate(_) => WorkflowStep::InitialGeneration,
            WorkflowRequest::ReverseTemplate { .. } => WorkflowStep::ReverseEngineering,
            WorkflowRequest::ReverseImage { .. } => WorkflowStep::ImageAnalysis,
        }
    }

    fn start_message(&self) -> String {
        match self {
            WorkflowRequest::Generate(brief) => {
                format!("Generating {} template for '{}'", brief.content_type, brief.topic)
            }
            WorkflowRequest::ReverseTemplate { content_type, .. } => {
                format!("Reverse-engineering {} template", content_type)
            }
            WorkflowRequest::ReverseImage { image, .. } => {
                format!("Analyzing image ({})", image.mime_type)
            }
        }
    }
}

/// Runs the full pipeline.
pub struct WorkflowOrchestrator {
    generator: AgentContext,
    evaluator: AgentContext,
    config: WorkflowConfig,
}

impl std::fmt::Debug for WorkflowOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WorkflowOrchestrator {
    /// Create an orchestrator; generation and evaluation may use different models.
    pub fn new(
        llm_client: Arc<dyn LlmProvider>,
        prompts: Arc<PromptsConfig>,
        config: WorkflowConfig,
    ) -> Self {
        let base = AgentContext::new(llm_client, prompts);
        Self {
            generator: base.clone().with_sampling(config.generator_sampling()),
            evaluator: base.with_sampling(config.evaluator_sampling()),
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Context used by generation agents.
    pub fn generator_context(&self) -> &AgentContext {
        &self.generator
    }

    fn refiner(&self) -> RefinerAgent {
        RefinerAgent::new(
            self.generator.clone(),
            RefinerConfig::default()
                .with_target_examples(self.config.example_count)
                .with_gap_fill_rounds(self.config.gap_fill_rounds),
        )
    }

    /// A quality loop wired to this orchestrator's models and thresholds.
    pub fn quality_loop(&self) -> QualityLoop {
        QualityLoop::new(
            EvaluatorAgent::new(self.evaluator.clone()),
            self.refiner(),
            self.config.quality_threshold,
            self.config.max_iterations,
        )
    }

    async fn initial_package(&self, request: &WorkflowRequest) -> Result<PromptPackage, WorkflowError> {
        let step = request.initial_step();
        let result = match request {
            WorkflowRequest::Generate(brief) => {
                GeneratorAgent::new(self.generator.clone()).generate(brief).await
            }
            WorkflowRequest::ReverseTemplate {
                template,
                content_type,
                platform,
            } => {
                ReverseEngineerAgent::new(self.generator.clone())
                    .analyze_template(template, *content_type, platform)
                    .await
            }
            WorkflowRequest::ReverseImage {
                image,
                additional_context,
                platform,
            } => {
                ReverseEngineerAgent::new(self.generator.clone())
                    .from_image(image, additional_context, platform)
                    .await
            }
        };
        result.map_err(|source| WorkflowError::StepFailed { step, source })
    }

    /// Run the workflow as a lazily produced stream of events.
    pub fn run(&self, request: WorkflowRequest) -> impl Stream<Item = WorkflowEvent> + '_ {
        async_stream::stream! {
            let step = request.initial_step();
            yield WorkflowEvent::running(step, request.start_message());
            let mut package = match self.initial_package(&request).await {
                Ok(package) => package,
                Err(err) => {
                    tracing::error!(%step, error = %err, "Workflow step failed");
                    yield WorkflowEvent::error(step, err.to_string());
                    return;
                }
            };
            yield WorkflowEvent::progress(
                step,
                format!("Draft ready: {} ({} variables)", package.topic, package.variables().len()),
                &package,
            );

            let step = WorkflowStep::TitleValidation;
            yield WorkflowEvent::running(step, "Validating title");
            let validation = validate_title(&package.topic);
            let message = if validation.score >= TITLE_SCORE_THRESHOLD {
                "Title meets quality standards.".to_string()
            } else {
                let issues: Vec<&str> = validation.issues.iter().map(|i| i.as_str()).collect();
                format!("Title issues found: {}", issues.join(", "))
            };
            package.title_validation = Some(validation);
            yield WorkflowEvent::progress(step, message, &package);

            let step = WorkflowStep::ComplianceEvaluation;
            yield WorkflowEvent::running(step, "Evaluating marketplace compliance");
            let evaluation = match EvaluatorAgent::new(self.evaluator.clone()).evaluate(&package).await {
                Ok(evaluation) => evaluation,
                Err(source) => {
                    let err = WorkflowError::StepFailed { step, source };
                    tracing::error!(%step, error = %err, "Workflow step failed");
                    yield WorkflowEvent::error(step, err.to_string());
                    return;
                }
            };
            let score = evaluation.score();
            package.evaluation = Some(evaluation.clone());
            package.advance_stage(PackageStage::Evaluated);
            yield WorkflowEvent::progress(step, format!("Compliance score: {}/100", score), &package);

            let step = WorkflowStep::Refinement;
            if score < self.config.compliance_threshold {
                yield WorkflowEvent::running(
                    step,
                    format!(
                        "Score {} below threshold {}, refining",
                        score, self.config.compliance_threshold
                    ),
                );
                let reconciled = match self.refiner().refine(&package, &evaluation).await {
                    Ok(reconciled) => reconciled,
                    Err(source) => {
                        let err = WorkflowError::StepFailed { step, source };
                        tracing::error!(%step, error = %err, "Workflow step failed");
                        yield WorkflowEvent::error(step, err.to_string());
                        return;
                    }
                };
                let message = match &reconciled.violation {
                    Some(violation) => {
                        tracing::warn!(%violation, "Refined template rejected, kept original");
                        format!("Refinement discarded: {}", violation)
                    }
                    None => "Template refined".to_string(),
                };
                package.set_template(reconciled.template);
                package.advance_stage(PackageStage::Refined);
                yield WorkflowEvent::progress(step, message, &package);
            } else {
                yield WorkflowEvent::progress(
                    step,
                    format!("No refinement needed (score {})", score),
                    &package,
                );
            }

            let step = WorkflowStep::ExampleGeneration;
            let count = self.config.example_count;
            yield WorkflowEvent::running(step, format!("Generating {} examples", count));
            let examples = match ExampleAgent::new(self.generator.clone())
                .generate(package.template(), package.variables(), count)
                .await
            {
                Ok(examples) => examples,
                Err(source) => {
                    let err = WorkflowError::StepFailed { step, source };
                    tracing::error!(%step, error = %err, "Workflow step failed");
                    yield WorkflowEvent::error(step, err.to_string());
                    return;
                }
            };
            package.examples = examples;
            let validation = validate_examples(&package.examples, package.variables());
            let message = match average_score(&validation) {
                Some(average) => format!(
                    "{} examples generated (average quality {:.1}/10)",
                    package.examples.len(),
                    average
                ),
                None => "0 examples generated".to_string(),
            };
            package.example_validation = Some(validation);
            package.advance_stage(PackageStage::WithExamples);
            yield WorkflowEvent::progress(step, message, &package);

            let step = WorkflowStep::TestGuidance;
            yield WorkflowEvent::running(step, "Writing testing guide");
            package.test_guidance = Some(generate_test_guidance(&package));
            yield WorkflowEvent::progress(step, "Testing guide ready", &package);

            let step = WorkflowStep::CommercialDescription;
            yield WorkflowEvent::running(step, "Writing commercial description");
            let message = match DescriptionAgent::new(self.generator.clone()).describe(&package).await {
                Ok(description) => {
                    package.commercial_description = Some(description);
                    "Description written".to_string()
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Description failed, using fallback");
                    package.commercial_description = Some(FALLBACK_DESCRIPTION.to_string());
                    format!("Description failed, using fallback: {}", err)
                }
            };
            package.advance_stage(PackageStage::Described);
            yield WorkflowEvent::progress(step, message, &package);

            let step = WorkflowStep::Categorization;
            yield WorkflowEvent::running(step, "Categorizing");
            let category = match CategorizerAgent::new(self.generator.clone()).categorize(&package).await {
                Ok(category) => category,
                Err(err) => {
                    tracing::warn!(error = %err, "Categorization failed");
                    UNCATEGORIZED.to_string()
                }
            };
            let message = format!("Category: {}", category);
            package.category = Some(category);
            package.advance_stage(PackageStage::Categorized);
            yield WorkflowEvent::progress(step, message, &package);

            let step = WorkflowStep::QualityEnhancement;
            yield WorkflowEvent::running(step, "Applying marketplace enhancements");
            package = enhance_package(&EnhancerAgent::new(self.generator.clone()), package).await;
            package.advance_stage(PackageStage::Enhanced);
            let applied = package.enhancement_log.as_ref().map(Vec::len).unwrap_or(0);
            yield WorkflowEvent::progress(
                step,
                format!("Enhancements applied: {} fixes", applied),
                &package,
            );

            tracing::info!(topic = %package.topic, "Workflow complete");
            yield WorkflowEvent::completed(package);
        }
    }

    /// Drive a run to its end and return the finished package.
    pub async fn run_to_completion(&self, request: WorkflowRequest) -> Result<PromptPackage, WorkflowError> {
        let stream = self.run(request);
        futures::pin_mut!(stream);

        while let Some(event) = stream.next().await {
            match event.status {
                EventStatus::Running => {
                    tracing::debug!(step = %event.step, message = %event.message, "Workflow progress");
                }
                EventStatus::Completed => {
                    return event.package.ok_or(WorkflowError::Incomplete);
                }
                EventStatus::Error => {
                    return Err(WorkflowError::Stopped {
                        step: event.step,
                        message: event.message,
                    });
                }
            }
        }
        Err(WorkflowError::Incomplete)
    }
}
