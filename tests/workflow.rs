//! End-to-end workflow tests against a routed mock provider.
//!
//! The provider picks its answer by looking for a marker phrase from the
//! built-in instruction templates in the prompt, so every agent in the
//! pipeline can be scripted independently.

use async_trait::async_trait;
use futures::StreamExt;
use prompt_forge::agents::{GenerationBrief, UNCATEGORIZED};
use prompt_forge::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};
use prompt_forge::package::{ContentType, PackageStage, PromptPackage};
use prompt_forge::pipeline::{
    EventStatus, StopReason, WorkflowConfig, WorkflowEvent, WorkflowOrchestrator, WorkflowRequest,
    WorkflowStep,
};
use prompt_forge::prompts::PromptsConfig;
use prompt_forge::LlmError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const GENERATE: &str = "top-selling prompt engineer";
const EVALUATE: &str = "strict prompt marketplace reviewer";
const REFINE: &str = "Improve a prompt template based on a quality review";
const IMPROVE: &str = "iterating on a marketplace prompt package";
const EXAMPLES: &str = "demonstrating the full potential";
const DESCRIBE: &str = "persuasive marketplace description";
const CATEGORIZE: &str = "Assign the prompt below to exactly one category";
const ABSTRACT: &str = "expert prompt example creator";

const TEMPLATE: &str = "A vintage botanical illustration of [PLANT] in [COLOR_PALETTE] on [PAPER]";

struct Route {
    marker: &'static str,
    responses: VecDeque<String>,
    calls: usize,
}

/// Answers by marker phrase; the last scripted answer of a route repeats.
struct RoutedProvider {
    routes: Mutex<Vec<Route>>,
}

impl RoutedProvider {
    fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
        }
    }

    fn route(self, marker: &'static str, responses: &[String]) -> Self {
        self.routes.lock().expect("lock not poisoned").push(Route {
            marker,
            responses: responses.iter().cloned().collect(),
            calls: 0,
        });
        self
    }

    fn calls(&self, marker: &str) -> usize {
        self.routes
            .lock()
            .expect("lock not poisoned")
            .iter()
            .filter(|r| r.marker == marker)
            .map(|r| r.calls)
            .sum()
    }
}

#[async_trait]
impl LlmProvider for RoutedProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let prompt = request.user_text();
        let content = {
            let mut routes = self.routes.lock().expect("lock not poisoned");
            let route = routes
                .iter_mut()
                .find(|r| prompt.contains(r.marker))
                .ok_or_else(|| LlmError::RequestFailed("no route for prompt".to_string()))?;
            route.calls += 1;
            let content = if route.responses.len() > 1 {
                route.responses.pop_front()
            } else {
                route.responses.front().cloned()
            };
            content.ok_or_else(|| LlmError::RequestFailed("route has no answer".to_string()))?
        };
        Ok(GenerationResponse {
            id: "mock-id".to_string(),
            model: "mock-model".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        })
    }
}

fn generated() -> String {
    serde_json::json!({
        "template": TEMPLATE,
        "description": "Antique plate style botanical art.",
        "tips": ["Name a specific plant"],
        "examples": [],
    })
    .to_string()
}

fn evaluation(score: f64) -> String {
    serde_json::json!({
        "total_score": score,
        "scores": {"clarity": 8},
        "priority_improvements": ["Tighter lighting cues"],
    })
    .to_string()
}

fn examples(count: usize) -> String {
    let examples: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "prompt": format!("A vintage botanical illustration of fern {} in sepia on linen paper", i),
                "variables": {"PLANT": format!("fern {}", i), "COLOR_PALETTE": "sepia", "PAPER": "linen paper"},
            })
        })
        .collect();
    serde_json::json!({ "examples": examples }).to_string()
}

fn abstract_examples() -> String {
    serde_json::json!({
        "abstract_examples": [
            "A vintage botanical illustration of the essence of spring in faded gold on parchment",
            "A vintage botanical illustration of a melancholic winter rose in ash grey on vellum",
        ]
    })
    .to_string()
}

fn improved(template: &str) -> String {
    let texts: Vec<String> = (0..9)
        .map(|i| format!("A vintage botanical illustration of orchid {} in teal on rice paper", i))
        .collect();
    serde_json::json!({
        "improved_template": template,
        "examples": texts,
        "changes_made": ["Added lighting cues"],
        "rationale": "Sharper direction",
    })
    .to_string()
}

fn s(text: &str) -> String {
    text.to_string()
}

/// Every agent answers with the given compliance score.
fn scored_provider(score: f64) -> RoutedProvider {
    RoutedProvider::new()
        .route(GENERATE, &[generated()])
        .route(EVALUATE, &[evaluation(score)])
        .route(REFINE, &[serde_json::json!({"improved_template": TEMPLATE}).to_string()])
        .route(EXAMPLES, &[examples(9)])
        .route(DESCRIBE, &[s("Bring timeless botanical plates to any wall.")])
        .route(CATEGORIZE, &[s("Art & Illustration")])
        .route(ABSTRACT, &[abstract_examples()])
}

fn happy_provider() -> RoutedProvider {
    scored_provider(85.0)
}

fn orchestrator(provider: Arc<RoutedProvider>) -> WorkflowOrchestrator {
    WorkflowOrchestrator::new(
        provider,
        Arc::new(PromptsConfig::builtin()),
        WorkflowConfig::default(),
    )
}

fn generate_request() -> WorkflowRequest {
    WorkflowRequest::Generate(GenerationBrief::new(
        "Vintage Botanical Illustration Prints",
        ContentType::Image,
        "Midjourney",
    ))
}

async fn collect(orchestrator: &WorkflowOrchestrator, request: WorkflowRequest) -> Vec<WorkflowEvent> {
    orchestrator.run(request).collect().await
}

#[tokio::test]
async fn test_generate_runs_every_step() {
    let provider = Arc::new(happy_provider());
    let orchestrator = orchestrator(provider.clone());
    let events = collect(&orchestrator, generate_request()).await;

    let last = events.last().expect("events");
    assert_eq!(last.status, EventStatus::Completed);
    assert_eq!(last.step, WorkflowStep::Complete);
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    let package = last.package.as_ref().expect("final package");
    assert_eq!(package.stage, PackageStage::Enhanced);
    assert_eq!(package.category.as_deref(), Some("Art & Illustration"));
    assert_eq!(
        package.commercial_description.as_deref(),
        Some("Bring timeless botanical plates to any wall.")
    );
    assert!(package.test_guidance.is_some());
    assert_eq!(package.variables().len(), 3);
    // nine generated plus two injected abstract examples
    assert_eq!(package.examples.len(), 11);
    assert_eq!(package.abstract_examples_injected, Some(2));
    // scored before the abstract examples were appended
    assert_eq!(package.example_validation.as_ref().map(Vec::len), Some(9));
    assert!(package.title_validation.as_ref().expect("title").is_valid);

    let steps: Vec<WorkflowStep> = events
        .iter()
        .filter(|e| e.status == EventStatus::Running && e.package.is_some())
        .map(|e| e.step)
        .collect();
    assert_eq!(
        steps,
        vec![
            WorkflowStep::InitialGeneration,
            WorkflowStep::TitleValidation,
            WorkflowStep::ComplianceEvaluation,
            WorkflowStep::Refinement,
            WorkflowStep::ExampleGeneration,
            WorkflowStep::TestGuidance,
            WorkflowStep::CommercialDescription,
            WorkflowStep::Categorization,
            WorkflowStep::QualityEnhancement,
        ]
    );
    assert_eq!(provider.calls(ABSTRACT), 1);
}

#[tokio::test]
async fn test_refinement_skipped_above_threshold() {
    let provider = Arc::new(happy_provider());
    let orchestrator = orchestrator(provider.clone());
    let events = collect(&orchestrator, generate_request()).await;

    assert_eq!(provider.calls(REFINE), 0);
    let refinement = events
        .iter()
        .find(|e| e.step == WorkflowStep::Refinement && e.package.is_some())
        .expect("refinement event");
    assert!(refinement.message.contains("No refinement needed"));
}

#[tokio::test]
async fn test_refinement_runs_below_threshold() {
    let provider = Arc::new(scored_provider(50.0));
    let orchestrator = orchestrator(provider.clone());
    let package = orchestrator
        .run_to_completion(generate_request())
        .await
        .expect("workflow completes");

    assert_eq!(provider.calls(REFINE), 1);
    assert_eq!(package.template(), TEMPLATE);
    assert_eq!(package.evaluation.as_ref().map(|e| e.score()), Some(50.0));
}

#[tokio::test]
async fn test_refinement_without_rewrite_keeps_template() {
    let provider = Arc::new(
        RoutedProvider::new()
            .route(GENERATE, &[generated()])
            .route(EVALUATE, &[evaluation(40.0)])
            .route(REFINE, &[s(r#"{"notes": "kept as is"}"#)])
            .route(EXAMPLES, &[examples(9)])
            .route(DESCRIBE, &[s("Bring timeless botanical plates to any wall.")])
            .route(CATEGORIZE, &[s("Art & Illustration")])
            .route(ABSTRACT, &[abstract_examples()]),
    );
    let orchestrator = orchestrator(provider.clone());
    let events = collect(&orchestrator, generate_request()).await;

    let last = events.last().expect("events");
    assert_eq!(last.status, EventStatus::Completed);
    assert_eq!(provider.calls(REFINE), 1);
    assert_eq!(provider.calls(EXAMPLES), 1);

    let refinement = events
        .iter()
        .find(|e| e.step == WorkflowStep::Refinement && e.package.is_some())
        .expect("refinement event");
    assert!(refinement.message.contains("Refinement discarded"));
    let package = last.package.as_ref().expect("final package");
    assert_eq!(package.template(), TEMPLATE);
}

#[tokio::test]
async fn test_evaluation_failure_stops_run() {
    let provider = Arc::new(
        RoutedProvider::new()
            .route(GENERATE, &[generated()])
            .route(EVALUATE, &[s("I cannot review this today.")])
            .route(EXAMPLES, &[examples(9)]),
    );
    let orchestrator = orchestrator(provider.clone());
    let events = collect(&orchestrator, generate_request()).await;

    let last = events.last().expect("events");
    assert_eq!(last.status, EventStatus::Error);
    assert_eq!(last.step, WorkflowStep::ComplianceEvaluation);
    assert!(last.package.is_none());
    assert_eq!(provider.calls(EXAMPLES), 0);
    assert!(!events
        .iter()
        .any(|e| e.step == WorkflowStep::ExampleGeneration));

    let err = orchestrator
        .run_to_completion(generate_request())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("compliance_evaluation"));
}

#[tokio::test]
async fn test_soft_steps_fall_back() {
    let provider = Arc::new(
        RoutedProvider::new()
            .route(GENERATE, &[generated()])
            .route(EVALUATE, &[evaluation(85.0)])
            .route(EXAMPLES, &[examples(9)])
            .route(CATEGORIZE, &[s("Something else entirely")]),
    );
    let orchestrator = orchestrator(provider);
    let package = orchestrator
        .run_to_completion(generate_request())
        .await
        .expect("soft failures do not stop the run");

    assert_eq!(package.category.as_deref(), Some(UNCATEGORIZED));
    assert_eq!(package.category.as_deref(), Some("Uncategorized"));
    assert!(package.commercial_description.is_some());
    let log = package.enhancement_log.as_ref().expect("enhancement log");
    assert!(log.iter().any(|l| l.starts_with("Abstract example injection failed")));
    assert_eq!(package.examples.len(), 9);
}

#[tokio::test]
async fn test_dropped_stream_stops_calls() {
    let provider = Arc::new(happy_provider());
    let orchestrator = orchestrator(provider.clone());
    {
        let stream = orchestrator.run(generate_request());
        futures::pin_mut!(stream);
        // running + draft ready
        stream.next().await;
        stream.next().await;
    }
    assert_eq!(provider.calls(GENERATE), 1);
    assert_eq!(provider.calls(EVALUATE), 0);
}

#[tokio::test]
async fn test_quality_loop_keeps_best_version() {
    let provider = Arc::new(
        RoutedProvider::new()
            .route(EVALUATE, &[evaluation(60.0), evaluation(80.0)])
            .route(
                IMPROVE,
                &[improved(
                    "A vintage botanical illustration of [PLANT] in [COLOR_PALETTE] on [PAPER], soft window light",
                )],
            ),
    );
    let orchestrator = orchestrator(provider.clone());
    let package = PromptPackage::new(
        "Vintage Botanical Illustration Prints",
        ContentType::Image,
        "Midjourney",
        "",
        "",
        TEMPLATE,
    );

    let run = orchestrator.quality_loop().run(package).await;
    assert_eq!(run.stop_reason, StopReason::ThresholdReached);
    assert_eq!(run.history.len(), 2);
    assert_eq!(run.best.iteration, 1);
    assert_eq!(run.improvement(), 20.0);
    assert!(run.best.prompt.template().ends_with("soft window light"));
    assert_eq!(run.best.prompt.examples.len(), 9);
    assert_eq!(provider.calls(IMPROVE), 1);
}
