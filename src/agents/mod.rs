//! Single-purpose LLM agents for the prompt-forge workflow.
//!
//! Each agent renders one named instruction template from
//! [`PromptsConfig`](crate::prompts::PromptsConfig), makes one completion
//! call through an [`AgentContext`], and normalizes the answer into a
//! package fragment. Agents hold no state between calls and never retry.

pub mod categorizer;
pub mod context;
pub mod describer;
pub mod enhancer;
pub mod error;
pub mod evaluator;
pub mod examples;
pub mod extractor;
pub mod fields;
pub mod generator;
pub mod ideation;
pub mod refiner;
pub mod reverse;
pub mod test_guidance;

pub use categorizer::{match_category, CategorizerAgent, UNCATEGORIZED};
pub use context::{AgentContext, SamplingConfig};
pub use describer::{DescriptionAgent, FALLBACK_DESCRIPTION};
pub use enhancer::{EnhancerAgent, TitleFix, TitleFixMethod};
pub use error::{AgentError, AgentResult};
pub use evaluator::EvaluatorAgent;
pub use examples::{ExampleAction, ExampleAgent};
pub use extractor::VariableExtractorAgent;
pub use generator::{GenerationBrief, GeneratorAgent};
pub use ideation::{IdeationAgent, PromptConcept, Trend};
pub use refiner::{Improvement, RefinerAgent, RefinerConfig};
pub use reverse::{ReverseEngineerAgent, SELF_EVALUATION_THRESHOLD};
pub use test_guidance::generate_test_guidance;
