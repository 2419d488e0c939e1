//! Workflow orchestration for prompt packages.
//!
//! # Architecture
//!
//! - **Orchestrator**: runs the end-to-end pipeline as a stream of
//!   [`WorkflowEvent`]s, from the first draft to the enhanced package.
//! - **Quality loop**: bounded evaluate/improve cycles that keep the best
//!   version seen.
//! - **Gap fill**: tops a list up to a target count with bounded retries.
//! - **Quick copy**: per-example variable values and the marketplace block.
//! - **Config**: thresholds, sampling and limits for a run.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use prompt_forge::agents::GenerationBrief;
//! use prompt_forge::package::ContentType;
//! use prompt_forge::pipeline::{WorkflowConfig, WorkflowOrchestrator, WorkflowRequest};
//!
//! let orchestrator = WorkflowOrchestrator::new(llm, prompts, WorkflowConfig::from_env()?);
//! let brief = GenerationBrief::new("Retro Travel Posters", ContentType::Image, "Midjourney");
//! let events = orchestrator.run(WorkflowRequest::Generate(brief));
//! futures::pin_mut!(events);
//! while let Some(event) = events.next().await {
//!     println!("[{}] {}: {}", event.status, event.step, event.message);
//! }
//! ```

pub mod config;
pub mod enhance;
pub mod events;
pub mod gap_fill;
pub mod orchestrator;
pub mod quality_loop;
pub mod quick_copy;
pub mod state;

pub use config::{WorkflowConfig, WorkflowConfigError};
pub use enhance::enhance_package;
pub use events::{EventStatus, WorkflowEvent, WorkflowStep};
pub use gap_fill::{fill_gap, GapFill, DEFAULT_MAX_ROUNDS};
pub use orchestrator::{WorkflowOrchestrator, WorkflowRequest};
pub use quality_loop::{
    best_entry_index, ImprovementHistoryEntry, QualityLoop, QualityRun, StopReason,
};
pub use quick_copy::{add_quick_copy, QuickCopySummary, MIN_MARKETPLACE_VARIABLES};
pub use state::WorkflowState;

use thiserror::Error;

use crate::agents::AgentError;

/// Errors that end a workflow run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A hard step failed.
    #[error("Step {step} failed: {source}")]
    StepFailed {
        step: WorkflowStep,
        source: AgentError,
    },

    /// The event stream ended with an error event.
    #[error("Workflow stopped at {step}: {message}")]
    Stopped { step: WorkflowStep, message: String },

    /// The request cannot be served.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The event stream ended without a terminal event.
    #[error("Workflow ended without a result")]
    Incomplete,
}
