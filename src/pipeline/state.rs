//! Caller-owned workflow state.
//!
//! Front ends keep one [`WorkflowState`] per session and thread it through
//! each action by value: apply the events of a run, attach the result of a
//! quality loop, pick an iteration from the history.

use serde::{Deserialize, Serialize};

use super::events::WorkflowEvent;
use super::orchestrator::WorkflowRequest;
use super::quality_loop::{ImprovementHistoryEntry, QualityRun, StopReason};
use super::WorkflowError;
use crate::package::PromptPackage;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub request: Option<WorkflowRequest>,
    /// The latest package seen.
    pub package: Option<PromptPackage>,
    pub history: Vec<ImprovementHistoryEntry>,
    /// Iteration chosen from `history`.
    pub selected_iteration: Option<usize>,
    pub stop_reason: Option<StopReason>,
    /// Message of the last event applied.
    pub last_message: Option<String>,
}

impl WorkflowState {
    pub fn new(request: WorkflowRequest) -> Self {
        Self {
            request: Some(request),
            ..Self::default()
        }
    }

    /// Start from an existing package, e.g. one loaded from disk.
    pub fn from_package(package: PromptPackage) -> Self {
        Self {
            package: Some(package),
            ..Self::default()
        }
    }

    /// Fold one orchestrator event into the state.
    pub fn apply_event(mut self, event: &WorkflowEvent) -> Self {
        if let Some(package) = &event.package {
            self.package = Some(package.clone());
        }
        self.last_message = Some(event.message.clone());
        self
    }

    /// Attach a quality loop result; the best iteration becomes current.
    pub fn with_quality_run(mut self, run: QualityRun) -> Self {
        self.selected_iteration = Some(run.best.iteration);
        self.package = Some(run.best.prompt);
        self.stop_reason = Some(run.stop_reason);
        self.history = run.history;
        self
    }

    /// Make another recorded iteration current.
    pub fn select_iteration(mut self, iteration: usize) -> Result<Self, WorkflowError> {
        let entry = self
            .history
            .iter()
            .find(|entry| entry.iteration == iteration)
            .ok_or_else(|| {
                WorkflowError::InvalidRequest(format!(
                    "iteration {} is not in the improvement history",
                    iteration
                ))
            })?;
        self.package = Some(entry.prompt.clone());
        self.selected_iteration = Some(iteration);
        Ok(self)
    }

    /// The package of the selected iteration, or the latest package.
    pub fn current_package(&self) -> Option<&PromptPackage> {
        self.selected_iteration
            .and_then(|iteration| self.history.iter().find(|e| e.iteration == iteration))
            .map(|entry| &entry.prompt)
            .or(self.package.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::ContentType;
    use crate::pipeline::events::WorkflowStep;

    fn package(template: &str) -> PromptPackage {
        PromptPackage::new("Bold Neon Signs", ContentType::Image, "Midjourney", "", "", template)
    }

    fn entry(iteration: usize, score: f64) -> ImprovementHistoryEntry {
        ImprovementHistoryEntry {
            iteration,
            prompt: package(&format!("Sign v{} for [BRAND]", iteration)),
            evaluation: None,
            score,
        }
    }

    #[test]
    fn test_apply_event_tracks_latest_package() {
        let state = WorkflowState::default()
            .apply_event(&WorkflowEvent::progress(WorkflowStep::TestGuidance, "ok", &package("A [X]")))
            .apply_event(&WorkflowEvent::running(WorkflowStep::Categorization, "next"));
        assert_eq!(state.package.as_ref().map(|p| p.template()), Some("A [X]"));
        assert_eq!(state.last_message.as_deref(), Some("next"));
    }

    #[test]
    fn test_quality_run_and_selection() {
        let run = QualityRun {
            best: entry(1, 80.0),
            history: vec![entry(0, 60.0), entry(1, 80.0)],
            stop_reason: StopReason::ThresholdReached,
        };
        let state = WorkflowState::from_package(package("A [X]")).with_quality_run(run);
        assert_eq!(state.selected_iteration, Some(1));
        assert_eq!(state.current_package().map(|p| p.template()), Some("Sign v1 for [BRAND]"));

        let state = state.select_iteration(0).expect("iteration 0 exists");
        assert_eq!(state.current_package().map(|p| p.template()), Some("Sign v0 for [BRAND]"));

        let err = state.select_iteration(7).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRequest(_)));
    }
}
