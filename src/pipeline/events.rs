//! Progress events emitted by a workflow run.

use serde::{Deserialize, Serialize};

use crate::package::PromptPackage;

/// Status carried by every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Running,
    Completed,
    Error,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Running => write!(f, "running"),
            EventStatus::Completed => write!(f, "completed"),
            EventStatus::Error => write!(f, "error"),
        }
    }
}

/// Steps of a workflow run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    InitialGeneration,
    ReverseEngineering,
    ImageAnalysis,
    TitleValidation,
    ComplianceEvaluation,
    Refinement,
    ExampleGeneration,
    TestGuidance,
    CommercialDescription,
    Categorization,
    QualityEnhancement,
    Complete,
}

impl WorkflowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::InitialGeneration => "initial_generation",
            WorkflowStep::ReverseEngineering => "reverse_engineering",
            WorkflowStep::ImageAnalysis => "image_analysis",
            WorkflowStep::TitleValidation => "title_validation",
            WorkflowStep::ComplianceEvaluation => "compliance_evaluation",
            WorkflowStep::Refinement => "refinement",
            WorkflowStep::ExampleGeneration => "example_generation",
            WorkflowStep::TestGuidance => "test_guidance",
            WorkflowStep::CommercialDescription => "commercial_description",
            WorkflowStep::Categorization => "categorization",
            WorkflowStep::QualityEnhancement => "quality_enhancement",
            WorkflowStep::Complete => "complete",
        }
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One progress event.
///
/// `package` is a snapshot taken after the step completed; it is absent on
/// the "starting" event of a step and on errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub status: EventStatus,
    pub step: WorkflowStep,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PromptPackage>,
}

impl WorkflowEvent {
    /// A step is about to run.
    pub fn running(step: WorkflowStep, message: impl Into<String>) -> Self {
        Self {
            status: EventStatus::Running,
            step,
            message: message.into(),
            package: None,
        }
    }

    /// A step finished; carries the package as it now stands.
    pub fn progress(step: WorkflowStep, message: impl Into<String>, package: &PromptPackage) -> Self {
        Self {
            status: EventStatus::Running,
            step,
            message: message.into(),
            package: Some(package.clone()),
        }
    }

    /// The run finished successfully.
    pub fn completed(package: PromptPackage) -> Self {
        Self {
            status: EventStatus::Completed,
            step: WorkflowStep::Complete,
            message: "Workflow complete".to_string(),
            package: Some(package),
        }
    }

    /// The run stopped at `step`.
    pub fn error(step: WorkflowStep, message: impl Into<String>) -> Self {
        Self {
            status: EventStatus::Error,
            step,
            message: message.into(),
            package: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != EventStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = WorkflowEvent::error(WorkflowStep::ComplianceEvaluation, "boom");
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["status"], "error");
        assert_eq!(json["step"], "compliance_evaluation");
        assert!(json.get("package").is_none());
        assert!(event.is_terminal());
        assert!(!WorkflowEvent::running(WorkflowStep::Refinement, "go").is_terminal());
    }
}
