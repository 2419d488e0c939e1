//! Bounded evaluate/improve loop with best-version selection.
//!
//! Iteration 0 is the package as given. After every evaluation the loop
//! stops when the score reaches the quality threshold, when the iteration
//! limit is hit, or when the last two scores are identical; otherwise the
//! refiner produces the next iteration. Failures end the loop early but
//! never discard the history collected so far.

use serde::{Deserialize, Serialize};

use crate::agents::{EvaluatorAgent, RefinerAgent};
use crate::package::{Evaluation, PackageStage, PromptPackage};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    ThresholdReached,
    MaxIterations,
    Plateau,
    EvaluationFailed,
    ImprovementFailed,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::ThresholdReached => write!(f, "quality threshold reached"),
            StopReason::MaxIterations => write!(f, "iteration limit reached"),
            StopReason::Plateau => write!(f, "score plateaued"),
            StopReason::EvaluationFailed => write!(f, "evaluation failed"),
            StopReason::ImprovementFailed => write!(f, "improvement failed"),
        }
    }
}

/// One evaluated version of the package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementHistoryEntry {
    pub iteration: usize,
    /// The package as evaluated, with its evaluation attached.
    pub prompt: PromptPackage,
    pub evaluation: Option<Evaluation>,
    /// Total score; 0 when the evaluation failed or had no total.
    pub score: f64,
}

/// Outcome of a loop run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRun {
    /// Highest-scoring entry; ties go to the earliest iteration.
    pub best: ImprovementHistoryEntry,
    pub history: Vec<ImprovementHistoryEntry>,
    pub stop_reason: StopReason,
}

impl QualityRun {
    /// Score gained over iteration 0.
    pub fn improvement(&self) -> f64 {
        let initial = self.history.first().map(|e| e.score).unwrap_or(0.0);
        self.best.score - initial
    }
}

/// Index of the best entry; the first maximum wins.
pub fn best_entry_index(history: &[ImprovementHistoryEntry]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, entry) in history.iter().enumerate() {
        match best {
            Some((_, score)) if entry.score <= score => {}
            _ => best = Some((index, entry.score)),
        }
    }
    best.map(|(index, _)| index)
}

/// The quality improvement loop.
pub struct QualityLoop {
    evaluator: EvaluatorAgent,
    refiner: RefinerAgent,
    quality_threshold: f64,
    max_iterations: usize,
}

impl std::fmt::Debug for QualityLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityLoop")
            .field("quality_threshold", &self.quality_threshold)
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

impl QualityLoop {
    pub fn new(
        evaluator: EvaluatorAgent,
        refiner: RefinerAgent,
        quality_threshold: f64,
        max_iterations: usize,
    ) -> Self {
        Self {
            evaluator,
            refiner,
            quality_threshold,
            max_iterations,
        }
    }

    /// Run the loop on `package`.
    pub async fn run(&self, package: PromptPackage) -> QualityRun {
        let mut history: Vec<ImprovementHistoryEntry> = Vec::new();
        let mut current = package;
        let mut iteration = 0;

        let stop_reason = loop {
            let evaluation = match self.evaluator.evaluate(&current).await {
                Ok(evaluation) => Some(evaluation),
                Err(err) => {
                    tracing::warn!(iteration, error = %err, "Evaluation failed");
                    None
                }
            };
            let score = evaluation.as_ref().map(Evaluation::score).unwrap_or(0.0);

            let mut snapshot = current.clone();
            snapshot.evaluation = evaluation.clone();
            snapshot.advance_stage(PackageStage::Evaluated);
            history.push(ImprovementHistoryEntry {
                iteration,
                prompt: snapshot,
                evaluation: evaluation.clone(),
                score,
            });
            tracing::info!(iteration, score, "Iteration evaluated");

            let Some(evaluation) = evaluation else {
                break StopReason::EvaluationFailed;
            };
            if score >= self.quality_threshold {
                break StopReason::ThresholdReached;
            }
            if iteration >= self.max_iterations {
                break StopReason::MaxIterations;
            }
            if let [.., previous, last] = history.as_slice() {
                if previous.score == last.score {
                    break StopReason::Plateau;
                }
            }

            match self.refiner.improve(&current, &evaluation).await {
                Ok(improvement) => {
                    if let Some(violation) = &improvement.violation {
                        tracing::warn!(iteration, %violation, "Improved template rejected, kept previous");
                    }
                    current = improvement.apply_to(&current);
                    iteration += 1;
                }
                Err(err) => {
                    tracing::warn!(iteration, error = %err, "Improvement failed");
                    break StopReason::ImprovementFailed;
                }
            }
        };

        let best_index = best_entry_index(&history).unwrap_or(0);
        let best = history[best_index].clone();
        tracing::info!(
            best_iteration = best.iteration,
            best_score = best.score,
            iterations = history.len(),
            %stop_reason,
            "Quality loop finished"
        );

        QualityRun {
            best,
            history,
            stop_reason,
        }
    }
}
