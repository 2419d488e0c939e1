//! Template handling for prompt packages.
//!
//! This module covers the two kinds of templates the forge deals with:
//!
//! - **Prompt templates** sold to end users, containing `[VARIABLE]`
//!   placeholders ([`variables`], [`extraction`]).
//! - **Instruction templates** sent to the model, using `{name}` format
//!   placeholders ([`render`]).
//!
//! It also owns the variable-preservation gate used by every agent that is
//! asked to rewrite a template without touching its variables.
//!
//! # Example
//!
//! ```
//! use prompt_forge::template::{extract_variables, reconcile};
//!
//! let original = extract_variables("A [SUBJECT] in [STYLE] style");
//! let result = reconcile(
//!     &original,
//!     "A [SUBJECT] drawn in [MEDIUM]",
//!     "A [SUBJECT] in [STYLE] style",
//! );
//! assert!(result.violation.is_some());
//! assert_eq!(result.template, "A [SUBJECT] in [STYLE] style");
//! ```

pub mod extraction;
pub mod render;
pub mod variables;

pub use extraction::fallback_extract_values;
pub use render::{referenced_placeholders, render};
pub use variables::{extract_variables, placeholder_token, placeholders, Placeholder};

use std::collections::BTreeSet;

use thiserror::Error;

/// A broken agent contract that was recovered locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    /// A variable-preserving rewrite changed the placeholder set.
    #[error("Variables changed: expected {expected:?}, got {produced:?}")]
    VariablesChanged {
        expected: BTreeSet<String>,
        produced: BTreeSet<String>,
    },

    /// The answer lacked the rewritten template.
    #[error("Answer has no '{field}'")]
    MissingRewrite { field: String },

    /// The model returned a different number of examples than requested.
    #[error("Wrong example count: expected {expected}, got {produced}")]
    ExampleCount { expected: usize, produced: usize },
}

/// Outcome of the variable-preservation gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Template to keep.
    pub template: String,
    /// Variables of the kept template.
    pub variables: BTreeSet<String>,
    /// Set when the produced template was rejected.
    pub violation: Option<ContractViolation>,
}

impl Reconciled {
    /// Whether the produced template was accepted.
    pub fn accepted(&self) -> bool {
        self.violation.is_none()
    }

    /// Keep `template` unchanged and report why.
    pub fn kept(template: &str, violation: ContractViolation) -> Self {
        Self {
            template: template.to_string(),
            variables: extract_variables(template),
            violation: Some(violation),
        }
    }
}

/// Accept `produced_template` only when its variables equal `original`.
///
/// On mismatch the fallback template is kept and a
/// [`ContractViolation::VariablesChanged`] is reported and logged.
pub fn reconcile(
    original: &BTreeSet<String>,
    produced_template: &str,
    fallback_template: &str,
) -> Reconciled {
    let produced = extract_variables(produced_template);

    if &produced == original {
        return Reconciled {
            template: produced_template.to_string(),
            variables: produced,
            violation: None,
        };
    }

    let violation = ContractViolation::VariablesChanged {
        expected: original.clone(),
        produced,
    };
    tracing::warn!(%violation, "Rewrite changed template variables, keeping original template");

    Reconciled::kept(fallback_template, violation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_accepts_same_variables() {
        let original = extract_variables("A [SUBJECT] in [STYLE]");
        let result = reconcile(&original, "Moody [STYLE] shot of [SUBJECT]", "A [SUBJECT] in [STYLE]");
        assert!(result.accepted());
        assert_eq!(result.template, "Moody [STYLE] shot of [SUBJECT]");
        assert_eq!(result.variables, original);
    }

    #[test]
    fn test_reconcile_reverts_on_mismatch() {
        let fallback = "A [SUBJECT] in [STYLE]";
        let original = extract_variables(fallback);
        let result = reconcile(&original, "A [SUBJECT] with [LIGHTING]", fallback);

        assert!(!result.accepted());
        assert_eq!(result.template, fallback);
        assert_eq!(result.variables, original);
        assert!(matches!(
            result.violation,
            Some(ContractViolation::VariablesChanged { .. })
        ));
    }

    #[test]
    fn test_reconcile_rejects_dropped_variable() {
        let fallback = "A [SUBJECT] in [STYLE]";
        let original = extract_variables(fallback);
        let result = reconcile(&original, "A [SUBJECT] in pastel", fallback);
        assert_eq!(result.template, fallback);
    }
}
