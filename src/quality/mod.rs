//! Deterministic marketplace quality checks.
//!
//! Nothing in this module calls a model. These checks score examples,
//! validate titles and inspect packages so that agents and the orchestrator
//! can decide what to fix.

pub mod enhancement;
pub mod examples;
pub mod title;

pub use enhancement::{
    check_abstract_examples, check_example_count, is_abstract_example, AbstractCheck,
    EnhancementStats, ExampleCountCheck, ABSTRACT_KEYWORDS, MIN_ABSTRACT_EXAMPLES, MIN_EXAMPLES,
    RECOMMENDED_EXAMPLES,
};
pub use examples::{
    average_score, jaccard_similarity, validate_examples, validate_texts,
    ExampleValidationResult, GENERIC_AI_TERMS,
};
pub use title::{simple_title_fix, validate_title, DESCRIPTORS, FORMAT_TYPES};
