//! Best-effort marketplace polish applied at the end of a workflow run.
//!
//! Three independent fixes: the title is brought to the marketplace
//! pattern, a short example list is flagged, and abstract examples are
//! injected when fewer than two are present. Every action and failure is
//! recorded in `enhancement_log`; nothing here fails the run.

use crate::agents::EnhancerAgent;
use crate::package::PromptPackage;
use crate::quality::enhancement::{check_abstract_examples, check_example_count};
use crate::quality::title::validate_title;

/// Apply the enhancement pass and return the updated package.
pub async fn enhance_package(enhancer: &EnhancerAgent, mut package: PromptPackage) -> PromptPackage {
    let mut log = Vec::new();

    let title_check = validate_title(&package.topic);
    if title_check.is_valid {
        package.title_validation = Some(title_check);
    } else {
        let fix = enhancer.fix_title(&package).await;
        if fix.title != package.topic {
            log.push(format!(
                "Title fixed ({:?}): {} -> {}",
                fix.method, package.topic, fix.title
            ));
            package.original_topic = Some(std::mem::replace(&mut package.topic, fix.title));
        }
        package.title_validation = Some(fix.validation);
    }

    let count_check = check_example_count(&package);
    if !count_check.is_valid {
        log.push(format!(
            "Warning: Only {} examples (need {})",
            count_check.current_count, count_check.required_count
        ));
        package.needs_more_examples = Some(count_check.deficit);
    }

    let abstract_check = check_abstract_examples(&package);
    if !abstract_check.has_abstract {
        let wanted = abstract_check
            .required_count
            .saturating_sub(abstract_check.abstract_count);
        match enhancer.inject_abstract_examples(&package, wanted).await {
            Ok(examples) => {
                log.push(format!("Injected {} abstract examples", examples.len()));
                package.abstract_examples_injected = Some(examples.len());
                package.examples.extend(examples);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Abstract example injection failed");
                log.push(format!("Abstract example injection failed: {}", err));
            }
        }
    }

    package.enhancement_log = Some(log);
    package
}
