//! Deterministic testing guide for a package.
//!
//! Buyers get a short checklist tailored to the content type and, for the
//! major image platforms, a platform tip. No model call is involved.

use crate::package::{ContentType, PromptPackage, TestGuidance};

/// Build the testing guide for a package.
pub fn generate_test_guidance(package: &PromptPackage) -> TestGuidance {
    let mut test_instructions = vec![
        format!("Copy the template into {}.", platform_name(&package.platform)),
        "Replace every [VARIABLE] with your own value; keep the rest unchanged.".to_string(),
        "Run the prompt with two or three example values to see the range of results."
            .to_string(),
    ];

    let (quality_checklist, common_issues) = match package.content_type {
        ContentType::Image => (
            vec![
                "Subject matches the value given for each variable".to_string(),
                "Lighting and composition stay consistent across runs".to_string(),
                "Style keywords are visibly reflected in the output".to_string(),
                "No unwanted text, watermarks or artifacts".to_string(),
            ],
            vec![
                "Overly long variable values can dilute the style".to_string(),
                "Conflicting values (e.g. 'night' with 'bright sunlight') give muddy results"
                    .to_string(),
            ],
        ),
        ContentType::Text => (
            vec![
                "Output follows the requested structure and length".to_string(),
                "Tone matches the template's intended voice".to_string(),
                "Every variable value is used in the answer".to_string(),
                "No placeholder text is left in the output".to_string(),
            ],
            vec![
                "Vague variable values produce generic answers".to_string(),
                "Very long inputs may push the model past its context window".to_string(),
            ],
        ),
        ContentType::Video => (
            vec![
                "Camera movement matches the template description".to_string(),
                "Subject stays consistent from the first to the last frame".to_string(),
                "Pacing fits the intended clip length".to_string(),
            ],
            vec!["Several simultaneous actions tend to produce warped motion".to_string()],
        ),
    };

    let platform = package.platform.to_lowercase();
    if platform.contains("midjourney") {
        test_instructions.push(
            "Append parameters such as --ar 3:2 or --stylize 250 to tune framing and style strength."
                .to_string(),
        );
    } else if platform.contains("dall-e") || platform.contains("dalle") {
        test_instructions.push(
            "If a detail is ignored, move that clause closer to the start of the prompt."
                .to_string(),
        );
    }

    TestGuidance {
        test_instructions,
        quality_checklist,
        common_issues,
    }
}

fn platform_name(platform: &str) -> &str {
    let trimmed = platform.trim();
    if trimmed.is_empty() {
        "your AI tool"
    } else {
        trimmed
    }
}
