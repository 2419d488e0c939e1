//! Built-in instruction templates.
//!
//! These are the templates every installation starts from. YAML files loaded
//! through [`PromptsConfig::load`](super::PromptsConfig::load) override them
//! key by key. Literal braces in inline JSON examples are escaped as `{{`/`}}`.

/// Instruction for generating an image prompt template.
pub const IMAGE_META_PROMPT: &str = r#"You are a top-selling prompt engineer on a prompt marketplace, specialised in {model_platform}.

Create a reusable, commercially attractive IMAGE prompt template.

TOPIC: {topic}
STYLE: {style}
USE CASE: {use_case}
{reference_examples}

REQUIREMENTS:
1. The template must contain between 4 and 6 variables written in square brackets, e.g. [SUBJECT], [COLOR PALETTE].
2. Everything that defines the signature look (lighting, composition, medium, camera) stays fixed in the template.
3. Variables must be simple for a buyer to fill in.
4. Avoid generic filler words such as "beautiful", "stunning", "4k" or "masterpiece".
5. Use syntax and parameters that work well on {model_platform}.

Return ONLY a JSON object:
{{
  "template": "The prompt template with [VARIABLES]",
  "variables_explanation": {{"VARIABLE": "What the buyer should put here"}},
  "example_prompts": ["Nine fully filled example prompts"],
  "technical_tips": ["Platform specific tips"],
  "description": "Short marketplace description",
  "instructions": "How to use the template"
}}"#;

/// Instruction for generating a text prompt template.
pub const TEXT_META_PROMPT: &str = r#"You are a top-selling prompt engineer on a prompt marketplace, specialised in {model_platform}.

Create a reusable, commercially attractive TEXT prompt template.

TOPIC: {topic}
TONE / STYLE: {style}
USE CASE: {use_case}
{reference_examples}

REQUIREMENTS:
1. The template must contain between 4 and 6 variables written in square brackets, e.g. [AUDIENCE], [PRODUCT].
2. The template defines role, structure, tone and output format; the buyer only supplies the variables.
3. The output must be consistent across very different inputs.

Return ONLY a JSON object:
{{
  "template": "The prompt template with [VARIABLES]",
  "variables_explanation": {{"VARIABLE": "What the buyer should put here"}},
  "example_prompts": ["Nine fully filled example prompts"],
  "writing_strategy": ["Tips for getting the best results"],
  "description": "Short marketplace description",
  "instructions": "How to use the template"
}}"#;

/// Instruction for generating a video prompt template.
pub const VIDEO_META_PROMPT: &str = r#"You are a top-selling prompt engineer on a prompt marketplace, specialised in {model_platform}.

Create a reusable, commercially attractive VIDEO prompt template.

TOPIC: {topic}
STYLE: {style}
USE CASE: {use_case}
{reference_examples}

REQUIREMENTS:
1. The template must contain between 4 and 6 variables written in square brackets, e.g. [SUBJECT], [CAMERA MOVE].
2. Describe shot type, camera motion, pacing, lighting and sound in the fixed part of the template.
3. Keep a single continuous shot unless the use case requires cuts.

Return ONLY a JSON object:
{{
  "template": "The prompt template with [VARIABLES]",
  "variables_explanation": {{"VARIABLE": "What the buyer should put here"}},
  "example_prompts": ["Nine fully filled example prompts"],
  "video_techniques": ["Platform specific techniques"],
  "description": "Short marketplace description",
  "instructions": "How to use the template"
}}"#;

/// Instruction for reverse-engineering a package from raw template text.
pub const REVERSE_ENGINEER_META_PROMPT: &str = r#"You are a prompt marketplace analyst. Reverse engineer the following prompt into a sellable template package.

PROMPT:
{template}

TASKS:
1. Identify the topic, style and use case.
2. Turn the parts a buyer would want to change into 4-6 [VARIABLES]; keep the signature look fixed.
3. Critically evaluate your own template on a 0-10 scale. If it scores below 7, improve it.

Return ONLY a JSON object:
{{
  "topic": "Marketplace title",
  "style": "Style summary",
  "use_case": "Primary use case",
  "original_template": "The prompt as given",
  "template": "Your template with [VARIABLES]",
  "variables_explanation": {{"VARIABLE": "Explanation"}},
  "example_prompts": ["Filled examples"],
  "technical_tips": ["Tips"],
  "description": "Short marketplace description",
  "instructions": "How to use the template",
  "self_evaluation": {{"overall_score": 8, "strengths": ["..."], "weaknesses": ["..."]}}
}}"#;

/// Instruction for reverse-engineering a package from an image.
pub const REVERSE_ENGINEER_IMAGE_PROMPT: &str = r#"You are an expert visual analyst and prompt engineer. Study the attached image and write a reusable prompt template that reproduces its look with different subjects.

{additional_context}

TASKS:
1. Describe the medium, lighting, composition, palette and mood that define the image.
2. Write a template where those qualities are fixed and 4-6 [VARIABLES] cover what a buyer would change.
3. Critically evaluate your template on a 0-10 scale. If it scores below 7, also provide an improved version.

Return ONLY a JSON object:
{{
  "topic": "Marketplace title",
  "style": ["style keyword", "style keyword"],
  "use_case": "Primary use case",
  "template": "Your template with [VARIABLES]",
  "variables_explanation": {{"VARIABLE": "Explanation"}},
  "example_prompts": ["Filled examples"],
  "technical_tips": ["Tips"],
  "description": "Short marketplace description",
  "self_evaluation": {{"overall_score": 8, "issues": ["..."]}},
  "improved_template": "Only when overall_score is below 7"
}}"#;

/// Instruction for the compliance evaluation rubric.
pub const AGENT_QUALITY_EVALUATION: &str = r#"You are a strict prompt marketplace reviewer. Evaluate this prompt package for approval.

TITLE: {prompt_title}

TEMPLATE:
{prompt_template}

EXAMPLES:
{variable_examples}

DESCRIPTION:
{commercial_description}

Score each criterion from 0 to 20:
- clarity: is the template easy to understand and fill in?
- originality: does it offer a distinctive, non-generic result?
- versatility: do the variables allow meaningfully different outputs?
- commercial_value: would buyers pay for it?
- compliance: does it respect marketplace rules (no generic filler, 4+ variables, no copyrighted names)?

Return ONLY a JSON object:
{{
  "scores": {{"clarity": 0, "originality": 0, "versatility": 0, "commercial_value": 0, "compliance": 0}},
  "total_score": 0,
  "priority_improvements": ["Most important fix first"]
}}"#;

/// Instruction for a single refinement pass.
pub const AGENT_REFINE_PROMPT: &str = r#"You are an expert prompt engineer. Improve a prompt template based on a quality review.

CURRENT TEMPLATE:
{prompt_template}

EVALUATION FEEDBACK:
- Total score: {total_score} / 100
- Key issues to fix: {priority_improvements}

YOUR TASK:
1. Rewrite the template to address the key issues.
2. You MUST keep exactly these variables: {variables}
3. Return ONLY a JSON object with the single key "improved_template"."#;

/// Instruction for a quality-loop improvement pass.
pub const AGENT_IMPROVE_PROMPT: &str = r#"You are an expert prompt engineer iterating on a marketplace prompt package.

CURRENT TEMPLATE:
{prompt_template}

VARIABLES (must be preserved exactly): {variables}

CURRENT EXAMPLES:
{examples}

REVIEW:
- Total score: {total_score} / 100
- Priority improvements: {priority_improvements}

YOUR TASK:
1. Improve the template to address the review without adding, removing or renaming variables.
2. Provide exactly {num_examples} diverse example prompts filled from the improved template.
3. List the changes you made and explain why they improve the score.

Return ONLY a JSON object:
{{
  "improved_template": "...",
  "examples": ["..."],
  "changes_made": ["..."],
  "rationale": "..."
}}"#;

/// Instruction for topping up a short example list.
pub const AGENT_ADDITIONAL_EXAMPLES: &str = r#"You are a creative assistant. Generate {count} additional example prompts for this template.

TEMPLATE:
{prompt_template}

VARIABLES: {variables}

EXISTING EXAMPLES (do not repeat these):
{existing_examples}

Return ONLY a JSON object:
{{"examples": ["..."]}}"#;

/// Instruction for generating structured examples.
pub const AGENT_GENERATE_EXAMPLES: &str = r#"You are a creative assistant specialising in demonstrating the full potential of prompt templates.
Generate {num_examples} diverse, client-friendly examples for the template below.

TEMPLATE:
{prompt_template}

VARIABLES: {variables}

STRATEGY:
1. Mix literal values ("a cozy cabin") with conceptual ones ("the weight of forgotten summers").
2. Keep variable values simple; the template carries the complexity.
3. Make every example substantively different.

Return ONLY a JSON object with the key "examples": a list of {num_examples} objects, each with
"variables" (an object mapping every variable name to its value) and "prompt" (the filled template).
{{"examples": [{{"variables": {{"VARIABLE": "value"}}, "prompt": "..."}}]}}"#;

/// Instruction for completing an example list up to a target.
pub const AGENT_COMPLETE_EXAMPLES: &str = r#"You are a creative assistant. Generate {count} new, diverse example prompts for a template. They MUST differ from the existing examples.

TEMPLATE:
{prompt_template}

VARIABLES: {variables}

EXISTING EXAMPLES (do not repeat these):
{existing_examples}

Return ONLY a JSON object with the single key "new_examples", a list of strings."#;

/// Instruction for regenerating a single example.
pub const AGENT_REGENERATE_EXAMPLE: &str = r#"You are a creative assistant. Regenerate a single example prompt. It must be distinct from every example in the list.

TEMPLATE:
{prompt_template}

FULL LIST OF CURRENT EXAMPLES:
{existing_examples}

EXAMPLE TO REPLACE:
"{example_to_replace}"

Return ONLY a JSON object with the single key "new_example", a string."#;

/// Instruction for the marketplace description.
pub const PRODUCT_DESCRIPTION_PROMPT: &str = r#"Write a persuasive marketplace description (60-120 words) for a {content_type} prompt template about "{topic}".
Highlight who it is for and what they get. Mention these use cases: {use_cases}.
Do not use markdown. Return only the description text."#;

/// Instruction for picking a category.
pub const AGENT_CATEGORIZE_PROMPT: &str = r#"Assign the prompt below to exactly one category from the list.

TITLE: {prompt_title}
DESCRIPTION: {prompt_description}
TEMPLATE: {prompt_template}

CATEGORIES:
{category_list}

Answer with the category name only."#;

/// Instruction for LLM-based variable extraction.
pub const VARIABLE_EXTRACTION_PROMPT: &str = r#"Extract the values used for these template variables from the text below: {variables}

TEXT:
{text}

Return ONLY a JSON object mapping each variable name to the value found in the text."#;

/// Instruction for fixing a marketplace title.
pub const TITLE_FIX_PROMPT: &str = r#"You are a marketplace title optimisation expert.

Fix this title to match the pattern: [Emotional/Visual Descriptor] + [Subject] + [Format/Type]

ORIGINAL TITLE: "{title}"
ISSUES: {issues}
{context}

REQUIREMENTS:
1. 3-6 words total.
2. Start with a descriptor such as: {descriptors}
3. End with a format type such as: {format_types}
4. Keep the core concept intact.

GOOD TITLES:
- "Cinematic Micro-Drone Product Reveals"
- "Surreal Edible Landscapes"
- "Whimsical Watercolor Character Art"

Return ONLY a JSON object:
{{"fixed_title": "Your Fixed Title"}}"#;

/// Instruction for injecting abstract, mood-driven examples.
pub const ABSTRACT_EXAMPLES_PROMPT: &str = r#"You are an expert prompt example creator.

Generate {count} ABSTRACT/CONCEPTUAL examples for this template that focus on mood, emotion or atmosphere rather than concrete subjects.

TEMPLATE: "{prompt_template}"
TOPIC: "{topic}"

GOOD EXAMPLES:
- "A sense of forgotten history and melancholic beauty"
- "The ephemeral weight of passing time"

Return ONLY a JSON object:
{{"abstract_examples": ["example1", "example2"]}}"#;

/// Instruction for brainstorming prompt concepts.
pub const IDEA_GENERATION_META_PROMPT: &str = r#"You are a prompt marketplace strategist. Propose commercially promising prompt concepts for the theme "{theme}".

MARKET ANALYSIS:
{market_analysis}

Return ONLY a JSON object:
{{"concepts": [{{"title": "...", "content_type": "Image", "style": "...", "use_case": "...", "rationale": "..."}}]}}"#;

/// Instruction for trend analysis over market data.
pub const TREND_ANALYSIS_PROMPT: &str = r#"Analyse the following marketplace data and predict which prompt concepts are trending.

DATA:
{market_data}

Return ONLY a JSON object:
{{"trends": [{{"name": "...", "evidence": "...", "suggested_prompt": "..."}}]}}"#;

/// Categories offered to the categorizer.
pub const PROMPT_CATEGORIES: &[&str] = &[
    "Art & Illustration",
    "Photography",
    "Logos & Icons",
    "Product Mockups",
    "3D Renders",
    "Anime & Cartoon",
    "Fantasy & Sci-Fi",
    "Patterns & Textures",
    "Marketing & Copywriting",
    "Writing & Storytelling",
    "Business & Productivity",
    "Education",
    "Video & Animation",
];

/// Every built-in template, keyed by configuration name.
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("image_meta_prompt", IMAGE_META_PROMPT),
    ("text_meta_prompt", TEXT_META_PROMPT),
    ("video_meta_prompt", VIDEO_META_PROMPT),
    ("reverse_engineer_meta_prompt", REVERSE_ENGINEER_META_PROMPT),
    ("reverse_engineer_image_prompt", REVERSE_ENGINEER_IMAGE_PROMPT),
    ("agent_quality_evaluation", AGENT_QUALITY_EVALUATION),
    ("agent_refine_prompt", AGENT_REFINE_PROMPT),
    ("agent_improve_prompt", AGENT_IMPROVE_PROMPT),
    ("agent_additional_examples", AGENT_ADDITIONAL_EXAMPLES),
    ("agent_generate_examples", AGENT_GENERATE_EXAMPLES),
    ("agent_complete_examples", AGENT_COMPLETE_EXAMPLES),
    ("agent_regenerate_example", AGENT_REGENERATE_EXAMPLE),
    ("product_description_prompt", PRODUCT_DESCRIPTION_PROMPT),
    ("agent_categorize_prompt", AGENT_CATEGORIZE_PROMPT),
    ("variable_extraction_prompt", VARIABLE_EXTRACTION_PROMPT),
    ("title_fix_prompt", TITLE_FIX_PROMPT),
    ("abstract_examples_prompt", ABSTRACT_EXAMPLES_PROMPT),
    ("idea_generation_meta_prompt", IDEA_GENERATION_META_PROMPT),
    ("trend_analysis_prompt", TREND_ANALYSIS_PROMPT),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::render;

    #[test]
    fn test_builtin_keys_unique() {
        let mut keys: Vec<&str> = BUILTIN_TEMPLATES.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), BUILTIN_TEMPLATES.len());
    }

    #[test]
    fn test_json_examples_render_with_balanced_braces() {
        let out = render::render(
            "agent_quality_evaluation",
            AGENT_QUALITY_EVALUATION,
            &[
                ("prompt_title", "t"),
                ("prompt_template", "p"),
                ("variable_examples", "[]"),
                ("commercial_description", "d"),
            ],
        )
        .expect("should render");
        assert!(out.contains("\"scores\": {\"clarity\": 0"));
        assert_eq!(out.matches('{').count(), out.matches('}').count());
    }

    #[test]
    fn test_categories_present() {
        assert!(!PROMPT_CATEGORIES.is_empty());
    }
}
