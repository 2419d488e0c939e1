//! Marketplace title checks.
//!
//! Titles that sell follow the pattern
//! `[Descriptor] + [Subject] + [Format/Type]` in three to six words, e.g.
//! "Whimsical Watercolor Character Art".

use crate::package::{TitleIssue, TitleValidation};

pub const MIN_TITLE_WORDS: usize = 3;
pub const MAX_TITLE_WORDS: usize = 6;

/// Titles scoring below this are reported with suggestions.
pub const TITLE_SCORE_THRESHOLD: f64 = 0.7;

/// Emotional or visual descriptor words.
pub const DESCRIPTORS: &[&str] = &[
    "cinematic",
    "ethereal",
    "dramatic",
    "whimsical",
    "surreal",
    "vintage",
    "minimalist",
    "vibrant",
    "moody",
    "dreamy",
    "bold",
    "elegant",
    "rustic",
    "futuristic",
    "mystical",
    "playful",
    "serene",
    "dynamic",
    "abstract",
    "geometric",
    "organic",
    "retro",
    "neo",
    "hyper",
    "ultra",
    "epic",
];

/// Format or product-type words.
pub const FORMAT_TYPES: &[&str] = &[
    "art",
    "illustration",
    "design",
    "photography",
    "portraits",
    "scenes",
    "landscapes",
    "mockups",
    "templates",
    "patterns",
    "icons",
    "logos",
    "poster",
    "wallpaper",
    "concept",
    "style",
    "aesthetic",
    "visuals",
    "renders",
    "compositions",
    "creations",
    "prints",
    "reveals",
    "tarot",
    "zines",
    "stickers",
    "graphics",
    "imagery",
    "artwork",
    "pieces",
    "shots",
    "images",
    "photos",
    "pictures",
    "views",
    "frames",
];

fn clean_title(title: &str) -> &str {
    title.trim().trim_matches('"').trim()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Check a title against the marketplace pattern.
///
/// Descriptor and format words are matched as case-insensitive substrings.
/// The score starts at 1.0 and loses 0.3 for a short title, 0.2 for a long
/// one, and 0.25 for each missing word class.
pub fn validate_title(title: &str) -> TitleValidation {
    let cleaned = clean_title(title);
    let lower = cleaned.to_lowercase();
    let word_count = cleaned.split_whitespace().count();

    let mut issues = Vec::new();
    let mut suggestions = Vec::new();
    let mut score: f64 = 1.0;

    if word_count < MIN_TITLE_WORDS {
        issues.push(TitleIssue::TooShort);
        suggestions.push("Add a style descriptor or use case".to_string());
        score -= 0.3;
    }
    if word_count > MAX_TITLE_WORDS {
        issues.push(TitleIssue::TooLong);
        suggestions.push("Condense to the essential elements".to_string());
        score -= 0.2;
    }

    let has_descriptor = contains_any(&lower, DESCRIPTORS);
    if !has_descriptor {
        issues.push(TitleIssue::MissingDescriptor);
        suggestions.push(format!("Consider: {}", DESCRIPTORS[..5].join(", ")));
        score -= 0.25;
    }

    let has_format_type = contains_any(&lower, FORMAT_TYPES);
    if !has_format_type {
        issues.push(TitleIssue::MissingFormatType);
        suggestions.push(format!("Add: {}", FORMAT_TYPES[..5].join(", ")));
        score -= 0.25;
    }

    TitleValidation {
        is_valid: issues.is_empty(),
        issues,
        word_count,
        has_descriptor,
        has_format_type,
        score: score.max(0.0),
        suggestions,
        original_title: title.to_string(),
    }
}

/// Deterministic title repair used when the model cannot help.
///
/// Truncates to the word limit, prepends "Cinematic" when no descriptor is
/// present, appends "Art" when no format word is present, then truncates
/// again.
pub fn simple_title_fix(title: &str) -> String {
    let mut words: Vec<String> = clean_title(title)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    words.truncate(MAX_TITLE_WORDS);

    let lower = words.join(" ").to_lowercase();
    if !contains_any(&lower, DESCRIPTORS) {
        words.insert(0, "Cinematic".to_string());
    }
    if !contains_any(&lower, FORMAT_TYPES) {
        words.push("Art".to_string());
    }
    words.truncate(MAX_TITLE_WORDS);

    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word_title() {
        let result = validate_title("Mockups");
        assert!(!result.is_valid);
        assert!(result.issues.contains(&TitleIssue::TooShort));
        assert!(result.issues.contains(&TitleIssue::MissingDescriptor));
        assert!(!result.issues.contains(&TitleIssue::MissingFormatType));
        assert!((result.score - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_good_title() {
        let result = validate_title("Whimsical Watercolor Character Art");
        assert!(result.is_valid);
        assert_eq!(result.word_count, 4);
        assert_eq!(result.score, 1.0);
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn test_long_title_and_quotes() {
        let result = validate_title("\"Epic Fantasy Castle Scenes For Tabletop Game Masters\"");
        assert_eq!(result.issues, vec![TitleIssue::TooLong]);
        assert!((result.score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_score_floor() {
        let result = validate_title("");
        assert_eq!(result.word_count, 0);
        assert!(result.score >= 0.0);
        assert!(result.score < TITLE_SCORE_THRESHOLD);
    }

    #[test]
    fn test_simple_fix_adds_descriptor_and_format() {
        assert_eq!(simple_title_fix("Coffee Shop"), "Cinematic Coffee Shop Art");
        assert!(validate_title(&simple_title_fix("Coffee Shop")).is_valid);
    }

    #[test]
    fn test_simple_fix_truncates() {
        let fixed = simple_title_fix("One Two Three Four Five Six Seven Eight");
        assert_eq!(fixed.split_whitespace().count(), MAX_TITLE_WORDS);
        assert!(fixed.starts_with("Cinematic"));
    }

    #[test]
    fn test_simple_fix_keeps_valid_words() {
        assert_eq!(simple_title_fix("Moody Harbor Photography"), "Moody Harbor Photography");
    }
}
