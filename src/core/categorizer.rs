//! Heuristic Categorizer: keyword rules for entries that arrive without labels
//!
//! Substring tests on lower-cased text, checked in fixed priority order.
//! Deterministic, not precise.

use lazy_static::lazy_static;
use crate::types::{Category, ConfidenceType};

lazy_static! {
    // =========================================================================
    // Category rules, first match wins. Order follows Category::NAMED.
    // =========================================================================
    static ref CATEGORY_RULES: Vec<(Category, Vec<&'static str>)> = vec![
        (Category::TechnicalSkills, vec![
            "frontend", "backend", "coding", "code", "js", "javascript",
            "react", "python", "bug", "pipeline", "sentry",
        ]),
        (Category::ProfessionalPresentation, vec![
            "present", "demo", "cursor", "laugh", "confidently", "playfully",
        ]),
        (Category::SelfImage, vec![
            "mirror", "powerful", "growth", "mood", "perfect",
        ]),
        (Category::SocialInteractions, vec![
            "talk", "therapist", "friends", "family", "conversation",
        ]),
        (Category::CreativeWork, vec![
            "video", "pomodoro", "ocean", "curiosity", "meditation", "painting", "music",
        ]),
        (Category::PersonalGrowth, vec![
            "learn", "lesson", "insight", "realiz", "reflect", "habit",
        ]),
        (Category::PhysicalWellness, vec![
            "teeth", "recovery", "dentist", "health", "workout", "sleep",
        ]),
        (Category::CareerDevelopment, vec![
            "recruiter", "email", "interview", "job", "resume",
        ]),
    ];

    // =========================================================================
    // Confidence type rules, professional checked first
    // =========================================================================
    static ref PROFESSIONAL_KEYWORDS: Vec<&'static str> = vec![
        "work", "frontend", "backend", "demo", "cursor", "interview", "recruiter", "pipeline",
    ];

    static ref PERSONAL_KEYWORDS: Vec<&'static str> = vec![
        "mirror", "feel", "growth", "meditation", "personal", "therapist",
    ];
}

/// Category used when no rule matches
pub const DEFAULT_CATEGORY: Category = Category::PersonalGrowth;

/// Confidence type used when no rule matches
pub const DEFAULT_CONFIDENCE_TYPE: ConfidenceType = ConfidenceType::Personal;

/// Keyword-based categorizer
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicCategorizer;

impl HeuristicCategorizer {
    /// Create new categorizer
    pub fn new() -> Self {
        Self
    }

    /// Category of the first keyword set with a hit
    pub fn categorize(&self, text: &str) -> Category {
        let lower = text.to_lowercase();
        CATEGORY_RULES
            .iter()
            .find(|(_, words)| contains_any(&lower, words))
            .map(|(category, _)| category.clone())
            .unwrap_or(DEFAULT_CATEGORY)
    }

    /// Professional if any professional keyword hits, else personal
    pub fn confidence_type(&self, text: &str) -> ConfidenceType {
        let lower = text.to_lowercase();
        if contains_any(&lower, &PROFESSIONAL_KEYWORDS) {
            ConfidenceType::Professional
        } else if contains_any(&lower, &PERSONAL_KEYWORDS) {
            ConfidenceType::Personal
        } else {
            DEFAULT_CONFIDENCE_TYPE
        }
    }

    /// Both labels at once
    pub fn classify(&self, text: &str) -> (Category, ConfidenceType) {
        (self.categorize(text), self.confidence_type(text))
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_category() {
        let c = HeuristicCategorizer::new();
        assert_eq!(c.categorize("Feel great today"), Category::PersonalGrowth);
        assert_eq!(c.categorize(""), Category::PersonalGrowth);
    }

    #[test]
    fn test_keyword_hits() {
        let c = HeuristicCategorizer::new();
        assert_eq!(c.categorize("Fixed the React bug alone"), Category::TechnicalSkills);
        assert_eq!(c.categorize("Gave the demo without notes"), Category::ProfessionalPresentation);
        assert_eq!(c.categorize("Liked the MIRROR today"), Category::SelfImage);
        assert_eq!(c.categorize("Long talk with friends"), Category::SocialInteractions);
        assert_eq!(c.categorize("Edited a video"), Category::CreativeWork);
        assert_eq!(c.categorize("Finally went to the dentist"), Category::PhysicalWellness);
        assert_eq!(c.categorize("A recruiter reached out"), Category::CareerDevelopment);
    }

    #[test]
    fn test_priority_order() {
        let c = HeuristicCategorizer::new();
        // "code" (technical) outranks "interview" (career)
        assert_eq!(c.categorize("Live code interview went well"), Category::TechnicalSkills);
        // "powerful" (self image) outranks "talk" (social)
        assert_eq!(c.categorize("Felt powerful during the talk"), Category::SelfImage);
    }

    #[test]
    fn test_confidence_type() {
        let c = HeuristicCategorizer::new();
        assert_eq!(c.confidence_type("Nailed the interview"), ConfidenceType::Professional);
        assert_eq!(c.confidence_type("I feel calm"), ConfidenceType::Personal);
        assert_eq!(c.confidence_type("Sunny"), ConfidenceType::Personal);
        // professional checked first
        assert_eq!(c.confidence_type("I feel good about work"), ConfidenceType::Professional);
    }

    #[test]
    fn test_determinism() {
        let c = HeuristicCategorizer::new();
        let text = "Presented my pipeline refactor to the team";
        let first = c.classify(text);
        for _ in 0..10 {
            assert_eq!(c.classify(text), first);
        }
    }
}
