//! Entry types: one dated confidence note from a diary page

use serde::{Deserialize, Serialize};
use crate::{POWER_LEVEL_MAX, POWER_LEVEL_MIN};

/// Confidence area of an entry
///
/// The eight named areas are the closed set the transcription prompt asks
/// for. A structured response may still invent a label; it is kept verbatim
/// as `Other` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    TechnicalSkills,
    ProfessionalPresentation,
    SelfImage,
    SocialInteractions,
    CreativeWork,
    PersonalGrowth,
    PhysicalWellness,
    CareerDevelopment,
    /// Unrecognized label, as written by the source
    Other(String),
}

impl Category {
    /// The named areas in their fixed priority order
    pub const NAMED: [Category; 8] = [
        Category::TechnicalSkills,
        Category::ProfessionalPresentation,
        Category::SelfImage,
        Category::SocialInteractions,
        Category::CreativeWork,
        Category::PersonalGrowth,
        Category::PhysicalWellness,
        Category::CareerDevelopment,
    ];

    /// Parse a label; case, surrounding space and `-`/space separators are
    /// ignored for the named areas
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        let key = trimmed.to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "technical_skills" => Self::TechnicalSkills,
            "professional_presentation" => Self::ProfessionalPresentation,
            "self_image" => Self::SelfImage,
            "social_interactions" => Self::SocialInteractions,
            "creative_work" => Self::CreativeWork,
            "personal_growth" => Self::PersonalGrowth,
            "physical_wellness" => Self::PhysicalWellness,
            "career_development" => Self::CareerDevelopment,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Wire label
    pub fn as_str(&self) -> &str {
        match self {
            Self::TechnicalSkills => "technical_skills",
            Self::ProfessionalPresentation => "professional_presentation",
            Self::SelfImage => "self_image",
            Self::SocialInteractions => "social_interactions",
            Self::CreativeWork => "creative_work",
            Self::PersonalGrowth => "personal_growth",
            Self::PhysicalWellness => "physical_wellness",
            Self::CareerDevelopment => "career_development",
            Self::Other(label) => label,
        }
    }

    /// Is this one of the eight named areas?
    pub fn is_named(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(label) => label,
            named => named.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an entry is about personal or professional confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceType {
    Personal,
    Professional,
}

impl ConfidenceType {
    /// Parse a label, case-insensitive; `None` for anything else
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "personal" => Some(Self::Personal),
            "professional" => Some(Self::Professional),
            _ => None,
        }
    }

    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Professional => "professional",
        }
    }
}

impl std::fmt::Display for ConfidenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated entry, owned by exactly one date bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub text: String,
    pub category: Category,
    pub confidence_type: ConfidenceType,
    /// 1-10; absent for grammars that do not carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_level: Option<u8>,
}

impl Entry {
    /// Create an entry
    pub fn new(
        text: impl Into<String>,
        category: Category,
        confidence_type: ConfidenceType,
        power_level: Option<u8>,
    ) -> Self {
        Self {
            text: text.into(),
            category,
            confidence_type,
            power_level,
        }
    }

    /// What makes a stored entry unfit to keep, if anything
    ///
    /// Entries built by the extractor always pass; this guards entries read
    /// back from disk.
    pub fn defect(&self) -> Option<&'static str> {
        if self.text.trim().is_empty() {
            return Some("empty text");
        }
        if self.category.as_str().trim().is_empty() {
            return Some("empty category");
        }
        match self.power_level {
            Some(level) if !(POWER_LEVEL_MIN..=POWER_LEVEL_MAX).contains(&level) => {
                Some("power level out of range")
            }
            _ => None,
        }
    }
}

/// Fields as a grammar recovered them, before any validation
///
/// Every field is optional text; the extractor's insertion point decides
/// whether the whole record survives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub date: Option<String>,
    pub text: Option<String>,
    pub category: Option<String>,
    pub confidence_type: Option<String>,
    pub power_level: Option<String>,
}

// =============================================================================
// TESTS
// =============================================================================
