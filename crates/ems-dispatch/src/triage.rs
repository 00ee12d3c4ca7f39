//! Turning a caller's free-text description into severity and category.
//!
//! The production classifier is an external service; [`KeywordClassifier`]
//! is the local rule set used when that service is absent or fails.

use thiserror::Error;

use ems_core::{Category, GeoPoint, Severity};

/// What triage extracted from a call.
#[derive(Clone, Debug, PartialEq)]
pub struct Triage {
    pub severity: Severity,
    pub category: Category,
    /// Best-effort location.  `None` (or an out-of-range point) means "no
    /// location extracted" and the dispatcher's fallback policy applies.
    pub position: Option<GeoPoint>,
    /// Landmark or locality, if recognised.
    pub area:     Option<String>,
}

#[derive(Debug, Error)]
#[error("triage failed: {0}")]
pub struct TriageError(pub String);

/// Classifies emergency descriptions.  Treated as opaque by the dispatcher.
pub trait TriageClassifier: Send + Sync {
    fn classify(&self, description: &str) -> Result<Triage, TriageError>;
}

// ── KeywordClassifier ─────────────────────────────────────────────────────────

const HIGH_KEYWORDS: &[&str] = &[
    "cardiac", "arrest", "unconscious", "not breathing", "unresponsive", "collapsed", "critical",
];

const MEDIUM_KEYWORDS: &[&str] = &[
    "fracture", "bleeding", "chest pain", "stroke", "accident", "moderate",
];

/// First matching row wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Cardiac,      &["cardiac", "heart", "chest pain", "arrest"]),
    (Category::Accident,     &["accident", "collision", "crash", "vehicle"]),
    (Category::Burns,        &["burn", "fire", "scald"]),
    (Category::Trauma,       &["fracture", "fall", "trauma", "bleed"]),
    (Category::Respiratory,  &["breathing", "respiratory", "asthma", "chok"]),
    (Category::Neurological, &["stroke", "seizure", "paralysis"]),
];

/// Case-insensitive substring rules.  Never fails and never extracts a
/// position.
#[derive(Copy, Clone, Debug, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn triage(description: &str) -> Triage {
        Triage {
            severity: Self::severity(description),
            category: Self::category(description),
            position: None,
            area:     None,
        }
    }

    pub fn severity(description: &str) -> Severity {
        let lower = description.to_lowercase();
        if HIGH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Severity::High
        } else if MEDIUM_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn category(description: &str) -> Category {
        let lower = description.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|k| lower.contains(k)))
            .map_or(Category::Other, |&(c, _)| c)
    }
}

impl TriageClassifier for KeywordClassifier {
    fn classify(&self, description: &str) -> Result<Triage, TriageError> {
        Ok(Self::triage(description))
    }
}
