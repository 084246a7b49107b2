//! # Intake Classifier
//!
//! Keyword-table triage of free-text complaints. Two independent tables drive
//! the result:
//!
//! - **Category**: each category scores the number of its trigger words that
//!   occur as substrings of the case-folded text. A category replaces the
//!   current best only when its score is strictly greater, so ties keep the
//!   earlier table entry and a zero score keeps [`DEFAULT_CATEGORY`].
//! - **Severity**: tables are checked in fixed priority order
//!   `CRITICAL → HIGH → MEDIUM → LOW`; the first with any match wins.
//!   No match yields `LOW`.
//!
//! The routing department defaults to the detected category. Explicit values
//! supplied by the caller always win over inferred ones (see
//! [`TriageOverrides`]).

use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// Category assigned when no category keyword matches.
pub const DEFAULT_CATEGORY: &str = "General";

/// Category trigger words, in table priority order.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Electricity",
        &[
            "power",
            "dark",
            "light",
            "wire",
            "shock",
            "pole",
            "transformer",
            "blackout",
        ],
    ),
    (
        "Water",
        &[
            "leak", "pipe", "water", "flood", "drain", "sewer", "smell", "blockage",
        ],
    ),
    (
        "Roads",
        &[
            "pothole",
            "crack",
            "road",
            "sidewalk",
            "pavement",
            "asphalt",
            "traffic",
        ],
    ),
    (
        "Waste",
        &["garbage", "trash", "dump", "bin", "litter", "waste"],
    ),
];

/// Severity trigger words, highest priority first.
pub const SEVERITY_KEYWORDS: &[(Severity, &[&str])] = &[
    (
        Severity::Critical,
        &[
            "immediate", "danger", "fire", "burst", "accident", "spark", "huge",
        ],
    ),
    (
        Severity::High,
        &["blocked", "broken", "no water", "outage", "deep"],
    ),
    (Severity::Medium, &["smell", "slow", "dirty", "crack"]),
    (Severity::Low, &["litter", "small", "paint"]),
];

/// Result of intake triage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Triage {
    /// Detected (or overridden) category.
    pub category: String,
    /// Detected (or overridden) severity.
    pub severity: Severity,
    /// Routing key for official visibility.
    pub department: String,
}

/// Caller-supplied values that take precedence over inferred ones.
///
/// An explicit `category` also becomes the routing department unless an
/// explicit `department` is given as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriageOverrides {
    pub category: Option<String>,
    pub severity: Option<Severity>,
    pub department: Option<String>,
}

impl Triage {
    /// Apply explicit caller values on top of the inferred triage.
    pub fn with_overrides(self, overrides: TriageOverrides) -> Triage {
        let department = overrides
            .department
            .or_else(|| overrides.category.clone())
            .unwrap_or(self.department);
        Triage {
            category: overrides.category.unwrap_or(self.category),
            severity: overrides.severity.unwrap_or(self.severity),
            department,
        }
    }
}

/// Classify a complaint from its title and description.
///
/// The two fields are joined with a single space before matching, so a
/// trigger phrase never spans the boundary by accident of concatenation.
pub fn classify(title: &str, description: &str) -> Triage {
    classify_text(&format!("{title} {description}"))
}

/// Classify arbitrary free text.
pub fn classify_text(text: &str) -> Triage {
    let normalized = text.to_lowercase();
    let category = detect_category(&normalized);
    let severity = detect_severity(&normalized);
    Triage {
        department: category.to_string(),
        category: category.to_string(),
        severity,
    }
}

fn detect_category(normalized: &str) -> &'static str {
    let mut best = DEFAULT_CATEGORY;
    let mut best_score = 0usize;
    for (category, words) in CATEGORY_KEYWORDS {
        let score = words.iter().filter(|w| normalized.contains(*w)).count();
        if score > best_score {
            best_score = score;
            best = category;
        }
    }
    best
}

fn detect_severity(normalized: &str) -> Severity {
    SEVERITY_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| normalized.contains(w)))
        .map(|(severity, _)| *severity)
        .unwrap_or(Severity::Low)
}
