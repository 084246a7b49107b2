//! # SLA Calculator
//!
//! Maps a final severity to a response window. The deadline is computed once,
//! at complaint creation, and never recomputed. Nothing fires when a deadline
//! passes; it is an informational, sortable value.

use chrono::{DateTime, Duration, Utc};

use crate::severity::Severity;

/// Response window in hours for the given severity.
pub fn sla_hours(severity: Severity) -> i64 {
    match severity {
        Severity::Critical => 4,
        Severity::High => 24,
        Severity::Medium => 48,
        Severity::Low => 72,
    }
}

/// Deadline for a complaint of `severity` created at `created_at`.
pub fn sla_deadline(severity: Severity, created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::hours(sla_hours(severity))
}
