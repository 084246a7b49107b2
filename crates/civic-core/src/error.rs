//! # Validation Errors
//!
//! Errors raised when intake input does not satisfy the domain rules.
//! Every variant carries the offending value or field name so the API layer
//! can surface it verbatim as a 422 message.

use thiserror::Error;

/// Input failed a domain validation rule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A severity string outside `LOW | MEDIUM | HIGH | CRITICAL`.
    #[error("unknown severity '{0}': expected one of LOW, MEDIUM, HIGH, CRITICAL")]
    UnknownSeverity(String),

    /// A status string outside `PENDING | IN_PROGRESS | RESOLVED`.
    #[error("unknown status '{0}': expected one of PENDING, IN_PROGRESS, RESOLVED")]
    UnknownStatus(String),

    /// A required text field was empty or whitespace.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A text field exceeded its maximum length.
    #[error("{field} must not exceed {max} characters")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum permitted length in characters.
        max: usize,
    },

    /// Longitude outside [-180, 180] or not finite.
    #[error("longitude {0} out of range [-180, 180]")]
    LongitudeOutOfRange(f64),

    /// Latitude outside [-90, 90] or not finite.
    #[error("latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(f64),
}
