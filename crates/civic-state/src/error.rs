//! Errors raised by complaint lifecycle operations.

use thiserror::Error;

/// A lifecycle rule rejected the requested mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The caller does not own the complaint.
    #[error("only the citizen who filed this complaint may review it")]
    NotOwner,

    /// A review was attempted before the complaint was resolved.
    #[error("complaint must be RESOLVED before it can be reviewed (current status: {status})")]
    NotResolved {
        /// The complaint's status at the time of the attempt.
        status: String,
    },

    /// Rating outside 1..=5.
    #[error("rating {0} out of range: expected 1 to 5")]
    RatingOutOfRange(u8),

    /// Comment text was empty after trimming.
    #[error("comment text must not be empty")]
    EmptyComment,

    /// Comment text exceeded the maximum length.
    #[error("comment text must not exceed {max} characters")]
    CommentTooLong {
        /// Maximum permitted length in characters.
        max: usize,
    },
}
