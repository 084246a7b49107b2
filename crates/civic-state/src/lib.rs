//! # civic-state: Complaint Aggregate and Lifecycle Rules
//!
//! A complaint moves through `PENDING → IN_PROGRESS → RESOLVED`, and a
//! resolved complaint may be reopened to any non-resolved status. Unlike a
//! typestate machine, every status is reachable from every other; the rules
//! live in the side effects:
//!
//! - **Status** ([`status`]): entering `RESOLVED` stamps `resolved_at` once;
//!   leaving it clears the stamp. Each change is appended to the status log.
//! - **Review** ([`review`]): only the owning citizen, only while resolved.
//!   A second review overwrites the first. Reopening keeps an attached
//!   review.
//! - **Engagement** ([`complaint`]): upvotes are a set keyed by caller id
//!   toggled idempotently; comments are append-only with author snapshots.
//! - **Projections** ([`public`], [`analytics`]): the sanitized public view
//!   and group-by-count breakdowns.

pub mod analytics;
pub mod complaint;
pub mod error;
pub mod public;
pub mod review;
pub mod role;
pub mod status;

// Re-export primary types.
pub use analytics::{Analytics, Breakdown};
pub use complaint::{Comment, Complaint, ComplaintDraft, COMMENT_MAX_LEN};
pub use error::LifecycleError;
pub use public::PublicComplaint;
pub use review::{Rating, Review};
pub use role::Role;
pub use status::{ComplaintStatus, StatusChange};
