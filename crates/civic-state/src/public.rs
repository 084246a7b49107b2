//! Sanitized projection for unauthenticated readers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use civic_core::{Location, Severity};

use crate::status::ComplaintStatus;

/// Public view of a complaint. Excludes description, evidence, comments,
/// review and any citizen identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PublicComplaint {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub status: ComplaintStatus,
    pub severity: Severity,
    pub location: Location,
    pub department_assigned: String,
    pub created_at: DateTime<Utc>,
    /// Upvote count.
    pub upvotes: usize,
}
