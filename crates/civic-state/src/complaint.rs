//! # Complaint Aggregate
//!
//! The complaint record and every mutation the lifecycle permits. Callers are
//! responsible for authorization (who may call what); this module enforces
//! the data rules that hold regardless of caller:
//!
//! - `department_assigned` and `sla_deadline` are fixed at [`Complaint::file`].
//! - `resolved_at` is set on the first entry into `RESOLVED` and cleared on
//!   every exit.
//! - Upvotes hold each caller id at most once.
//! - Comments and status log entries are only ever appended.
//! - A review requires the owner and `RESOLVED`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use civic_core::{classify, sla_deadline, Location, Severity, TriageOverrides, ValidationError};

use crate::error::LifecycleError;
use crate::public::PublicComplaint;
use crate::review::{Rating, Review};
use crate::role::Role;
use crate::status::{ComplaintStatus, StatusChange};

/// Maximum title length in characters.
pub const TITLE_MAX_LEN: usize = 200;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX_LEN: usize = 5_000;
/// Maximum comment length in characters.
pub const COMMENT_MAX_LEN: usize = 2_000;

/// A comment with author details snapshotted at posting time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Comment {
    pub text: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_role: Role,
    pub created_at: DateTime<Utc>,
}

/// Citizen-supplied intake for a new complaint.
#[derive(Debug, Clone, Default)]
pub struct ComplaintDraft {
    pub title: String,
    pub description: String,
    pub overrides: TriageOverrides,
    pub location: Location,
    pub evidence: Vec<String>,
}

/// A civic grievance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Complaint {
    pub id: Uuid,
    /// Owning citizen. Never changes after filing.
    pub citizen_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub severity: Severity,
    pub status: ComplaintStatus,
    /// Routing key for official visibility.
    pub department_assigned: String,
    pub sla_deadline: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub location: Location,
    /// Encoded images, in upload order.
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Ids of callers who upvoted, without duplicates.
    #[serde(default)]
    pub upvotes: Vec<Uuid>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub review: Option<Review>,
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn required_text(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

impl Complaint {
    /// File a new complaint: validate, triage, and compute the SLA deadline.
    ///
    /// Blank override strings are treated as absent so a form that submits
    /// `category: ""` still gets an inferred category.
    pub fn file(
        citizen_id: Uuid,
        draft: ComplaintDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = required_text(&draft.title, "title", TITLE_MAX_LEN)?;
        let description = required_text(&draft.description, "description", DESCRIPTION_MAX_LEN)?;

        let non_blank = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        let overrides = TriageOverrides {
            category: non_blank(draft.overrides.category),
            severity: draft.overrides.severity,
            department: non_blank(draft.overrides.department),
        };
        let triage = classify(&title, &description).with_overrides(overrides);

        Ok(Self {
            id: Uuid::new_v4(),
            citizen_id,
            title,
            description,
            sla_deadline: sla_deadline(triage.severity, now),
            category: triage.category,
            severity: triage.severity,
            status: ComplaintStatus::Pending,
            department_assigned: triage.department,
            resolved_at: None,
            location: draft.location,
            evidence: draft.evidence,
            upvotes: Vec::new(),
            comments: Vec::new(),
            review: None,
            status_history: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Move to `to`, applying the `resolved_at` rules.
    ///
    /// Entering `RESOLVED` keeps an existing `resolved_at`; any other target
    /// clears it. A change to the same status is not logged.
    ///
    /// Only `status`, `resolved_at`, `status_history` and `updated_at` are
    /// touched. Reopening a reviewed complaint therefore leaves its review in
    /// place, so a non-resolved complaint can carry a review even though one
    /// can only be attached while resolved.
    pub fn transition_status(&mut self, to: ComplaintStatus, actor: Uuid, now: DateTime<Utc>) {
        let from = self.status;
        if to == ComplaintStatus::Resolved {
            if self.resolved_at.is_none() {
                self.resolved_at = Some(now);
            }
        } else {
            self.resolved_at = None;
        }
        self.status = to;
        if from != to {
            self.status_history.push(StatusChange {
                from,
                to,
                actor,
                at: now,
            });
        }
        self.updated_at = now;
    }

    /// Toggle `caller`'s upvote and return the resulting count.
    pub fn toggle_upvote(&mut self, caller: Uuid, now: DateTime<Utc>) -> usize {
        if let Some(pos) = self.upvotes.iter().position(|id| *id == caller) {
            self.upvotes.remove(pos);
        } else {
            self.upvotes.push(caller);
        }
        self.updated_at = now;
        self.upvotes.len()
    }

    /// Append a comment. Text is trimmed before storage.
    pub fn add_comment(
        &mut self,
        author_id: Uuid,
        author_name: &str,
        author_role: Role,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<&Comment, LifecycleError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LifecycleError::EmptyComment);
        }
        if text.chars().count() > COMMENT_MAX_LEN {
            return Err(LifecycleError::CommentTooLong {
                max: COMMENT_MAX_LEN,
            });
        }
        self.comments.push(Comment {
            text: text.to_string(),
            author_id,
            author_name: author_name.to_string(),
            author_role,
            created_at: now,
        });
        self.updated_at = now;
        Ok(&self.comments[self.comments.len() - 1])
    }

    /// Attach (or overwrite) the owner's review.
    ///
    /// The resolved check applies at attach time only. A later
    /// [`Complaint::transition_status`] away from `RESOLVED` keeps the review.
    pub fn attach_review(
        &mut self,
        caller: Uuid,
        rating: Rating,
        feedback: &str,
        now: DateTime<Utc>,
    ) -> Result<&Review, LifecycleError> {
        if caller != self.citizen_id {
            return Err(LifecycleError::NotOwner);
        }
        if self.status != ComplaintStatus::Resolved {
            return Err(LifecycleError::NotResolved {
                status: self.status.to_string(),
            });
        }
        self.updated_at = now;
        Ok(self.review.insert(Review {
            rating,
            feedback: feedback.trim().to_string(),
            created_at: now,
        }))
    }

    /// Open and past its SLA deadline.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && now > self.sla_deadline
    }

    /// Sanitized read-only view for the public listing.
    pub fn to_public(&self) -> PublicComplaint {
        PublicComplaint {
            id: self.id,
            title: self.title.clone(),
            category: self.category.clone(),
            status: self.status,
            severity: self.severity,
            location: self.location.clone(),
            department_assigned: self.department_assigned.clone(),
            created_at: self.created_at,
            upvotes: self.upvotes.len(),
        }
    }
}
