//! Complaint persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `complaints` table.
//! Lifecycle rules are enforced in `civic-state`, not in SQL; the row is
//! written whole (last write wins).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use civic_core::{Location, Severity};
use civic_state::{Complaint, ComplaintStatus};

use super::{decode_json, encode_json};

/// Insert or fully replace a complaint row.
pub async fn upsert(pool: &PgPool, c: &Complaint) -> Result<(), sqlx::Error> {
    let evidence = encode_json("complaint evidence", &c.evidence)?;
    let upvotes = encode_json("complaint upvotes", &c.upvotes)?;
    let comments = encode_json("complaint comments", &c.comments)?;
    let review = c
        .review
        .as_ref()
        .map(|r| encode_json("complaint review", r))
        .transpose()?;
    let history = encode_json("complaint status_history", &c.status_history)?;

    sqlx::query(
        "INSERT INTO complaints (id, citizen_id, title, description, category, severity, status,
             department_assigned, sla_deadline, resolved_at, longitude, latitude, address,
             evidence, upvotes, comments, review, status_history, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
         ON CONFLICT (id) DO UPDATE SET
             status = EXCLUDED.status,
             resolved_at = EXCLUDED.resolved_at,
             upvotes = EXCLUDED.upvotes,
             comments = EXCLUDED.comments,
             review = EXCLUDED.review,
             status_history = EXCLUDED.status_history,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(c.id)
    .bind(c.citizen_id)
    .bind(&c.title)
    .bind(&c.description)
    .bind(&c.category)
    .bind(c.severity.as_str())
    .bind(c.status.as_str())
    .bind(&c.department_assigned)
    .bind(c.sla_deadline)
    .bind(c.resolved_at)
    .bind(c.location.longitude)
    .bind(c.location.latitude)
    .bind(&c.location.address)
    .bind(&evidence)
    .bind(&upvotes)
    .bind(&comments)
    .bind(&review)
    .bind(&history)
    .bind(c.created_at)
    .bind(c.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all complaints into memory on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Complaint>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ComplaintRow>(
        "SELECT id, citizen_id, title, description, category, severity, status,
             department_assigned, sla_deadline, resolved_at, longitude, latitude, address,
             evidence, upvotes, comments, review, status_history, created_at, updated_at
         FROM complaints ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ComplaintRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct ComplaintRow {
    id: Uuid,
    citizen_id: Uuid,
    title: String,
    description: String,
    category: String,
    severity: String,
    status: String,
    department_assigned: String,
    sla_deadline: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
    longitude: f64,
    latitude: f64,
    address: String,
    evidence: serde_json::Value,
    upvotes: serde_json::Value,
    comments: serde_json::Value,
    review: Option<serde_json::Value>,
    status_history: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ComplaintRow {
    fn into_record(self) -> Complaint {
        let id = self.id;
        let severity: Severity = self.severity.parse().unwrap_or_else(|e| {
            tracing::warn!(%id, severity = %self.severity, error = %e, "unknown severity in database, defaulting to LOW");
            Severity::Low
        });
        let status: ComplaintStatus = self.status.parse().unwrap_or_else(|e| {
            tracing::warn!(%id, status = %self.status, error = %e, "unknown status in database, defaulting to PENDING");
            ComplaintStatus::Pending
        });
        let review = self
            .review
            .and_then(|v| decode_json::<Option<civic_state::Review>>(id, "review", v));

        Complaint {
            id,
            citizen_id: self.citizen_id,
            title: self.title,
            description: self.description,
            category: self.category,
            severity,
            status,
            department_assigned: self.department_assigned,
            sla_deadline: self.sla_deadline,
            resolved_at: self.resolved_at,
            location: Location {
                longitude: self.longitude,
                latitude: self.latitude,
                address: self.address,
            },
            evidence: decode_json(id, "evidence", self.evidence),
            upvotes: decode_json(id, "upvotes", self.upvotes),
            comments: decode_json(id, "comments", self.comments),
            review,
            status_history: decode_json(id, "status_history", self.status_history),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
