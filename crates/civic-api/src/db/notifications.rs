//! Notification persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::{NotificationKind, NotificationRecord};

pub async fn insert(pool: &PgPool, n: &NotificationRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO notifications (id, recipient_id, complaint_id, kind, message, from_name, complaint_title, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(n.id)
    .bind(n.recipient_id)
    .bind(n.complaint_id)
    .bind(n.kind.as_str())
    .bind(&n.message)
    .bind(&n.from_name)
    .bind(&n.complaint_title)
    .bind(n.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a notification. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<NotificationRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, NotificationRow>(
        "SELECT id, recipient_id, complaint_id, kind, message, from_name, complaint_title, created_at
         FROM notifications ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(NotificationRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    complaint_id: Uuid,
    kind: String,
    message: String,
    from_name: String,
    complaint_title: String,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_record(self) -> NotificationRecord {
        let kind = match self.kind.as_str() {
            "review" => NotificationKind::Review,
            _ => NotificationKind::Comment,
        };
        NotificationRecord {
            id: self.id,
            recipient_id: self.recipient_id,
            complaint_id: self.complaint_id,
            kind,
            message: self.message,
            from_name: self.from_name,
            complaint_title: self.complaint_title,
            created_at: self.created_at,
        }
    }
}
