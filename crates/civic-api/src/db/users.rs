//! User directory persistence operations.

use sqlx::PgPool;
use uuid::Uuid;

use civic_state::Role;

use crate::state::UserRecord;

/// Insert or replace a directory entry.
pub async fn upsert(pool: &PgPool, user: &UserRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, name, email, phone, role, department)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (id) DO UPDATE SET
             name = EXCLUDED.name,
             email = EXCLUDED.email,
             phone = EXCLUDED.phone,
             role = EXCLUDED.role,
             department = EXCLUDED.department",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(user.role.as_str())
    .bind(&user.department)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the directory on startup. Rows with an unknown role are skipped.
pub async fn load_all(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, phone, role, department FROM users ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(UserRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    department: Option<String>,
}

impl UserRow {
    fn into_record(self) -> Option<UserRecord> {
        let role: Role = match self.role.parse() {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "skipping directory entry with unknown role");
                return None;
            }
        };
        Some(UserRecord {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            role,
            department: self.department,
        })
    }
}
