//! # Notification API
//!
//! Per-user inbox. Entries are created by comment and review activity on
//! complaints; see [`crate::routes::complaints`].

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::extract_path;
use crate::state::{AppState, NotificationRecord};

/// How many notifications the inbox returns.
pub const INBOX_LIMIT: usize = 50;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DismissResponse {
    pub message: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/:id", delete(dismiss_notification))
}

/// GET /api/notifications: The caller's newest notifications.
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "Newest first, at most 50", body = Vec<NotificationRecord>),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
async fn list_notifications(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Json<Vec<NotificationRecord>> {
    let mut inbox = state
        .notifications
        .filter(|n| n.recipient_id == caller.user_id);
    inbox.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    inbox.truncate(INBOX_LIMIT);
    Json(inbox)
}

/// DELETE /api/notifications/:id: Dismiss one of the caller's notifications.
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Dismissed", body = DismissResponse),
        (status = 404, description = "Not found or not the caller's", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
async fn dismiss_notification(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DismissResponse>, AppError> {
    let id = extract_path(id)?;
    state
        .notifications
        .remove_if(&id, |n| n.recipient_id == caller.user_id)
        .ok_or_else(|| AppError::NotFound(format!("notification {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        crate::db::notifications::delete(pool, id).await.map_err(|e| {
            tracing::error!(notification_id = %id, error = %e, "failed to delete notification");
            AppError::Internal(format!("notification delete failed: {e}"))
        })?;
    }

    Ok(Json(DismissResponse {
        message: "Notification dismissed".to_string(),
    }))
}
