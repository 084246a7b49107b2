//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Registers the `bearer` JWT security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "HS256 token with claims {id, role, exp}, signed with JWT_SECRET.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Civic Grievance API",
        version = "0.3.0",
        description = "Complaint intake with keyword triage and SLA deadlines, department-scoped official workflows, citizen reviews, notifications and analytics.\n\nAuthentication: `Authorization: Bearer <token>`. `/api/complaints/public`, `/health/*`, `/metrics` and `/openapi.json` are unauthenticated."
    ),
    paths(
        crate::routes::complaints::create_complaint,
        crate::routes::complaints::public_complaints,
        crate::routes::complaints::my_complaints,
        crate::routes::complaints::department_complaints,
        crate::routes::complaints::analytics,
        crate::routes::complaints::get_complaint,
        crate::routes::complaints::update_status,
        crate::routes::complaints::add_comment,
        crate::routes::complaints::toggle_upvote,
        crate::routes::complaints::submit_review,
        crate::routes::notifications::list_notifications,
        crate::routes::notifications::dismiss_notification,
    ),
    components(schemas(
        civic_core::Severity,
        civic_core::Location,
        civic_state::Role,
        civic_state::ComplaintStatus,
        civic_state::StatusChange,
        civic_state::Comment,
        civic_state::Rating,
        civic_state::Review,
        civic_state::Complaint,
        civic_state::PublicComplaint,
        civic_state::Breakdown,
        civic_state::Analytics,
        crate::state::CitizenContact,
        crate::state::NotificationKind,
        crate::state::NotificationRecord,
        crate::routes::complaints::LocationInput,
        crate::routes::complaints::CreateComplaintRequest,
        crate::routes::complaints::DepartmentComplaint,
        crate::routes::complaints::UpdateStatusRequest,
        crate::routes::complaints::CommentRequest,
        crate::routes::complaints::UpvoteResponse,
        crate::routes::complaints::ReviewRequest,
        crate::routes::notifications::DismissResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "complaints", description = "Complaint lifecycle"),
        (name = "notifications", description = "Per-user inbox"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
