//! # Complaint API
//!
//! Intake, listing, status workflow, comments, upvotes and reviews.
//!
//! Visibility rules:
//! - A citizen sees and comments on their own complaints only.
//! - An official sees complaints routed to their department, or all of
//!   them when their department is `"All"` or unset.
//! - Anything outside the caller's view reads as 404 on `GET /:id`.
//!
//! `GET /api/complaints/public` lives in [`public_router`] and is mounted
//! without the auth layer.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use civic_core::{Location, Severity, TriageOverrides};
use civic_state::{
    Analytics, Comment, Complaint, ComplaintDraft, ComplaintStatus, PublicComplaint, Rating,
    Review, Role, COMMENT_MAX_LEN,
};

use crate::auth::{require_role, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json, extract_validated_query, Validate};
use crate::state::{AppState, CitizenContact, NotificationKind, NotificationRecord, UserRecord};

/// Maximum evidence attachments per complaint.
pub const MAX_EVIDENCE: usize = 5;

// -- Request / response types -------------------------------------------------

/// Location as submitted at intake. Missing parts fall back to defaults.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LocationInput {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub address: Option<String>,
}

/// Request to file a complaint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateComplaintRequest {
    pub title: String,
    pub description: String,
    /// Overrides the inferred category (and department, unless `department` is given).
    #[serde(default)]
    pub category: Option<String>,
    /// One of LOW, MEDIUM, HIGH, CRITICAL. Overrides the inferred severity.
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub location: Option<LocationInput>,
    /// Encoded images, stored opaquely.
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl Validate for CreateComplaintRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description must not be empty".to_string());
        }
        if self.evidence.len() > MAX_EVIDENCE {
            return Err(format!("at most {MAX_EVIDENCE} evidence items are allowed"));
        }
        if self.evidence.iter().any(|e| e.trim().is_empty()) {
            return Err("evidence items must not be empty".to_string());
        }
        Ok(())
    }
}

impl CreateComplaintRequest {
    fn into_draft(self) -> Result<ComplaintDraft, AppError> {
        let severity = self
            .severity
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<Severity>)
            .transpose()?;
        let loc = self.location.unwrap_or_default();
        let location = Location::resolve(loc.longitude, loc.latitude, loc.address)?;
        Ok(ComplaintDraft {
            title: self.title,
            description: self.description,
            overrides: TriageOverrides {
                category: self.category,
                severity,
                department: self.department,
            },
            location,
            evidence: self.evidence,
        })
    }
}

/// Geofilter for the public listing. All three parameters go together.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PublicQuery {
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub radius_km: Option<f64>,
}

impl Validate for PublicQuery {
    fn validate(&self) -> Result<(), String> {
        match (self.lng, self.lat, self.radius_km) {
            (None, None, None) => Ok(()),
            (Some(lng), Some(lat), Some(r)) => {
                if !(-180.0..=180.0).contains(&lng) {
                    return Err("lng must be within [-180, 180]".to_string());
                }
                if !(-90.0..=90.0).contains(&lat) {
                    return Err("lat must be within [-90, 90]".to_string());
                }
                if !(r.is_finite() && r > 0.0) {
                    return Err("radius_km must be a positive number".to_string());
                }
                Ok(())
            }
            _ => Err("lng, lat and radius_km must be given together".to_string()),
        }
    }
}

/// A complaint in an official's listing, with the filer's contact details.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DepartmentComplaint {
    #[serde(flatten)]
    pub complaint: Complaint,
    /// `None` when the filer is not in the directory.
    pub citizen: Option<CitizenContact>,
}

/// Status change request. A missing status leaves the complaint unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

impl Validate for UpdateStatusRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub text: String,
}

impl Validate for CommentRequest {
    fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("text must not be empty".to_string());
        }
        if self.text.trim().chars().count() > COMMENT_MAX_LEN {
            return Err(format!("text must not exceed {COMMENT_MAX_LEN} characters"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpvoteResponse {
    pub upvotes: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// Whole number from 1 to 5. Any JSON number is accepted here and
    /// range-checked in validation.
    pub rating: f64,
    #[serde(default)]
    pub feedback: String,
}

impl ReviewRequest {
    fn rating(&self) -> Result<Rating, String> {
        let r = self.rating;
        let range = f64::from(Rating::MIN)..=f64::from(Rating::MAX);
        if r.fract() != 0.0 || !range.contains(&r) {
            return Err(format!(
                "rating must be a whole number between {} and {}",
                Rating::MIN,
                Rating::MAX
            ));
        }
        Rating::new(r as u8).map_err(|e| e.to_string())
    }
}

impl Validate for ReviewRequest {
    fn validate(&self) -> Result<(), String> {
        self.rating()?;
        if self.feedback.chars().count() > COMMENT_MAX_LEN {
            return Err(format!("feedback must not exceed {COMMENT_MAX_LEN} characters"));
        }
        Ok(())
    }
}

// -- Routers ------------------------------------------------------------------

/// Authenticated complaint routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/complaints", post(create_complaint))
        .route("/api/complaints/me", get(my_complaints))
        .route("/api/complaints/department", get(department_complaints))
        .route("/api/complaints/analytics", get(analytics))
        .route(
            "/api/complaints/:id",
            get(get_complaint).patch(update_status),
        )
        .route("/api/complaints/:id/comments", post(add_comment))
        .route("/api/complaints/:id/upvote", post(toggle_upvote))
        .route("/api/complaints/:id/review", post(submit_review))
}

/// Unauthenticated public listing.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/api/complaints/public", get(public_complaints))
}

// -- Access helpers -----------------------------------------------------------

/// Resolve the calling official's directory entry.
fn official(state: &AppState, caller: &CallerIdentity) -> Result<UserRecord, AppError> {
    require_role(caller, Role::Official)?;
    state.users.get(&caller.user_id).ok_or_else(|| {
        tracing::warn!(user_id = %caller.user_id, "official not in directory");
        AppError::Forbidden("official is not registered in the directory".to_string())
    })
}

/// Whether `caller` may see `complaint` in full.
fn can_view(state: &AppState, caller: &CallerIdentity, complaint: &Complaint) -> bool {
    match caller.role {
        Role::Citizen => complaint.citizen_id == caller.user_id,
        Role::Official => state
            .users
            .get(&caller.user_id)
            .is_some_and(|u| u.scope().permits(&complaint.department_assigned)),
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("complaint {id} not found"))
}

// -- Handlers -----------------------------------------------------------------

/// POST /api/complaints: File a complaint.
#[utoipa::path(
    post,
    path = "/api/complaints",
    request_body = CreateComplaintRequest,
    responses(
        (status = 201, description = "Complaint filed and triaged", body = Complaint),
        (status = 403, description = "Caller is not a citizen", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "complaints"
)]
async fn create_complaint(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateComplaintRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Complaint>), AppError> {
    require_role(&caller, Role::Citizen)?;
    let req = extract_validated_json(body)?;
    let draft = req.into_draft()?;
    let complaint = Complaint::file(caller.user_id, draft, Utc::now())?;

    state.persist_complaint(&complaint).await?;
    state.complaints.insert(complaint.id, complaint.clone());

    tracing::info!(
        complaint_id = %complaint.id,
        category = %complaint.category,
        severity = %complaint.severity,
        department = %complaint.department_assigned,
        "complaint filed"
    );
    Ok((StatusCode::CREATED, Json(complaint)))
}

/// GET /api/complaints/public: Sanitized listing, newest first.
#[utoipa::path(
    get,
    path = "/api/complaints/public",
    params(PublicQuery),
    responses(
        (status = 200, description = "Public complaint listing", body = Vec<PublicComplaint>),
        (status = 422, description = "Incomplete or invalid geofilter", body = crate::error::ErrorBody),
    ),
    tag = "complaints"
)]
async fn public_complaints(
    State(state): State<AppState>,
    query: Result<Query<PublicQuery>, QueryRejection>,
) -> Result<Json<Vec<PublicComplaint>>, AppError> {
    let q = extract_validated_query(query)?;
    let near = match (q.lng, q.lat, q.radius_km) {
        (Some(lng), Some(lat), Some(r)) => Some((lng, lat, r)),
        _ => None,
    };

    let mut complaints = state.complaints.filter(|c| match near {
        Some((lng, lat, r)) => c.location.distance_km(lng, lat) <= r,
        None => true,
    });
    complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(complaints.iter().map(Complaint::to_public).collect()))
}

/// GET /api/complaints/me: The caller's own complaints, newest first.
#[utoipa::path(
    get,
    path = "/api/complaints/me",
    responses(
        (status = 200, description = "Caller's complaints", body = Vec<Complaint>),
        (status = 403, description = "Caller is not a citizen", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "complaints"
)]
async fn my_complaints(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<Complaint>>, AppError> {
    require_role(&caller, Role::Citizen)?;
    let mut complaints = state.complaints.filter(|c| c.citizen_id == caller.user_id);
    complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(complaints))
}

/// GET /api/complaints/department: The official's scoped work queue.
///
/// Ordered by status name, then by SLA deadline (most urgent first).
#[utoipa::path(
    get,
    path = "/api/complaints/department",
    responses(
        (status = 200, description = "Scoped complaints", body = Vec<DepartmentComplaint>),
        (status = 403, description = "Caller is not a registered official", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "complaints"
)]
async fn department_complaints(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<DepartmentComplaint>>, AppError> {
    let scope = official(&state, &caller)?.scope();
    let mut complaints = state
        .complaints
        .filter(|c| scope.permits(&c.department_assigned));
    complaints.sort_by(|a, b| {
        a.status
            .as_str()
            .cmp(b.status.as_str())
            .then(a.sla_deadline.cmp(&b.sla_deadline))
    });

    let listing = complaints
        .into_iter()
        .map(|complaint| {
            let citizen = state
                .users
                .get(&complaint.citizen_id)
                .map(|u| CitizenContact::from(&u));
            DepartmentComplaint { complaint, citizen }
        })
        .collect();
    Ok(Json(listing))
}

/// GET /api/complaints/analytics: Counts by category and status.
#[utoipa::path(
    get,
    path = "/api/complaints/analytics",
    responses(
        (status = 200, description = "Scoped breakdowns", body = Analytics),
        (status = 403, description = "Caller is not a registered official", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "complaints"
)]
async fn analytics(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Analytics>, AppError> {
    let scope = official(&state, &caller)?.scope();
    let complaints = state
        .complaints
        .filter(|c| scope.permits(&c.department_assigned));
    Ok(Json(Analytics::over(&complaints)))
}

/// GET /api/complaints/:id: Full record for the owner or an in-scope official.
#[utoipa::path(
    get,
    path = "/api/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint found", body = Complaint),
        (status = 404, description = "Not found or not visible", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "complaints"
)]
async fn get_complaint(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Complaint>, AppError> {
    let id = extract_path(id)?;
    match state.complaints.get(&id) {
        Some(c) if can_view(&state, &caller, &c) => Ok(Json(c)),
        _ => Err(not_found(id)),
    }
}

/// PATCH /api/complaints/:id: Change status (official, in scope).
#[utoipa::path(
    patch,
    path = "/api/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated complaint", body = Complaint),
        (status = 403, description = "Not an official or out of scope", body = crate::error::ErrorBody),
        (status = 404, description = "Complaint not found", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown status", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "complaints"
)]
async fn update_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Complaint>, AppError> {
    let id = extract_path(id)?;
    let scope = official(&state, &caller)?.scope();
    let req = extract_validated_json(body)?;
    let target = req
        .status
        .as_deref()
        .map(str::parse::<ComplaintStatus>)
        .transpose()?;

    let updated = state
        .complaints
        .try_update(&id, |c| {
            if !scope.permits(&c.department_assigned) {
                return Err(AppError::Forbidden(
                    "complaint is outside your department".to_string(),
                ));
            }
            if let Some(to) = target {
                c.transition_status(to, caller.user_id, Utc::now());
            }
            Ok(c.clone())
        })
        .ok_or_else(|| not_found(id))??;

    if target.is_some() {
        state.persist_complaint(&updated).await?;
        tracing::info!(
            complaint_id = %id,
            status = %updated.status,
            actor = %caller.user_id,
            "complaint status updated"
        );
    }
    Ok(Json(updated))
}

/// POST /api/complaints/:id/comments: Append a comment.
///
/// Returns the full comment thread.
#[utoipa::path(
    post,
    path = "/api/complaints/{id}/comments",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment thread", body = Vec<Comment>),
        (status = 403, description = "Not the owner or out of scope", body = crate::error::ErrorBody),
        (status = 404, description = "Complaint not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "complaints"
)]
async fn add_comment(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Comment>>), AppError> {
    let id = extract_path(id)?;
    let req = extract_validated_json(body)?;
    let scope = match caller.role {
        Role::Official => Some(official(&state, &caller)?.scope()),
        Role::Citizen => None,
    };
    let author_name = state.display_name(&caller.user_id);

    let updated = state
        .complaints
        .try_update(&id, |c| {
            let allowed = match &scope {
                Some(scope) => scope.permits(&c.department_assigned),
                None => c.citizen_id == caller.user_id,
            };
            if !allowed {
                return Err(AppError::Forbidden(
                    "not permitted to comment on this complaint".to_string(),
                ));
            }
            c.add_comment(caller.user_id, &author_name, caller.role, &req.text, Utc::now())?;
            Ok(c.clone())
        })
        .ok_or_else(|| not_found(id))??;

    state.persist_complaint(&updated).await?;

    if updated.citizen_id != caller.user_id {
        state
            .notify(NotificationRecord {
                id: Uuid::new_v4(),
                recipient_id: updated.citizen_id,
                complaint_id: id,
                kind: NotificationKind::Comment,
                message: format!("{author_name} commented on your complaint \"{}\"", updated.title),
                from_name: author_name,
                complaint_title: updated.title.clone(),
                created_at: Utc::now(),
            })
            .await?;
    }

    Ok((StatusCode::CREATED, Json(updated.comments)))
}

/// POST /api/complaints/:id/upvote: Toggle the caller's upvote.
#[utoipa::path(
    post,
    path = "/api/complaints/{id}/upvote",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Resulting upvote count", body = UpvoteResponse),
        (status = 404, description = "Complaint not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "complaints"
)]
async fn toggle_upvote(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UpvoteResponse>, AppError> {
    let id = extract_path(id)?;
    let updated = state
        .complaints
        .try_update(&id, |c| {
            c.toggle_upvote(caller.user_id, Utc::now());
            Ok::<_, AppError>(c.clone())
        })
        .ok_or_else(|| not_found(id))??;

    state.persist_complaint(&updated).await?;
    Ok(Json(UpvoteResponse {
        upvotes: updated.upvotes.len(),
    }))
}

/// POST /api/complaints/:id/review: Rate a resolved complaint (owner only).
///
/// Submitting again replaces the earlier review.
#[utoipa::path(
    post,
    path = "/api/complaints/{id}/review",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review stored", body = Review),
        (status = 403, description = "Caller does not own the complaint", body = crate::error::ErrorBody),
        (status = 404, description = "Complaint not found", body = crate::error::ErrorBody),
        (status = 409, description = "Complaint is not resolved", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "complaints"
)]
async fn submit_review(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<Review>, AppError> {
    let id = extract_path(id)?;
    require_role(&caller, Role::Citizen)?;
    let req = extract_validated_json(body)?;
    let rating = req.rating().map_err(AppError::Validation)?;

    let (updated, review) = state
        .complaints
        .try_update(&id, |c| {
            let review = c
                .attach_review(caller.user_id, rating, &req.feedback, Utc::now())?
                .clone();
            Ok::<_, AppError>((c.clone(), review))
        })
        .ok_or_else(|| not_found(id))??;

    state.persist_complaint(&updated).await?;

    let from_name = state.display_name(&caller.user_id);
    let recipients = state.users.filter(|u| {
        u.role == Role::Official && u.scope().permits(&updated.department_assigned)
    });
    for official in recipients {
        state
            .notify(NotificationRecord {
                id: Uuid::new_v4(),
                recipient_id: official.id,
                complaint_id: id,
                kind: NotificationKind::Review,
                message: format!(
                    "{from_name} rated the resolution of \"{}\" {}/{}",
                    updated.title,
                    rating.value(),
                    Rating::MAX
                ),
                from_name: from_name.clone(),
                complaint_title: updated.title.clone(),
                created_at: Utc::now(),
            })
            .await?;
    }

    tracing::info!(complaint_id = %id, rating = rating.value(), "review submitted");
    Ok(Json(review))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct Fixture {
        state: AppState,
        citizen: CallerIdentity,
        other_citizen: CallerIdentity,
        water: CallerIdentity,
        roads: CallerIdentity,
        admin: CallerIdentity,
    }

    fn user(role: Role, name: &str, department: Option<&str>) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: Some("9000000000".into()),
            role,
            department: department.map(str::to_string),
        }
    }

    fn fixture() -> Fixture {
        let state = AppState::new();
        let mut ids = Vec::new();
        for u in [
            user(Role::Citizen, "Rahul Sharma", None),
            user(Role::Citizen, "Priya Patel", None),
            user(Role::Official, "Sneha Gupta", Some("Water Department")),
            user(Role::Official, "Amit Singh", Some("Roads Department")),
            user(Role::Official, "Commissioner", Some("All")),
        ] {
            ids.push(CallerIdentity {
                user_id: u.id,
                role: u.role,
            });
            state.users.insert(u.id, u);
        }
        Fixture {
            state,
            citizen: ids[0],
            other_citizen: ids[1],
            water: ids[2],
            roads: ids[3],
            admin: ids[4],
        }
    }

    fn app(state: &AppState, caller: CallerIdentity) -> Router {
        router()
            .merge(public_router())
            .layer(axum::Extension(caller))
            .with_state(state.clone())
    }

    async fn call(
        state: &AppState,
        caller: CallerIdentity,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> axum::response::Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        app(state, caller)
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn file(f: &Fixture, body: serde_json::Value) -> Complaint {
        let resp = call(&f.state, f.citizen, "POST", "/api/complaints", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }

    async fn file_water(f: &Fixture) -> Complaint {
        file(
            f,
            serde_json::json!({
                "title": "Water pipe burst",
                "description": "Main line burst near the school",
                "department": "Water Department",
            }),
        )
        .await
    }

    async fn set_status(f: &Fixture, id: Uuid, status: &str) {
        let resp = call(
            &f.state,
            f.admin,
            "PATCH",
            &format!("/api/complaints/{id}"),
            Some(serde_json::json!({ "status": status })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_triages_and_sets_sla() {
        let f = fixture();
        let c = file(
            &f,
            serde_json::json!({
                "title": "Pothole",
                "description": "There is a huge pothole, immediate danger of accident",
            }),
        )
        .await;
        assert_eq!(c.category, "Roads");
        assert_eq!(c.department_assigned, "Roads");
        assert_eq!(c.severity, Severity::Critical);
        assert_eq!(c.status, ComplaintStatus::Pending);
        assert_eq!(c.sla_deadline - c.created_at, chrono::Duration::hours(4));
        assert_eq!(c.citizen_id, f.citizen.user_id);
        assert_eq!(c.location, Location::default());
        assert_eq!(f.state.complaints.len(), 1);
    }

    #[tokio::test]
    async fn create_honors_explicit_triage() {
        let f = fixture();
        let c = file(
            &f,
            serde_json::json!({
                "title": "Pothole",
                "description": "huge pothole",
                "category": "Infrastructure",
                "severity": "LOW",
                "location": { "longitude": 72.8777, "latitude": 19.076, "address": "Andheri West, Mumbai" },
            }),
        )
        .await;
        assert_eq!(c.category, "Infrastructure");
        assert_eq!(c.department_assigned, "Infrastructure");
        assert_eq!(c.severity, Severity::Low);
        assert_eq!(c.sla_deadline - c.created_at, chrono::Duration::hours(72));
        assert_eq!(c.location.address, "Andheri West, Mumbai");
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let f = fixture();
        let cases = [
            serde_json::json!({ "title": " ", "description": "x" }),
            serde_json::json!({ "title": "x", "description": "x", "severity": "HUGE" }),
            serde_json::json!({ "title": "x", "description": "x", "location": { "latitude": 120.0 } }),
        ];
        for body in cases {
            let resp = call(&f.state, f.citizen, "POST", "/api/complaints", Some(body)).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
        assert!(f.state.complaints.is_empty());
    }

    #[tokio::test]
    async fn officials_cannot_file() {
        let f = fixture();
        let resp = call(
            &f.state,
            f.water,
            "POST",
            "/api/complaints",
            Some(serde_json::json!({ "title": "x", "description": "y" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn public_listing_is_sanitized() {
        let f = fixture();
        file_water(&f).await;
        let resp = call(&f.state, f.other_citizen, "GET", "/api/complaints/public", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let listing: Vec<serde_json::Value> = body_json(resp).await;
        assert_eq!(listing.len(), 1);
        let entry = &listing[0];
        assert!(entry.get("description").is_none());
        assert!(entry.get("citizen_id").is_none());
        assert!(entry.get("comments").is_none());
        assert!(entry.get("evidence").is_none());
        assert_eq!(entry["upvotes"], 0);
    }

    #[tokio::test]
    async fn public_listing_geofilter() {
        let f = fixture();
        file(
            &f,
            serde_json::json!({
                "title": "Bengaluru pothole",
                "description": "pothole",
                "location": { "longitude": 77.5946, "latitude": 12.9716 },
            }),
        )
        .await;
        file(&f, serde_json::json!({ "title": "Delhi leak", "description": "leak" })).await;

        let resp = call(
            &f.state,
            f.citizen,
            "GET",
            "/api/complaints/public?lng=77.59&lat=12.97&radius_km=10",
            None,
        )
        .await;
        let near: Vec<PublicComplaint> = body_json(resp).await;
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].title, "Bengaluru pothole");

        let resp = call(
            &f.state,
            f.citizen,
            "GET",
            "/api/complaints/public?lng=77.59&lat=12.97",
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn me_lists_only_own_newest_first() {
        let f = fixture();
        let first = file(&f, serde_json::json!({ "title": "First", "description": "a" })).await;
        let second = file(&f, serde_json::json!({ "title": "Second", "description": "b" })).await;

        let resp = call(&f.state, f.citizen, "GET", "/api/complaints/me", None).await;
        let mine: Vec<Complaint> = body_json(resp).await;
        assert_eq!(mine.len(), 2);
        assert!(mine[0].created_at >= mine[1].created_at);
        let ids: Vec<Uuid> = mine.iter().map(|c| c.id).collect();
        assert!(ids.contains(&first.id) && ids.contains(&second.id));

        let resp = call(&f.state, f.other_citizen, "GET", "/api/complaints/me", None).await;
        let theirs: Vec<Complaint> = body_json(resp).await;
        assert!(theirs.is_empty());
    }

    #[tokio::test]
    async fn department_listing_is_scoped() {
        let f = fixture();
        file_water(&f).await;
        file(
            &f,
            serde_json::json!({
                "title": "Pothole",
                "description": "pothole",
                "department": "Roads Department",
            }),
        )
        .await;

        let resp = call(&f.state, f.water, "GET", "/api/complaints/department", None).await;
        let listing: Vec<DepartmentComplaint> = body_json(resp).await;
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].complaint.department_assigned, "Water Department");
        let contact = listing[0].citizen.as_ref().unwrap();
        assert_eq!(contact.name, "Rahul Sharma");

        let resp = call(&f.state, f.admin, "GET", "/api/complaints/department", None).await;
        let all: Vec<DepartmentComplaint> = body_json(resp).await;
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn department_listing_orders_by_status_then_deadline() {
        let f = fixture();
        let low = file(
            &f,
            serde_json::json!({ "title": "a", "description": "a", "severity": "LOW" }),
        )
        .await;
        let critical = file(
            &f,
            serde_json::json!({ "title": "b", "description": "b", "severity": "CRITICAL" }),
        )
        .await;
        let progressing = file(
            &f,
            serde_json::json!({ "title": "c", "description": "c", "severity": "LOW" }),
        )
        .await;
        set_status(&f, progressing.id, "IN_PROGRESS").await;

        let resp = call(&f.state, f.admin, "GET", "/api/complaints/department", None).await;
        let listing: Vec<DepartmentComplaint> = body_json(resp).await;
        let order: Vec<Uuid> = listing.iter().map(|d| d.complaint.id).collect();
        assert_eq!(order, vec![progressing.id, critical.id, low.id]);
    }

    #[tokio::test]
    async fn citizens_cannot_use_official_routes() {
        let f = fixture();
        for uri in ["/api/complaints/department", "/api/complaints/analytics"] {
            let resp = call(&f.state, f.citizen, "GET", uri, None).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[tokio::test]
    async fn unregistered_official_is_forbidden() {
        let f = fixture();
        let ghost = CallerIdentity {
            user_id: Uuid::new_v4(),
            role: Role::Official,
        };
        let resp = call(&f.state, ghost, "GET", "/api/complaints/department", None).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn get_by_id_respects_visibility() {
        let f = fixture();
        let c = file_water(&f).await;
        let uri = format!("/api/complaints/{}", c.id);

        for (caller, expected) in [
            (f.citizen, StatusCode::OK),
            (f.water, StatusCode::OK),
            (f.admin, StatusCode::OK),
            (f.other_citizen, StatusCode::NOT_FOUND),
            (f.roads, StatusCode::NOT_FOUND),
        ] {
            let resp = call(&f.state, caller, "GET", &uri, None).await;
            assert_eq!(resp.status(), expected);
        }

        let resp = call(
            &f.state,
            f.citizen,
            "GET",
            &format!("/api/complaints/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_transitions_track_resolved_at() {
        let f = fixture();
        let c = file_water(&f).await;
        let uri = format!("/api/complaints/{}", c.id);

        let patch = |status: &'static str| {
            let state = f.state.clone();
            let uri = uri.clone();
            let caller = f.water;
            async move {
                let resp = call(
                    &state,
                    caller,
                    "PATCH",
                    &uri,
                    Some(serde_json::json!({ "status": status })),
                )
                .await;
                assert_eq!(resp.status(), StatusCode::OK);
                body_json::<Complaint>(resp).await
            }
        };

        let resolved = patch("RESOLVED").await;
        let stamp = resolved.resolved_at.unwrap();
        let again = patch("RESOLVED").await;
        assert_eq!(again.resolved_at, Some(stamp));
        let reopened = patch("IN_PROGRESS").await;
        assert!(reopened.resolved_at.is_none());
        assert_eq!(reopened.status_history.len(), 2);
        assert_eq!(reopened.severity, c.severity);
        assert_eq!(reopened.sla_deadline, c.sla_deadline);
    }

    #[tokio::test]
    async fn patch_enforces_role_scope_and_status() {
        let f = fixture();
        let c = file_water(&f).await;
        let uri = format!("/api/complaints/{}", c.id);
        let body = Some(serde_json::json!({ "status": "RESOLVED" }));

        let resp = call(&f.state, f.citizen, "PATCH", &uri, body.clone()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = call(&f.state, f.roads, "PATCH", &uri, body).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = call(
            &f.state,
            f.water,
            "PATCH",
            &uri,
            Some(serde_json::json!({ "status": "CLOSED" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = call(&f.state, f.water, "PATCH", &uri, Some(serde_json::json!({}))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let unchanged: Complaint = body_json(resp).await;
        assert_eq!(unchanged.status, ComplaintStatus::Pending);

        assert_eq!(
            f.state.complaints.get(&c.id).unwrap().status,
            ComplaintStatus::Pending
        );
    }

    #[tokio::test]
    async fn comments_append_and_notify_owner() {
        let f = fixture();
        let c = file_water(&f).await;
        let uri = format!("/api/complaints/{}/comments", c.id);

        let resp = call(
            &f.state,
            f.water,
            "POST",
            &uri,
            Some(serde_json::json!({ "text": "Crew dispatched" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let thread: Vec<Comment> = body_json(resp).await;
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].author_name, "Sneha Gupta");
        assert_eq!(thread[0].author_role, Role::Official);

        let resp = call(
            &f.state,
            f.citizen,
            "POST",
            &uri,
            Some(serde_json::json!({ "text": "Thanks!" })),
        )
        .await;
        let thread: Vec<Comment> = body_json(resp).await;
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[1].text, "Thanks!");

        // Only the official's comment notifies the owner.
        let inbox = f
            .state
            .notifications
            .filter(|n| n.recipient_id == f.citizen.user_id);
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Comment);
        assert_eq!(inbox[0].from_name, "Sneha Gupta");
    }

    #[tokio::test]
    async fn comments_rejected_outside_view() {
        let f = fixture();
        let c = file_water(&f).await;
        let uri = format!("/api/complaints/{}/comments", c.id);
        let body = Some(serde_json::json!({ "text": "hello" }));

        let resp = call(&f.state, f.other_citizen, "POST", &uri, body.clone()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let resp = call(&f.state, f.roads, "POST", &uri, body).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = call(
            &f.state,
            f.citizen,
            "POST",
            &uri,
            Some(serde_json::json!({ "text": "   " })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(f.state.complaints.get(&c.id).unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn upvote_toggles() {
        let f = fixture();
        let c = file_water(&f).await;
        let uri = format!("/api/complaints/{}/upvote", c.id);

        let up: UpvoteResponse = body_json(call(&f.state, f.other_citizen, "POST", &uri, None).await).await;
        assert_eq!(up.upvotes, 1);
        let up: UpvoteResponse = body_json(call(&f.state, f.citizen, "POST", &uri, None).await).await;
        assert_eq!(up.upvotes, 2);
        let down: UpvoteResponse = body_json(call(&f.state, f.other_citizen, "POST", &uri, None).await).await;
        assert_eq!(down.upvotes, 1);

        let resp = call(
            &f.state,
            f.citizen,
            "POST",
            &format!("/api/complaints/{}/upvote", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn review_gate() {
        let f = fixture();
        let c = file_water(&f).await;
        let uri = format!("/api/complaints/{}/review", c.id);
        let body = Some(serde_json::json!({ "rating": 4, "feedback": "Quick fix" }));

        let resp = call(&f.state, f.citizen, "POST", &uri, body.clone()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        set_status(&f, c.id, "RESOLVED").await;

        let resp = call(&f.state, f.other_citizen, "POST", &uri, body.clone()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = call(
            &f.state,
            f.citizen,
            "POST",
            &uri,
            Some(serde_json::json!({ "rating": 6 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = call(&f.state, f.citizen, "POST", &uri, body).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let review: Review = body_json(resp).await;
        assert_eq!(review.rating.value(), 4);

        // Overwrite keeps a single review.
        let resp = call(
            &f.state,
            f.citizen,
            "POST",
            &uri,
            Some(serde_json::json!({ "rating": 2 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let stored = f.state.complaints.get(&c.id).unwrap();
        assert_eq!(stored.review.unwrap().rating.value(), 2);
    }

    #[tokio::test]
    async fn review_rejects_malformed_ratings_as_validation() {
        let f = fixture();
        let c = file_water(&f).await;
        set_status(&f, c.id, "RESOLVED").await;
        let uri = format!("/api/complaints/{}/review", c.id);

        for body in [
            serde_json::json!({ "rating": 0 }),
            serde_json::json!({ "rating": 300 }),
            serde_json::json!({ "rating": -1 }),
            serde_json::json!({ "rating": 4.5 }),
            serde_json::json!({ "rating": "5" }),
            serde_json::json!({ "feedback": "no rating" }),
        ] {
            let resp = call(&f.state, f.citizen, "POST", &uri, Some(body.clone())).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
            let err: crate::error::ErrorBody = body_json(resp).await;
            assert_eq!(err.error.code, "VALIDATION_ERROR", "{body}");
        }
        assert!(f.state.complaints.get(&c.id).unwrap().review.is_none());
    }

    #[tokio::test]
    async fn create_without_title_is_validation_error() {
        let f = fixture();
        let resp = call(
            &f.state,
            f.citizen,
            "POST",
            "/api/complaints",
            Some(serde_json::json!({ "description": "Water pipe burst" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let err: crate::error::ErrorBody = body_json(resp).await;
        assert_eq!(err.error.code, "VALIDATION_ERROR");
        assert!(f.state.complaints.is_empty());
    }

    #[tokio::test]
    async fn malformed_id_is_json_not_found() {
        let f = fixture();
        for (method, uri) in [
            ("GET", "/api/complaints/42"),
            ("POST", "/api/complaints/42/upvote"),
        ] {
            let resp = call(&f.state, f.admin, method, uri, None).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method} {uri}");
            let err: crate::error::ErrorBody = body_json(resp).await;
            assert_eq!(err.error.code, "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn review_notifies_in_scope_officials() {
        let f = fixture();
        let c = file_water(&f).await;
        set_status(&f, c.id, "RESOLVED").await;
        let resp = call(
            &f.state,
            f.citizen,
            "POST",
            &format!("/api/complaints/{}/review", c.id),
            Some(serde_json::json!({ "rating": 5 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let mut recipients: Vec<Uuid> = f
            .state
            .notifications
            .filter(|n| n.kind == NotificationKind::Review)
            .iter()
            .map(|n| n.recipient_id)
            .collect();
        recipients.sort();
        let mut expected = vec![f.water.user_id, f.admin.user_id];
        expected.sort();
        assert_eq!(recipients, expected);
    }

    #[tokio::test]
    async fn analytics_counts_scoped_set() {
        let f = fixture();
        file_water(&f).await;
        file_water(&f).await;
        file(
            &f,
            serde_json::json!({
                "title": "Pothole",
                "description": "pothole",
                "department": "Roads Department",
            }),
        )
        .await;

        let resp = call(&f.state, f.water, "GET", "/api/complaints/analytics", None).await;
        let scoped: Analytics = body_json(resp).await;
        assert_eq!(scoped.statuses.count("PENDING"), 2);
        assert_eq!(scoped.categories.total(), 2);

        let resp = call(&f.state, f.admin, "GET", "/api/complaints/analytics", None).await;
        let all: Analytics = body_json(resp).await;
        assert_eq!(all.statuses.total(), 3);
    }

    #[test]
    fn public_query_requires_all_or_nothing() {
        assert!(PublicQuery::default().validate().is_ok());
        let partial = PublicQuery {
            lng: Some(77.2),
            ..Default::default()
        };
        assert!(partial.validate().is_err());
        let negative = PublicQuery {
            lng: Some(77.2),
            lat: Some(28.6),
            radius_km: Some(-1.0),
        };
        assert!(negative.validate().is_err());
    }
}
