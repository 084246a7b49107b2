//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers to extract
//! and validate JSON bodies, query strings and path parameters in handlers.
//!
//! Rejections are folded into the [`AppError`] envelope:
//! - a body that parses as JSON but does not fit the DTO (missing field,
//!   wrong type, number out of range) is a validation failure (422);
//! - malformed JSON and a missing `Content-Type` stay 400;
//! - an unparseable path id is a 404.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;

use crate::error::AppError;

/// Request types that check business rules beyond what serde enforces.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(v)| v).map_err(|err| match err {
        JsonRejection::JsonDataError(e) => AppError::Validation(e.body_text()),
        other => AppError::BadRequest(other.body_text()),
    })
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract and validate query parameters.
pub fn extract_validated_query<T: Validate>(
    result: Result<Query<T>, QueryRejection>,
) -> Result<T, AppError> {
    let Query(value) = result.map_err(|err| AppError::Validation(err.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract a path parameter. A value that does not parse names no resource.
pub fn extract_path<T>(result: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    result.map(|Path(v)| v).map_err(|err| match err {
        PathRejection::FailedToDeserializePathParams(e) => AppError::NotFound(e.body_text()),
        other => AppError::Internal(other.body_text()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::Router;
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    impl Validate for Named {
        fn validate(&self) -> Result<(), String> {
            if self.name.is_empty() {
                return Err("name must not be empty".to_string());
            }
            Ok(())
        }
    }

    async fn named(
        id: Result<Path<Uuid>, PathRejection>,
        body: Result<Json<Named>, JsonRejection>,
    ) -> axum::response::Response {
        let outcome = extract_path(id).and_then(|_| extract_validated_json(body));
        match outcome {
            Ok(n) => n.name.into_response(),
            Err(e) => e.into_response(),
        }
    }

    async fn send(uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, String) {
        let app = Router::new().route("/named/:id", post(named));
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let resp = app
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn uri() -> String {
        format!("/named/{}", Uuid::new_v4())
    }

    #[tokio::test]
    async fn missing_field_is_validation_error() {
        let (status, body) = send(&uri(), Some("application/json"), "{}").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("VALIDATION_ERROR"), "got: {body}");
    }

    #[tokio::test]
    async fn wrong_type_is_validation_error() {
        let (status, _) = send(&uri(), Some("application/json"), r#"{"name": 7}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn business_rule_is_validation_error() {
        let (status, _) = send(&uri(), Some("application/json"), r#"{"name": ""}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = send(&uri(), Some("application/json"), "{\"name\":").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("BAD_REQUEST"), "got: {body}");
    }

    #[tokio::test]
    async fn missing_content_type_is_bad_request() {
        let (status, _) = send(&uri(), None, r#"{"name": "x"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unparseable_id_is_json_not_found() {
        let (status, body) = send("/named/not-a-uuid", Some("application/json"), r#"{"name": "x"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("\"code\":\"NOT_FOUND\""), "got: {body}");
    }

    #[tokio::test]
    async fn valid_request_passes() {
        let (status, body) = send(&uri(), Some("application/json"), r#"{"name": "ok"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
