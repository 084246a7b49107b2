//! # Per-Caller Rate Limiting
//!
//! Fixed-window limiter keyed by the authenticated caller's id. Runs inside
//! the auth middleware, so rejected credentials never consume quota.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parking_lot::Mutex;

use crate::auth::CallerIdentity;
use crate::error::{ErrorBody, ErrorDetail};

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window duration in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Clone)]
struct Window {
    count: u64,
    started: Instant,
}

#[derive(Debug)]
struct Windows {
    by_key: HashMap<String, Window>,
    last_sweep: Instant,
}

/// Shared rate limiter state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<Windows>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(Windows {
                by_key: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    /// Count a request against `key`. Returns `false` once the window is full.
    ///
    /// Expired windows are dropped at most once per window length.
    pub fn check(&self, key: &str) -> bool {
        let mut windows = self.windows.lock();
        let now = Instant::now();
        let window_secs = self.config.window_secs;

        if now.duration_since(windows.last_sweep).as_secs() >= window_secs {
            windows
                .by_key
                .retain(|_, w| now.duration_since(w.started).as_secs() < window_secs);
            windows.last_sweep = now;
        }

        let window = windows.by_key.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started).as_secs() >= window_secs {
            window.count = 0;
            window.started = now;
        }

        if window.count >= self.config.max_requests {
            false
        } else {
            window.count += 1;
            true
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.windows.lock().by_key.len()
    }
}

/// Middleware that enforces per-caller rate limits.
///
/// Requests without a [`CallerIdentity`] share the `"anonymous"` bucket.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    if let Some(limiter) = request.extensions().get::<RateLimiter>().cloned() {
        let key = request
            .extensions()
            .get::<CallerIdentity>()
            .map(|c| c.user_id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        if !limiter.check(&key) {
            tracing::warn!(caller = %key, "rate limit exceeded");
            let body = ErrorBody {
                error: ErrorDetail {
                    code: "RATE_LIMITED".to_string(),
                    message: "rate limit exceeded".to_string(),
                    details: None,
                },
            };
            return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::Role;

    fn limiter(max: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests: max,
            window_secs: 60,
        })
    }

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let l = limiter(3);
        assert!(l.check("a"));
        assert!(l.check("a"));
        assert!(l.check("a"));
        assert!(!l.check("a"));
    }

    #[test]
    fn keys_are_independent() {
        let l = limiter(1);
        assert!(l.check("a"));
        assert!(l.check("b"));
        assert!(!l.check("a"));
    }

    #[test]
    fn zero_length_window_resets_every_call() {
        let l = RateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window_secs: 0,
        });
        assert!(l.check("a"));
        assert!(l.check("a"));
    }

    #[test]
    fn expired_windows_are_pruned() {
        let l = RateLimiter::new(RateLimitConfig {
            max_requests: 5,
            window_secs: 0,
        });
        for key in ["a", "b", "c", "d"] {
            assert!(l.check(key));
        }
        assert_eq!(l.tracked(), 1);
    }

    #[test]
    fn live_windows_survive_a_sweep() {
        let l = limiter(5);
        assert!(l.check("a"));
        assert!(l.check("b"));
        assert_eq!(l.tracked(), 2);
    }

    #[test]
    fn clones_share_windows() {
        let l = limiter(1);
        let c = l.clone();
        assert!(l.check("a"));
        assert!(!c.check("a"));
    }

    fn app(limiter: RateLimiter, caller: CallerIdentity) -> Router {
        Router::new()
            .route("/x", get(|| async { "ok" }))
            .layer(from_fn(rate_limit_middleware))
            .layer(Extension(caller))
            .layer(Extension(limiter))
    }

    async fn status(app: &Router) -> StatusCode {
        app.clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/x")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn middleware_returns_429_per_caller() {
        let l = limiter(1);
        let alice = app(
            l.clone(),
            CallerIdentity {
                user_id: Uuid::new_v4(),
                role: Role::Citizen,
            },
        );
        let bob = app(
            l,
            CallerIdentity {
                user_id: Uuid::new_v4(),
                role: Role::Citizen,
            },
        );
        assert_eq!(status(&alice).await, StatusCode::OK);
        assert_eq!(status(&alice).await, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status(&bob).await, StatusCode::OK);
    }
}
