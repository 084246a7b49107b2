//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! - **Complaints**: the complaint aggregates, authoritative for reads.
//! - **Users**: the user directory: display names, contact details, roles
//!   and official departments. Populated from the directory seed and the
//!   database; identity itself comes from the bearer token.
//! - **Notifications**: per-user inbox entries.
//!
//! When a database pool is present, every mutation is written through to
//! Postgres and the stores are hydrated from it on startup.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use civic_core::DepartmentScope;
use civic_state::{Complaint, Role};

use crate::auth::{AuthConfig, SecretToken};
use crate::error::AppError;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot`, never held across `.await`.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Clone out the records matching `pred`, under a single read lock.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| pred(v))
            .cloned()
            .collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under the write lock and may reject the change by
    /// returning `Err`. Returns `None` if the record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove the record if `pred` accepts it. Returns the removed record.
    pub fn remove_if(&self, id: &Uuid, pred: impl FnOnce(&T) -> bool) -> Option<T> {
        let mut guard = self.data.write();
        match guard.get(id) {
            Some(v) if pred(v) => guard.remove(id),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Directory & Inbox Records ------------------------------------------------

/// A user directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
    /// Official's department. `None`, empty or `"All"` means unrestricted.
    #[serde(default)]
    pub department: Option<String>,
}

impl UserRecord {
    /// Visibility scope when acting as an official.
    pub fn scope(&self) -> DepartmentScope {
        DepartmentScope::for_department(self.department.as_deref())
    }
}

/// Contact summary of the citizen who filed a complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CitizenContact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&UserRecord> for CitizenContact {
    fn from(u: &UserRecord) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
        }
    }
}

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Comment,
    Review,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Review => "review",
        }
    }
}

/// An inbox entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub complaint_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub from_name: String,
    pub complaint_title: String,
    pub created_at: DateTime<Utc>,
}

// -- Application State --------------------------------------------------------

/// Application configuration.
///
/// Custom `Debug` redacts the secret.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// HS256 secret for bearer tokens. `None` generates an ephemeral one.
    pub jwt_secret: Option<SecretToken>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            jwt_secret: None,
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in each `Store`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub complaints: Store<Complaint>,
    pub users: Store<UserRecord>,
    pub notifications: Store<NotificationRecord>,

    /// PostgreSQL pool for write-through persistence. `None` means
    /// in-memory only.
    pub db_pool: Option<PgPool>,

    /// Token verification keys.
    pub auth: AuthConfig,
    /// Whether the signing secret was generated at startup.
    pub secret_ephemeral: bool,

    pub config: AppConfig,
}

impl AppState {
    /// Create state with default configuration and no database.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create state from configuration and an optional database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let (secret, secret_ephemeral) = match &config.jwt_secret {
            Some(secret) => (secret.clone(), false),
            None => (SecretToken::generate(), true),
        };

        Self {
            complaints: Store::new(),
            users: Store::new(),
            notifications: Store::new(),
            db_pool,
            auth: AuthConfig::new(&secret),
            secret_ephemeral,
            config,
        }
    }

    /// Display name for `id`, or `"Unknown"` when not in the directory.
    pub fn display_name(&self, id: &Uuid) -> String {
        self.users
            .get(id)
            .map(|u| u.name)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Persist a complaint when a database is configured.
    pub async fn persist_complaint(&self, complaint: &Complaint) -> Result<(), AppError> {
        if let Some(pool) = &self.db_pool {
            crate::db::complaints::upsert(pool, complaint)
                .await
                .map_err(|e| {
                    tracing::error!(complaint_id = %complaint.id, error = %e, "failed to persist complaint");
                    AppError::Internal(format!("complaint persist failed: {e}"))
                })?;
        }
        Ok(())
    }

    /// Persist a directory entry when a database is configured.
    pub async fn persist_user(&self, user: &UserRecord) -> Result<(), AppError> {
        if let Some(pool) = &self.db_pool {
            crate::db::users::upsert(pool, user).await.map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "failed to persist user");
                AppError::Internal(format!("user persist failed: {e}"))
            })?;
        }
        Ok(())
    }

    /// Store and persist a notification.
    pub async fn notify(&self, notification: NotificationRecord) -> Result<(), AppError> {
        self.notifications
            .insert(notification.id, notification.clone());
        if let Some(pool) = &self.db_pool {
            crate::db::notifications::insert(pool, &notification)
                .await
                .map_err(|e| {
                    tracing::error!(notification_id = %notification.id, error = %e, "failed to persist notification");
                    AppError::Internal(format!("notification persist failed: {e}"))
                })?;
        }
        Ok(())
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let users = crate::db::users::load_all(pool)
            .await
            .map_err(|e| format!("failed to load users: {e}"))?;
        let user_count = users.len();
        for record in users {
            self.users.insert(record.id, record);
        }

        let complaints = crate::db::complaints::load_all(pool)
            .await
            .map_err(|e| format!("failed to load complaints: {e}"))?;
        let complaint_count = complaints.len();
        for record in complaints {
            self.complaints.insert(record.id, record);
        }

        let notifications = crate::db::notifications::load_all(pool)
            .await
            .map_err(|e| format!("failed to load notifications: {e}"))?;
        let notification_count = notifications.len();
        for record in notifications {
            self.notifications.insert(record.id, record);
        }

        tracing::info!(
            users = user_count,
            complaints = complaint_count,
            notifications = notification_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, department: Option<&str>) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            name: "Sneha Gupta".into(),
            email: "sneha.water@gov.in".into(),
            phone: Some("9000000002".into()),
            role,
            department: department.map(str::to_string),
        }
    }

    #[test]
    fn store_insert_get_and_len() {
        let store: Store<UserRecord> = Store::new();
        assert!(store.is_empty());
        let u = user(Role::Citizen, None);
        assert!(store.insert(u.id, u.clone()).is_none());
        assert_eq!(store.get(&u.id), Some(u.clone()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.list(), vec![u]);
    }

    #[test]
    fn store_filter_selects_matching() {
        let store: Store<UserRecord> = Store::new();
        let a = user(Role::Citizen, None);
        let b = user(Role::Official, Some("Water Department"));
        store.insert(a.id, a);
        store.insert(b.id, b.clone());
        assert_eq!(store.filter(|u| u.role == Role::Official), vec![b]);
    }

    #[test]
    fn store_try_update_runs_under_lock() {
        let store: Store<UserRecord> = Store::new();
        let u = user(Role::Citizen, None);
        store.insert(u.id, u.clone());

        let ok: Option<Result<(), String>> = store.try_update(&u.id, |r| {
            r.name = "Rahul Sharma".into();
            Ok(())
        });
        assert!(matches!(ok, Some(Ok(()))));
        assert_eq!(store.get(&u.id).unwrap().name, "Rahul Sharma");

        let err: Option<Result<(), String>> = store.try_update(&u.id, |_| Err("nope".into()));
        assert!(matches!(err, Some(Err(_))));

        let missing: Option<Result<(), String>> = store.try_update(&Uuid::new_v4(), |_| Ok(()));
        assert!(missing.is_none());
    }

    #[test]
    fn store_remove_if_respects_predicate() {
        let store: Store<UserRecord> = Store::new();
        let u = user(Role::Citizen, None);
        store.insert(u.id, u.clone());
        assert!(store.remove_if(&u.id, |r| r.role == Role::Official).is_none());
        assert_eq!(store.len(), 1);
        assert!(store.remove_if(&u.id, |r| r.role == Role::Citizen).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn store_clone_shares_data() {
        let a: Store<UserRecord> = Store::new();
        let b = a.clone();
        let u = user(Role::Citizen, None);
        a.insert(u.id, u.clone());
        assert_eq!(b.get(&u.id), Some(u));
    }

    #[test]
    fn user_scope_follows_department() {
        assert_eq!(user(Role::Official, None).scope(), DepartmentScope::All);
        assert_eq!(user(Role::Official, Some("All")).scope(), DepartmentScope::All);
        assert_eq!(
            user(Role::Official, Some("Water Department")).scope(),
            DepartmentScope::Only("Water Department".into())
        );
    }

    #[test]
    fn display_name_falls_back_to_unknown() {
        let state = AppState::new();
        let u = user(Role::Citizen, None);
        state.users.insert(u.id, u.clone());
        assert_eq!(state.display_name(&u.id), "Sneha Gupta");
        assert_eq!(state.display_name(&Uuid::new_v4()), "Unknown");
    }

    #[test]
    fn app_state_without_secret_is_ephemeral() {
        let state = AppState::new();
        assert!(state.secret_ephemeral);
        let config = AppConfig {
            port: 9000,
            jwt_secret: Some(SecretToken::new("a".repeat(32)).unwrap()),
        };
        let state = AppState::with_config(config, None);
        assert!(!state.secret_ephemeral);
        assert_eq!(state.config.port, 9000);
    }

    #[test]
    fn app_config_debug_redacts_secret() {
        let config = AppConfig {
            port: 8080,
            jwt_secret: Some(SecretToken::new("super-secret-value-that-is-long-enough").unwrap()),
        };
        let dbg = format!("{config:?}");
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("super-secret"));
    }
}
