//! # Directory Bootstrap
//!
//! Loads the user directory (and optionally starter complaints) from a YAML
//! seed file named by `DIRECTORY_SEED` at startup.
//!
//! ```yaml
//! users:
//!   - id: 00000000-0000-4000-8000-000000000003
//!     name: Amit Singh
//!     email: amit.roads@gov.in
//!     role: official
//!     department: Roads Department
//! complaints:
//!   - citizen_id: 00000000-0000-4000-8000-000000000001
//!     title: Huge pothole on MG Road causing accidents
//!     description: ...
//!     severity: HIGH
//!     status: IN_PROGRESS
//! ```
//!
//! Seeding is idempotent: users are upserted and complaints whose id is
//! already present are skipped, so a database-backed deployment can keep
//! `DIRECTORY_SEED` set across restarts.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use civic_core::{Location, Severity, TriageOverrides};
use civic_state::{Complaint, ComplaintDraft, ComplaintStatus, Role};

use crate::state::{AppState, UserRecord};

/// Errors during bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("directory seed not found: {path}")]
    SeedNotFound { path: String },

    #[error("invalid directory seed: {0}")]
    InvalidSeed(String),

    #[error("failed to persist seed data: {0}")]
    Persist(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Contents of a directory seed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorySeed {
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub complaints: Vec<SeedComplaint>,
}

/// A starter complaint. Missing triage fields are inferred as at intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedComplaint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub citizen_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default)]
    pub status: ComplaintStatus,
    #[serde(default)]
    pub location: Location,
}

/// What a seed application changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub complaints_added: usize,
    pub complaints_skipped: usize,
}

/// Fixed id of a demo directory user, by position (1-based).
pub fn demo_user_id(n: u128) -> Uuid {
    Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0000 | n)
}

fn demo_complaint_id(n: u128) -> Uuid {
    Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0001_0000 | n)
}

/// The demo directory: two citizens, two department officials, and four
/// complaints across Indian cities.
pub fn demo_seed() -> DirectorySeed {
    let citizen = |n: u128, name: &str, email: &str, phone: &str| UserRecord {
        id: demo_user_id(n),
        name: name.into(),
        email: email.into(),
        phone: Some(phone.into()),
        role: Role::Citizen,
        department: None,
    };
    let official = |n: u128, name: &str, email: &str, phone: &str, dept: &str| UserRecord {
        id: demo_user_id(n),
        name: name.into(),
        email: email.into(),
        phone: Some(phone.into()),
        role: Role::Official,
        department: Some(dept.into()),
    };

    let users = vec![
        citizen(1, "Rahul Sharma", "rahul@example.com", "9876543210"),
        citizen(2, "Priya Patel", "priya@example.com", "9876543211"),
        official(3, "Amit Singh", "amit.roads@gov.in", "9000000001", "Roads Department"),
        official(4, "Sneha Gupta", "sneha.water@gov.in", "9000000002", "Water Department"),
    ];

    #[allow(clippy::type_complexity)]
    let rows: [(&str, &str, &str, Severity, &str, ComplaintStatus, (f64, f64, &str)); 4] = [
        (
            "Huge pothole on MG Road causing accidents",
            "There is a massive pothole right in the middle of MG Road near the metro station. Two bikers fell yesterday.",
            "Roads",
            Severity::High,
            "Roads Department",
            ComplaintStatus::InProgress,
            (77.5946, 12.9716, "MG Road, Bengaluru"),
        ),
        (
            "Water pipe burst flooding the street",
            "Main water supply line burst this morning. Entire street is flooded and water pressure is zero in our homes.",
            "Water",
            Severity::Critical,
            "Water Department",
            ComplaintStatus::Pending,
            (77.2090, 28.6139, "Connaught Place, New Delhi"),
        ),
        (
            "Streetlights not working for a week",
            "The streetlights from sector 4 to sector 5 are completely dead. It is very unsafe at night.",
            "Electricity",
            Severity::Medium,
            "Electricity Department",
            ComplaintStatus::Pending,
            (72.8777, 19.0760, "Andheri West, Mumbai"),
        ),
        (
            "Garbage dump overflowing near park",
            "The community bin has not been cleared for 4 days. Strong foul smell reaching the children play area.",
            "Waste",
            Severity::Medium,
            "Waste Department",
            ComplaintStatus::Resolved,
            (80.2707, 13.0827, "T Nagar, Chennai"),
        ),
    ];

    let complaints = rows
        .into_iter()
        .enumerate()
        .map(
            |(i, (title, description, category, severity, dept, status, (lng, lat, addr)))| {
                SeedComplaint {
                    id: Some(demo_complaint_id(i as u128 + 1)),
                    citizen_id: demo_user_id(i as u128 % 2 + 1),
                    title: title.into(),
                    description: description.into(),
                    category: Some(category.into()),
                    severity: Some(severity),
                    department: Some(dept.into()),
                    status,
                    location: Location {
                        longitude: lng,
                        latitude: lat,
                        address: addr.into(),
                    },
                }
            },
        )
        .collect();

    DirectorySeed { users, complaints }
}

/// Parse a seed file and check that every complaint belongs to a citizen
/// listed in it.
pub fn load_seed(path: &Path) -> Result<DirectorySeed, BootstrapError> {
    if !path.exists() {
        return Err(BootstrapError::SeedNotFound {
            path: path.display().to_string(),
        });
    }
    let raw = std::fs::read_to_string(path)?;
    let seed: DirectorySeed =
        serde_yaml::from_str(&raw).map_err(|e| BootstrapError::InvalidSeed(e.to_string()))?;

    for c in &seed.complaints {
        let owner = seed.users.iter().find(|u| u.id == c.citizen_id);
        match owner {
            Some(u) if u.role == Role::Citizen => {}
            Some(_) => {
                return Err(BootstrapError::InvalidSeed(format!(
                    "complaint '{}' is owned by a non-citizen",
                    c.title
                )))
            }
            None => {
                return Err(BootstrapError::InvalidSeed(format!(
                    "complaint '{}' references unknown citizen {}",
                    c.title, c.citizen_id
                )))
            }
        }
    }
    Ok(seed)
}

/// Apply a seed to the stores, writing through to the database.
pub async fn apply_seed(
    state: &AppState,
    seed: &DirectorySeed,
) -> Result<SeedSummary, BootstrapError> {
    let mut summary = SeedSummary::default();

    for user in &seed.users {
        state.users.insert(user.id, user.clone());
        state
            .persist_user(user)
            .await
            .map_err(|e| BootstrapError::Persist(e.to_string()))?;
        summary.users += 1;
    }

    let now = Utc::now();
    for entry in &seed.complaints {
        if let Some(id) = entry.id {
            if state.complaints.get(&id).is_some() {
                summary.complaints_skipped += 1;
                continue;
            }
        }

        let draft = ComplaintDraft {
            title: entry.title.clone(),
            description: entry.description.clone(),
            overrides: TriageOverrides {
                category: entry.category.clone(),
                severity: entry.severity,
                department: entry.department.clone(),
            },
            location: entry.location.clone(),
            evidence: Vec::new(),
        };
        let mut complaint = Complaint::file(entry.citizen_id, draft, now)
            .map_err(|e| BootstrapError::InvalidSeed(format!("{}: {e}", entry.title)))?;
        if let Some(id) = entry.id {
            complaint.id = id;
        }
        if entry.status != ComplaintStatus::Pending {
            complaint.transition_status(entry.status, Uuid::nil(), now);
        }

        state
            .persist_complaint(&complaint)
            .await
            .map_err(|e| BootstrapError::Persist(e.to_string()))?;
        state.complaints.insert(complaint.id, complaint);
        summary.complaints_added += 1;
    }

    Ok(summary)
}

/// Load and apply the seed named by `DIRECTORY_SEED`, if set.
pub async fn bootstrap(state: &AppState) -> Result<Option<SeedSummary>, BootstrapError> {
    let path = match std::env::var("DIRECTORY_SEED") {
        Ok(p) if !p.trim().is_empty() => p,
        _ => {
            tracing::info!("DIRECTORY_SEED not set, starting with the hydrated directory only");
            return Ok(None);
        }
    };

    let seed = load_seed(Path::new(&path))?;
    let summary = apply_seed(state, &seed).await?;
    tracing::info!(
        path = %path,
        users = summary.users,
        complaints_added = summary.complaints_added,
        complaints_skipped = summary.complaints_skipped,
        "Directory seed applied"
    );
    Ok(Some(summary))
}
