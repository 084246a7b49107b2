//! # civic-core: Triage Primitives for the Civic Grievance Stack
//!
//! This crate is the leaf of the workspace. It defines the pieces of intake
//! triage that every other crate builds on, and depends on nothing internal.
//!
//! ## Contents
//!
//! - [`Severity`]: the four-level severity scale (`LOW` → `CRITICAL`).
//! - [`classify`]: keyword-table intake classifier producing a [`Triage`]
//!   (category, severity, routing department) from free text.
//! - [`sla`]: severity → response window mapping and deadline computation.
//! - [`DepartmentScope`]: the routing/visibility policy for officials.
//! - [`Location`]: complaint geolocation with intake defaults and
//!   great-circle distance.
//!
//! ## Crate Policy
//!
//! - Keyword tables are `const` data. Nothing in this crate holds mutable
//!   global state.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug` and `Clone`; data types implement
//!   `Serialize`/`Deserialize`. The `openapi` feature adds `utoipa::ToSchema`.

pub mod classify;
pub mod department;
pub mod error;
pub mod location;
pub mod severity;
pub mod sla;

// Re-export primary types for ergonomic imports.
pub use classify::{classify, classify_text, Triage, TriageOverrides, DEFAULT_CATEGORY};
pub use department::{DepartmentScope, ALL_DEPARTMENTS};
pub use error::ValidationError;
pub use location::Location;
pub use severity::Severity;
pub use sla::{sla_deadline, sla_hours};
