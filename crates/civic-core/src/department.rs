//! # Department Scoping
//!
//! An official either manages every complaint (department `"All"`, empty, or
//! unset) or only complaints whose routing department exactly equals their
//! own. Matching is case-sensitive with no hierarchy and no wildcards.

/// Sentinel department granting visibility over every complaint.
pub const ALL_DEPARTMENTS: &str = "All";

/// Visibility scope of an official.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentScope {
    /// Sees and manages every complaint.
    All,
    /// Restricted to complaints routed to this department.
    Only(String),
}

impl DepartmentScope {
    /// Derive the scope from an official's department attribute.
    pub fn for_department(department: Option<&str>) -> Self {
        match department {
            None => Self::All,
            Some(d) if d.is_empty() || d == ALL_DEPARTMENTS => Self::All,
            Some(d) => Self::Only(d.to_string()),
        }
    }

    /// Whether a complaint routed to `department_assigned` is in scope.
    pub fn permits(&self, department_assigned: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(d) => d == department_assigned,
        }
    }
}
