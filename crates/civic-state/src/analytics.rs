//! # Analytics Breakdowns
//!
//! Group-by-count over a set of complaints, shaped as parallel `labels` and
//! `data` sequences for charting. Labels are sorted ascending so output is
//! deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::complaint::Complaint;

/// Parallel label/count sequences. `labels[i]` has count `data[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Breakdown {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

impl Breakdown {
    fn from_counts(counts: BTreeMap<String, u64>) -> Self {
        let (labels, data) = counts.into_iter().unzip();
        Self { labels, data }
    }

    /// Count for `label`, or zero when absent.
    pub fn count(&self, label: &str) -> u64 {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.data[i])
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.data.iter().sum()
    }
}

/// Category and status breakdowns over one scoped complaint set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Analytics {
    pub categories: Breakdown,
    pub statuses: Breakdown,
}

impl Analytics {
    pub fn over<'a>(complaints: impl IntoIterator<Item = &'a Complaint>) -> Self {
        let mut categories: BTreeMap<String, u64> = BTreeMap::new();
        let mut statuses: BTreeMap<String, u64> = BTreeMap::new();
        for c in complaints {
            *categories.entry(c.category.clone()).or_default() += 1;
            *statuses.entry(c.status.to_string()).or_default() += 1;
        }
        Self {
            categories: Breakdown::from_counts(categories),
            statuses: Breakdown::from_counts(statuses),
        }
    }
}
