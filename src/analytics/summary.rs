use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ingest::parse_iso;
use crate::model::Defect;

/// Headline numbers for a dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    /// Severity `high` or `critical`.
    pub high_severity: usize,
    pub ready_for_testing: usize,
    /// Created on the day before the reference date.
    pub created_yesterday: usize,
    pub domains: Vec<String>,
}

fn eq_any(value: Option<&str>, wanted: &[&str]) -> bool {
    value.map_or(false, |v| {
        let v = v.trim();
        wanted.iter().any(|w| v.eq_ignore_ascii_case(w))
    })
}

/// Sorted, de-duplicated non-empty domains.
pub fn unique_domains(defects: &[Defect]) -> Vec<String> {
    defects
        .iter()
        .filter_map(|d| d.domain.as_deref().map(str::trim))
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Summarize `defects` relative to `today` (UTC calendar date).
pub fn summarize(defects: &[Defect], today: NaiveDate) -> Summary {
    let yesterday = today - Duration::days(1);
    Summary {
        total: defects.len(),
        high_severity: defects
            .iter()
            .filter(|d| eq_any(d.severity.as_deref(), &["high", "critical"]))
            .count(),
        ready_for_testing: defects
            .iter()
            .filter(|d| eq_any(d.status.as_deref(), &["ready for testing"]))
            .count(),
        created_yesterday: defects
            .iter()
            .filter_map(|d| parse_iso(&d.created_at))
            .filter(|dt| dt.date_naive() == yesterday)
            .count(),
        domains: unique_domains(defects),
    }
}
