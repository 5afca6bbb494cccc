use serde::{Deserialize, Serialize};

use crate::ingest::parse_iso;
use crate::model::Defect;

/// Time-to-resolve figures over `done` defects, in whole hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionStats {
    /// Resolved defects considered (status `done` with an `updated` time).
    pub count: usize,
    pub average_hours: f64,
    pub min_hours: i64,
    pub max_hours: i64,
}

/// Hours from `created_at` to `updated`, truncated toward zero.
fn hours_to_resolve(defect: &Defect) -> Option<i64> {
    let created = parse_iso(&defect.created_at)?;
    let updated = parse_iso(defect.updated.as_deref()?)?;
    Some((updated - created).num_hours())
}

/// Resolution statistics, optionally restricted to one domain.
///
/// Negative durations (updated before created) are ignored. All figures are
/// zero when nothing qualifies.
pub fn resolution_stats(defects: &[Defect], domain: Option<&str>) -> ResolutionStats {
    let resolved: Vec<&Defect> = defects
        .iter()
        .filter(|d| domain.map_or(true, |want| d.domain.as_deref() == Some(want)))
        .filter(|d| d.is_done() && d.updated.is_some())
        .collect();

    let hours: Vec<i64> = resolved
        .iter()
        .filter_map(|d| hours_to_resolve(d))
        .filter(|h| *h >= 0)
        .collect();

    if hours.is_empty() {
        return ResolutionStats::default();
    }

    let sum: i64 = hours.iter().sum();
    ResolutionStats {
        count: resolved.len(),
        average_hours: sum as f64 / hours.len() as f64,
        min_hours: hours.iter().copied().min().unwrap_or(0),
        max_hours: hours.iter().copied().max().unwrap_or(0),
    }
}

/// `"5.0 hours"` under a day, otherwise `"1.5 days"`.
pub fn format_duration(hours: f64) -> String {
    if hours < 24.0 {
        format!("{:.1} hours", hours)
    } else {
        format!("{:.1} days", hours / 24.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(id: &str, created: &str, updated: Option<&str>, domain: &str) -> Defect {
        Defect {
            id: id.into(),
            summary: "s".into(),
            status: Some("Done".into()),
            domain: Some(domain.into()),
            created_at: created.into(),
            updated: updated.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn averages_min_and_max_over_done_defects() {
        let mut open = done("3", "2024-01-01T00:00:00.000Z", Some("2024-03-01T00:00:00.000Z"), "A");
        open.status = Some("Open".into());
        let defects = vec![
            done("1", "2024-01-01T00:00:00.000Z", Some("2024-01-01T10:30:00.000Z"), "A"),
            done("2", "2024-01-01T00:00:00.000Z", Some("2024-01-03T00:00:00.000Z"), "B"),
            open,
        ];
        let stats = resolution_stats(&defects, None);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min_hours, 10);
        assert_eq!(stats.max_hours, 48);
        assert!((stats.average_hours - 29.0).abs() < f64::EPSILON);
    }

    #[test]
    fn domain_filter_is_exact() {
        let defects = vec![
            done("1", "2024-01-01T00:00:00.000Z", Some("2024-01-01T05:00:00.000Z"), "A"),
            done("2", "2024-01-01T00:00:00.000Z", Some("2024-01-02T00:00:00.000Z"), "B"),
        ];
        let stats = resolution_stats(&defects, Some("B"));
        assert_eq!(stats.count, 1);
        assert_eq!(stats.max_hours, 24);
    }

    #[test]
    fn nothing_qualifying_is_all_zero() {
        let defects = vec![
            done("1", "2024-01-01T00:00:00.000Z", None, "A"),
            done("2", "2024-01-05T00:00:00.000Z", Some("2024-01-01T00:00:00.000Z"), "A"),
        ];
        assert_eq!(resolution_stats(&defects, None), ResolutionStats::default());
    }

    #[test]
    fn durations_format_in_hours_or_days() {
        assert_eq!(format_duration(5.0), "5.0 hours");
        assert_eq!(format_duration(36.0), "1.5 days");
    }
}
