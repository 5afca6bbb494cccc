use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{trace, warn};

use crate::ingest::parse_iso;
use crate::model::Defect;

/// Bucket width for a trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Period {
    /// Monday-start weeks, keyed `YYYY-MM-DD` of the Monday.
    #[default]
    Week,
    /// Keyed `YYYY-MM`.
    Month,
    /// Keyed `YYYY`.
    Year,
    /// Inclusive date range bucketed per day, keyed `YYYY-MM-DD`.
    Range { from: NaiveDate, to: NaiveDate },
}

/// Which timestamp drives the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analysis {
    /// `created_at` of every record.
    #[default]
    Creation,
    /// `updated` of records whose status is `done`.
    Resolution,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendQuery {
    pub period: Period,
    pub analysis: Analysis,
    /// Domains to split out as separate series; empty means no split.
    pub domains: Vec<String>,
}

/// Keys `TrendPoint` already uses; a domain with one of these names cannot be
/// split out without clobbering them.
pub const RESERVED_SERIES: [&str; 2] = ["date", "count"];

/// One bucket. Per-domain counts serialize next to `date` and `count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub count: usize,
    #[serde(flatten)]
    pub per_category: BTreeMap<String, usize>,
}

impl Period {
    /// Bucket key for `date`, or `None` when a range excludes it.
    pub fn key(&self, date: NaiveDate) -> Option<String> {
        match *self {
            Period::Week => {
                let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
                Some(monday.format("%Y-%m-%d").to_string())
            }
            Period::Month => Some(date.format("%Y-%m").to_string()),
            Period::Year => Some(date.format("%Y").to_string()),
            Period::Range { from, to } => {
                (from <= date && date <= to).then(|| date.format("%Y-%m-%d").to_string())
            }
        }
    }
}

/// Date on the requested axis, `None` when the record does not take part.
fn axis_date(defect: &Defect, analysis: Analysis) -> Option<NaiveDate> {
    let raw = match analysis {
        Analysis::Creation => defect.created_at.as_str(),
        Analysis::Resolution => {
            if !defect.is_done() {
                return None;
            }
            defect.updated.as_deref()?
        }
    };
    let parsed = parse_iso(raw);
    if parsed.is_none() {
        trace!(id = %defect.id, value = raw, "skipping record with unreadable timestamp");
    }
    parsed.map(|dt| dt.date_naive())
}

/// Bucket `defects` per `query`, ascending by key.
///
/// With a domain whitelist every point carries one entry per listed domain,
/// zero when that domain had nothing in the period.
pub fn trend(defects: &[Defect], query: &TrendQuery) -> Vec<TrendPoint> {
    let domains: Vec<&String> = query
        .domains
        .iter()
        .filter(|d| {
            let reserved = RESERVED_SERIES.contains(&d.as_str());
            if reserved {
                warn!(domain = %d, "domain name collides with a trend field, not split out");
            }
            !reserved
        })
        .collect();
    let mut buckets: BTreeMap<String, TrendPoint> = BTreeMap::new();

    for defect in defects {
        let Some(date) = axis_date(defect, query.analysis) else {
            continue;
        };
        let Some(key) = query.period.key(date) else {
            continue;
        };

        let point = buckets.entry(key.clone()).or_insert_with(|| TrendPoint {
            date: key,
            count: 0,
            per_category: domains.iter().map(|d| ((*d).clone(), 0)).collect(),
        });
        point.count += 1;

        if let Some(domain) = defect.domain.as_deref().map(str::trim) {
            if let Some(n) = point.per_category.get_mut(domain) {
                *n += 1;
            }
        }
    }

    buckets.into_values().collect()
}

/// One domain's series out of a split trend, as `(date, count)` pairs.
pub fn series<'a>(points: &'a [TrendPoint], domain: &str) -> Vec<(&'a str, usize)> {
    points
        .iter()
        .filter_map(|p| p.per_category.get(domain).map(|n| (p.date.as_str(), *n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defect(id: &str, created: &str) -> Defect {
        Defect {
            id: id.into(),
            summary: "s".into(),
            created_at: created.into(),
            ..Default::default()
        }
    }

    fn resolved(id: &str, created: &str, updated: &str, status: &str) -> Defect {
        Defect {
            status: Some(status.into()),
            updated: Some(updated.into()),
            ..defect(id, created)
        }
    }

    fn in_domain(mut d: Defect, domain: &str) -> Defect {
        d.domain = Some(domain.into());
        d
    }

    fn weekly() -> TrendQuery {
        TrendQuery::default()
    }

    #[test]
    fn same_iso_week_shares_the_monday_bucket() {
        let defects = vec![
            defect("1", "2024-05-28T09:00:00.000Z"), // Tuesday
            defect("2", "2024-05-27T23:00:00.000Z"), // Monday, same week
        ];
        let points = trend(&defects, &weekly());
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, "2024-05-27");
        assert_eq!(points[0].count, 2);
    }

    #[test]
    fn next_monday_opens_a_new_week_and_output_is_ascending() {
        let defects = vec![
            defect("1", "2024-06-03T08:00:00.000Z"),
            defect("2", "2024-05-28T09:00:00.000Z"),
            defect("3", "2024-06-02T23:59:59.000Z"), // Sunday
        ];
        let points = trend(&defects, &weekly());
        let keys: Vec<(&str, usize)> = points.iter().map(|p| (p.date.as_str(), p.count)).collect();
        assert_eq!(keys, vec![("2024-05-27", 2), ("2024-06-03", 1)]);
    }

    #[test]
    fn month_and_year_keys() {
        let defects = vec![
            defect("1", "2023-12-31T10:00:00.000Z"),
            defect("2", "2024-01-02T10:00:00.000Z"),
            defect("3", "2024-01-20T10:00:00.000Z"),
        ];
        let monthly = trend(
            &defects,
            &TrendQuery { period: Period::Month, ..Default::default() },
        );
        let keys: Vec<&str> = monthly.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(keys, vec!["2023-12", "2024-01"]);
        assert_eq!(monthly[1].count, 2);

        let yearly = trend(
            &defects,
            &TrendQuery { period: Period::Year, ..Default::default() },
        );
        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[0].date, "2023");
    }

    #[test]
    fn range_is_inclusive_and_daily() {
        let defects = vec![
            defect("1", "2024-03-01T00:00:00.000Z"),
            defect("2", "2024-03-03T23:59:00.000Z"),
            defect("3", "2024-03-04T00:00:00.000Z"),
            defect("4", "2024-02-29T12:00:00.000Z"),
        ];
        let query = TrendQuery {
            period: Period::Range {
                from: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                to: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            },
            ..Default::default()
        };
        let keys: Vec<String> = trend(&defects, &query).into_iter().map(|p| p.date).collect();
        assert_eq!(keys, vec!["2024-03-01", "2024-03-03"]);
    }

    #[test]
    fn resolution_uses_updated_of_done_records_only() {
        let defects = vec![
            resolved("1", "2024-01-01T00:00:00.000Z", "2024-02-10T00:00:00.000Z", "Done"),
            resolved("2", "2024-01-01T00:00:00.000Z", "2024-02-11T00:00:00.000Z", "Open"),
            Defect { status: Some("done".into()), ..defect("3", "2024-01-01T00:00:00.000Z") },
        ];
        let query = TrendQuery {
            period: Period::Month,
            analysis: Analysis::Resolution,
            ..Default::default()
        };
        let points = trend(&defects, &query);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, "2024-02");
        assert_eq!(points[0].count, 1);
    }

    #[test]
    fn domain_split_counts_whitelisted_domains_only() -> anyhow::Result<()> {
        let defects = vec![
            in_domain(defect("1", "2024-05-27T10:00:00.000Z"), "Billing"),
            in_domain(defect("2", "2024-05-28T10:00:00.000Z"), "Billing"),
            in_domain(defect("3", "2024-05-29T10:00:00.000Z"), "Search"),
            in_domain(defect("4", "2024-06-04T10:00:00.000Z"), "Other"),
        ];
        let query = TrendQuery {
            domains: vec!["Billing".into(), "Search".into()],
            ..Default::default()
        };
        let points = trend(&defects, &query);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].count, 3);
        assert_eq!(points[0].per_category["Billing"], 2);
        assert_eq!(points[0].per_category["Search"], 1);
        assert_eq!(points[1].per_category["Billing"], 0);
        assert!(!points[1].per_category.contains_key("Other"));

        assert_eq!(series(&points, "Billing"), vec![("2024-05-27", 2), ("2024-06-03", 0)]);

        let json = serde_json::to_value(&points[0])?;
        assert_eq!(json["date"], "2024-05-27");
        assert_eq!(json["Billing"], 2);
        Ok(())
    }

    #[test]
    fn reserved_domain_names_are_not_split_out() -> anyhow::Result<()> {
        let defects = vec![
            in_domain(defect("1", "2024-05-27T10:00:00.000Z"), "count"),
            in_domain(defect("2", "2024-05-28T10:00:00.000Z"), "date"),
        ];
        let query = TrendQuery {
            domains: vec!["count".into(), "date".into(), "Billing".into()],
            ..Default::default()
        };
        let points = trend(&defects, &query);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].per_category.keys().collect::<Vec<_>>(), vec!["Billing"]);

        let json = serde_json::to_string(&points)?;
        assert_eq!(json, r#"[{"date":"2024-05-27","count":2,"Billing":0}]"#);
        Ok(())
    }

    #[test]
    fn unreadable_timestamps_are_skipped() {
        let defects = vec![defect("1", "garbage"), defect("2", "2024-05-27T10:00:00.000Z")];
        assert_eq!(trend(&defects, &weekly())[0].count, 1);
    }
}
