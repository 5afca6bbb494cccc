// src/analytics/mod.rs
pub mod attention;
pub mod group;
pub mod resolution;
pub mod summary;
pub mod trend;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::model::Defect;

pub use attention::{assess, needs_attention, AttentionReason, AttentionRecord, AttentionRules};
pub use group::{group_counts, partition_by, GroupCount, GroupField, GroupOrder, UNASSIGNED};
pub use resolution::{format_duration, resolution_stats, ResolutionStats};
pub use summary::{summarize, unique_domains, Summary};
pub use trend::{series, trend, Analysis, Period, TrendPoint, TrendQuery, RESERVED_SERIES};

/// Inputs for a full dashboard computation.
#[derive(Debug, Clone)]
pub struct DashboardQuery {
    pub group_by: GroupField,
    pub order: GroupOrder,
    pub trend: TrendQuery,
    pub rules: AttentionRules,
    pub today: NaiveDate,
}

/// Every view over one immutable record set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub summary: Summary,
    pub groups: Vec<GroupCount>,
    pub trend: Vec<TrendPoint>,
    pub attention: Vec<AttentionRecord>,
    pub resolution: ResolutionStats,
}

impl Dashboard {
    /// The views share nothing but the borrowed slice, so they run side by side.
    pub fn compute(defects: &[Defect], query: &DashboardQuery) -> Self {
        debug!(records = defects.len(), "computing dashboard views");
        let ((summary, groups), (trend_points, (attention, resolution))) = rayon::join(
            || {
                rayon::join(
                    || summarize(defects, query.today),
                    || group_counts(defects, query.group_by, query.order),
                )
            },
            || {
                rayon::join(
                    || trend(defects, &query.trend),
                    || {
                        rayon::join(
                            || needs_attention(defects, &query.rules),
                            || resolution_stats(defects, None),
                        )
                    },
                )
            },
        );

        Dashboard {
            summary,
            groups,
            trend: trend_points,
            attention,
            resolution,
        }
    }
}
