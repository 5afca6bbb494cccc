//! Command-line and environment configuration for the `defectscope` binary.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::analytics::{Analysis, GroupField, GroupOrder, Period, TrendQuery, RESERVED_SERIES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliGroupField {
    Severity,
    Priority,
    Status,
    Domain,
    Reporter,
}

impl From<CliGroupField> for GroupField {
    fn from(value: CliGroupField) -> Self {
        match value {
            CliGroupField::Severity => GroupField::Severity,
            CliGroupField::Priority => GroupField::Priority,
            CliGroupField::Status => GroupField::Status,
            CliGroupField::Domain => GroupField::Domain,
            CliGroupField::Reporter => GroupField::Reporter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliGroupOrder {
    Count,
    Name,
}

impl From<CliGroupOrder> for GroupOrder {
    fn from(value: CliGroupOrder) -> Self {
        match value {
            CliGroupOrder::Count => GroupOrder::Count,
            CliGroupOrder::Name => GroupOrder::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliPeriod {
    Week,
    Month,
    Year,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliAnalysis {
    Creation,
    Resolution,
}

impl From<CliAnalysis> for Analysis {
    fn from(value: CliAnalysis) -> Self {
        match value {
            CliAnalysis::Creation => Analysis::Creation,
            CliAnalysis::Resolution => Analysis::Resolution,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "defectscope",
    about = "Ingest defect-tracker CSV exports and derive trend, grouping and attention views",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "DEFECTSCOPE_STORE_DIR",
        default_value = "data",
        help = "Directory holding the current defect snapshot"
    )]
    pub store_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a CSV export, replacing the stored record set
    Ingest {
        file: PathBuf,
    },
    /// Count defects per value of a field
    Group {
        #[arg(long, value_enum, default_value = "severity")]
        by: CliGroupField,
        #[arg(long, value_enum, default_value = "count")]
        order: CliGroupOrder,
        #[arg(long, help = "List the member defects of each group instead of counts")]
        members: bool,
    },
    /// Bucket defects over time
    Trend {
        #[arg(long, value_enum, default_value = "week")]
        period: CliPeriod,
        #[arg(long, help = "Range start (YYYY-MM-DD), with --period range")]
        from: Option<NaiveDate>,
        #[arg(long, help = "Range end (YYYY-MM-DD, inclusive), with --period range")]
        to: Option<NaiveDate>,
        #[arg(long, value_enum, default_value = "creation")]
        analysis: CliAnalysis,
        #[arg(long = "domain", help = "Split out this domain as its own series (repeatable)")]
        domains: Vec<String>,
    },
    /// List open defects whose descriptions need attention
    Attention,
    /// Time-to-resolve statistics for done defects
    Resolution {
        #[arg(long)]
        domain: Option<String>,
    },
    /// Headline counts
    Summary {
        #[arg(long, help = "Reference date (YYYY-MM-DD), defaults to today (UTC)")]
        today: Option<NaiveDate>,
    },
    /// Every view at once, with default grouping and trend settings
    Dashboard {
        #[arg(long, help = "Reference date (YYYY-MM-DD), defaults to today (UTC)")]
        today: Option<NaiveDate>,
    },
    /// Write the stored record set as CSV
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete the stored record set
    Clear,
}

/// Build a [`TrendQuery`] from `trend` arguments; `range` needs both bounds.
pub fn trend_query(
    period: CliPeriod,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    analysis: CliAnalysis,
    domains: Vec<String>,
) -> Result<TrendQuery> {
    let period = match (period, from, to) {
        (CliPeriod::Week, ..) => Period::Week,
        (CliPeriod::Month, ..) => Period::Month,
        (CliPeriod::Year, ..) => Period::Year,
        (CliPeriod::Range, Some(from), Some(to)) => {
            if from > to {
                bail!("--from {} is after --to {}", from, to);
            }
            Period::Range { from, to }
        }
        (CliPeriod::Range, _, _) => bail!("--period range requires both --from and --to"),
    };
    if let Some(name) = domains.iter().find(|d| RESERVED_SERIES.contains(&d.as_str())) {
        bail!("--domain {:?} collides with a trend output field", name);
    }
    Ok(TrendQuery {
        period,
        analysis: analysis.into(),
        domains,
    })
}
