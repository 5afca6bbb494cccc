// src/model/types.rs

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// A single validated defect record.
///
/// `id`, `summary` and `created_at` are always non-empty; `created_at` and
/// `updated` are ISO-8601 strings in `YYYY-MM-DDTHH:MM:SS.mmmZ` form.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct Defect {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub status: Option<String>,
    pub reported_by: Option<String>,
    pub severity: Option<String>,
    pub priority: Option<String>,
    pub created_at: String,
    pub updated: Option<String>,
    /// Columns with no canonical meaning, keyed by normalized header.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Defect {
    /// Text value of `field`, `None` when the field is absent.
    pub fn text(&self, field: &Field) -> Option<&str> {
        match field {
            Field::Id => Some(&self.id),
            Field::Summary => Some(&self.summary),
            Field::Description => self.description.as_deref(),
            Field::Domain => self.domain.as_deref(),
            Field::Status => self.status.as_deref(),
            Field::ReportedBy => self.reported_by.as_deref(),
            Field::Severity => self.severity.as_deref(),
            Field::Priority => self.priority.as_deref(),
            Field::CreatedAt => Some(&self.created_at),
            Field::Updated => self.updated.as_deref(),
            Field::Extra(key) => self.extra.get(key).map(String::as_str),
        }
    }

    /// True when the status is `done`, ignoring case and surrounding whitespace.
    pub fn is_done(&self) -> bool {
        self.status
            .as_deref()
            .map_or(false, |s| s.trim().eq_ignore_ascii_case("done"))
    }
}

/// Canonical destination of a source column.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Summary,
    Description,
    Domain,
    Status,
    ReportedBy,
    Severity,
    Priority,
    CreatedAt,
    Updated,
    /// Unrecognized header, carried under its normalized name.
    Extra(String),
}

impl Field {
    /// Fields a header row must provide.
    pub const MANDATORY: [Field; 3] = [Field::Id, Field::Summary, Field::CreatedAt];

    /// The fixed canonical fields, in record order.
    pub const CANONICAL: [Field; 10] = [
        Field::Id,
        Field::Summary,
        Field::Description,
        Field::Domain,
        Field::Status,
        Field::ReportedBy,
        Field::Severity,
        Field::Priority,
        Field::CreatedAt,
        Field::Updated,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Field::Id => "id",
            Field::Summary => "summary",
            Field::Description => "description",
            Field::Domain => "domain",
            Field::Status => "status",
            Field::ReportedBy => "reported_by",
            Field::Severity => "severity",
            Field::Priority => "priority",
            Field::CreatedAt => "created_at",
            Field::Updated => "updated",
            Field::Extra(name) => name,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Field::CreatedAt | Field::Updated)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected data row.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    /// 1-based record number; the header is row 1.
    pub row_number: usize,
    /// Source header of the offending column, if one applies.
    pub column: Option<String>,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(col) => write!(f, "row {} column \"{}\": {}", self.row_number, col, self.message),
            None => write!(f, "row {}: {}", self.row_number, self.message),
        }
    }
}
