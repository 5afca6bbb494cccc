//! Resolve arbitrary source headers to canonical [`Field`]s.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::model::Field;

/// Normalized header → canonical field. Lookups happen after [`normalize_header`].
static ALIASES: &[(&str, Field)] = &[
    ("issue_key", Field::Id),
    ("issue_id", Field::Id),
    ("key", Field::Id),
    ("id", Field::Id),
    ("summary", Field::Summary),
    ("title", Field::Summary),
    ("description", Field::Description),
    ("custom_field_business_domain", Field::Domain),
    ("business_domain", Field::Domain),
    ("domain", Field::Domain),
    ("status", Field::Status),
    ("reporter", Field::ReportedBy),
    ("reported_by", Field::ReportedBy),
    ("severity", Field::Severity),
    ("priority", Field::Priority),
    ("created", Field::CreatedAt),
    ("created_at", Field::CreatedAt),
    ("created_date", Field::CreatedAt),
    ("updated", Field::Updated),
    ("updated_at", Field::Updated),
    ("last_modified", Field::Updated),
    ("lastmodified", Field::Updated),
    ("last_updated", Field::Updated),
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]").expect("valid regex"));

/// `"Custom field (Business Domain)"` → `"custom_field_business_domain"`.
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let underscored = WHITESPACE.replace_all(&lowered, "_");
    DISALLOWED.replace_all(&underscored, "").into_owned()
}

/// Canonical field for an already-normalized header.
pub fn resolve(normalized: &str) -> Field {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, field)| field.clone())
        .unwrap_or_else(|| Field::Extra(normalized.to_string()))
}

/// One source column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Header text as written in the file (trimmed), used in error messages.
    pub source: String,
    pub normalized: String,
    pub field: Field,
}

/// Column layout of a document, built once from its header row.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    columns: Vec<Column>,
}

impl HeaderMap {
    /// Map every header and check the mandatory fields.
    ///
    /// Reports all missing mandatory fields together.
    pub fn build(header_row: &[String]) -> Result<Self> {
        let columns: Vec<Column> = header_row
            .iter()
            .map(|raw| {
                let normalized = normalize_header(raw);
                let field = resolve(&normalized);
                if let Field::Extra(_) = field {
                    debug!(header = %raw.trim(), "unrecognized header, carried as extra field");
                }
                Column {
                    source: raw.trim().to_string(),
                    normalized,
                    field,
                }
            })
            .collect();

        let missing: Vec<Field> = Field::MANDATORY
            .iter()
            .filter(|f| !columns.iter().any(|c| &c.field == *f))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::MissingHeaders { missing });
        }

        Ok(Self { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Field mapped at column `idx`.
    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.columns.get(idx).map(|c| &c.field)
    }

    /// Source header of the first column mapped to `field`.
    pub fn source_of(&self, field: &Field) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| &c.field == field)
            .map(|c| c.source.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalization_lowercases_underscores_and_strips() {
        assert_eq!(normalize_header("Issue key"), "issue_key");
        assert_eq!(normalize_header("  Issue   Key  "), "issue_key");
        assert_eq!(
            normalize_header("Custom field (Business Domain)"),
            "custom_field_business_domain"
        );
        assert_eq!(normalize_header("Last-Modified"), "lastmodified");
        assert_eq!(normalize_header("Created\tAt"), "created_at");
    }

    #[test]
    fn aliases_resolve_to_canonical_fields() {
        assert_eq!(resolve("issue_key"), Field::Id);
        assert_eq!(resolve("issue_id"), Field::Id);
        assert_eq!(resolve("created"), Field::CreatedAt);
        assert_eq!(resolve("reporter"), Field::ReportedBy);
        assert_eq!(resolve("custom_field_business_domain"), Field::Domain);
        assert_eq!(resolve(&normalize_header("Last-Modified")), Field::Updated);
        assert_eq!(resolve("sprint"), Field::Extra("sprint".into()));
    }

    #[test]
    fn build_maps_columns_in_order() -> anyhow::Result<()> {
        let map = HeaderMap::build(&headers(&["Issue key", "Summary", "Created", "Sprint"]))?;
        assert_eq!(map.len(), 4);
        assert_eq!(map.field(0), Some(&Field::Id));
        assert_eq!(map.field(2), Some(&Field::CreatedAt));
        assert_eq!(map.field(3), Some(&Field::Extra("sprint".into())));
        assert_eq!(map.field(4), None);
        assert_eq!(map.source_of(&Field::CreatedAt), Some("Created"));
        Ok(())
    }

    #[test]
    fn build_reports_every_missing_mandatory_header() {
        let err = HeaderMap::build(&headers(&["Status", "Priority"])).unwrap_err();
        match err {
            IngestError::MissingHeaders { missing } => {
                assert_eq!(missing, vec![Field::Id, Field::Summary, Field::CreatedAt]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn build_reports_only_the_missing_one() {
        let err = HeaderMap::build(&headers(&["Issue id", "Summary"])).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingHeaders { ref missing } if missing == &vec![Field::CreatedAt]
        ));
    }
}
