//! Document-level ingestion failures.

use thiserror::Error;

use crate::model::{Field, RowError};

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Failures that abort ingestion of a whole document.
///
/// Row-level problems are never reported through this type unless every
/// row failed, in which case they ride along in [`IngestError::NoValidRows`].
#[derive(Error, Debug)]
pub enum IngestError {
    /// Fewer than two rows: 0 is an empty file, 1 is a header-only file.
    #[error("{}", not_enough_rows_message(.rows))]
    NotEnoughRows { rows: usize },

    /// One or more mandatory headers could not be resolved.
    #[error("missing required headers: {}", describe_missing(.missing))]
    MissingHeaders { missing: Vec<Field> },

    /// The document was well-formed but every data row was rejected.
    #[error("no valid defect rows: all {} data rows were rejected", .errors.len())]
    NoValidRows { errors: Vec<RowError> },
}

impl IngestError {
    /// Row errors attached to this failure, empty for structural errors.
    pub fn row_errors(&self) -> &[RowError] {
        match self {
            IngestError::NoValidRows { errors } => errors,
            _ => &[],
        }
    }
}

fn not_enough_rows_message(rows: &usize) -> &'static str {
    if *rows == 0 {
        "CSV file is empty"
    } else {
        "CSV file must have a header and at least one data row"
    }
}

fn describe_missing(missing: &[Field]) -> String {
    missing
        .iter()
        .map(|f| match f {
            Field::Id => "id (issue key / issue id)".to_string(),
            Field::CreatedAt => "created_at (created)".to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
