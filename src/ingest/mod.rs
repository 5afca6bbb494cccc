// src/ingest/mod.rs
pub mod date_parser;
pub mod headers;
pub mod row;
pub mod tokenizer;

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};
use crate::model::{Defect, Field, RowError};

pub use date_parser::{normalize_date, parse_date, parse_iso, to_iso};
pub use headers::{normalize_header, HeaderMap};
pub use row::RowBuilder;
pub use tokenizer::{tokenize, RawRow};

/// Outcome of a successful ingestion: accepted records plus rejected rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub defects: Vec<Defect>,
    pub errors: Vec<RowError>,
}

/// Tokenize `text`, map its header row, and build one [`Defect`] per data row.
///
/// - fewer than two rows, or a missing mandatory header, aborts immediately;
/// - a bad row is recorded in `errors` and skipped, never aborting the rest;
/// - if no row survives, the collected row errors come back in
///   [`IngestError::NoValidRows`].
#[tracing::instrument(level = "info", skip(text), fields(bytes = text.len()))]
pub fn ingest(text: &str) -> Result<IngestReport> {
    let rows = tokenize(text);
    if rows.len() < 2 {
        return Err(IngestError::NotEnoughRows { rows: rows.len() });
    }

    let headers = HeaderMap::build(&rows[0])?;
    debug!(columns = headers.len(), "header row mapped");

    let builder = RowBuilder::new(&headers);
    let mut seen_ids: HashSet<String> = HashSet::with_capacity(rows.len());
    let mut report = IngestReport {
        defects: Vec::with_capacity(rows.len() - 1),
        errors: Vec::new(),
    };

    // header is row 1, so the first data row is row 2; blank lines are not counted
    for (idx, raw) in rows.iter().enumerate().skip(1) {
        let row_number = idx + 1;
        let outcome = builder.build(row_number, raw).and_then(|defect| {
            if seen_ids.insert(defect.id.clone()) {
                Ok(defect)
            } else {
                Err(RowError {
                    row_number,
                    column: headers.source_of(&Field::Id).map(str::to_string),
                    message: format!("duplicate id \"{}\"", defect.id),
                })
            }
        });

        match outcome {
            Ok(defect) => report.defects.push(defect),
            Err(err) => {
                warn!(
                    row = err.row_number,
                    column = err.column.as_deref().unwrap_or("-"),
                    "skipping row: {}",
                    err.message
                );
                report.errors.push(err);
            }
        }
    }

    if report.defects.is_empty() {
        return Err(IngestError::NoValidRows {
            errors: report.errors,
        });
    }

    info!(
        accepted = report.defects.len(),
        rejected = report.errors.len(),
        "ingestion complete"
    );
    Ok(report)
}
