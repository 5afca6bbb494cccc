use tracing::{debug, warn};

use super::date_parser::{normalize_date, parse_date, to_iso};
use super::headers::HeaderMap;
use super::tokenizer::RawRow;
use crate::model::{Defect, Field, RowError};

/// Builds one [`Defect`] per data row against a fixed [`HeaderMap`].
pub struct RowBuilder<'a> {
    headers: &'a HeaderMap,
}

/// Record under construction plus the first unparseable `created_at` seen.
#[derive(Default)]
struct Draft {
    defect: Defect,
    created_raw: Option<(String, String)>,
}

impl<'a> RowBuilder<'a> {
    pub fn new(headers: &'a HeaderMap) -> Self {
        Self { headers }
    }

    /// Zip `raw` against the header map and validate the result.
    ///
    /// `row_number` is the 1-based record number used for error attribution.
    /// Short rows are padded with empty values, long rows are truncated.
    pub fn build(&self, row_number: usize, raw: &RawRow) -> Result<Defect, RowError> {
        let width = self.headers.len();
        if raw.len() > width {
            warn!(
                row = row_number,
                expected = width,
                got = raw.len(),
                "row has more fields than headers, truncating"
            );
        }

        let mut draft = Draft::default();
        for (idx, column) in self.headers.columns().iter().enumerate() {
            let value = raw.get(idx).map(|v| v.trim()).unwrap_or("");
            if value.is_empty() {
                continue;
            }
            self.assign(&mut draft, row_number, &column.field, &column.source, value);
        }

        self.validate(row_number, draft)
    }

    fn assign(
        &self,
        draft: &mut Draft,
        row_number: usize,
        field: &Field,
        source: &str,
        value: &str,
    ) {
        let d = &mut draft.defect;
        match field {
            Field::Id => set_once_str(&mut d.id, value),
            Field::Summary => set_once_str(&mut d.summary, value),
            Field::CreatedAt => {
                if !d.created_at.is_empty() {
                    return;
                }
                match parse_date(value) {
                    Some(dt) => d.created_at = to_iso(&dt),
                    None => {
                        if draft.created_raw.is_none() {
                            draft.created_raw = Some((source.to_string(), value.to_string()));
                        }
                    }
                }
            }
            Field::Updated => {
                if d.updated.is_some() {
                    return;
                }
                match normalize_date(value) {
                    Some(iso) => d.updated = Some(iso),
                    None => debug!(
                        row = row_number,
                        column = source,
                        value,
                        "unparseable updated date, leaving it absent"
                    ),
                }
            }
            Field::Description => set_once(&mut d.description, value),
            Field::Domain => set_once(&mut d.domain, value),
            Field::Status => set_once(&mut d.status, value),
            Field::ReportedBy => set_once(&mut d.reported_by, value),
            Field::Severity => set_once(&mut d.severity, value),
            Field::Priority => set_once(&mut d.priority, value),
            Field::Extra(key) => {
                d.extra
                    .entry(key.clone())
                    .or_insert_with(|| value.to_string());
            }
        }
    }

    fn validate(&self, row_number: usize, draft: Draft) -> Result<Defect, RowError> {
        let Draft { defect, created_raw } = draft;

        if defect.id.is_empty() {
            return Err(self.missing(row_number, &Field::Id));
        }
        if defect.summary.is_empty() {
            return Err(self.missing(row_number, &Field::Summary));
        }
        if defect.created_at.is_empty() {
            return Err(match created_raw {
                Some((source, raw)) => RowError {
                    row_number,
                    column: Some(source),
                    message: format!("invalid date \"{}\"", raw),
                },
                None => self.missing(row_number, &Field::CreatedAt),
            });
        }
        Ok(defect)
    }

    fn missing(&self, row_number: usize, field: &Field) -> RowError {
        RowError {
            row_number,
            column: self.headers.source_of(field).map(str::to_string),
            message: format!("missing required value for {}", field),
        }
    }
}

/// First non-empty value wins when several columns map to one field.
fn set_once_str(slot: &mut String, value: &str) {
    if slot.is_empty() {
        *slot = value.to_string();
    }
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}
