//! Write a record set back out as CSV with canonical headers.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::io::Write;

use crate::model::{Defect, Field};

/// Write `defects` as CSV to `out`. Absent values become empty cells.
pub fn write_csv<W: Write>(defects: &[Defect], out: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    wtr.write_record(Field::CANONICAL.iter().map(Field::as_str))
        .context("writing CSV header")?;
    for d in defects {
        wtr.write_record(Field::CANONICAL.iter().map(|f| d.text(f).unwrap_or("")))
            .with_context(|| format!("writing CSV row for {}", d.id))?;
    }
    wtr.flush().context("flushing CSV output")?;
    Ok(())
}

/// [`write_csv`] into a `String`.
pub fn to_csv(defects: &[Defect]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(defects, &mut buf)?;
    String::from_utf8(buf).context("CSV output was not UTF-8")
}
