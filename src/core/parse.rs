// ActionBoard - core/parse.rs
//
// Delimited-text payload parsing into a RecordSet.
// Core layer: operates on an in-memory string, no I/O.

use crate::core::model::{Record, RecordSet, Value};

/// Parse a CSV payload with a header row.
///
/// Cell text is kept exactly as written; only empty fields become `Null`.
/// Short rows are padded with `Null`; cells beyond the header width are
/// dropped. A payload without a header yields an empty set with no columns.
pub fn parse_csv(payload: &str) -> Result<RecordSet, csv::Error> {
    let payload = payload.strip_prefix('\u{feff}').unwrap_or(payload);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(payload.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.is_empty() || (columns.len() == 1 && columns[0].is_empty()) {
        return Ok(RecordSet::default());
    }

    let width = columns.len();
    let mut rows = Vec::new();
    let mut truncated = 0usize;

    for (source_row, result) in reader.records().enumerate() {
        let raw = result?;
        if raw.len() > width {
            truncated += 1;
        }
        let values: Vec<Value> = raw.iter().take(width).map(Value::from_field).collect();
        rows.push(Record { source_row, values });
    }

    if truncated > 0 {
        tracing::debug!(rows = truncated, width, "Dropped cells beyond header width");
    }

    Ok(RecordSet::new(columns, rows))
}
