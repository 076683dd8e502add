// ActionBoard - core/projection.rs
//
// Output column selection. Preferred names are taken in preference
// order; when none are present every column is kept in source order.

use crate::core::model::{Record, RecordSet};
use std::sync::Arc;

/// Columns to output for `records`, given a preference list.
pub fn select_columns(records: &RecordSet, preferred: &[&str]) -> Vec<String> {
    let chosen: Vec<String> = preferred
        .iter()
        .filter(|name| records.has_column(name))
        .map(|name| (*name).to_string())
        .collect();

    if chosen.is_empty() {
        tracing::debug!("No preferred columns present; projecting all columns");
        return records.columns().to_vec();
    }
    chosen
}

/// Build the projected record set. Rows keep their `source_row`.
pub fn project(records: &RecordSet, preferred: &[&str]) -> RecordSet {
    let columns = select_columns(records, preferred);
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|c| records.column_index(c))
        .collect();

    let rows = records
        .rows()
        .iter()
        .map(|row| {
            Arc::new(Record {
                source_row: row.source_row,
                values: indices.iter().map(|&i| row.values[i].clone()).collect(),
            })
        })
        .collect();

    RecordSet::from_shared(columns, rows)
}
