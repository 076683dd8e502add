// ActionBoard - core/normalize.rs
//
// Canonicalises the known comparison fields so equality filters are
// reliable. Pure and total: unknown or missing columns are left alone.

use crate::core::model::{Record, RecordSet, Value};
use crate::util::constants::{PRIORITY_COLUMN, STATUS_COLUMN};
use std::sync::Arc;

/// Normalise the status and priority columns when present.
///
/// Status becomes trimmed text; priority becomes trimmed upper-case text.
/// `Null` cells stay `Null`. Rows keep their `source_row`.
pub fn normalize(records: RecordSet) -> RecordSet {
    let status_idx = records.column_index(STATUS_COLUMN);
    let priority_idx = records.column_index(PRIORITY_COLUMN);

    if status_idx.is_none() && priority_idx.is_none() {
        return records;
    }

    let rows = records
        .rows()
        .iter()
        .map(|row| {
            let mut values = row.values.clone();
            if let Some(i) = status_idx {
                values[i] = canonical(&values[i], false);
            }
            if let Some(i) = priority_idx {
                values[i] = canonical(&values[i], true);
            }
            Arc::new(Record {
                source_row: row.source_row,
                values,
            })
        })
        .collect();

    RecordSet::from_shared(records.columns().to_vec(), rows)
}

fn canonical(value: &Value, upper: bool) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    let trimmed = value.to_string().trim().to_string();
    if upper {
        Value::Text(trimmed.to_uppercase())
    } else {
        Value::Text(trimmed)
    }
}
