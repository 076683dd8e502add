// ActionBoard - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Value
// =============================================================================

/// A single scalar cell.
///
/// Empty fields are `Null`; every other field keeps its source text
/// verbatim, so IDs like `007` survive filtering and export untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Text(String),
    Null,
}

impl Value {
    /// Build a value from one raw delimited-text field.
    pub fn from_field(raw: &str) -> Self {
        if raw.is_empty() {
            Value::Null
        } else {
            Value::Text(raw.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text content, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Null => Ok(()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Null => serializer.serialize_none(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

// =============================================================================
// Record / RecordSet
// =============================================================================

/// One row of the dataset.
///
/// `values` is aligned with the owning `RecordSet::columns`. `source_row`
/// is the 0-based data row index in the fetched payload and is the row's
/// identity across every derived set.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub source_row: usize,
    pub values: Vec<Value>,
}

/// An ordered, homogeneous table of records.
///
/// Rows are shared through `Arc` so filter stages can derive new sets
/// without copying or mutating the base.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Arc<Record>>,
}

impl RecordSet {
    /// Build a record set from owned rows.
    ///
    /// Rows are fitted to the column count: short rows are padded with
    /// `Null` and extra cells are dropped.
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.values.resize(width, Value::Null);
                Arc::new(r)
            })
            .collect();
        Self { columns, rows }
    }

    /// Build a record set sharing already-allocated rows. Rows that do not
    /// match the column count are copied and fitted as in [`RecordSet::new`].
    pub fn from_shared(columns: Vec<String>, rows: Vec<Arc<Record>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|r| {
                if r.values.len() == width {
                    return r;
                }
                let mut fitted = Record::clone(&r);
                fitted.values.resize(width, Value::Null);
                Arc::new(fitted)
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Arc<Record>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the column list, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value of `column` in `record`, or `None` when the column is absent.
    pub fn value<'a>(&self, record: &'a Record, column: &str) -> Option<&'a Value> {
        self.column_index(column).and_then(|i| record.values.get(i))
    }

    /// Derive a new set holding the rows that satisfy `keep`, in order.
    pub fn retain_where<F>(&self, mut keep: F) -> RecordSet
    where
        F: FnMut(&Record) -> bool,
    {
        RecordSet {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep(r))
                .cloned()
                .collect(),
        }
    }

    /// Source row indices, in order. Handy for asserting subset/order laws.
    pub fn source_rows(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.source_row).collect()
    }
}

/// Serialises as an array of `{column: value}` objects.
impl Serialize for RecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowView {
                columns: &self.columns,
                record: row,
            })?;
        }
        seq.end()
    }
}

struct RowView<'a> {
    columns: &'a [String],
    record: &'a Record,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (col, val) in self.columns.iter().zip(&self.record.values) {
            map.serialize_entry(col, val)?;
        }
        map.end()
    }
}
