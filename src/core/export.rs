// ActionBoard - core/export.rs
//
// CSV and JSON export of the projected record set.
// Core layer: writes to any Write trait object.

use crate::core::model::RecordSet;
use crate::util::constants::{
    EXPORT_CSV_FILE_NAME, EXPORT_CSV_MIME, EXPORT_JSON_FILE_NAME, EXPORT_JSON_MIME,
};
use crate::util::error::ExportError;
use std::io::Write;

/// Export format selectable from config or CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// A ready-to-write export: bytes plus download metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub rows: usize,
}

impl ExportPayload {
    pub fn build(records: &RecordSet, format: ExportFormat) -> Result<Self, ExportError> {
        match format {
            ExportFormat::Csv => Self::csv(records),
            ExportFormat::Json => Self::json(records),
        }
    }

    pub fn csv(records: &RecordSet) -> Result<Self, ExportError> {
        let mut bytes = Vec::new();
        let rows = export_csv(records, &mut bytes)?;
        Ok(Self {
            bytes,
            file_name: EXPORT_CSV_FILE_NAME,
            mime_type: EXPORT_CSV_MIME,
            rows,
        })
    }

    pub fn json(records: &RecordSet) -> Result<Self, ExportError> {
        let mut bytes = Vec::new();
        let rows = export_json(records, &mut bytes)?;
        Ok(Self {
            bytes,
            file_name: EXPORT_JSON_FILE_NAME,
            mime_type: EXPORT_JSON_MIME,
            rows,
        })
    }
}

/// Export records to CSV: one header row, then one row per record.
///
/// Fields containing the delimiter, quotes or newlines are quoted.
/// `Null` is written as an empty field.
pub fn export_csv<W: Write>(records: &RecordSet, writer: W) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(records.columns())
        .map_err(|e| ExportError::Csv { source: e })?;

    let mut count = 0;
    for row in records.rows() {
        csv_writer
            .write_record(row.values.iter().map(|v| v.to_string()))
            .map_err(|e| ExportError::Csv { source: e })?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: EXPORT_CSV_FILE_NAME.into(),
        source: e,
    })?;

    Ok(count)
}

/// Export records to JSON (array of `{column: value}` objects).
pub fn export_json<W: Write>(records: &RecordSet, writer: W) -> Result<usize, ExportError> {
    serde_json::to_writer_pretty(writer, records).map_err(|e| ExportError::Json { source: e })?;
    Ok(records.len())
}
