//! CSV access through Arrow: every column is read as text and normalised by
//! the callers, writes go through a temp file and an atomic rename.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, StringArray};
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::record_batch::RecordBatch;
use tempfile::NamedTempFile;
use triage_core::tables;

use crate::StoreError;

/// A CSV file read as all-text Arrow batches.
pub(crate) struct TextTable {
    pub columns: Vec<String>,
    pub batches: Vec<RecordBatch>,
}

impl TextTable {
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }
}

pub(crate) fn read_text_csv(path: &Path) -> Result<TextTable, StoreError> {
    let mut file = File::open(path)?;

    // Header only: column names drive the all-text schema.
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(0))?;
    let columns: Vec<String> = header.fields().iter().map(|f| f.name().clone()).collect();
    file.seek(SeekFrom::Start(0))?;

    let schema = Arc::new(tables::text_schema(&columns));
    let reader = ReaderBuilder::new(schema).with_header(true).build(file)?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;

    Ok(TextTable { columns, batches })
}

/// Required column names absent from `columns`.
pub(crate) fn missing_columns(columns: &[String], required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !columns.iter().any(|c| c == *name))
        .map(|name| name.to_string())
        .collect()
}

pub(crate) fn text_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a StringArray, StoreError> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StoreError::Other(format!("column '{name}' is not readable as text")))
}

/// Trimmed cell text; nulls become the empty string.
pub(crate) fn text_value(col: &StringArray, row: usize) -> String {
    if col.is_null(row) {
        String::new()
    } else {
        col.value(row).trim().to_string()
    }
}

/// Coerce an id cell to an integer: `"12"`, `" 12 "` and `"12.0"` all give 12.
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }
    let value: f64 = raw.parse().ok()?;
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15).then_some(value as i64)
}

/// Write `batch` as CSV with a header, replacing `path` atomically.
pub(crate) fn write_csv_atomic(path: &Path, batch: &RecordBatch) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = WriterBuilder::new().with_header(true).build(tmp.as_file_mut());
        writer.write(batch)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
