//! Source dataset loading and pending-work computation.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};
use triage_core::SourceRecord;
use triage_core::tables::source;

use crate::StoreError;
use crate::table::{missing_columns, parse_id, read_text_csv, text_column, text_value};

/// Load the source export.
///
/// Fails with [`StoreError::NotFound`] when the file is absent and with
/// [`StoreError::Schema`] when a required column is missing. Rows whose id is
/// not an integer are dropped; repeated ids keep their first row.
pub fn load_source(path: &Path) -> Result<Vec<SourceRecord>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }

    let table = read_text_csv(path)?;
    let missing = missing_columns(&table.columns, source::REQUIRED);
    if !missing.is_empty() {
        return Err(StoreError::Schema {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut records = Vec::with_capacity(table.num_rows());
    let mut seen = HashSet::new();
    let mut dropped = 0usize;
    let mut duplicates = 0usize;

    for batch in &table.batches {
        let ids = text_column(batch, source::ID)?;
        let timestamps = text_column(batch, source::TIMESTAMP)?;
        let comments = text_column(batch, source::COMMENT)?;
        let priorities = text_column(batch, source::PRIORITY)?;
        let categories = text_column(batch, source::CATEGORY)?;

        for row in 0..batch.num_rows() {
            let raw_id = text_value(ids, row);
            let Some(id) = parse_id(&raw_id) else {
                debug!(raw_id = %raw_id, "dropping row with non-integer id");
                dropped += 1;
                continue;
            };
            if !seen.insert(id) {
                duplicates += 1;
                continue;
            }
            records.push(SourceRecord {
                id,
                timestamp: text_value(timestamps, row),
                comment: text_value(comments, row),
                priority: text_value(priorities, row),
                category: text_value(categories, row),
            });
        }
    }

    if dropped > 0 {
        warn!(dropped, path = %path.display(), "dropped rows with non-integer ids");
    }
    if duplicates > 0 {
        warn!(duplicates, path = %path.display(), "ignored rows with repeated ids");
    }
    info!(count = records.len(), path = %path.display(), "loaded source records");
    Ok(records)
}

/// Records whose id is not in `done`, in source order.
pub fn pending<'a>(records: &'a [SourceRecord], done: &HashSet<i64>) -> Vec<&'a SourceRecord> {
    records.iter().filter(|r| !done.contains(&r.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const HEADER: &str = "id,SR start date/time,Priority,Service Category,Service Comments";

    fn write(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("source.csv");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_errors() {
        let result = load_source(Path::new("/nonexistent/source.csv"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn missing_columns_are_a_schema_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write(tmp.path(), "id,Priority\n1,03-Routine\n");
        match load_source(&path) {
            Err(StoreError::Schema { missing, .. }) => {
                assert_eq!(
                    missing,
                    vec!["Service Category", "Service Comments", "SR start date/time"]
                );
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn normalises_text_and_ids() {
        let tmp = tempfile::TempDir::new().unwrap();
        let body = format!(
            "{HEADER}\n\
             1,2024-01-01 09:00, 03-Routine ,Plumbing,  Drip under sink  \n\
             2.0,2024-01-02 10:00,01-Emergency,,\n\
             abc,2024-01-03 11:00,02-Urgent,HVAC,No heat\n\
             1,2024-01-04 12:00,02-Urgent,HVAC,duplicate\n"
        );
        let path = write(tmp.path(), &body);

        let records = load_source(&path).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].priority, "03-Routine");
        assert_eq!(records[0].comment, "Drip under sink");
        assert_eq!(records[0].timestamp, "2024-01-01 09:00");

        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].category, "");
        assert_eq!(records[1].comment, "");
    }

    #[test]
    fn extra_columns_ignored() {
        let tmp = tempfile::TempDir::new().unwrap();
        let body = format!("{HEADER},Ward\n5,t,03-Routine,Pest,Mice,North\n");
        let path = write(tmp.path(), &body);
        let records = load_source(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "Pest");
    }

    #[test]
    fn pending_preserves_order() {
        let records: Vec<SourceRecord> = [5, 3, 9, 1]
            .into_iter()
            .map(|id| SourceRecord {
                id,
                timestamp: String::new(),
                comment: String::new(),
                priority: String::new(),
                category: String::new(),
            })
            .collect();
        let done = HashSet::from([3, 1]);
        let ids: Vec<i64> = pending(&records, &done).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 9]);
    }
}
