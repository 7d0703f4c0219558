//! Prediction ledger: an append-only JSONL log plus a deduplicated CSV
//! snapshot.
//!
//! Every validated label is appended to the log before anything else
//! happens, so the log is the durable record of finished work. The snapshot
//! is derived from it: [`Ledger::merge`] overlays a replay of the whole log
//! onto the current snapshot with last-write-wins on id and rewrites the
//! snapshot atomically. Replaying is idempotent, so a merge interrupted or
//! repeated any number of times converges on the same snapshot.
//!
//! Read failures are governed by [`OnLedgerCorrupt`]. The default treats an
//! unreadable ledger as empty: work gets labelled again rather than the run
//! crashing.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use tracing::{info, warn};
use triage_core::LabelResult;
use triage_core::tables::{self, snapshot};

use crate::StoreError;
use crate::table::{
    missing_columns, parse_id, read_text_csv, text_column, text_value, write_csv_atomic,
};

/// Id-ordered mapping of the current label for each ticket.
pub type LedgerMap = BTreeMap<i64, LabelResult>;

/// What to do when a ledger file exists but cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnLedgerCorrupt {
    /// Log a warning and continue as if nothing had been labelled.
    #[default]
    TreatAsEmpty,
    /// Abort with [`StoreError::CorruptLedger`].
    Fail,
}

impl OnLedgerCorrupt {
    fn recover<T: Default>(self, path: &Path, err: StoreError) -> Result<T, StoreError> {
        match self {
            Self::TreatAsEmpty => {
                warn!(path = %path.display(), error = %err, "unreadable ledger treated as empty");
                Ok(T::default())
            }
            Self::Fail => Err(StoreError::CorruptLedger {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }),
        }
    }
}

/// Load a ledger snapshot.
///
/// A missing file is an empty ledger. Any read or parse failure, including a
/// missing column or a non-integer id, is handed to `policy`. Repeated ids
/// keep the last row.
pub fn load_ledger(path: &Path, policy: OnLedgerCorrupt) -> Result<LedgerMap, StoreError> {
    if !path.exists() {
        return Ok(LedgerMap::new());
    }
    match read_snapshot(path) {
        Ok(entries) => Ok(entries),
        Err(err) => policy.recover(path, err),
    }
}

fn read_snapshot(path: &Path) -> Result<LedgerMap, StoreError> {
    let table = read_text_csv(path)?;
    let missing = missing_columns(&table.columns, snapshot::REQUIRED);
    if !missing.is_empty() {
        return Err(StoreError::Schema {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut entries = LedgerMap::new();
    for batch in &table.batches {
        let ids = text_column(batch, snapshot::ID)?;
        let priorities = text_column(batch, snapshot::PRIORITY)?;
        let categories = text_column(batch, snapshot::CATEGORY)?;
        let actions = text_column(batch, snapshot::SUGGESTED_ACTIONS)?;

        for row in 0..batch.num_rows() {
            let raw_id = text_value(ids, row);
            let id = parse_id(&raw_id)
                .ok_or_else(|| StoreError::Other(format!("non-integer id '{raw_id}'")))?;
            entries.insert(
                id,
                LabelResult {
                    id,
                    priority: text_value(priorities, row),
                    category: text_value(categories, row),
                    suggested_actions: text_value(actions, row),
                },
            );
        }
    }
    Ok(entries)
}

/// Overlay `results` onto `entries`, last write wins per id.
///
/// Returns how many results changed the mapping.
pub fn merge_results(
    entries: &mut LedgerMap,
    results: impl IntoIterator<Item = LabelResult>,
) -> usize {
    let mut changed = 0;
    for result in results {
        if entries.get(&result.id) != Some(&result) {
            changed += 1;
            entries.insert(result.id, result);
        }
    }
    changed
}

/// Snapshot overlaid with the log replay.
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    pub entries: LedgerMap,
    /// Parsed log lines.
    pub log_entries: usize,
    /// Ids whose replayed value is missing from, or differs from, the
    /// snapshot on disk.
    pub changed: usize,
}

impl Reconciled {
    pub fn done_ids(&self) -> HashSet<i64> {
        self.entries.keys().copied().collect()
    }
}

/// Paths and read policy for one ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    snapshot_path: PathBuf,
    log_path: PathBuf,
    policy: OnLedgerCorrupt,
}

impl Ledger {
    pub fn new(
        snapshot_path: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
        policy: OnLedgerCorrupt,
    ) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            log_path: log_path.into(),
            policy,
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn load_snapshot(&self) -> Result<LedgerMap, StoreError> {
        load_ledger(&self.snapshot_path, self.policy)
    }

    /// Every result in the append log, oldest first.
    ///
    /// Unparseable lines (a torn final write, hand edits) are skipped under
    /// [`OnLedgerCorrupt::TreatAsEmpty`] and fail the read under
    /// [`OnLedgerCorrupt::Fail`].
    pub fn read_log(&self) -> Result<Vec<LabelResult>, StoreError> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let file = match File::open(&self.log_path) {
            Ok(file) => file,
            Err(err) => return self.policy.recover(&self.log_path, err.into()),
        };

        let mut results = Vec::new();
        let mut skipped = 0usize;
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => return self.policy.recover(&self.log_path, err.into()),
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LabelResult>(&line) {
                Ok(result) => results.push(result),
                Err(err) => match self.policy {
                    OnLedgerCorrupt::TreatAsEmpty => skipped += 1,
                    OnLedgerCorrupt::Fail => {
                        return Err(StoreError::CorruptLedger {
                            path: self.log_path.clone(),
                            reason: format!("line {}: {err}", index + 1),
                        });
                    }
                },
            }
        }

        if skipped > 0 {
            warn!(skipped, path = %self.log_path.display(), "skipped unparseable log lines");
        }
        Ok(results)
    }

    /// Append validated results to the log and sync them to disk.
    pub fn append(&self, results: &[LabelResult]) -> Result<(), StoreError> {
        if results.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.log_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.log_path)?;
        let torn = ends_without_newline(&mut file)?;

        let mut writer = BufWriter::new(file);
        if torn {
            // Terminate a partial line left by an interrupted write.
            writer.write_all(b"\n")?;
        }
        for result in results {
            serde_json::to_writer(&mut writer, result)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }

    /// Current snapshot with the log replayed on top.
    pub fn reconcile(&self) -> Result<Reconciled, StoreError> {
        let snapshot = self.load_snapshot()?;
        let log = self.read_log()?;
        let log_entries = log.len();
        let mut entries = snapshot.clone();
        merge_results(&mut entries, log);
        let changed = entries
            .iter()
            .filter(|&(id, result)| snapshot.get(id) != Some(result))
            .count();
        Ok(Reconciled {
            entries,
            log_entries,
            changed,
        })
    }

    /// Reconcile and persist the result as the new snapshot.
    pub fn merge(&self) -> Result<Reconciled, StoreError> {
        let reconciled = self.reconcile()?;
        self.write_snapshot(&reconciled.entries)?;
        info!(
            rows = reconciled.entries.len(),
            changed = reconciled.changed,
            path = %self.snapshot_path.display(),
            "merged ledger snapshot"
        );
        Ok(reconciled)
    }

    pub fn write_snapshot(&self, entries: &LedgerMap) -> Result<(), StoreError> {
        let batch = RecordBatch::try_new(
            Arc::new(tables::snapshot_schema()),
            vec![
                Arc::new(Int64Array::from_iter_values(entries.keys().copied())),
                Arc::new(StringArray::from_iter_values(
                    entries.values().map(|r| r.priority.as_str()),
                )),
                Arc::new(StringArray::from_iter_values(
                    entries.values().map(|r| r.category.as_str()),
                )),
                Arc::new(StringArray::from_iter_values(
                    entries.values().map(|r| r.suggested_actions.as_str()),
                )),
            ],
        )?;
        write_csv_atomic(&self.snapshot_path, &batch)
    }
}

fn ends_without_newline(file: &mut File) -> Result<bool, StoreError> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
