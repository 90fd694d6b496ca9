use crate::core::io::record::{
    has_failure_sentinel, read_record, stable_file_name, ts_file_name, RECORD_FILE,
};
use crate::core::io::xyz::read_structure_file;
use crate::core::models::pathway::{PathwayRecord, Stability};
use crate::core::models::structure::Structure;
use crate::engine::error::{CanonicalizeError, EngineError};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Snapshot of every record the store has accepted, kept at the store root.
pub const SNAPSHOT_FILE: &str = "pathways.json";
/// Directory under the store root holding one folder per scan job.
pub const REACTIONS_DIR: &str = "reactions";

/// Optional identifier hook applied to newly loaded records, e.g. to
/// re-derive identifiers with spectator atoms excluded.
pub type Reparser<'a> = dyn Fn(&Structure) -> Result<String, CanonicalizeError> + 'a;

/// Counts from one [`PathwayStore::load`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Records read from job folders this pass.
    pub loaded: usize,
    /// Records restored from the snapshot before scanning folders.
    pub from_snapshot: usize,
    /// Folders skipped because the snapshot already covers them.
    pub skipped: usize,
    /// Folders with a failure sentinel, an unreadable record, or a failed
    /// reparse.
    pub failed: usize,
}

/// Restart-safe collection of pathway records rooted at one results
/// directory.
///
/// Records are keyed by the last component of their folder path, so a
/// results tree moved or renamed above that level is picked up from the
/// snapshot instead of being re-read.
pub struct PathwayStore {
    root: PathBuf,
    records: Vec<PathwayRecord>,
    known: HashSet<String>,
    dirty: bool,
}

fn folder_key(folder: &str) -> &str {
    Path::new(folder)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(folder)
}

fn reparse_record(
    folder: &Path,
    record: &PathwayRecord,
    reparse: &Reparser<'_>,
) -> Result<Vec<String>, EngineError> {
    let mut ids = Vec::with_capacity(record.len());
    for point in record.points() {
        let file_name = match point.stability {
            Stability::Stable => stable_file_name(point.index),
            Stability::Transition => ts_file_name(point.index),
        };
        let frame = read_structure_file(&folder.join(file_name))?;
        ids.push(reparse(&frame.structure)?);
    }
    Ok(ids)
}

impl PathwayStore {
    /// Opens the store at `root`, restoring the snapshot when one exists.
    /// A snapshot that fails to parse is discarded with a warning; the next
    /// load pass rebuilds it from the job folders.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let root = root.into();
        let snapshot = root.join(SNAPSHOT_FILE);
        let records: Vec<PathwayRecord> = if snapshot.exists() {
            let reader = BufReader::new(File::open(&snapshot)?);
            match serde_json::from_reader(reader) {
                Ok(records) => records,
                Err(error) => {
                    warn!(path = %snapshot.display(), %error, "discarding unreadable snapshot");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        let known = records
            .iter()
            .map(|record| folder_key(&record.folder).to_string())
            .collect();
        Ok(Self {
            root,
            records,
            known,
            dirty: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> &[PathwayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Scans `root/reactions` for job folders not yet covered by the
    /// snapshot and absorbs their records. Folders carrying a failure
    /// sentinel are counted and never revisited as records; unreadable or
    /// inconsistent records are counted and skipped without aborting the
    /// pass. When a reparser is supplied it is applied to every record that
    /// still lacks the reparsed column, snapshot-restored ones included.
    pub fn load(&mut self, reparser: Option<&Reparser<'_>>) -> Result<LoadReport, EngineError> {
        let mut report = LoadReport {
            from_snapshot: self.records.len(),
            ..LoadReport::default()
        };

        let reactions = self.root.join(REACTIONS_DIR);
        if !reactions.is_dir() {
            return Ok(report);
        }
        let mut folders: Vec<PathBuf> = fs::read_dir(&reactions)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_dir())
            .collect();
        folders.sort();

        for folder in folders {
            let Some(name) = folder.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let current = format!("{REACTIONS_DIR}/{name}");

            if self.known.contains(name) {
                let mut reparse_failed = false;
                // Correct stale paths in place so downstream consumers can
                // resolve files under the current root.
                for record in &mut self.records {
                    if folder_key(&record.folder) != name {
                        continue;
                    }
                    if record.folder != current {
                        debug!(from = %record.folder, to = %current, "folder path updated");
                        record.folder = current.clone();
                        self.dirty = true;
                    }
                    // Snapshot-restored records predate the hook; fill the
                    // reparsed column from the persisted structures so that
                    // restarting with atom exclusion sees every record.
                    if let Some(reparse) = reparser {
                        if record.ids_reparsed.is_none() {
                            match reparse_record(&folder, record, reparse) {
                                Ok(ids) => {
                                    record.ids_reparsed = Some(ids);
                                    self.dirty = true;
                                }
                                Err(error) => {
                                    warn!(folder = %folder.display(), %error, "reparse failed");
                                    reparse_failed = true;
                                }
                            }
                        }
                    }
                }
                if reparse_failed {
                    self.records
                        .retain(|record| folder_key(&record.folder) != name);
                    self.known.remove(name);
                    self.dirty = true;
                    report.failed += 1;
                } else {
                    report.skipped += 1;
                }
                continue;
            }

            if has_failure_sentinel(&folder) {
                debug!(folder = %folder.display(), "failure sentinel present");
                report.failed += 1;
                continue;
            }

            let mut record = match read_record(&folder.join(RECORD_FILE)) {
                Ok(record) => record,
                Err(error) => {
                    warn!(folder = %folder.display(), %error, "unreadable pathway record");
                    report.failed += 1;
                    continue;
                }
            };
            record.folder = current;

            if let Some(reparse) = reparser {
                match reparse_record(&folder, &record, reparse) {
                    Ok(ids) => record.ids_reparsed = Some(ids),
                    Err(error) => {
                        warn!(folder = %folder.display(), %error, "reparse failed");
                        report.failed += 1;
                        continue;
                    }
                }
            }

            self.known.insert(name.to_string());
            self.records.push(record);
            self.dirty = true;
            report.loaded += 1;
        }

        info!(
            loaded = report.loaded,
            from_snapshot = report.from_snapshot,
            skipped = report.skipped,
            failed = report.failed,
            "pathway store loaded"
        );
        Ok(report)
    }

    /// Registers a freshly produced record without touching the filesystem.
    pub fn append(&mut self, record: PathwayRecord) {
        self.known.insert(folder_key(&record.folder).to_string());
        self.records.push(record);
        self.dirty = true;
    }

    /// Writes the snapshot when anything changed since the last flush.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        if !self.dirty {
            return Ok(());
        }
        let snapshot = self.root.join(SNAPSHOT_FILE);
        let writer = BufWriter::new(File::create(&snapshot)?);
        serde_json::to_writer_pretty(writer, &self.records)
            .map_err(|error| EngineError::Io(std::io::Error::other(error)))?;
        self.dirty = false;
        debug!(path = %snapshot.display(), records = self.records.len(), "snapshot written");
        Ok(())
    }
}
