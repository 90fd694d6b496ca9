use crate::core::models::pathway::PathwayRecord;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Pathway record document written into each scan-job folder.
pub const RECORD_FILE: &str = "pathway.json";
/// Stitched trajectory written by the scan driver.
pub const TRAJECTORY_FILE: &str = "scan.xyz";
/// Sentinel marking a failed forward relaxation chain.
pub const FAILED_FORWARD: &str = "FAILED_FORWARD";
/// Sentinel marking a failed backward relaxation chain.
pub const FAILED_BACKWARD: &str = "FAILED_BACKWARD";

/// Which relaxation chain of a scan job a sentinel refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    Forward,
    Backward,
}

impl ScanDirection {
    pub fn sentinel(self) -> &'static str {
        match self {
            ScanDirection::Forward => FAILED_FORWARD,
            ScanDirection::Backward => FAILED_BACKWARD,
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed record document '{path}': {source}", path = path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Inconsistent record in '{path}': parallel columns disagree", path = path.display())]
    Inconsistent { path: PathBuf },
}

/// Structure file name for a stable stretch point at a trajectory index.
pub fn stable_file_name(index: usize) -> String {
    format!("stable_{index:04}.xyz")
}

/// Structure file name for a transition stretch point at a trajectory index.
pub fn ts_file_name(index: usize) -> String {
    format!("ts_{index:04}.xyz")
}

/// True if the folder carries a forward- or backward-failure sentinel.
pub fn has_failure_sentinel(folder: &Path) -> bool {
    folder.join(FAILED_FORWARD).exists() || folder.join(FAILED_BACKWARD).exists()
}

/// Drops a failure sentinel into the job folder. Sentinels are preserved for
/// post-mortem inspection and cause the folder to be excluded from
/// aggregation, never to abort a batch.
pub fn write_sentinel(folder: &Path, direction: ScanDirection) -> Result<(), RecordError> {
    fs::write(folder.join(direction.sentinel()), b"")?;
    Ok(())
}

/// Reads a pathway record document and checks its structural invariants.
pub fn read_record(path: &Path) -> Result<PathwayRecord, RecordError> {
    let reader = BufReader::new(File::open(path)?);
    let record: PathwayRecord =
        serde_json::from_reader(reader).map_err(|source| RecordError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    if !record.is_consistent() {
        return Err(RecordError::Inconsistent {
            path: path.to_path_buf(),
        });
    }
    Ok(record)
}

/// Writes a pathway record document. Energies round-trip bit-for-bit.
pub fn write_record(path: &Path, record: &PathwayRecord) -> Result<(), RecordError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, record).map_err(|source| RecordError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
