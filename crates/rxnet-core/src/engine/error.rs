use crate::core::io::record::RecordError;
use crate::core::io::tables::TableError;
use crate::core::io::xyz::XyzError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The optimization-engine collaborator could not be driven at all
    /// (spawn failure, unreadable log). A clean non-zero engine status is
    /// not an error; it is recorded via a failure sentinel instead.
    #[error("Optimizer collaborator failed: {0}")]
    Optimizer(#[from] OptimizerError),

    #[error("Canonicalization failed: {0}")]
    Canonicalize(#[from] CanonicalizeError),

    /// No accepted stable minima in a trajectory. Excludes the pathway,
    /// never aborts the batch.
    #[error("Segmentation found no stable minima in '{folder}'", folder = folder.display())]
    SegmentationDegenerate { folder: PathBuf },

    /// Zero species across the whole batch. Batch-fatal.
    #[error("No chemical species identified across the batch")]
    EmptyCatalog,

    /// An explicitly requested seed set has no member in the catalog. A
    /// single absent seed among valid ones is reported and skipped instead.
    #[error("Reactant '{identifier}' not found among catalog species")]
    MissingReactant { identifier: String },

    #[error("Trajectory I/O failed: {0}")]
    Xyz(#[from] XyzError),

    #[error("Pathway record I/O failed: {0}")]
    Record(#[from] RecordError),

    #[error("Table export failed: {0}")]
    Table(#[from] TableError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Relaxation log missing or unreadable at '{path}': {message}", path = path.display())]
    Log { path: PathBuf, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CanonicalizeError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Canonicalizer produced no identifier (status {status})")]
    EmptyOutput { status: i32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
