use crate::core::constraints::ConstraintSchedule;
use crate::core::io::record::{write_record, RECORD_FILE};
use crate::core::models::structure::Structure;
use crate::engine::config::ScanConfig;
use crate::engine::error::EngineError;
use crate::engine::optimizer::{Canonicalizer, Optimizer};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scan::{run_scan, ScanJob};
use crate::engine::segment::{segment_trajectory, SegmentRequest};
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// One scan job to drive: the starting geometry, the full constraint
/// schedule, and the pivot index the forward/backward chains split at.
#[derive(Debug, Clone)]
pub struct SearchJobSpec {
    pub initial: Structure,
    pub schedule: ConstraintSchedule,
    pub pivot: usize,
}

/// Terminal state of one scan job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Trajectory scanned, segmented, and recorded.
    Completed,
    /// The scan produced no usable trajectory; a failure sentinel marks the
    /// folder.
    ScanFailed,
    /// Segmentation found no stable minima; the pathway is excluded.
    Degenerate,
    /// Collaborator breakage (spawn failure, unreadable log, I/O).
    Error(String),
}

#[derive(Debug, Clone)]
pub struct JobReport {
    pub scan_index: usize,
    pub folder: PathBuf,
    pub status: JobStatus,
}

/// Per-status counts over one batch, with the individual job reports.
#[derive(Debug)]
pub struct BatchSummary {
    pub reports: Vec<JobReport>,
}

impl BatchSummary {
    pub fn completed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Completed))
    }

    pub fn degenerate(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Degenerate))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::ScanFailed | JobStatus::Error(_)))
    }

    fn count(&self, predicate: impl Fn(&JobStatus) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(&report.status))
            .count()
    }
}

/// Drives a batch of constrained scans in parallel and distills each
/// trajectory into a persisted pathway record under
/// `root/reactions/<scan index>`.
///
/// Job-level failures never abort the batch; every job ends in exactly one
/// [`JobStatus`] and the summary reports them all.
#[instrument(skip_all, name = "search_workflow")]
pub fn run(
    jobs: &[SearchJobSpec],
    root: &Path,
    config: &ScanConfig,
    optimizer: &dyn Optimizer,
    canonicalizer: &dyn Canonicalizer,
    reporter: &ProgressReporter,
) -> Result<BatchSummary, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Constrained Scans",
    });
    reporter.report(Progress::BatchStart {
        total_jobs: jobs.len() as u64,
    });
    info!(jobs = jobs.len(), root = %root.display(), "starting scan batch");

    let reports: Vec<JobReport> = jobs
        .par_iter()
        .enumerate()
        .map(|(scan_index, spec)| {
            let folder = root.join("reactions").join(format!("{scan_index:04}"));
            let status = run_job(scan_index, spec, &folder, config, optimizer, canonicalizer);
            if let JobStatus::Error(message) = &status {
                warn!(scan_index, %message, "scan job errored");
            }
            reporter.report(Progress::JobFinish);
            JobReport {
                scan_index,
                folder,
                status,
            }
        })
        .collect();

    reporter.report(Progress::BatchFinish);
    reporter.report(Progress::PhaseFinish);

    let summary = BatchSummary { reports };
    info!(
        completed = summary.completed(),
        degenerate = summary.degenerate(),
        failed = summary.failed(),
        "scan batch finished"
    );
    Ok(summary)
}

fn run_job(
    scan_index: usize,
    spec: &SearchJobSpec,
    folder: &Path,
    config: &ScanConfig,
    optimizer: &dyn Optimizer,
    canonicalizer: &dyn Canonicalizer,
) -> JobStatus {
    let job = ScanJob {
        scan_index,
        initial: spec.initial.clone(),
        schedule: spec.schedule.clone(),
        pivot: spec.pivot,
        folder: folder.to_path_buf(),
    };

    let outcome = match run_scan(&job, optimizer, config) {
        Ok(outcome) => outcome,
        Err(error) => return JobStatus::Error(error.to_string()),
    };
    let Some(trajectory) = outcome.trajectory else {
        return JobStatus::ScanFailed;
    };

    let mut ids_stereo = Vec::with_capacity(trajectory.len());
    let mut ids_plain = Vec::with_capacity(trajectory.len());
    for frame in trajectory.frames() {
        let stereo = canonicalizer.canonicalize(&frame.structure, true, &[]);
        let plain = canonicalizer.canonicalize(&frame.structure, false, &[]);
        match (stereo, plain) {
            (Ok(stereo), Ok(plain)) => {
                ids_stereo.push(stereo);
                ids_plain.push(plain);
            }
            (Err(error), _) | (_, Err(error)) => return JobStatus::Error(error.to_string()),
        }
    }

    let mut metadata = Map::new();
    metadata.insert("scan_index".into(), Value::from(scan_index as i64));
    let request = SegmentRequest {
        trajectory: &trajectory,
        ids_stereo: &ids_stereo,
        ids_plain: &ids_plain,
        folder,
        metadata,
    };

    match segment_trajectory(&request, optimizer, canonicalizer, config) {
        Ok(record) => match write_record(&folder.join(RECORD_FILE), &record) {
            Ok(()) => JobStatus::Completed,
            Err(error) => JobStatus::Error(error.to_string()),
        },
        Err(EngineError::SegmentationDegenerate { .. }) => JobStatus::Degenerate,
        Err(error) => JobStatus::Error(error.to_string()),
    }
}
