use crate::core::constraints::{Constraint, ConstraintSchedule};
use crate::core::io::record::{self, ScanDirection, TRAJECTORY_FILE};
use crate::core::io::xyz;
use crate::core::models::frame::Trajectory;
use crate::core::models::structure::Structure;
use crate::engine::config::ScanConfig;
use crate::engine::error::EngineError;
use crate::engine::optimizer::{Optimizer, RelaxationRequest};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One scan job as pure data: everything needed to run the forward and
/// backward relaxation chains from a pivot structure. Construction is
/// decoupled from execution; descriptors are handed to the batch runner.
#[derive(Debug, Clone)]
pub struct ScanJob {
    /// Identifier of the job within its batch (also the originating scan
    /// index recorded in the pathway metadata).
    pub scan_index: usize,
    /// Structure the pivot relaxation starts from.
    pub initial: Structure,
    /// The full constraint schedule of the batch.
    pub schedule: ConstraintSchedule,
    /// Index splitting the schedule into forward (`pivot..`) and backward
    /// (`..pivot`, traversed in reverse) sub-schedules.
    pub pivot: usize,
    /// Folder owned exclusively by this job.
    pub folder: PathBuf,
}

/// What one scan job produced.
#[derive(Debug)]
pub struct ScanOutcome {
    pub scan_index: usize,
    pub folder: PathBuf,
    /// The stitched trajectory, or `None` when the very first forward step
    /// failed and the job has no usable output.
    pub trajectory: Option<Trajectory>,
    pub forward_failed: bool,
    pub backward_failed: bool,
    /// Either chain stopped early because a representative energy exceeded
    /// the configured ceiling.
    pub threshold_hit: bool,
}

struct ChainResult {
    samples: Vec<(Structure, f64)>,
    failed: bool,
    threshold_hit: bool,
}

/// Runs one relaxation chain: each step feeds the previous step's
/// representative (lowest-energy sample of that step's own relaxation log)
/// into the next constrained relaxation.
///
/// Stops early, keeping everything collected so far, when the engine reports
/// a non-zero status (a failure sentinel is dropped into the job folder) or
/// when the representative energy exceeds the configured ceiling.
fn run_chain(
    job: &ScanJob,
    start: &Structure,
    constraints: &[Constraint],
    direction: ScanDirection,
    optimizer: &dyn Optimizer,
    config: &ScanConfig,
) -> Result<ChainResult, EngineError> {
    let mut samples: Vec<(Structure, f64)> = Vec::with_capacity(constraints.len());
    let mut current = start.clone();

    for (step, constraint) in constraints.iter().enumerate() {
        let log = optimizer.relax(&RelaxationRequest {
            structure: &current,
            constraint: Some(constraint),
            level: &config.opt_level,
            wall: config.wall.as_deref(),
        })?;

        let representative = match log.lowest() {
            Some(sample) if log.succeeded() => sample.clone(),
            _ => {
                // Engine failure, or a "success" with an empty log; either
                // way this chain is done. Collected steps are kept.
                warn!(
                    scan_index = job.scan_index,
                    ?direction,
                    step,
                    status = log.status,
                    "relaxation chain aborted by engine"
                );
                record::write_sentinel(&job.folder, direction)?;
                return Ok(ChainResult {
                    samples,
                    failed: true,
                    threshold_hit: false,
                });
            }
        };

        debug!(
            scan_index = job.scan_index,
            ?direction,
            step,
            energy = representative.energy,
            "step relaxed"
        );
        current = representative.structure.clone();
        let energy = representative.energy;
        samples.push((representative.structure, energy));

        if let Some(ceiling) = config.energy_max {
            if energy > ceiling {
                debug!(
                    scan_index = job.scan_index,
                    ?direction,
                    step,
                    energy,
                    ceiling,
                    "energy ceiling exceeded, stopping chain"
                );
                return Ok(ChainResult {
                    samples,
                    failed: false,
                    threshold_hit: true,
                });
            }
        }
    }

    Ok(ChainResult {
        samples,
        failed: false,
        threshold_hit: false,
    })
}

/// Drives one scan job: forward chain first, then the backward chain seeded
/// from the first forward representative, stitched into a single trajectory
/// with contiguous indices and written to the job folder.
///
/// Per-job failures never propagate as errors: an engine failure leaves a
/// sentinel and a (possibly empty) partial trajectory. Only collaborator
/// breakage at the I/O level (spawn failure, unreadable log) is an `Err`.
pub fn run_scan(
    job: &ScanJob,
    optimizer: &dyn Optimizer,
    config: &ScanConfig,
) -> Result<ScanOutcome, EngineError> {
    fs::create_dir_all(&job.folder)?;
    let (forward_constraints, backward_constraints) = job.schedule.split_at_pivot(job.pivot);

    let forward = run_chain(
        job,
        &job.initial,
        &forward_constraints,
        ScanDirection::Forward,
        optimizer,
        config,
    )?;

    if forward.samples.is_empty() {
        // First forward step failed (or the forward sub-schedule was empty):
        // no usable output, and no backward chain is attempted.
        info!(scan_index = job.scan_index, "scan produced no forward samples");
        return Ok(ScanOutcome {
            scan_index: job.scan_index,
            folder: job.folder.clone(),
            trajectory: None,
            forward_failed: forward.failed,
            backward_failed: false,
            threshold_hit: forward.threshold_hit,
        });
    }

    // The first forward representative is already relaxed at the pivot
    // constraint; it seeds the backward chain.
    let backward_seed = forward.samples[0].0.clone();
    let backward = run_chain(
        job,
        &backward_seed,
        &backward_constraints,
        ScanDirection::Backward,
        optimizer,
        config,
    )?;

    let stitched: Vec<(Structure, f64)> = backward
        .samples
        .into_iter()
        .rev()
        .chain(forward.samples)
        .collect();
    let trajectory = Trajectory::from_samples(stitched);

    let trajectory_path = job.folder.join(TRAJECTORY_FILE);
    let mut writer = BufWriter::new(File::create(&trajectory_path)?);
    xyz::write_trajectory(
        &mut writer,
        trajectory.frames().iter().map(|f| (&f.structure, f.energy)),
    )?;
    writer.flush()?;

    info!(
        scan_index = job.scan_index,
        frames = trajectory.len(),
        forward_failed = forward.failed,
        backward_failed = backward.failed,
        "scan stitched"
    );

    Ok(ScanOutcome {
        scan_index: job.scan_index,
        folder: job.folder.clone(),
        trajectory: Some(trajectory),
        forward_failed: forward.failed,
        backward_failed: backward.failed,
        threshold_hit: forward.threshold_hit || backward.threshold_hit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::record::{FAILED_BACKWARD, FAILED_FORWARD};
    use crate::core::models::structure::Atom;
    use crate::engine::config::ScanConfigBuilder;
    use crate::engine::error::OptimizerError;
    use crate::engine::optimizer::{RelaxationLog, RelaxationSample};
    use std::sync::Mutex;

    fn probe() -> Structure {
        Structure::new(vec![
            Atom::new("H", 0.0, 0.0, 0.0),
            Atom::new("H", 1.0, 0.0, 0.0),
        ])
    }

    fn config() -> ScanConfig {
        ScanConfigBuilder::new()
            .opt_level("tight")
            .relax_level("vtight")
            .build()
            .unwrap()
    }

    /// Scripted engine: answers each call with the next programmed step and
    /// records the constraint distances it was asked to hold.
    struct ScriptedOptimizer {
        script: Mutex<Vec<RelaxationLog>>,
        seen_distances: Mutex<Vec<f64>>,
    }

    impl ScriptedOptimizer {
        fn new(script: Vec<RelaxationLog>) -> Self {
            Self {
                script: Mutex::new(script),
                seen_distances: Mutex::new(Vec::new()),
            }
        }

        fn ok(energies: &[f64]) -> RelaxationLog {
            RelaxationLog {
                status: 0,
                samples: energies
                    .iter()
                    .map(|&energy| RelaxationSample {
                        structure: probe(),
                        energy,
                    })
                    .collect(),
            }
        }

        fn fail() -> RelaxationLog {
            RelaxationLog {
                status: 1,
                samples: Vec::new(),
            }
        }
    }

    impl Optimizer for ScriptedOptimizer {
        fn relax(&self, request: &RelaxationRequest) -> Result<RelaxationLog, OptimizerError> {
            if let Some(c) = request.constraint {
                self.seen_distances.lock().unwrap().push(c.distance);
            }
            let mut script = self.script.lock().unwrap();
            assert!(!script.is_empty(), "engine called more often than scripted");
            Ok(script.remove(0))
        }
    }

    fn job(folder: &std::path::Path, pivot: usize, n: usize) -> ScanJob {
        ScanJob {
            scan_index: 0,
            initial: probe(),
            schedule: ConstraintSchedule::stretch(1, 2, 1.0, 1.0, n as f64, n, 1.0),
            pivot,
            folder: folder.to_path_buf(),
        }
    }

    #[test]
    fn stitched_trajectory_is_backward_reversed_then_forward() {
        let dir = tempfile::tempdir().unwrap();
        // Schedule distances 1..=5, pivot 2: forward holds 3,4,5 then the
        // backward chain holds 2,1.
        let optimizer = ScriptedOptimizer::new(vec![
            ScriptedOptimizer::ok(&[-1.0, -1.3]), // fwd step 0 -> rep -1.3
            ScriptedOptimizer::ok(&[-1.1]),       // fwd step 1
            ScriptedOptimizer::ok(&[-0.9]),       // fwd step 2
            ScriptedOptimizer::ok(&[-1.4]),       // bwd step 0
            ScriptedOptimizer::ok(&[-1.6]),       // bwd step 1
        ]);

        let outcome = run_scan(&job(dir.path(), 2, 5), &optimizer, &config()).unwrap();
        let trajectory = outcome.trajectory.unwrap();
        assert_eq!(trajectory.energies(), vec![-1.6, -1.4, -1.3, -1.1, -0.9]);
        assert!(!outcome.forward_failed && !outcome.backward_failed);
        assert_eq!(
            *optimizer.seen_distances.lock().unwrap(),
            vec![3.0, 4.0, 5.0, 2.0, 1.0]
        );

        // Stitched file round-trips with contiguous frames.
        let text = std::fs::read_to_string(dir.path().join(TRAJECTORY_FILE)).unwrap();
        assert_eq!(text.matches("energy:").count(), 5);
    }

    #[test]
    fn first_forward_step_failure_yields_no_output_and_no_backward_chain() {
        let dir = tempfile::tempdir().unwrap();
        let optimizer = ScriptedOptimizer::new(vec![ScriptedOptimizer::fail()]);

        let outcome = run_scan(&job(dir.path(), 1, 3), &optimizer, &config()).unwrap();
        assert!(outcome.trajectory.is_none());
        assert!(outcome.forward_failed);
        assert!(!outcome.backward_failed);
        assert!(dir.path().join(FAILED_FORWARD).exists());
        // All scripted steps consumed: the backward chain was never started.
        assert!(optimizer.script.lock().unwrap().is_empty());
    }

    #[test]
    fn mid_forward_failure_keeps_collected_steps_and_still_runs_backward() {
        let dir = tempfile::tempdir().unwrap();
        // pivot 1 of 4: forward steps 1,2,3 (fails at the 2nd), backward step 0.
        let optimizer = ScriptedOptimizer::new(vec![
            ScriptedOptimizer::ok(&[-1.0]),
            ScriptedOptimizer::fail(),
            ScriptedOptimizer::ok(&[-1.2]),
        ]);

        let outcome = run_scan(&job(dir.path(), 1, 4), &optimizer, &config()).unwrap();
        let trajectory = outcome.trajectory.unwrap();
        assert_eq!(trajectory.energies(), vec![-1.2, -1.0]);
        assert!(outcome.forward_failed);
        assert!(dir.path().join(FAILED_FORWARD).exists());
        assert!(!dir.path().join(FAILED_BACKWARD).exists());
    }

    #[test]
    fn energy_ceiling_stops_a_chain_without_a_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfigBuilder::new()
            .opt_level("tight")
            .relax_level("vtight")
            .energy_max(-0.5)
            .build()
            .unwrap();
        // Forward: first step fine, second exceeds the ceiling, third never
        // runs. Backward sub-schedule is empty (pivot 0).
        let optimizer = ScriptedOptimizer::new(vec![
            ScriptedOptimizer::ok(&[-1.0]),
            ScriptedOptimizer::ok(&[-0.2]),
        ]);

        let outcome = run_scan(&job(dir.path(), 0, 3), &optimizer, &config).unwrap();
        let trajectory = outcome.trajectory.unwrap();
        assert_eq!(trajectory.energies(), vec![-1.0, -0.2]);
        assert!(outcome.threshold_hit);
        assert!(!outcome.forward_failed);
        assert!(!dir.path().join(FAILED_FORWARD).exists());
    }

    #[test]
    fn backward_failure_is_marked_with_its_own_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let optimizer = ScriptedOptimizer::new(vec![
            ScriptedOptimizer::ok(&[-1.0]), // fwd (pivot 2 of 3 -> one fwd step)
            ScriptedOptimizer::fail(),      // bwd step 0 fails
        ]);

        let outcome = run_scan(&job(dir.path(), 2, 3), &optimizer, &config()).unwrap();
        assert!(outcome.backward_failed);
        assert!(!outcome.forward_failed);
        assert_eq!(outcome.trajectory.unwrap().energies(), vec![-1.0]);
        assert!(dir.path().join(FAILED_BACKWARD).exists());
    }

    #[test]
    fn representative_sample_is_the_lowest_energy_of_each_step_log() {
        let dir = tempfile::tempdir().unwrap();
        let optimizer = ScriptedOptimizer::new(vec![ScriptedOptimizer::ok(&[-0.5, -2.0, -1.0])]);
        let outcome = run_scan(&job(dir.path(), 0, 1), &optimizer, &config()).unwrap();
        assert_eq!(outcome.trajectory.unwrap().energies(), vec![-2.0]);
    }
}
