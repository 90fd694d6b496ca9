use crate::core::io::record::{stable_file_name, ts_file_name};
use crate::core::io::xyz;
use crate::core::models::frame::Trajectory;
use crate::core::models::pathway::{PathwayRecord, Stability};
use crate::engine::config::ScanConfig;
use crate::engine::error::EngineError;
use crate::engine::optimizer::{Canonicalizer, Optimizer, RelaxationRequest};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

/// Input to one segmentation pass: the stitched trajectory and its parallel
/// canonical-identifier sequences.
#[derive(Debug)]
pub struct SegmentRequest<'a> {
    pub trajectory: &'a Trajectory,
    pub ids_stereo: &'a [String],
    pub ids_plain: &'a [String],
    /// Job folder the stable/transition structures are persisted into.
    pub folder: &'a Path,
    /// Caller metadata copied into the record (e.g. originating scan index).
    pub metadata: Map<String, Value>,
}

/// The potential-surface walk accumulated in one pass: stretch-point indices
/// with their flags, kept in a single structure rather than parallel lists.
#[derive(Debug, Default)]
struct SurfaceWalk {
    points: Vec<(usize, Stability)>,
}

/// Partitions the trajectory into maximal runs of identical non-stereo
/// identifier. Boundaries fall exactly where the identifier changes between
/// consecutive frames; each region is a half-open index range.
fn identifier_regions(ids: &[String]) -> Vec<(usize, usize)> {
    let mut regions = Vec::new();
    let mut start = 0;
    for i in 1..ids.len() {
        if ids[i] != ids[i - 1] {
            regions.push((start, i));
            start = i;
        }
    }
    if !ids.is_empty() {
        regions.push((start, ids.len()));
    }
    regions
}

/// Index of the first minimum of `energies[start..end]`, absolute.
fn region_minimum(energies: &[f64], start: usize, end: usize) -> usize {
    let mut best = start;
    for i in start + 1..end {
        if energies[i] < energies[best] {
            best = i;
        }
    }
    best
}

/// A candidate is accepted only if it is a strict local minimum of the whole
/// trajectory: neither immediate neighbor has lower energy.
fn is_global_local_minimum(energies: &[f64], index: usize) -> bool {
    if index > 0 && energies[index - 1] < energies[index] {
        return false;
    }
    if index + 1 < energies.len() && energies[index + 1] < energies[index] {
        return false;
    }
    true
}

fn build_surface_walk(energies: &[f64], ids_plain: &[String]) -> Option<SurfaceWalk> {
    let accepted: Vec<usize> = identifier_regions(ids_plain)
        .into_iter()
        .map(|(start, end)| region_minimum(energies, start, end))
        .filter(|&imin| is_global_local_minimum(energies, imin))
        .collect();

    if accepted.is_empty() {
        return None;
    }

    // The trajectory endpoints are always part of the surface; interior
    // maxima between an endpoint and the nearest accepted minimum are still
    // picked up below.
    let mut minima = accepted;
    minima.push(0);
    minima.push(energies.len() - 1);
    minima.sort_unstable();
    minima.dedup();

    let mut walk = SurfaceWalk::default();
    walk.points.push((minima[0], Stability::Stable));
    for k in 1..minima.len() {
        let (a, b) = (minima[k - 1], minima[k]);
        // Maximum over the open interval (a, b); adjacent minima are
        // directly connected with no transition point.
        if b > a + 1 {
            let mut imax = a + 1;
            for i in a + 2..b {
                if energies[i] > energies[imax] {
                    imax = i;
                }
            }
            walk.points.push((imax, Stability::Transition));
        }
        walk.points.push((b, Stability::Stable));
    }
    Some(walk)
}

/// Classifies a stitched trajectory into stable minima and transition
/// maxima, re-relaxes the stable structures, persists every surface point
/// into the job folder, and emits the pathway record.
///
/// A trajectory with zero accepted stable minima is a non-fatal
/// [`EngineError::SegmentationDegenerate`]: the pathway is excluded and the
/// batch continues.
pub fn segment_trajectory(
    request: &SegmentRequest,
    optimizer: &dyn Optimizer,
    canonicalizer: &dyn Canonicalizer,
    config: &ScanConfig,
) -> Result<PathwayRecord, EngineError> {
    let energies = request.trajectory.energies();
    let walk = build_surface_walk(&energies, request.ids_plain).ok_or_else(|| {
        EngineError::SegmentationDegenerate {
            folder: request.folder.to_path_buf(),
        }
    })?;

    let mut record = PathwayRecord {
        energies: Vec::with_capacity(walk.points.len()),
        ids_stereo: Vec::with_capacity(walk.points.len()),
        ids_plain: Vec::with_capacity(walk.points.len()),
        ids_reparsed: None,
        is_stable: Vec::with_capacity(walk.points.len()),
        stretch_points: Vec::with_capacity(walk.points.len()),
        folder: request.folder.display().to_string(),
        metadata: request.metadata.clone(),
    };

    for &(index, stability) in &walk.points {
        let frame = request
            .trajectory
            .frame(index)
            .expect("surface walk index within trajectory bounds");

        match stability {
            Stability::Stable => {
                // Re-relax the isolated structure without the scan
                // constraint at the tight level.
                let log = optimizer.relax(&RelaxationRequest {
                    structure: &frame.structure,
                    constraint: None,
                    level: &config.relax_level,
                    wall: config.wall.as_deref(),
                })?;

                let path = request.folder.join(stable_file_name(index));
                match log.lowest() {
                    Some(relaxed) if log.succeeded() => {
                        xyz::write_structure_file(&path, &relaxed.structure, relaxed.energy)?;
                        record
                            .ids_stereo
                            .push(canonicalizer.canonicalize(&relaxed.structure, true, &[])?);
                        record
                            .ids_plain
                            .push(canonicalizer.canonicalize(&relaxed.structure, false, &[])?);
                        record.energies.push(relaxed.energy);
                    }
                    _ => {
                        // Re-relaxation failed; keep the as-scanned point
                        // rather than losing the pathway.
                        warn!(
                            index,
                            status = log.status,
                            "stable-point re-relaxation failed, keeping scanned frame"
                        );
                        xyz::write_structure_file(&path, &frame.structure, frame.energy)?;
                        record.ids_stereo.push(request.ids_stereo[index].clone());
                        record.ids_plain.push(request.ids_plain[index].clone());
                        record.energies.push(frame.energy);
                    }
                }
                record.is_stable.push(true);
            }
            Stability::Transition => {
                let path = request.folder.join(ts_file_name(index));
                xyz::write_structure_file(&path, &frame.structure, frame.energy)?;
                record.ids_stereo.push(request.ids_stereo[index].clone());
                record.ids_plain.push(request.ids_plain[index].clone());
                record.energies.push(frame.energy);
                record.is_stable.push(false);
            }
        }
        record.stretch_points.push(index);
    }

    debug!(
        points = record.len(),
        folder = %request.folder.display(),
        "trajectory segmented"
    );
    Ok(record)
}
