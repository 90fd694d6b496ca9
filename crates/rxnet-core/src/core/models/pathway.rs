use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Classification of a stretch point on the potential-surface walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stability {
    /// Local energy minimum; re-relaxed without scan constraints.
    Stable,
    /// Local energy maximum between two minima; kept as scanned.
    Transition,
}

/// An index into a trajectory flagged stable or transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StretchPoint {
    pub index: usize,
    pub stability: Stability,
}

/// Which canonical-identifier column of a [`PathwayRecord`] to key on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdVariant {
    /// Connectivity only, stereochemistry ignored.
    #[default]
    NonStereo,
    /// Stereo-resolved identifiers.
    Stereo,
    /// Caller-supplied re-parsed identifiers (e.g. with atoms excluded).
    Reparsed,
}

/// One scan job's distilled result: the ordered stretch points of its
/// trajectory with per-point energies, identifiers, and stability flags.
///
/// Owned exclusively by the job that produced it and immutable after
/// persistence; the only field rewritten later is `folder`, which the store
/// overwrites on load so records survive folder renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayRecord {
    /// Per-point energies (re-relaxed for stable points, as-scanned for
    /// transitions).
    pub energies: Vec<f64>,
    /// Stereo-resolved canonical identifiers, parallel to `energies`.
    pub ids_stereo: Vec<String>,
    /// Non-stereo canonical identifiers, parallel to `energies`.
    pub ids_plain: Vec<String>,
    /// Re-parsed identifiers filled in by the store's reparser hook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids_reparsed: Option<Vec<String>>,
    /// Stability flags, parallel to `energies`.
    pub is_stable: Vec<bool>,
    /// Trajectory indices of the stretch points, strictly increasing.
    pub stretch_points: Vec<usize>,
    /// Source folder identity.
    pub folder: String,
    /// Arbitrary caller metadata (e.g. originating scan index).
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl PathwayRecord {
    /// Number of stretch points.
    pub fn len(&self) -> usize {
        self.stretch_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stretch_points.is_empty()
    }

    /// The identifier column for `variant`, if present.
    pub fn ids(&self, variant: IdVariant) -> Option<&[String]> {
        match variant {
            IdVariant::NonStereo => Some(&self.ids_plain),
            IdVariant::Stereo => Some(&self.ids_stereo),
            IdVariant::Reparsed => self.ids_reparsed.as_deref(),
        }
    }

    /// The ordered stretch points with their stability flags.
    pub fn points(&self) -> impl Iterator<Item = StretchPoint> + '_ {
        self.stretch_points
            .iter()
            .zip(&self.is_stable)
            .map(|(&index, &stable)| StretchPoint {
                index,
                stability: if stable {
                    Stability::Stable
                } else {
                    Stability::Transition
                },
            })
    }

    /// Checks the structural invariants: parallel columns have equal length
    /// and stretch-point indices are strictly increasing.
    pub fn is_consistent(&self) -> bool {
        let n = self.stretch_points.len();
        if self.energies.len() != n
            || self.ids_stereo.len() != n
            || self.ids_plain.len() != n
            || self.is_stable.len() != n
        {
            return false;
        }
        if let Some(reparsed) = &self.ids_reparsed {
            if reparsed.len() != n {
                return false;
            }
        }
        self.stretch_points.windows(2).all(|w| w[0] < w[1])
    }

    /// The originating scan index, when the producer recorded one.
    pub fn scan_index(&self) -> Option<i64> {
        self.metadata.get("scan_index").and_then(Value::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn record(
        energies: Vec<f64>,
        ids: Vec<&str>,
        stable: Vec<bool>,
        points: Vec<usize>,
    ) -> PathwayRecord {
        let ids: Vec<String> = ids.into_iter().map(String::from).collect();
        PathwayRecord {
            energies,
            ids_stereo: ids.clone(),
            ids_plain: ids,
            ids_reparsed: None,
            is_stable: stable,
            stretch_points: points,
            folder: "reactions/0000".into(),
            metadata: Map::new(),
        }
    }

    #[test]
    fn consistent_record_passes_invariant_check() {
        let r = record(
            vec![-1.0, -0.5, -0.9],
            vec!["A", "X", "B"],
            vec![true, false, true],
            vec![0, 3, 6],
        );
        assert!(r.is_consistent());
    }

    #[test]
    fn non_increasing_indices_fail_invariant_check() {
        let r = record(
            vec![-1.0, -0.5],
            vec!["A", "B"],
            vec![true, true],
            vec![3, 3],
        );
        assert!(!r.is_consistent());
    }

    #[test]
    fn mismatched_column_lengths_fail_invariant_check() {
        let mut r = record(
            vec![-1.0, -0.5],
            vec!["A", "B"],
            vec![true, true],
            vec![0, 1],
        );
        r.energies.pop();
        assert!(!r.is_consistent());
    }

    #[test]
    fn points_expose_stability_flags() {
        let r = record(
            vec![-1.0, -0.5, -0.9],
            vec!["A", "X", "B"],
            vec![true, false, true],
            vec![0, 3, 6],
        );
        let points: Vec<_> = r.points().collect();
        assert_eq!(points[1].index, 3);
        assert_eq!(points[1].stability, Stability::Transition);
        assert_eq!(points[2].stability, Stability::Stable);
    }

    #[test]
    fn reparsed_column_is_selected_by_variant() {
        let mut r = record(vec![-1.0], vec!["A"], vec![true], vec![0]);
        assert!(r.ids(IdVariant::Reparsed).is_none());
        r.ids_reparsed = Some(vec!["A'".into()]);
        assert_eq!(r.ids(IdVariant::Reparsed).unwrap(), ["A'".to_string()]);
    }
}
