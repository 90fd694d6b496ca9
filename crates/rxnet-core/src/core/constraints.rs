//! Constraint schedules for bond-stretching scans.
//!
//! A scan is driven by an ordered list of geometric restraints, applied one
//! at a time: each entry pins one interatomic distance with a harmonic
//! restraint of fixed force constant. Schedules are built from a bond (two
//! 1-based atom indices and a reference length) and a range of stretch
//! factors.

use serde::{Deserialize, Serialize};

/// One harmonic distance restraint: hold atoms `atom1`/`atom2` (1-based)
/// near `distance` with the given force constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub atom1: usize,
    pub atom2: usize,
    pub distance: f64,
    pub force_constant: f64,
}

/// An ordered constraint schedule, one restraint per relaxation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSchedule {
    steps: Vec<Constraint>,
}

impl ConstraintSchedule {
    pub fn new(steps: Vec<Constraint>) -> Self {
        Self { steps }
    }

    /// Builds a stretch schedule for a bond of reference length
    /// `bond_length`: `count` target distances spaced linearly between
    /// `low * bond_length` and `high * bond_length`.
    pub fn stretch(
        atom1: usize,
        atom2: usize,
        bond_length: f64,
        low: f64,
        high: f64,
        count: usize,
        force_constant: f64,
    ) -> Self {
        let steps = (0..count)
            .map(|i| {
                let t = if count > 1 {
                    i as f64 / (count - 1) as f64
                } else {
                    0.0
                };
                Constraint {
                    atom1,
                    atom2,
                    distance: (low + (high - low) * t) * bond_length,
                    force_constant,
                }
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[Constraint] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Splits the schedule at a pivot: the forward sub-schedule
    /// (`pivot..end`, in order) and the backward sub-schedule (`start..pivot`
    /// traversed in reverse).
    pub fn split_at_pivot(&self, pivot: usize) -> (Vec<Constraint>, Vec<Constraint>) {
        let pivot = pivot.min(self.steps.len());
        let forward = self.steps[pivot..].to_vec();
        let backward = self.steps[..pivot].iter().rev().cloned().collect();
        (forward, backward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretch_spans_the_requested_factor_range() {
        let s = ConstraintSchedule::stretch(1, 2, 1.5, 1.0, 3.0, 5, 0.5);
        assert_eq!(s.len(), 5);
        assert!((s.steps()[0].distance - 1.5).abs() < 1e-12);
        assert!((s.steps()[4].distance - 4.5).abs() < 1e-12);
        assert!((s.steps()[2].distance - 3.0).abs() < 1e-12);
        assert!(s.steps().iter().all(|c| c.force_constant == 0.5));
    }

    #[test]
    fn single_point_stretch_sits_at_the_low_factor() {
        let s = ConstraintSchedule::stretch(1, 2, 2.0, 1.2, 3.0, 1, 1.0);
        assert_eq!(s.len(), 1);
        assert!((s.steps()[0].distance - 2.4).abs() < 1e-12);
    }

    #[test]
    fn split_at_pivot_reverses_the_backward_branch() {
        let s = ConstraintSchedule::stretch(1, 2, 1.0, 1.0, 5.0, 5, 1.0);
        let (forward, backward) = s.split_at_pivot(2);
        let fwd: Vec<f64> = forward.iter().map(|c| c.distance).collect();
        let bwd: Vec<f64> = backward.iter().map(|c| c.distance).collect();
        assert_eq!(fwd, vec![3.0, 4.0, 5.0]);
        assert_eq!(bwd, vec![2.0, 1.0]);
    }

    #[test]
    fn split_at_out_of_range_pivot_yields_empty_forward_branch() {
        let s = ConstraintSchedule::stretch(1, 2, 1.0, 1.0, 2.0, 3, 1.0);
        let (forward, backward) = s.split_at_pivot(10);
        assert!(forward.is_empty());
        assert_eq!(backward.len(), 3);
    }
}
