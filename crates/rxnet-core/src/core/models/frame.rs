use super::structure::Structure;
use serde::{Deserialize, Serialize};

/// One point along a scan: a relaxed structure, its energy, and its position
/// in the trajectory. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub index: usize,
    pub energy: f64,
    pub structure: Structure,
}

/// An ordered sequence of frames from one scan (forward, backward, or
/// stitched). Indices are contiguous from zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    frames: Vec<Frame>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a trajectory from (structure, energy) samples, assigning
    /// contiguous indices in order.
    pub fn from_samples(samples: impl IntoIterator<Item = (Structure, f64)>) -> Self {
        let frames = samples
            .into_iter()
            .enumerate()
            .map(|(index, (structure, energy))| Frame {
                index,
                energy,
                structure,
            })
            .collect();
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn energies(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.energy).collect()
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_samples_assigns_contiguous_indices() {
        let t = Trajectory::from_samples(vec![
            (Structure::default(), -1.0),
            (Structure::default(), -2.0),
            (Structure::default(), -1.5),
        ]);
        let indices: Vec<_> = t.frames().iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(t.energies(), vec![-1.0, -2.0, -1.5]);
    }

    #[test]
    fn empty_trajectory_reports_empty() {
        let t = Trajectory::new();
        assert!(t.is_empty());
        assert_eq!(t.frame(0), None);
    }
}
