use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The best-known occurrence of one chemical species across all pathways.
///
/// Mutated only during catalog aggregation, and only monotonically: the
/// stored energy never increases once set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesEntry {
    /// Canonical identifier the entry is keyed by.
    pub identifier: String,
    /// Lowest energy observed for this species.
    pub energy: f64,
    /// Structure file of the lowest-energy occurrence.
    pub structure_path: PathBuf,
    /// Stretch index of the lowest-energy occurrence within its trajectory.
    pub stretch_index: usize,
}

impl SpeciesEntry {
    /// Folds in another occurrence, keeping the lower-energy one.
    /// First-seen wins ties.
    pub fn fold(&mut self, other: SpeciesEntry) {
        if other.energy < self.energy {
            *self = other;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(energy: f64, index: usize) -> SpeciesEntry {
        SpeciesEntry {
            identifier: "A".into(),
            energy,
            structure_path: PathBuf::from(format!("stable_{index:04}.xyz")),
            stretch_index: index,
        }
    }

    #[test]
    fn fold_keeps_lower_energy_occurrence() {
        let mut e = entry(-1.0, 2);
        e.fold(entry(-2.0, 5));
        assert_eq!(e.energy, -2.0);
        assert_eq!(e.stretch_index, 5);
    }

    #[test]
    fn fold_is_monotone_and_first_seen_wins_ties() {
        let mut e = entry(-2.0, 2);
        e.fold(entry(-1.0, 5));
        assert_eq!(e.stretch_index, 2);
        e.fold(entry(-2.0, 9));
        assert_eq!(e.stretch_index, 2);
    }
}
