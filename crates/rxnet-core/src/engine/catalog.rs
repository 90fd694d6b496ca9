use crate::core::io::record::stable_file_name;
use crate::core::models::pathway::{IdVariant, PathwayRecord};
use crate::core::models::species::SpeciesEntry;
use crate::engine::error::EngineError;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Deduplicated table of stable species across all pathways, keyed by one
/// canonical-identifier variant. Collisions keep the lower-energy
/// occurrence; first seen wins ties.
#[derive(Debug, Default)]
pub struct SpeciesCatalog {
    entries: HashMap<String, SpeciesEntry>,
    variant: IdVariant,
}

impl SpeciesCatalog {
    /// Folds the stable stretch points of every record into a catalog.
    ///
    /// Fails with [`EngineError::EmptyCatalog`] if, after processing the
    /// whole batch, zero species remain.
    pub fn build(records: &[PathwayRecord], variant: IdVariant) -> Result<Self, EngineError> {
        let mut catalog = Self {
            entries: HashMap::new(),
            variant,
        };

        for record in records {
            let Some(ids) = record.ids(variant) else {
                warn!(
                    folder = %record.folder,
                    "record lacks the requested identifier variant, skipping"
                );
                continue;
            };
            for (k, id) in ids.iter().enumerate() {
                if !record.is_stable[k] {
                    continue;
                }
                let index = record.stretch_points[k];
                let candidate = SpeciesEntry {
                    identifier: id.clone(),
                    energy: record.energies[k],
                    structure_path: Path::new(&record.folder).join(stable_file_name(index)),
                    stretch_index: index,
                };
                catalog
                    .entries
                    .entry(id.clone())
                    .and_modify(|existing| existing.fold(candidate.clone()))
                    .or_insert(candidate);
            }
        }

        if catalog.entries.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }
        info!(species = catalog.entries.len(), "species catalog built");
        Ok(catalog)
    }

    pub fn variant(&self) -> IdVariant {
        self.variant
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<&SpeciesEntry> {
        self.entries.get(identifier)
    }

    pub fn energy(&self, identifier: &str) -> Option<f64> {
        self.entries.get(identifier).map(|e| e.energy)
    }

    /// All entries, sorted ascending by energy (ties broken by identifier
    /// for a deterministic export order).
    pub fn entries_by_energy(&self) -> Vec<&SpeciesEntry> {
        let mut entries: Vec<&SpeciesEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            a.energy
                .total_cmp(&b.energy)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        entries
    }

    /// Identifiers sorted descending by energy: the seed order used when
    /// expanding the network from every species at once.
    pub fn identifiers_by_energy_descending(&self) -> Vec<String> {
        self.entries_by_energy()
            .into_iter()
            .rev()
            .map(|e| e.identifier.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn record(folder: &str, ids: Vec<&str>, energies: Vec<f64>, stable: Vec<bool>) -> PathwayRecord {
        let ids: Vec<String> = ids.into_iter().map(String::from).collect();
        let points = (0..ids.len()).map(|i| i * 2).collect();
        PathwayRecord {
            energies,
            ids_stereo: ids.clone(),
            ids_plain: ids,
            ids_reparsed: None,
            is_stable: stable,
            stretch_points: points,
            folder: folder.into(),
            metadata: Map::new(),
        }
    }

    #[test]
    fn lower_energy_occurrence_wins_regardless_of_order() {
        let a = record("reactions/0000", vec!["A"], vec![-1.0], vec![true]);
        let b = record("reactions/0001", vec!["A"], vec![-2.0], vec![true]);

        for records in [[a.clone(), b.clone()], [b, a]] {
            let catalog = SpeciesCatalog::build(&records, IdVariant::NonStereo).unwrap();
            assert_eq!(catalog.len(), 1);
            assert_eq!(catalog.energy("A"), Some(-2.0));
            assert_eq!(
                catalog.get("A").unwrap().structure_path,
                Path::new("reactions/0001").join("stable_0000.xyz")
            );
        }
    }

    #[test]
    fn transition_points_never_enter_the_catalog() {
        let r = record(
            "reactions/0000",
            vec!["A", "X", "B"],
            vec![-1.0, 0.5, -0.8],
            vec![true, false, true],
        );
        let catalog = SpeciesCatalog::build(&[r], IdVariant::NonStereo).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.contains("X"));
    }

    #[test]
    fn batch_with_no_stable_points_is_an_empty_catalog() {
        let r = record("reactions/0000", vec!["X"], vec![0.5], vec![false]);
        assert!(matches!(
            SpeciesCatalog::build(&[r], IdVariant::NonStereo),
            Err(EngineError::EmptyCatalog)
        ));
    }

    #[test]
    fn entries_are_exported_ascending_and_seeds_descending() {
        let r = record(
            "reactions/0000",
            vec!["A", "B", "C"],
            vec![-1.0, -3.0, -2.0],
            vec![true, true, true],
        );
        let catalog = SpeciesCatalog::build(&[r], IdVariant::NonStereo).unwrap();
        let ascending: Vec<&str> = catalog
            .entries_by_energy()
            .into_iter()
            .map(|e| e.identifier.as_str())
            .collect();
        assert_eq!(ascending, vec!["B", "C", "A"]);
        assert_eq!(
            catalog.identifiers_by_energy_descending(),
            vec!["A", "C", "B"]
        );
    }

    #[test]
    fn missing_reparsed_column_skips_the_record_not_the_batch() {
        let with = record("reactions/0000", vec!["A"], vec![-1.0], vec![true]);
        let mut with = with;
        with.ids_reparsed = Some(vec!["A'".into()]);
        let without = record("reactions/0001", vec!["B"], vec![-2.0], vec![true]);

        let catalog = SpeciesCatalog::build(&[with, without], IdVariant::Reparsed).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("A'"));
    }
}
