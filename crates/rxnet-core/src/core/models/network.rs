use serde::{Deserialize, Serialize};

/// One candidate reaction extracted from a single pathway: a stable reactant
/// occurrence connected to a stable product occurrence over an interior
/// energy maximum.
///
/// Derived and recomputable from [`super::pathway::PathwayRecord`]s; never
/// persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEdge {
    pub reactant: String,
    pub product: String,
    /// Transition-state energy: maximum strictly between the occurrences.
    pub ts_energy: f64,
    /// `ts_energy` minus the reactant occurrence energy.
    pub barrier: f64,
    /// Product catalog energy minus reactant catalog energy.
    pub delta_e: f64,
    /// Product occurrence energy minus reactant occurrence energy
    /// (pathway-local, ignores the catalog).
    pub local_delta_e: f64,
    /// Trajectory index of the transition state within the owning pathway.
    pub ts_index: usize,
    /// Trajectory index of the reactant occurrence.
    pub reactant_index: usize,
    /// Trajectory index of the product occurrence.
    pub product_index: usize,
    /// Folder of the owning pathway.
    pub folder: String,
    /// Originating scan index of the owning pathway, when recorded.
    pub scan_index: Option<i64>,
}

/// One row per assigned reaction id: the representative edge under the
/// configured ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionSummaryRow {
    pub reaction_id: u32,
    pub reactant: String,
    pub product: String,
    /// Reaction energy under the active ranking mode (catalog-referenced or
    /// pathway-local).
    pub delta_e: f64,
    /// Barrier height under the active ranking mode.
    pub delta_e_ts: f64,
    pub pathway: String,
    pub ts_index: usize,
    pub scan_index: Option<i64>,
}

/// One row per alternate pathway sharing a reaction id, sorted ascending by
/// transition-state energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionDetailRow {
    pub reaction_id: u32,
    /// 1-based rank among alternates of the same reaction id.
    pub rank: u32,
    pub ts_energy: f64,
    pub barrier: f64,
    pub ts_index: usize,
    pub reactant_index: usize,
    pub product_index: usize,
    pub pathway: String,
    pub scan_index: Option<i64>,
}

/// The assembled reaction network: a summary table keyed by reaction id and
/// a detail table listing every alternate pathway per id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionNetwork {
    pub summary: Vec<ReactionSummaryRow>,
    pub detail: Vec<ReactionDetailRow>,
}

impl ReactionNetwork {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }

    /// All detail rows sharing `reaction_id`, in rank order.
    pub fn alternates(&self, reaction_id: u32) -> impl Iterator<Item = &ReactionDetailRow> {
        self.detail
            .iter()
            .filter(move |row| row.reaction_id == reaction_id)
    }
}
