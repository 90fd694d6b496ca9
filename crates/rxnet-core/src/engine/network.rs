use crate::core::models::network::{
    ReactionDetailRow, ReactionEdge, ReactionNetwork, ReactionSummaryRow,
};
use crate::core::models::pathway::PathwayRecord;
use crate::engine::catalog::SpeciesCatalog;
use crate::engine::config::{ArtifactPolicy, NetworkConfig, RankingKey};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Result of one network build: the assembled tables plus diagnostics.
#[derive(Debug)]
pub struct NetworkBuildReport {
    pub network: ReactionNetwork,
    /// Candidate edges discarded because their transition-state energy did
    /// not exceed both endpoints (or no interior maximum existed).
    pub artifact_edges_dropped: usize,
    /// Requested seeds absent from the catalog. Fatal for those seeds only.
    pub missing_seeds: Vec<String>,
    /// Species expanded, in processing order.
    pub visited: Vec<String>,
}

/// Assembles the reaction network by layered breadth-first expansion over
/// the species catalog.
pub struct ReactionNetworkBuilder<'a> {
    records: &'a [PathwayRecord],
    catalog: &'a SpeciesCatalog,
    config: NetworkConfig,
}

impl<'a> ReactionNetworkBuilder<'a> {
    pub fn new(
        records: &'a [PathwayRecord],
        catalog: &'a SpeciesCatalog,
        config: NetworkConfig,
    ) -> Self {
        Self {
            records,
            catalog,
            config,
        }
    }

    fn key(&self, edge: &ReactionEdge) -> f64 {
        match self.config.ranking {
            RankingKey::TsEnergy => edge.ts_energy,
            RankingKey::Barrier => edge.barrier,
            RankingKey::DeltaE => edge.delta_e,
            RankingKey::LocalDeltaE => edge.local_delta_e,
        }
    }

    /// Emits a candidate edge for one (reactant occurrence, product
    /// occurrence) pair, or `None` when the candidate is an artifact under
    /// the configured policy.
    fn candidate_edge(
        &self,
        record: &PathwayRecord,
        ids: &[String],
        reactant: &str,
        i: usize,
        j: usize,
        artifacts: &mut usize,
    ) -> Option<ReactionEdge> {
        let energies = &record.energies;
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };

        // Transition state: maximum strictly between the two occurrences.
        // Adjacent occurrences have no interior and thus no real barrier.
        if hi <= lo + 1 {
            *artifacts += 1;
            return None;
        }
        let mut tspos = lo + 1;
        for k in lo + 2..hi {
            if energies[k] > energies[tspos] {
                tspos = k;
            }
        }
        let ts = energies[tspos];

        if ts <= energies[i] || ts <= energies[j] {
            // Scan artifact with no real barrier.
            *artifacts += 1;
            if self.config.artifact_policy == ArtifactPolicy::Drop {
                debug!(
                    folder = %record.folder,
                    reactant_index = record.stretch_points[i],
                    product_index = record.stretch_points[j],
                    "artifact edge dropped"
                );
                return None;
            }
        }

        let product = &ids[j];
        let reactant_catalog_energy = self.catalog.energy(reactant)?;
        let product_catalog_energy = self.catalog.energy(product)?;

        Some(ReactionEdge {
            reactant: reactant.to_string(),
            product: product.clone(),
            ts_energy: ts,
            barrier: ts - energies[i],
            delta_e: product_catalog_energy - reactant_catalog_energy,
            local_delta_e: energies[j] - energies[i],
            ts_index: record.stretch_points[tspos],
            reactant_index: record.stretch_points[i],
            product_index: record.stretch_points[j],
            folder: record.folder.clone(),
            scan_index: record.scan_index(),
        })
    }

    /// Generates every candidate edge leaving `reactant`: for each stable
    /// occurrence of the reactant in each pathway, every later and every
    /// earlier stable occurrence whose identifier is not excluded.
    fn edges_from(
        &self,
        reactant: &str,
        exclude: &HashSet<&str>,
        artifacts: &mut usize,
    ) -> Vec<ReactionEdge> {
        let mut edges = Vec::new();
        for record in self.records {
            let Some(ids) = record.ids(self.catalog.variant()) else {
                continue;
            };
            for i in 0..record.len() {
                if !record.is_stable[i] || ids[i] != reactant {
                    continue;
                }
                let partner = |j: usize| record.is_stable[j] && !exclude.contains(ids[j].as_str());
                for j in (i + 1..record.len()).filter(|&j| partner(j)) {
                    edges.extend(self.candidate_edge(record, ids, reactant, i, j, artifacts));
                }
                for j in (0..i).rev().filter(|&j| partner(j)) {
                    edges.extend(self.candidate_edge(record, ids, reactant, i, j, artifacts));
                }
            }
        }
        edges
    }

    /// Layered breadth-first expansion from the given seed species.
    ///
    /// Reaction ids are assigned once, sequentially, in discovery order and
    /// are never reused for a different (reactant, product) pair within one
    /// run. Previously-unseen destinations enter the frontier exactly once.
    pub fn build(&self, seeds: &[String]) -> NetworkBuildReport {
        let mut todo: VecDeque<String> = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();
        let mut done: HashSet<String> = HashSet::new();
        let mut missing_seeds = Vec::new();

        for seed in seeds {
            if !self.catalog.contains(seed) {
                warn!(seed = %seed, "seed species absent from catalog");
                missing_seeds.push(seed.clone());
                continue;
            }
            if queued.insert(seed.clone()) {
                todo.push_back(seed.clone());
            }
        }

        let mut network = ReactionNetwork::default();
        let mut visited = Vec::new();
        let mut artifacts = 0usize;
        let mut next_id: u32 = 1;

        while let Some(current) = todo.pop_front() {
            queued.remove(&current);

            let exclude: HashSet<&str> = done
                .iter()
                .chain(queued.iter())
                .map(String::as_str)
                .chain(std::iter::once(current.as_str()))
                .collect();
            let edges = self.edges_from(&current, &exclude, &mut artifacts);

            // Destinations ordered by the best (ascending) ranking key among
            // their edges.
            let mut destinations: Vec<String> = Vec::new();
            for edge in &edges {
                if !destinations.contains(&edge.product) {
                    destinations.push(edge.product.clone());
                }
            }
            destinations.sort_by(|a, b| {
                let best = |dest: &str| {
                    edges
                        .iter()
                        .filter(|e| e.product == dest)
                        .map(|e| self.key(e))
                        .fold(f64::INFINITY, f64::min)
                };
                best(a).total_cmp(&best(b))
            });

            if destinations.is_empty() {
                debug!(species = %current, "no outgoing reactions");
                done.insert(current.clone());
                visited.push(current);
                continue;
            }

            for destination in destinations {
                let mut alternates: Vec<&ReactionEdge> =
                    edges.iter().filter(|e| e.product == destination).collect();
                alternates.sort_by(|a, b| a.ts_energy.total_cmp(&b.ts_energy));

                let representative = alternates
                    .iter()
                    .copied()
                    .min_by(|a, b| self.key(a).total_cmp(&self.key(b)))
                    .expect("destination has at least one edge");

                let (delta_e, delta_e_ts) = if self.config.ranking.is_local() {
                    (representative.local_delta_e, representative.barrier)
                } else {
                    let reactant_energy = self
                        .catalog
                        .energy(&current)
                        .expect("expanded species is cataloged");
                    (
                        representative.delta_e,
                        representative.ts_energy - reactant_energy,
                    )
                };

                let reaction_id = next_id;
                next_id += 1;

                network.summary.push(ReactionSummaryRow {
                    reaction_id,
                    reactant: current.clone(),
                    product: destination.clone(),
                    delta_e,
                    delta_e_ts,
                    pathway: representative.folder.clone(),
                    ts_index: representative.ts_index,
                    scan_index: representative.scan_index,
                });
                for (rank, edge) in alternates.iter().enumerate() {
                    network.detail.push(ReactionDetailRow {
                        reaction_id,
                        rank: rank as u32 + 1,
                        ts_energy: edge.ts_energy,
                        barrier: edge.barrier,
                        ts_index: edge.ts_index,
                        reactant_index: edge.reactant_index,
                        product_index: edge.product_index,
                        pathway: edge.folder.clone(),
                        scan_index: edge.scan_index,
                    });
                }

                if !done.contains(&destination) && queued.insert(destination.clone()) {
                    todo.push_back(destination);
                }
            }

            done.insert(current.clone());
            visited.push(current);
        }

        info!(
            reactions = network.summary.len(),
            alternates = network.detail.len(),
            artifacts,
            "reaction network assembled"
        );
        NetworkBuildReport {
            network,
            artifact_edges_dropped: artifacts,
            missing_seeds,
            visited,
        }
    }
}
