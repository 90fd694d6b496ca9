use crate::core::io::tables;
use crate::engine::catalog::SpeciesCatalog;
use crate::engine::config::NetworkConfig;
use crate::engine::error::EngineError;
use crate::engine::network::{NetworkBuildReport, ReactionNetworkBuilder};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::store::{LoadReport, PathwayStore, Reparser};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const SPECIES_TABLE: &str = "species.csv";
pub const SUMMARY_TABLE: &str = "reactions.csv";
pub const DETAIL_TABLE: &str = "reactions_detail.csv";

/// Inputs to one network assembly pass over a results tree.
pub struct NetworkRequest<'a> {
    /// Results root holding `reactions/` and the store snapshot.
    pub root: &'a Path,
    /// Seed species to expand from. Empty means expand everything, highest
    /// catalog energy first.
    pub seeds: Vec<String>,
    pub config: NetworkConfig,
    /// Optional identifier hook applied to newly loaded records.
    pub reparser: Option<&'a Reparser<'a>>,
}

#[derive(Debug)]
pub struct NetworkResult {
    pub species_table: PathBuf,
    pub summary_table: PathBuf,
    pub detail_table: PathBuf,
    pub load: LoadReport,
    pub build: NetworkBuildReport,
}

/// Loads every stored pathway, assembles the species catalog and the
/// reaction network, and exports the three result tables under the root.
///
/// The store snapshot is refreshed before assembly, so an interrupted or
/// extended batch picks up exactly where it left off.
#[instrument(skip_all, name = "network_workflow")]
pub fn run(
    request: &NetworkRequest,
    reporter: &ProgressReporter,
) -> Result<NetworkResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Loading Pathways",
    });
    let mut store = PathwayStore::open(request.root)?;
    let load = store.load(request.reparser)?;
    store.flush()?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Species Catalog",
    });
    let catalog = SpeciesCatalog::build(store.records(), request.config.id_variant)?;
    info!(species = catalog.len(), "species catalog built");

    let species_table = request.root.join(SPECIES_TABLE);
    let entries: Vec<_> = catalog.entries_by_energy().into_iter().cloned().collect();
    tables::write_species_table(&species_table, &entries)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Network Expansion",
    });
    let seeds = if request.seeds.is_empty() {
        catalog.identifiers_by_energy_descending()
    } else {
        request.seeds.clone()
    };
    let builder = ReactionNetworkBuilder::new(store.records(), &catalog, request.config);
    let build = builder.build(&seeds);
    for seed in &build.missing_seeds {
        reporter.report(Progress::Message(format!(
            "seed species '{seed}' not found in the catalog"
        )));
    }
    // One absent seed leaves the others intact, but an explicitly requested
    // seed set with no catalog member at all yields an empty expansion.
    if !request.seeds.is_empty() && build.missing_seeds.len() == seeds.len() {
        return Err(EngineError::MissingReactant {
            identifier: build.missing_seeds[0].clone(),
        });
    }

    let summary_table = request.root.join(SUMMARY_TABLE);
    let detail_table = request.root.join(DETAIL_TABLE);
    tables::write_network_summary(&summary_table, &build.network.summary)?;
    tables::write_network_detail(&detail_table, &build.network.detail)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        species = catalog.len(),
        reactions = build.network.summary.len(),
        missing_seeds = build.missing_seeds.len(),
        "network workflow finished"
    );
    Ok(NetworkResult {
        species_table,
        summary_table,
        detail_table,
        load,
        build,
    })
}
