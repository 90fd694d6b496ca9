use crate::cli::{IdColumn, NetworkArgs, Ranking};
use crate::config::Settings;
use crate::error::{CliError, Result};
use rxnet::core::models::pathway::IdVariant;
use rxnet::core::models::structure::Structure;
use rxnet::engine::config::{ArtifactPolicy, NetworkConfig, RankingKey};
use rxnet::engine::error::CanonicalizeError;
use rxnet::engine::optimizer::Canonicalizer;
use rxnet::engine::progress::{Progress, ProgressReporter};
use rxnet::workflows::network::{self, NetworkRequest};

pub fn run(args: NetworkArgs) -> Result<()> {
    let reparse = build_reparser(&args)?;

    let id_variant = if reparse.is_some() {
        IdVariant::Reparsed
    } else {
        match args.ids {
            IdColumn::Plain => IdVariant::NonStereo,
            IdColumn::Stereo => IdVariant::Stereo,
        }
    };
    let ranking = match args.ranking {
        Ranking::TsEnergy => RankingKey::TsEnergy,
        Ranking::Barrier => RankingKey::Barrier,
        Ranking::DeltaE => RankingKey::DeltaE,
        Ranking::LocalDeltaE => RankingKey::LocalDeltaE,
    };
    let policy = if args.keep_artifacts {
        ArtifactPolicy::Keep
    } else {
        ArtifactPolicy::Drop
    };

    let config = NetworkConfig::new()
        .with_id_variant(id_variant)
        .with_ranking(ranking)
        .with_artifact_policy(policy);

    let reporter = ProgressReporter::with_callback(Box::new(progress_line));
    let request = NetworkRequest {
        root: &args.results,
        seeds: args.seeds.clone(),
        config,
        reparser: reparse.as_deref(),
    };
    let result = network::run(&request, &reporter)?;

    println!(
        "Loaded {} pathway(s) ({} from snapshot, {} skipped, {} failed).",
        result.load.loaded, result.load.from_snapshot, result.load.skipped, result.load.failed
    );
    println!(
        "Network: {} reaction(s), {} alternate pathway(s), {} artifact edge(s) dropped.",
        result.build.network.summary.len(),
        result.build.network.detail.len(),
        result.build.artifact_edges_dropped
    );
    println!("Species table:  {}", result.species_table.display());
    println!("Reactions:      {}", result.summary_table.display());
    println!("Alternates:     {}", result.detail_table.display());
    Ok(())
}

type ReparseFn = Box<dyn Fn(&Structure) -> std::result::Result<String, CanonicalizeError>>;

/// Builds the identifier-reparse hook when atom exclusion is requested; it
/// needs the canonicalizer from the settings file.
fn build_reparser(args: &NetworkArgs) -> Result<Option<ReparseFn>> {
    if args.exclude_atoms.is_empty() {
        return Ok(None);
    }
    let path = args.config.as_ref().ok_or_else(|| {
        CliError::Argument("--exclude-atom requires --config with a [canonicalizer] section".into())
    })?;
    let settings = Settings::from_file(path)?;
    let canonicalizer = settings.canonicalizer()?;
    let stereo = args.ids == IdColumn::Stereo;
    let exclude = args.exclude_atoms.clone();
    Ok(Some(Box::new(move |structure: &Structure| {
        canonicalizer.canonicalize(structure, stereo, &exclude)
    })))
}

fn progress_line(event: Progress) {
    match event {
        Progress::PhaseStart { name } => println!("==> {name}"),
        Progress::Message(text) => println!("Warning: {text}"),
        _ => {}
    }
}
