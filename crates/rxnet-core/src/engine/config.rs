use crate::core::models::pathway::IdVariant;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },
}

/// Ranking key used to order destination species and pick the representative
/// edge per destination, always ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankingKey {
    /// Transition-state energy, catalog-referenced.
    #[default]
    TsEnergy,
    /// Barrier height, pathway-local.
    Barrier,
    /// Reaction energy against catalog species energies.
    DeltaE,
    /// Reaction energy between the two occurrences of one pathway.
    LocalDeltaE,
}

impl RankingKey {
    /// Whether the key compares pathway-local quantities rather than
    /// catalog-referenced ones.
    pub fn is_local(self) -> bool {
        matches!(self, RankingKey::Barrier | RankingKey::LocalDeltaE)
    }
}

/// What to do with a candidate edge whose transition-state energy does not
/// strictly exceed both endpoint energies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArtifactPolicy {
    /// Discard the candidate and count it for diagnostics.
    #[default]
    Drop,
    /// Retain the candidate with the computed interior maximum.
    Keep,
}

/// Control parameters for one scan job.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Convergence level passed to the engine for constrained steps.
    pub opt_level: String,
    /// Tighter convergence level for the unconstrained re-relaxation of
    /// stable stretch points.
    pub relax_level: String,
    /// Absolute energy ceiling; a representative sample above it stops the
    /// chain early. `None` disables the threshold.
    pub energy_max: Option<f64>,
    /// Confining wall potential text forwarded verbatim to the engine.
    pub wall: Option<String>,
    /// Keep per-call scratch directories for debugging instead of releasing
    /// them.
    pub keep_scratch: bool,
}

#[derive(Default)]
pub struct ScanConfigBuilder {
    opt_level: Option<String>,
    relax_level: Option<String>,
    energy_max: Option<f64>,
    wall: Option<String>,
    keep_scratch: bool,
}

impl ScanConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opt_level(mut self, level: impl Into<String>) -> Self {
        self.opt_level = Some(level.into());
        self
    }
    pub fn relax_level(mut self, level: impl Into<String>) -> Self {
        self.relax_level = Some(level.into());
        self
    }
    pub fn energy_max(mut self, ceiling: f64) -> Self {
        self.energy_max = Some(ceiling);
        self
    }
    pub fn wall(mut self, wall: impl Into<String>) -> Self {
        self.wall = Some(wall.into());
        self
    }
    pub fn keep_scratch(mut self, keep: bool) -> Self {
        self.keep_scratch = keep;
        self
    }

    pub fn build(self) -> Result<ScanConfig, ConfigError> {
        Ok(ScanConfig {
            opt_level: self
                .opt_level
                .ok_or(ConfigError::MissingParameter("opt_level"))?,
            relax_level: self
                .relax_level
                .ok_or(ConfigError::MissingParameter("relax_level"))?,
            energy_max: self.energy_max,
            wall: self.wall,
            keep_scratch: self.keep_scratch,
        })
    }
}

/// Control parameters for network assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkConfig {
    /// Which identifier column keys the species catalog and edge matching.
    pub id_variant: IdVariant,
    pub ranking: RankingKey,
    pub artifact_policy: ArtifactPolicy,
}

impl NetworkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_variant(mut self, variant: IdVariant) -> Self {
        self.id_variant = variant;
        self
    }
    pub fn with_ranking(mut self, ranking: RankingKey) -> Self {
        self.ranking = ranking;
        self
    }
    pub fn with_artifact_policy(mut self, policy: ArtifactPolicy) -> Self {
        self.artifact_policy = policy;
        self
    }
}
