use crate::cli::ScanArgs;
use crate::error::{CliError, Result};
use rxnet::core::constraints::ConstraintSchedule;
use rxnet::core::models::structure::Structure;
use rxnet::engine::config::{ScanConfig, ScanConfigBuilder};
use rxnet::engine::optimizer::{CommandCanonicalizer, CommandOptimizer};
use rxnet::workflows::search::SearchJobSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The optimization-engine section of the settings file.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct EngineSection {
    /// Engine executable driven once per relaxation step.
    pub program: PathBuf,
    /// Extra arguments placed before the generated ones (charge, spin,
    /// solvent and similar flags).
    #[serde(default)]
    pub args: Vec<String>,
    /// Scratch root for per-call working directories; defaults to the
    /// system temporary directory.
    pub scratch: Option<PathBuf>,
    /// Convergence level for constrained scan steps.
    pub opt_level: String,
    /// Tighter convergence level for stable-point re-relaxation.
    pub relax_level: String,
    /// Absolute energy ceiling stopping a relaxation chain early.
    pub energy_max: Option<f64>,
    /// Confining wall potential text forwarded verbatim to the engine.
    pub wall: Option<String>,
}

/// The canonicalizer section of the settings file.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct CanonicalizerSection {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    pub scratch: Option<PathBuf>,
}

/// One bond-stretch job definition.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StretchSection {
    /// 1-based indices of the stretched bond.
    pub atom1: usize,
    pub atom2: usize,
    /// Reference bond length the stretch factors scale.
    pub bond_length: f64,
    /// Lowest and highest stretch factor.
    pub low: f64,
    pub high: f64,
    /// Number of linearly spaced scan steps.
    pub count: usize,
    pub force_constant: f64,
    /// Schedule index the forward chain starts at; everything before it is
    /// scanned backward from the pivot geometry.
    #[serde(default)]
    pub pivot: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub engine: EngineSection,
    pub canonicalizer: Option<CanonicalizerSection>,
    #[serde(default)]
    pub stretch: Vec<StretchSection>,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&text).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        debug!(path = %path.display(), jobs = settings.stretch.len(), "settings loaded");
        Ok(settings)
    }

    fn scratch_root(path: &Option<PathBuf>) -> PathBuf {
        path.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Merges the engine section with CLI overrides into the scan
    /// configuration.
    pub fn scan_config(&self, args: &ScanArgs) -> Result<ScanConfig> {
        let mut builder = ScanConfigBuilder::new()
            .opt_level(self.engine.opt_level.as_str())
            .relax_level(self.engine.relax_level.as_str())
            .keep_scratch(args.keep_scratch);
        if let Some(ceiling) = args.energy_max.or(self.engine.energy_max) {
            builder = builder.energy_max(ceiling);
        }
        if let Some(wall) = &self.engine.wall {
            builder = builder.wall(wall.as_str());
        }
        Ok(builder.build()?)
    }

    pub fn optimizer(&self, keep_scratch: bool) -> CommandOptimizer {
        CommandOptimizer::new(
            self.engine.program.clone(),
            Self::scratch_root(&self.engine.scratch),
        )
        .with_extra_args(self.engine.args.clone())
        .with_keep_scratch(keep_scratch)
    }

    pub fn canonicalizer(&self) -> Result<CommandCanonicalizer> {
        let section = self.canonicalizer.as_ref().ok_or_else(|| {
            CliError::Argument("settings file has no [canonicalizer] section".into())
        })?;
        Ok(
            CommandCanonicalizer::new(section.program.clone(), Self::scratch_root(&section.scratch))
                .with_extra_args(section.args.clone()),
        )
    }

    /// Expands the stretch sections into one scan job each, all starting
    /// from the same input geometry.
    pub fn job_specs(&self, initial: &Structure) -> Result<Vec<SearchJobSpec>> {
        if self.stretch.is_empty() {
            return Err(CliError::Argument(
                "settings file defines no [[stretch]] jobs".into(),
            ));
        }
        Ok(self
            .stretch
            .iter()
            .map(|s| SearchJobSpec {
                initial: initial.clone(),
                schedule: ConstraintSchedule::stretch(
                    s.atom1,
                    s.atom2,
                    s.bond_length,
                    s.low,
                    s.high,
                    s.count,
                    s.force_constant,
                ),
                pivot: s.pivot,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[engine]
program = "xtb-relax"
args = ["--chrg", "0"]
opt-level = "tight"
relax-level = "vtight"
energy-max = 12.5

[canonicalizer]
program = "canon"

[[stretch]]
atom1 = 1
atom2 = 5
bond-length = 1.54
low = 0.8
high = 3.0
count = 30
force-constant = 0.5
pivot = 3
"#;

    #[test]
    fn sample_settings_parse_with_kebab_case_keys() {
        let settings: Settings = toml::from_str(SAMPLE).unwrap();
        assert_eq!(settings.engine.opt_level, "tight");
        assert_eq!(settings.engine.energy_max, Some(12.5));
        assert!(settings.engine.wall.is_none());
        assert_eq!(settings.stretch.len(), 1);
        assert_eq!(settings.stretch[0].pivot, 3);
        assert!(settings.canonicalizer.is_some());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = SAMPLE.replace("energy-max", "energy-maximum");
        assert!(toml::from_str::<Settings>(&text).is_err());
    }

    #[test]
    fn missing_canonicalizer_section_is_an_argument_error() {
        let mut settings: Settings = toml::from_str(SAMPLE).unwrap();
        settings.canonicalizer = None;
        assert!(matches!(
            settings.canonicalizer(),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn stretch_sections_expand_into_job_specs() {
        let settings: Settings = toml::from_str(SAMPLE).unwrap();
        let initial = Structure::new(Vec::new());
        let jobs = settings.job_specs(&initial).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].schedule.len(), 30);
        assert_eq!(jobs[0].pivot, 3);
    }
}
