use crate::core::constraints::Constraint;
use crate::core::io::xyz;
use crate::core::models::structure::Structure;
use crate::engine::error::{CanonicalizeError, OptimizerError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// One intermediate sample from a relaxation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxationSample {
    pub structure: Structure,
    pub energy: f64,
}

/// The engine's answer to one relaxation request: an exit status plus the
/// ordered log of intermediate samples. Status zero means success; on a
/// non-zero status the log may be partial or empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxationLog {
    pub status: i32,
    pub samples: Vec<RelaxationSample>,
}

impl RelaxationLog {
    pub fn succeeded(&self) -> bool {
        self.status == 0
    }

    /// The lowest-energy sample of the log, used as a step's representative.
    pub fn lowest(&self) -> Option<&RelaxationSample> {
        self.samples
            .iter()
            .min_by(|a, b| a.energy.total_cmp(&b.energy))
    }

    /// The final sample of the log.
    pub fn last(&self) -> Option<&RelaxationSample> {
        self.samples.last()
    }
}

/// One relaxation request: input structure, at most one geometric
/// constraint, and control parameters.
#[derive(Debug, Clone)]
pub struct RelaxationRequest<'a> {
    pub structure: &'a Structure,
    pub constraint: Option<&'a Constraint>,
    /// Engine-specific convergence level.
    pub level: &'a str,
    /// Confining wall potential, forwarded verbatim when present.
    pub wall: Option<&'a str>,
}

/// The optimization-engine collaborator.
///
/// Each call is blocking and side-effect free from the caller's point of
/// view; any scratch the implementation needs is its own and must be
/// released on every exit path. Cancelling an engine subprocess is
/// indistinguishable from an engine failure (non-zero status).
pub trait Optimizer: Send + Sync {
    fn relax(&self, request: &RelaxationRequest) -> Result<RelaxationLog, OptimizerError>;
}

/// The canonicalization collaborator: maps a structure to a canonical
/// identifier string, optionally stereo-resolved and with atoms (1-based)
/// excluded from the perception.
pub trait Canonicalizer: Send + Sync {
    fn canonicalize(
        &self,
        structure: &Structure,
        stereo: bool,
        exclude: &[usize],
    ) -> Result<String, CanonicalizeError>;
}

/// Subprocess-backed [`Optimizer`].
///
/// Contract with the external program: it is invoked as
/// `<program> <extra args..> <input.xyz> --level <level> [--input <control>]`
/// inside a private scratch directory, and it appends its relaxation log as
/// an XYZ trajectory (energies in the comment lines) to `relax.log.xyz`
/// there. The process exit code becomes the log status.
pub struct CommandOptimizer {
    program: PathBuf,
    extra_args: Vec<String>,
    scratch_root: PathBuf,
    keep_scratch: bool,
}

const RELAX_LOG: &str = "relax.log.xyz";
const RELAX_INPUT: &str = "input.xyz";
const CONTROL_FILE: &str = "control.inp";

impl CommandOptimizer {
    pub fn new(program: impl Into<PathBuf>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            scratch_root: scratch_root.into(),
            keep_scratch: false,
        }
    }

    /// Arguments placed before the generated ones on every invocation
    /// (charge, spin, solvent and similar engine flags).
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn with_keep_scratch(mut self, keep: bool) -> Self {
        self.keep_scratch = keep;
        self
    }

    fn write_control_file(
        path: &Path,
        constraint: Option<&Constraint>,
        wall: Option<&str>,
    ) -> Result<(), OptimizerError> {
        let mut writer = BufWriter::new(File::create(path)?);
        if let Some(c) = constraint {
            writeln!(writer, "$constrain")?;
            writeln!(writer, "  force constant={}", c.force_constant)?;
            writeln!(writer, "  distance: {}, {}, {}", c.atom1, c.atom2, c.distance)?;
            writeln!(writer, "$end")?;
        }
        if let Some(wall) = wall {
            writeln!(writer, "$wall")?;
            for line in wall.lines() {
                writeln!(writer, "  {}", line)?;
            }
            writeln!(writer, "$end")?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Optimizer for CommandOptimizer {
    fn relax(&self, request: &RelaxationRequest) -> Result<RelaxationLog, OptimizerError> {
        // RAII scratch: released on every exit path, including `?`.
        let scratch = tempfile::Builder::new()
            .prefix("relax-")
            .tempdir_in(&self.scratch_root)?;

        let input_path = scratch.path().join(RELAX_INPUT);
        xyz::write_structure_file(&input_path, request.structure, 0.0).map_err(|e| {
            OptimizerError::Io(std::io::Error::other(e.to_string()))
        })?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.extra_args)
            .arg(&input_path)
            .arg("--level")
            .arg(request.level)
            .current_dir(scratch.path());

        if request.constraint.is_some() || request.wall.is_some() {
            let control_path = scratch.path().join(CONTROL_FILE);
            Self::write_control_file(&control_path, request.constraint, request.wall)?;
            command.arg("--input").arg(control_path);
        }

        let output = command.output().map_err(|source| OptimizerError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        let status = output.status.code().unwrap_or(-1);
        debug!(status, program = %self.program.display(), "engine invocation finished");

        let log_path = scratch.path().join(RELAX_LOG);
        let samples = if log_path.exists() {
            let mut reader = BufReader::new(File::open(&log_path)?);
            xyz::read_energy_trajectory(&mut reader)
                .map_err(|e| OptimizerError::Log {
                    path: log_path.clone(),
                    message: e.to_string(),
                })?
                .into_iter()
                .map(|(structure, energy)| RelaxationSample { structure, energy })
                .collect()
        } else if status == 0 {
            return Err(OptimizerError::Log {
                path: log_path,
                message: "engine reported success but wrote no log".into(),
            });
        } else {
            Vec::new()
        };

        if self.keep_scratch {
            let kept = scratch.keep();
            debug!(path = %kept.display(), "scratch kept for inspection");
        }

        Ok(RelaxationLog { status, samples })
    }
}

/// Subprocess-backed [`Canonicalizer`].
///
/// The external program is invoked as
/// `<program> <extra args..> <structure.xyz> [--stereo] [--exclude a,b,..]`
/// and prints the canonical identifier as the first line of stdout.
pub struct CommandCanonicalizer {
    program: PathBuf,
    extra_args: Vec<String>,
    scratch_root: PathBuf,
}

impl CommandCanonicalizer {
    pub fn new(program: impl Into<PathBuf>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            scratch_root: scratch_root.into(),
        }
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

impl Canonicalizer for CommandCanonicalizer {
    fn canonicalize(
        &self,
        structure: &Structure,
        stereo: bool,
        exclude: &[usize],
    ) -> Result<String, CanonicalizeError> {
        let scratch = tempfile::Builder::new()
            .prefix("canon-")
            .tempdir_in(&self.scratch_root)?;
        let input_path = scratch.path().join("structure.xyz");
        xyz::write_structure_file(&input_path, structure, 0.0)
            .map_err(|e| CanonicalizeError::Io(std::io::Error::other(e.to_string())))?;

        let mut command = Command::new(&self.program);
        command.args(&self.extra_args).arg(&input_path);
        if stereo {
            command.arg("--stereo");
        }
        if !exclude.is_empty() {
            let list: Vec<String> = exclude.iter().map(usize::to_string).collect();
            command.arg("--exclude").arg(list.join(","));
        }

        let output = command
            .output()
            .map_err(|source| CanonicalizeError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let identifier = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        if identifier.is_empty() {
            return Err(CanonicalizeError::EmptyOutput {
                status: output.status.code().unwrap_or(-1),
            });
        }
        Ok(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::Atom;

    fn hydrogen() -> Structure {
        Structure::new(vec![
            Atom::new("H", 0.0, 0.0, 0.0),
            Atom::new("H", 0.74, 0.0, 0.0),
        ])
    }

    #[test]
    fn lowest_sample_wins_over_last() {
        let log = RelaxationLog {
            status: 0,
            samples: vec![
                RelaxationSample {
                    structure: hydrogen(),
                    energy: -1.0,
                },
                RelaxationSample {
                    structure: hydrogen(),
                    energy: -1.5,
                },
                RelaxationSample {
                    structure: hydrogen(),
                    energy: -1.2,
                },
            ],
        };
        assert_eq!(log.lowest().unwrap().energy, -1.5);
        assert_eq!(log.last().unwrap().energy, -1.2);
    }

    #[test]
    fn empty_log_has_no_representative() {
        let log = RelaxationLog {
            status: 1,
            samples: Vec::new(),
        };
        assert!(!log.succeeded());
        assert!(log.lowest().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn command_optimizer_runs_a_fake_engine_and_cleans_scratch() {
        let scratch_root = tempfile::tempdir().unwrap();
        // A fake engine that "relaxes" by copying its input into the log.
        let optimizer = CommandOptimizer::new("sh", scratch_root.path()).with_extra_args(vec![
            "-c".into(),
            "cp \"$1\" \"$(dirname \"$1\")/relax.log.xyz\"".into(),
            "fake-engine".into(),
        ]);

        let structure = hydrogen();
        let log = optimizer
            .relax(&RelaxationRequest {
                structure: &structure,
                constraint: None,
                level: "tight",
                wall: None,
            })
            .unwrap();
        assert!(log.succeeded());
        assert_eq!(log.samples.len(), 1);
        assert_eq!(log.samples[0].structure.len(), 2);

        // Scratch released: the root holds no leftover relax-* directories.
        let leftovers = std::fs::read_dir(scratch_root.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[cfg(unix)]
    #[test]
    fn command_optimizer_maps_engine_failure_to_nonzero_status() {
        let scratch_root = tempfile::tempdir().unwrap();
        let optimizer = CommandOptimizer::new("sh", scratch_root.path()).with_extra_args(vec![
            "-c".into(),
            "exit 3".into(),
            "fake-engine".into(),
        ]);
        let structure = hydrogen();
        let log = optimizer
            .relax(&RelaxationRequest {
                structure: &structure,
                constraint: None,
                level: "tight",
                wall: None,
            })
            .unwrap();
        assert_eq!(log.status, 3);
        assert!(log.samples.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn command_canonicalizer_reads_first_stdout_line() {
        let scratch_root = tempfile::tempdir().unwrap();
        let canon = CommandCanonicalizer::new("sh", scratch_root.path()).with_extra_args(vec![
            "-c".into(),
            "echo 'CCO'; echo 'ignored'".into(),
            "fake-canon".into(),
        ]);
        let id = canon.canonicalize(&hydrogen(), false, &[]).unwrap();
        assert_eq!(id, "CCO");
    }
}
