use crate::core::models::network::{ReactionDetailRow, ReactionSummaryRow};
use crate::core::models::species::SpeciesEntry;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes the species table, sorted ascending by energy.
pub fn write_species_table(path: &Path, entries: &[SpeciesEntry]) -> Result<(), TableError> {
    let mut sorted: Vec<&SpeciesEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.energy.total_cmp(&b.energy));

    let mut writer = csv::Writer::from_path(path)?;
    for entry in sorted {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the reaction network summary table (one row per reaction id).
pub fn write_network_summary(
    path: &Path,
    rows: &[ReactionSummaryRow],
) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the reaction network detail table (one row per alternate pathway).
pub fn write_network_detail(path: &Path, rows: &[ReactionDetailRow]) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
