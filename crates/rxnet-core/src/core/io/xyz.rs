use crate::core::models::structure::{Atom, Structure};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count (value: '{value}')")]
    InvalidAtomCount { value: String },
    #[error("Invalid coordinate line (value: '{value}')")]
    InvalidCoordinates { value: String },
    #[error("Frame truncated: expected {expected} atom lines")]
    TruncatedFrame { expected: usize },
    #[error("Comment line carries no parseable energy")]
    MissingEnergy,
}

/// Extracts the scalar energy from a frame comment line.
///
/// Prefers the token following an `energy:` marker (the form this module
/// writes); otherwise takes the first token that parses as a float, which
/// tolerates the comment lines external engines leave in their logs.
pub fn comment_energy(comment: &str) -> Option<f64> {
    let tokens: Vec<&str> = comment.split_whitespace().collect();
    for (i, token) in tokens.iter().enumerate() {
        if token.trim_end_matches(':').eq_ignore_ascii_case("energy") {
            if let Some(next) = tokens.get(i + 1) {
                if let Ok(e) = next.parse::<f64>() {
                    return Some(e);
                }
            }
        }
    }
    tokens.iter().find_map(|t| t.parse::<f64>().ok())
}

/// One parsed XYZ frame: the structure plus whatever energy the comment line
/// carried.
#[derive(Debug, Clone, PartialEq)]
pub struct XyzFrame {
    pub structure: Structure,
    pub energy: Option<f64>,
}

/// Reads every frame of an XYZ trajectory.
pub fn read_trajectory(reader: &mut impl BufRead) -> Result<Vec<XyzFrame>, XyzError> {
    let mut lines = reader.lines().enumerate();
    let mut frames = Vec::new();

    while let Some((line_num, line_res)) = lines.next() {
        let line = line_res?;
        if line.trim().is_empty() {
            continue;
        }
        let count: usize = line.trim().parse().map_err(|_| XyzError::Parse {
            line: line_num + 1,
            kind: XyzParseErrorKind::InvalidAtomCount {
                value: line.trim().into(),
            },
        })?;

        let comment = match lines.next() {
            Some((_, res)) => res?,
            None => {
                return Err(XyzError::Parse {
                    line: line_num + 1,
                    kind: XyzParseErrorKind::TruncatedFrame { expected: count },
                });
            }
        };

        let mut atoms = Vec::with_capacity(count);
        for _ in 0..count {
            let (atom_line_num, atom_res) = lines.next().ok_or(XyzError::Parse {
                line: line_num + 1,
                kind: XyzParseErrorKind::TruncatedFrame { expected: count },
            })?;
            let atom_line = atom_res?;
            atoms.push(parse_atom_line(&atom_line, atom_line_num + 1)?);
        }

        frames.push(XyzFrame {
            structure: Structure::new(atoms),
            energy: comment_energy(&comment),
        });
    }

    Ok(frames)
}

fn parse_atom_line(line: &str, line_num: usize) -> Result<Atom, XyzError> {
    let invalid = || XyzError::Parse {
        line: line_num,
        kind: XyzParseErrorKind::InvalidCoordinates { value: line.into() },
    };
    let mut tokens = line.split_whitespace();
    let symbol = tokens.next().ok_or_else(invalid)?;
    let mut coord = [0.0f64; 3];
    for c in &mut coord {
        *c = tokens
            .next()
            .ok_or_else(invalid)?
            .parse()
            .map_err(|_| invalid())?;
    }
    Ok(Atom::new(symbol, coord[0], coord[1], coord[2]))
}

/// Reads a trajectory, requiring an energy on every frame.
pub fn read_energy_trajectory(
    reader: &mut impl BufRead,
) -> Result<Vec<(Structure, f64)>, XyzError> {
    read_trajectory(reader)?
        .into_iter()
        .enumerate()
        .map(|(i, frame)| {
            let energy = frame.energy.ok_or(XyzError::Parse {
                line: i + 1,
                kind: XyzParseErrorKind::MissingEnergy,
            })?;
            Ok((frame.structure, energy))
        })
        .collect()
}

/// Writes one frame; the comment line round-trips the energy exactly
/// (shortest decimal representation that parses back to the same bits).
pub fn write_frame(
    writer: &mut impl Write,
    structure: &Structure,
    energy: f64,
) -> Result<(), XyzError> {
    writeln!(writer, "{}", structure.len())?;
    writeln!(writer, " energy: {}", energy)?;
    for atom in &structure.atoms {
        writeln!(
            writer,
            "{} {:.10} {:.10} {:.10}",
            atom.symbol, atom.position.x, atom.position.y, atom.position.z
        )?;
    }
    Ok(())
}

pub fn write_trajectory<'a>(
    writer: &mut impl Write,
    frames: impl IntoIterator<Item = (&'a Structure, f64)>,
) -> Result<(), XyzError> {
    for (structure, energy) in frames {
        write_frame(writer, structure, energy)?;
    }
    Ok(())
}

/// Reads the first frame of an XYZ file.
pub fn read_structure_file(path: &Path) -> Result<XyzFrame, XyzError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut frames = read_trajectory(&mut reader)?;
    if frames.is_empty() {
        return Err(XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::TruncatedFrame { expected: 1 },
        });
    }
    Ok(frames.remove(0))
}

/// Writes a single-frame XYZ file.
pub fn write_structure_file(path: &Path, structure: &Structure, energy: f64) -> Result<(), XyzError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_frame(&mut writer, structure, energy)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn water() -> Structure {
        Structure::new(vec![
            Atom::new("O", 0.0, 0.0, 0.1173),
            Atom::new("H", 0.0, 0.7572, -0.4692),
            Atom::new("H", 0.0, -0.7572, -0.4692),
        ])
    }

    #[test]
    fn energy_round_trips_bit_for_bit() {
        let energies = [-76.026_760_737_428_1, 0.1 + 0.2, f64::MIN_POSITIVE, -0.0];
        let mut buf = Vec::new();
        for &e in &energies {
            write_frame(&mut buf, &water(), e).unwrap();
        }
        let frames = read_energy_trajectory(&mut Cursor::new(buf)).unwrap();
        for (i, &(ref _s, e)) in frames.iter().enumerate() {
            assert_eq!(e.to_bits(), energies[i].to_bits());
        }
    }

    #[test]
    fn trajectory_round_trips_structures() {
        let s = water();
        let mut buf = Vec::new();
        write_trajectory(&mut buf, [(&s, -76.0), (&s, -75.9)]).unwrap();
        let frames = read_trajectory(&mut Cursor::new(buf)).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].structure.len(), 3);
        assert_eq!(frames[0].structure.atoms[1].symbol, "H");
        assert_eq!(frames[1].energy, Some(-75.9));
    }

    #[test]
    fn comment_energy_handles_external_engine_comments() {
        assert_eq!(comment_energy(" energy: -13.5 gnorm: 0.01"), Some(-13.5));
        assert_eq!(comment_energy("-13.5"), Some(-13.5));
        assert_eq!(comment_energy("Energy = nope -42.0"), Some(-42.0));
        assert_eq!(comment_energy("no numbers here"), None);
    }

    #[test]
    fn truncated_frame_is_a_parse_error() {
        let text = "3\n energy: -1.0\nO 0.0 0.0 0.0\nH 0.0 0.0 1.0\n";
        let err = read_trajectory(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(
            err,
            XyzError::Parse {
                kind: XyzParseErrorKind::TruncatedFrame { expected: 3 },
                ..
            }
        ));
    }

    #[test]
    fn bad_atom_count_reports_line_number() {
        let err = read_trajectory(&mut Cursor::new("abc\n")).unwrap_err();
        assert!(matches!(
            err,
            XyzError::Parse {
                line: 1,
                kind: XyzParseErrorKind::InvalidAtomCount { .. },
            }
        ));
    }

    #[test]
    fn missing_energy_is_rejected_for_energy_trajectories() {
        let text = "1\ncomment with no number\nH 0.0 0.0 0.0\n";
        assert!(read_energy_trajectory(&mut Cursor::new(text)).is_err());
        // but tolerated for plain trajectories
        let frames = read_trajectory(&mut Cursor::new(text)).unwrap();
        assert_eq!(frames[0].energy, None);
    }
}
