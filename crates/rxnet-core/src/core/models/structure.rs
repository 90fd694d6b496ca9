use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A single atom: element symbol plus Cartesian position in Angstroms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub symbol: String,
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(symbol: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            symbol: symbol.into(),
            position: Point3::new(x, y, z),
        }
    }
}

/// A molecular geometry as an ordered list of atoms.
///
/// Atom order is significant: constraint schedules and canonicalization
/// exclusion sets refer to atoms by their (1-based) position in this list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub atoms: Vec<Atom>,
}

impl Structure {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Distance between two atoms given by 1-based indices.
    ///
    /// Returns `None` if either index is out of range.
    pub fn distance(&self, atom1: usize, atom2: usize) -> Option<f64> {
        let a = self.atoms.get(atom1.checked_sub(1)?)?;
        let b = self.atoms.get(atom2.checked_sub(1)?)?;
        Some((a.position - b.position).norm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diatomic(separation: f64) -> Structure {
        Structure::new(vec![
            Atom::new("H", 0.0, 0.0, 0.0),
            Atom::new("H", separation, 0.0, 0.0),
        ])
    }

    #[test]
    fn distance_uses_one_based_indices() {
        let s = diatomic(0.74);
        assert!((s.distance(1, 2).unwrap() - 0.74).abs() < 1e-12);
    }

    #[test]
    fn distance_rejects_out_of_range_indices() {
        let s = diatomic(1.0);
        assert_eq!(s.distance(0, 1), None);
        assert_eq!(s.distance(1, 3), None);
    }
}
