//! Molecular structure snapshots with redundant internal coordinates.
//!
//! A [`Geometry`] holds everything extracted from one checkpoint file: the
//! atom list, the total electronic energy, the redundant internal coordinates
//! (RICs) with their defining atom indices, and (for the reference structure)
//! the internal-coordinate Hessian.
//!
//! # Units
//!
//! RIC values are atomic units throughout: Bohr for bond lengths, radians for
//! angles and dihedrals. Atom positions are stored in Angstrom, the unit the
//! reporting layer works in. Force constants are Ha/Bohr² and Ha/rad².
//!
//! # Degree-of-freedom ordering
//!
//! A geometry's DOFs are grouped bonds first, then angles, then dihedrals.
//! `dims` records the group sizes as `[total, bonds, angles, dihedrals]` and
//! `dim_indices[k]` names the atoms defining the kth DOF in `ric`.

use crate::elements::atomic_number_to_symbol;
use crate::error::{Result, SithError};
use crate::units;
use nalgebra::{DMatrix, DVector};
use std::path::PathBuf;

/// Tolerance for structural equality of floating-point data.
const EQ_TOLERANCE: f64 = 1e-6;

/// One atom: element symbol and Cartesian position in Angstrom.
#[derive(Debug, Clone)]
pub struct Atom {
    /// Chemical element symbol (e.g. "C", "H", "O")
    pub symbol: String,
    /// Cartesian position [x, y, z] in Angstrom
    pub position: [f64; 3],
}

impl Atom {
    /// Creates an atom from a symbol and position.
    pub fn new(symbol: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            symbol: symbol.into(),
            position,
        }
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self
                .position
                .iter()
                .zip(other.position.iter())
                .all(|(a, b)| (a - b).abs() < EQ_TOLERANCE)
    }
}

/// Atom indices defining one internal coordinate.
///
/// Indices are 1-based, matching the convention of the checkpoint format.
/// The variant carries the DOF type, so a bond can never hold four atoms and
/// a dihedral can never hold two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DofIndex {
    /// Bond length between two atoms
    Bond(usize, usize),
    /// Bond angle over three atoms, vertex in the middle
    Angle(usize, usize, usize),
    /// Dihedral angle over four atoms
    Dihedral(usize, usize, usize, usize),
}

impl DofIndex {
    /// True when the given 1-based atom index participates in this DOF.
    pub fn contains_atom(&self, atom: usize) -> bool {
        match *self {
            DofIndex::Bond(a, b) => a == atom || b == atom,
            DofIndex::Angle(a, b, c) => a == atom || b == atom || c == atom,
            DofIndex::Dihedral(a, b, c, d) => {
                a == atom || b == atom || c == atom || d == atom
            }
        }
    }

    /// Number of atoms defining this DOF (2, 3, or 4).
    pub fn arity(&self) -> usize {
        match self {
            DofIndex::Bond(..) => 2,
            DofIndex::Angle(..) => 3,
            DofIndex::Dihedral(..) => 4,
        }
    }

    /// True for angle and dihedral DOFs, whose values live on the (−π, π]
    /// branch and need wraparound correction when differenced.
    pub fn is_angular(&self) -> bool {
        !matches!(self, DofIndex::Bond(..))
    }
}

/// One molecular structure snapshot.
///
/// Created empty by [`Geometry::new`] and populated by the extractor through
/// [`build_ric`](Geometry::build_ric) and
/// [`build_atoms`](Geometry::build_atoms). After extraction the geometry is
/// logically immutable except for [`kill_dofs`](Geometry::kill_dofs).
#[derive(Debug, Clone)]
pub struct Geometry {
    /// Identifier, derived from the source file stem
    pub name: String,
    /// Originating file, kept for error messages
    pub path: PathBuf,
    /// Atom count, fixed at construction
    pub n_atoms: usize,
    /// Atom list, length `n_atoms` once built
    pub atoms: Vec<Atom>,
    /// Total electronic energy in Hartree; `None` until parsed
    pub energy: Option<f64>,
    /// DOF counts: `[total, bonds, angles, dihedrals]`
    pub dims: [usize; 4],
    /// Atom indices defining each DOF, in `ric` order
    pub dim_indices: Vec<DofIndex>,
    /// RIC values in atomic units, one per DOF
    pub ric: DVector<f64>,
    /// Internal-coordinate Hessian; carried by the reference geometry only
    pub hessian: Option<DMatrix<f64>>,
}

impl Geometry {
    /// Creates an empty geometry shell for the extractor to populate.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, n_atoms: usize) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            n_atoms,
            atoms: Vec::new(),
            energy: None,
            dims: [0; 4],
            dim_indices: Vec::new(),
            ric: DVector::zeros(0),
            hessian: None,
        }
    }

    /// Parses the RIC dimension line, index block, and coordinate block.
    ///
    /// `dim_line` carries the four dimension values `[total, bonds, angles,
    /// dihedrals]`. `index_lines` hold `4 * total` whitespace-separated atom
    /// indices, four slots per DOF with unused slots zero-padded.
    /// `coord_lines` hold `total` coordinate values in atomic units.
    ///
    /// Every input defect is reported as a distinct [`SithError::Format`]:
    /// non-numeric dimensions, inconsistent dimension sums, wrong index
    /// counts, out-of-range or misplaced-zero atom indices, grouping
    /// mismatches against the declared dimension types, non-numeric
    /// coordinates, and coordinate count mismatches.
    pub fn build_ric(
        &mut self,
        dim_line: &str,
        index_lines: &[String],
        coord_lines: &[String],
    ) -> Result<()> {
        let tokens: Vec<&str> = dim_line.split_whitespace().collect();
        if tokens.len() != 4 {
            return Err(SithError::Format(format!(
                "expected 4 redundant internal dimension values, got {}",
                tokens.len()
            )));
        }
        let mut dims = [0usize; 4];
        for (dim, token) in dims.iter_mut().zip(tokens.iter()) {
            *dim = token.parse().map_err(|_| {
                SithError::Format(
                    "invalid input given for redundant internal dimensions".to_string(),
                )
            })?;
        }
        if dims[0] != dims[1] + dims[2] + dims[3] {
            return Err(SithError::Format(format!(
                "invalid quantities of dimension types: {} bonds + {} angles + {} dihedrals != {} total",
                dims[1], dims[2], dims[3], dims[0]
            )));
        }

        let mut slots = Vec::with_capacity(dims[0] * 4);
        for line in index_lines {
            for token in line.split_whitespace() {
                let index: usize = token.parse().map_err(|_| {
                    SithError::Format(format!(
                        "invalid atom index '{}' in redundant internal coordinate indices",
                        token
                    ))
                })?;
                slots.push(index);
            }
        }
        if slots.len() != dims[0] * 4 {
            return Err(SithError::Format(format!(
                "redundant internal coordinate indices are missing or malformed: expected {} entries, got {}",
                dims[0] * 4,
                slots.len()
            )));
        }

        let mut dim_indices = Vec::with_capacity(dims[0]);
        for (record, chunk) in slots.chunks_exact(4).enumerate() {
            let (a1, a2, a3, a4) = (chunk[0], chunk[1], chunk[2], chunk[3]);
            for &atom in chunk {
                if atom > self.n_atoms {
                    return Err(SithError::Format(format!(
                        "invalid atom index {}: structure has {} atoms",
                        atom, self.n_atoms
                    )));
                }
            }
            if a1 == 0 || a2 == 0 {
                return Err(SithError::Format(format!(
                    "invalid atom index 0 in degree of freedom {}",
                    record + 1
                )));
            }
            let dof = if record < dims[1] {
                if a3 != 0 || a4 != 0 {
                    return Err(Self::grouping_mismatch(record, "bond"));
                }
                DofIndex::Bond(a1, a2)
            } else if record < dims[1] + dims[2] {
                if a3 == 0 || a4 != 0 {
                    return Err(Self::grouping_mismatch(record, "angle"));
                }
                DofIndex::Angle(a1, a2, a3)
            } else {
                if a3 == 0 || a4 == 0 {
                    return Err(Self::grouping_mismatch(record, "dihedral"));
                }
                DofIndex::Dihedral(a1, a2, a3, a4)
            };
            dim_indices.push(dof);
        }

        let mut ric = Vec::with_capacity(dims[0]);
        for line in coord_lines {
            for token in line.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| {
                    SithError::Format(format!(
                        "redundant internal coordinates contain a non-numeric value '{}'",
                        token
                    ))
                })?;
                ric.push(value);
            }
        }
        if ric.len() != dims[0] {
            return Err(SithError::Format(format!(
                "expected {} degrees of freedom but found {} redundant internal coordinate values",
                dims[0],
                ric.len()
            )));
        }

        self.dims = dims;
        self.dim_indices = dim_indices;
        self.ric = DVector::from_vec(ric);
        Ok(())
    }

    fn grouping_mismatch(record: usize, expected: &str) -> SithError {
        SithError::Format(format!(
            "mismatch between redundant internal dimensions and coordinate indices: \
             degree of freedom {} is declared as a {} but its index slots disagree",
            record + 1,
            expected
        ))
    }

    /// Builds the atom list from a flat Cartesian stream and a parallel list
    /// of atomic numbers.
    ///
    /// The coordinate stream is in Bohr (checkpoint convention); stored
    /// positions are converted to Angstrom. Fails when the counts disagree
    /// with `n_atoms` or an atomic number is outside the element table.
    pub fn build_atoms(&mut self, coord_lines: &[String], atomic_numbers: &[usize]) -> Result<()> {
        if atomic_numbers.len() != self.n_atoms {
            return Err(SithError::Format(format!(
                "expected {} atomic numbers, got {}",
                self.n_atoms,
                atomic_numbers.len()
            )));
        }
        let mut flat = Vec::with_capacity(self.n_atoms * 3);
        for line in coord_lines {
            for token in line.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| {
                    SithError::Format(format!("non-numeric cartesian coordinate '{}'", token))
                })?;
                flat.push(value);
            }
        }
        if flat.len() != self.n_atoms * 3 {
            return Err(SithError::Format(format!(
                "expected {} cartesian coordinate values for {} atoms, got {}",
                self.n_atoms * 3,
                self.n_atoms,
                flat.len()
            )));
        }
        let mut atoms = Vec::with_capacity(self.n_atoms);
        for (&number, chunk) in atomic_numbers.iter().zip(flat.chunks_exact(3)) {
            let symbol = atomic_number_to_symbol(number)
                .ok_or_else(|| SithError::Format(format!("unknown atomic number {}", number)))?;
            atoms.push(Atom::new(
                symbol,
                [
                    units::bohr_to_angstrom(chunk[0]),
                    units::bohr_to_angstrom(chunk[1]),
                    units::bohr_to_angstrom(chunk[2]),
                ],
            ));
        }
        self.atoms = atoms;
        Ok(())
    }

    /// Removes the DOFs at the given 0-based positions in place.
    ///
    /// `ric`, `dim_indices` and `dims` are updated together, and when a
    /// Hessian is attached its matching rows and columns are removed as well.
    /// Positions outside the current DOF range are ignored; duplicates count
    /// once. Atom data is never touched.
    pub fn kill_dofs(&mut self, indices: &[usize]) {
        let mut removed: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.dims[0])
            .collect();
        removed.sort_unstable();
        removed.dedup();
        if removed.is_empty() {
            return;
        }

        // Per-type bookkeeping against the pre-removal group boundaries.
        let bond_end = self.dims[1];
        let angle_end = self.dims[1] + self.dims[2];
        let bonds_removed = removed.iter().filter(|&&i| i < bond_end).count();
        let angles_removed = removed
            .iter()
            .filter(|&&i| i >= bond_end && i < angle_end)
            .count();
        let dihedrals_removed = removed.len() - bonds_removed - angles_removed;

        let keep: Vec<usize> = (0..self.dims[0])
            .filter(|i| removed.binary_search(i).is_err())
            .collect();
        self.ric = DVector::from_iterator(keep.len(), keep.iter().map(|&i| self.ric[i]));
        self.dim_indices = keep.iter().map(|&i| self.dim_indices[i]).collect();
        if let Some(hessian) = &self.hessian {
            self.hessian = Some(DMatrix::from_fn(keep.len(), keep.len(), |r, c| {
                hessian[(keep[r], keep[c])]
            }));
        }

        self.dims[0] -= removed.len();
        self.dims[1] -= bonds_removed;
        self.dims[2] -= angles_removed;
        self.dims[3] -= dihedrals_removed;
    }
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        let energy_equal = match (self.energy, other.energy) {
            (None, None) => true,
            (Some(a), Some(b)) => (a - b).abs() < EQ_TOLERANCE,
            _ => false,
        };
        self.name == other.name
            && self.n_atoms == other.n_atoms
            && self.dims == other.dims
            && self.dim_indices == other.dim_indices
            && energy_equal
            && self.ric.len() == other.ric.len()
            && self
                .ric
                .iter()
                .zip(other.ric.iter())
                .all(|(a, b)| (a - b).abs() < EQ_TOLERANCE)
            && self.atoms == other.atoms
    }
}
