//! Shared checkpoint-file fixtures for the integration tests.
//!
//! [`Fchk`] renders a syntactically faithful formatted checkpoint file from
//! its components; [`methanol`] is the standard 6-atom fixture with 15
//! degrees of freedom (5 bonds, 7 angles, 3 dihedrals) and a diagonal
//! Hessian, so every expected energy is a hand-computable `1/2 k dq^2`.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Components of one formatted checkpoint file.
pub struct Fchk {
    pub n_atoms: usize,
    pub atomic_numbers: Vec<usize>,
    pub energy: f64,
    /// `[total, bonds, angles, dihedrals]`
    pub dims: [usize; 4],
    /// `4 * total` atom-index slots, zero-padded per record
    pub indices: Vec<usize>,
    /// RIC values: Bohr for bonds, radians for angles and dihedrals
    pub ric: Vec<f64>,
    /// `3 * n_atoms` Cartesian values in Bohr
    pub cartesians: Vec<f64>,
    /// Packed lower-triangular Hessian, `total * (total + 1) / 2` values
    pub hessian: Vec<f64>,
}

impl Fchk {
    /// Renders the checkpoint text with the section layout the extractor
    /// expects (header lines, data blocks, end markers).
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("integration test structure\n");
        out.push_str("Freq      RB3LYP                                                  6-31G(d)\n");
        out.push_str(&format!(
            "Number of atoms                            I{:>17}\n",
            self.n_atoms
        ));
        out.push_str(&format!(
            "Atomic numbers                             I   N={:>12}\n",
            self.atomic_numbers.len()
        ));
        out.push_str(&int_line(&self.atomic_numbers));
        out.push_str(&format!(
            "Total Energy                               R    {:>16}\n",
            sci(self.energy)
        ));
        out.push_str("Redundant internal dimensions              I   N=           4\n");
        out.push_str(&int_line(&[
            self.dims[0],
            self.dims[1],
            self.dims[2],
            self.dims[3],
        ]));
        out.push_str(&format!(
            "Redundant internal coordinate indices      I   N={:>12}\n",
            self.indices.len()
        ));
        out.push_str(&int_block(&self.indices));
        out.push_str(&format!(
            "Redundant internal coordinates             R   N={:>12}\n",
            self.ric.len()
        ));
        out.push_str(&float_block(&self.ric));
        out.push_str(&format!(
            "ZRed-IntVec                                I   N={:>12}\n",
            self.ric.len()
        ));
        out.push_str(&int_block(&vec![1; self.ric.len()]));
        out.push_str(&format!(
            "Current cartesian coordinates              R   N={:>12}\n",
            self.cartesians.len()
        ));
        out.push_str(&float_block(&self.cartesians));
        out.push_str("Force Field                                I                0\n");
        out.push_str(&format!(
            "Internal Force Constants                   R   N={:>12}\n",
            self.hessian.len()
        ));
        out.push_str(&float_block(&self.hessian));
        out.push_str(&format!(
            "Mulliken Charges                           R   N={:>12}\n",
            self.n_atoms
        ));
        out.push_str(&float_block(&vec![0.0; self.n_atoms]));
        out
    }

    /// Renders into individual lines, the form the extractor consumes.
    pub fn lines(&self) -> Vec<String> {
        self.render().lines().map(|l| l.to_string()).collect()
    }
}

/// Writes a rendered checkpoint under `dir` and returns its path.
pub fn write_fchk(dir: &Path, name: &str, fchk: &Fchk) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, fchk.render()).unwrap();
    path
}

/// Packs a diagonal matrix into lower-triangular checkpoint order.
pub fn diagonal_packed(diagonal: &[f64]) -> Vec<f64> {
    let n = diagonal.len();
    let mut values = Vec::with_capacity(n * (n + 1) / 2);
    for i in 0..n {
        for j in 0..=i {
            values.push(if i == j { diagonal[i] } else { 0.0 });
        }
    }
    values
}

/// Per-DOF force constants of the methanol fixture, in `ric` order.
///
/// Bonds: C-O 0.40, three C-H 0.35, O-H 0.45 (Ha/Bohr²).
/// Angles: 0.16 each; dihedrals: 0.02 each (Ha/rad²).
pub fn methanol_stiffness() -> Vec<f64> {
    let mut diagonal = vec![0.40, 0.35, 0.35, 0.35, 0.45];
    diagonal.extend(vec![0.16; 7]);
    diagonal.extend(vec![0.02; 3]);
    diagonal
}

/// Methanol (CH3OH): 6 atoms, 15 DOFs, diagonal Hessian.
///
/// Atom order: C(1), O(2), methyl H(3-5), hydroxyl H(6). The O-C-O-H
/// dihedral `ric[12]` sits at 3.10 rad, close to the +π branch boundary, so
/// tests can flip it across the cut.
pub fn methanol(energy: f64) -> Fchk {
    let indices = vec![
        1, 2, 0, 0, // C-O
        1, 3, 0, 0, // C-H
        1, 4, 0, 0,
        1, 5, 0, 0,
        2, 6, 0, 0, // O-H
        2, 1, 3, 0,
        2, 1, 4, 0,
        2, 1, 5, 0,
        3, 1, 4, 0,
        3, 1, 5, 0,
        4, 1, 5, 0,
        1, 2, 6, 0,
        3, 1, 2, 6,
        4, 1, 2, 6,
        5, 1, 2, 6,
    ];
    let ric = vec![
        2.68, 2.06, 2.06, 2.06, 1.81, // bonds, Bohr
        1.91, 1.91, 1.91, 1.89, 1.89, 1.89, 1.89, // angles, rad
        3.10, -1.05, 1.05, // dihedrals, rad
    ];
    let cartesians = vec![
        0.00, 0.00, 0.00, // C
        2.68, 0.00, 0.00, // O
        -0.68, 1.94, 0.00, // H
        -0.68, -0.97, 1.68, // H
        -0.68, -0.97, -1.68, // H
        3.29, 1.71, 0.00, // H
    ];
    Fchk {
        n_atoms: 6,
        atomic_numbers: vec![6, 8, 1, 1, 1, 1],
        energy,
        dims: [15, 5, 7, 3],
        indices,
        ric,
        cartesians,
        hessian: diagonal_packed(&methanol_stiffness()),
    }
}

fn sci(value: f64) -> String {
    let formatted = format!("{:.8E}", value);
    let (mantissa, exponent) = formatted.split_once('E').unwrap();
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(rest) => ('-', rest),
        None => ('+', exponent),
    };
    format!("{}E{}{:0>2}", mantissa, sign, digits)
}

fn int_line(values: &[usize]) -> String {
    let mut line = String::new();
    for value in values {
        line.push_str(&format!("{:>12}", value));
    }
    line.push('\n');
    line
}

fn int_block(values: &[usize]) -> String {
    let mut out = String::new();
    for chunk in values.chunks(6) {
        out.push_str(&int_line(chunk));
    }
    out
}

fn float_block(values: &[f64]) -> String {
    let mut out = String::new();
    for chunk in values.chunks(5) {
        for value in chunk {
            out.push_str(&format!("{:>16}", sci(*value)));
        }
        out.push('\n');
    }
    out
}
