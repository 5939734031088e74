#![deny(missing_docs)]

//! Sith - Stress Energy Decomposition for Deformed Molecular Structures
//!
//! Sith implements the JEDI (Judgement of Energy DIstribution) analysis: given
//! a relaxed reference structure and one or more deformed structures of the
//! same molecule, it distributes the harmonic deformation energy over the
//! individual redundant internal coordinates (bonds, angles, and dihedrals).
//!
//! # Overview
//!
//! Within the harmonic approximation the energy stored in a deformation is
//!
//! ```text
//! E = 1/2 * dQ^T * H * dQ
//! ```
//!
//! where `H` is the reference structure's Hessian in redundant internal
//! coordinates and `dQ` the internal-coordinate displacement. Evaluating the
//! same quadratic form with all but one displacement component zeroed gives
//! the energy stored in that single degree of freedom, which is how the
//! analysis locates the bonds and angles that carry mechanical stress.
//!
//! # Pipeline
//!
//! 1. Parse the reference and deformed Gaussian formatted checkpoint files
//! 2. Optionally remove degrees of freedom (by DOF or by atom)
//! 3. Reconcile the DOF sets and build the displacement matrix
//! 4. Decompose the energies and report per-DOF contributions
//!
//! # Example
//!
//! ```no_run
//! use sith::Sith;
//!
//! fn main() -> sith::error::Result<()> {
//!     let mut sith = Sith::new("x0.fchk", "deformed/");
//!     sith.extract()?;
//!     sith.analyze()?;
//!     let energies = sith.energies()?;
//!     println!("{}", energies);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod extractor;
pub mod geometry;
pub mod matrix;
pub mod units;

pub use analysis::{EnergyComparison, Sith};
pub use error::SithError;
pub use extractor::Extractor;
pub use geometry::{Atom, DofIndex, Geometry};
pub use matrix::LtMatrix;
