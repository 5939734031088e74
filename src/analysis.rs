//! JEDI stress-energy analysis over a reference and deformed structures.
//!
//! [`Sith`] owns one reference (relaxed) [`Geometry`] and an ordered list of
//! deformed geometries, reconciles their degree-of-freedom sets, and
//! distributes each deformation's harmonic stress energy over the individual
//! internal coordinates:
//!
//! ```text
//! E_i       = 1/2 · ΔQᵢᵀ · H · ΔQᵢ          (total, per deformation)
//! E[j, i]   = 1/2 · qᵀ · H · q,  q = ΔQᵢ with all rows but j zeroed
//! ```
//!
//! where `H` is the reference structure's internal-coordinate Hessian. The
//! per-DOF terms drop all cross couplings, so their sum approximates but does
//! not equal the total; [`Sith::compare_energies`] quantifies that gap
//! against the ab-initio energy differences.
//!
//! The pipeline is strictly ordered: construct, optionally configure DOF
//! removal, [`extract`](Sith::extract), [`analyze`](Sith::analyze). Calling a
//! stage before its predecessor is a [`SithError::Sequencing`] error.

use crate::error::{Result, SithError};
use crate::extractor::Extractor;
use crate::geometry::{DofIndex, Geometry};
use log::{debug, info};
use nalgebra::{DMatrix, DVector, RowDVector};
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

/// Deformation-energy accuracy check against the ab-initio energies.
///
/// All rows are indexed by deformation, in deformed-list order. A degenerate
/// deformation (zero expected difference) yields non-finite entries in
/// `percent_error` per IEEE semantics; it is never raised as an error.
#[derive(Debug, Clone)]
pub struct EnergyComparison {
    /// Ab-initio energy difference `E_deformed − E_reference` in Hartree
    pub expected: RowDVector<f64>,
    /// Harmonic deformation energy minus the expected difference
    pub error: RowDVector<f64>,
    /// `100 · error / expected`
    pub percent_error: RowDVector<f64>,
}

/// The analysis engine: reference and deformed geometries plus the derived
/// displacement and energy arrays.
///
/// Results (`q0`, `qf`, `delta_q`, `energies`, …) are recomputed from
/// scratch by each pipeline stage, never partially mutated.
pub struct Sith {
    reference_path: PathBuf,
    deformed_path: PathBuf,
    kill_atoms: Vec<usize>,
    kill_dofs: Vec<DofIndex>,
    kill: bool,
    reference: Option<Geometry>,
    deformed: Vec<Geometry>,
    q0: Option<DVector<f64>>,
    qf: Option<DMatrix<f64>>,
    delta_q: Option<DMatrix<f64>>,
    energies: Option<DMatrix<f64>>,
    deformation_energy: Option<RowDVector<f64>>,
    proportional_energies: Option<DMatrix<f64>>,
}

impl Sith {
    /// Creates an engine over a reference checkpoint file and either a single
    /// deformed checkpoint file or a directory of them.
    ///
    /// Directories are scanned for `*.fchk` files and processed in sorted
    /// filename order so deformation indices are deterministic. Paths are
    /// validated in [`extract`](Sith::extract), not here.
    pub fn new(reference_path: impl Into<PathBuf>, deformed_path: impl Into<PathBuf>) -> Self {
        Self {
            reference_path: reference_path.into(),
            deformed_path: deformed_path.into(),
            kill_atoms: Vec::new(),
            kill_dofs: Vec::new(),
            kill: false,
            reference: None,
            deformed: Vec::new(),
            q0: None,
            qf: None,
            delta_q: None,
            energies: None,
            deformation_energy: None,
            proportional_energies: None,
        }
    }

    /// Marks atoms (1-based indices) whose DOFs are removed from the
    /// reference geometry during [`extract`](Sith::extract). Every DOF
    /// touching a marked atom is removed.
    pub fn set_kill_atoms(&mut self, atoms: Vec<usize>) {
        self.kill_atoms = atoms;
        self.kill = true;
    }

    /// Marks specific DOFs for removal from the reference geometry during
    /// [`extract`](Sith::extract).
    pub fn set_kill_dofs(&mut self, dofs: Vec<DofIndex>) {
        self.kill_dofs = dofs;
        self.kill = true;
    }

    /// Reads, parses, and reconciles all input structures.
    ///
    /// Steps: validate and read every input file, run the [`Extractor`] on
    /// each, apply any configured DOF removal to the reference, drop
    /// deformed-only DOFs from each deformed geometry (a reference DOF
    /// missing from a deformed structure is fatal — the reference defines the
    /// canonical coordinate set), validate that all structures now agree in
    /// atoms, dimensions, and DOF ordering, and populate the displacement
    /// arrays `q0`, `qf`, and the angle-corrected `delta_q`.
    pub fn extract(&mut self) -> Result<()> {
        let reference_lines = read_lines(&self.reference_path)?;
        let deformed_paths = self.deformed_paths()?;
        let mut deformed_inputs = Vec::with_capacity(deformed_paths.len());
        for path in deformed_paths {
            let lines = read_lines(&path)?;
            deformed_inputs.push((path, lines));
        }

        let mut extractor = Extractor::new(&self.reference_path, reference_lines);
        extractor.extract()?;
        let mut reference = extractor.take_geometry()?;

        let mut deformed = Vec::with_capacity(deformed_inputs.len());
        for (path, lines) in deformed_inputs {
            let mut extractor = Extractor::new(&path, lines);
            extractor.extract()?;
            deformed.push(extractor.take_geometry()?);
        }
        info!(
            "extracted reference '{}' and {} deformed structure(s)",
            reference.name,
            deformed.len()
        );

        if self.kill {
            apply_kill(&mut reference, &self.kill_dofs, &self.kill_atoms);
        }
        reconcile(&reference, &mut deformed)?;
        validate_geometries(&reference, &deformed)?;

        let n_dofs = reference.dims[0];
        let q0 = reference.ric.clone();
        let qf = DMatrix::from_fn(n_dofs, deformed.len(), |r, c| deformed[c].ric[r]);
        let mut delta_q = DMatrix::from_fn(n_dofs, deformed.len(), |r, c| qf[(r, c)] - q0[r]);
        for (row, dof) in reference.dim_indices.iter().enumerate() {
            if dof.is_angular() {
                for col in 0..deformed.len() {
                    delta_q[(row, col)] = fold_branch(delta_q[(row, col)]);
                }
            }
        }

        self.reference = Some(reference);
        self.deformed = deformed;
        self.q0 = Some(q0);
        self.qf = Some(qf);
        self.delta_q = Some(delta_q);
        self.energies = None;
        self.deformation_energy = None;
        self.proportional_energies = None;
        Ok(())
    }

    /// Runs the energy decomposition, populating `energies`,
    /// `deformation_energy`, and `proportional_energies`.
    ///
    /// A deformation with zero total energy produces non-finite proportional
    /// entries per IEEE semantics rather than an error, so callers can detect
    /// degenerate deformations.
    pub fn analyze(&mut self) -> Result<()> {
        let delta_q = self.delta_q.as_ref().ok_or_else(prerequisites_missing)?;
        let reference = self.reference.as_ref().ok_or_else(prerequisites_missing)?;
        let hessian = reference.hessian.as_ref().ok_or_else(|| {
            SithError::Consistency(format!(
                "reference structure '{}' carries no Hessian",
                reference.name
            ))
        })?;

        let n_dofs = reference.dims[0];
        let n_deformed = self.deformed.len();
        let mut energies = DMatrix::zeros(n_dofs, n_deformed);
        let mut deformation_energy = RowDVector::zeros(n_deformed);
        for i in 0..n_deformed {
            let delta = delta_q.column(i).into_owned();
            deformation_energy[i] = total_energy(hessian, &delta);
            for j in 0..n_dofs {
                energies[(j, i)] = isolated_energy(hessian, &delta, j);
            }
        }
        let proportional_energies = DMatrix::from_fn(n_dofs, n_deformed, |j, i| {
            100.0 * energies[(j, i)] / deformation_energy[i]
        });

        info!(
            "energy analysis complete: {} DOFs across {} deformation(s)",
            n_dofs, n_deformed
        );
        self.energies = Some(energies);
        self.deformation_energy = Some(deformation_energy);
        self.proportional_energies = Some(proportional_energies);
        Ok(())
    }

    /// Compares the harmonic deformation energies against the ab-initio
    /// energy differences of the input calculations.
    pub fn compare_energies(&self) -> Result<EnergyComparison> {
        let deformation_energy = self
            .deformation_energy
            .as_ref()
            .ok_or_else(|| no_results("compare_energies"))?;
        let reference = self.reference.as_ref().ok_or_else(prerequisites_missing)?;
        let reference_energy = reference.energy.ok_or_else(|| {
            SithError::Consistency(format!("reference '{}' has no energy", reference.name))
        })?;

        let mut expected = RowDVector::zeros(self.deformed.len());
        for (i, geometry) in self.deformed.iter().enumerate() {
            let energy = geometry.energy.ok_or_else(|| {
                SithError::Consistency(format!("'{}' has no energy", geometry.name))
            })?;
            expected[i] = energy - reference_energy;
        }
        let error = deformation_energy - &expected;
        let percent_error =
            RowDVector::from_fn(expected.len(), |_, i| 100.0 * error[i] / expected[i]);
        Ok(EnergyComparison {
            expected,
            error,
            percent_error,
        })
    }

    /// The reference geometry. Available after [`extract`](Sith::extract).
    pub fn reference(&self) -> Result<&Geometry> {
        self.reference.as_ref().ok_or_else(prerequisites_missing)
    }

    /// The deformed geometries in deformation order. Empty before
    /// [`extract`](Sith::extract).
    pub fn deformed(&self) -> &[Geometry] {
        &self.deformed
    }

    /// Reference RIC column vector. Available after [`extract`](Sith::extract).
    pub fn q0(&self) -> Result<&DVector<f64>> {
        self.q0.as_ref().ok_or_else(prerequisites_missing)
    }

    /// Deformed RIC matrix, one column per deformation. Available after
    /// [`extract`](Sith::extract).
    pub fn qf(&self) -> Result<&DMatrix<f64>> {
        self.qf.as_ref().ok_or_else(prerequisites_missing)
    }

    /// Angle-corrected displacement matrix `qF − q0`. Available after
    /// [`extract`](Sith::extract).
    pub fn delta_q(&self) -> Result<&DMatrix<f64>> {
        self.delta_q.as_ref().ok_or_else(prerequisites_missing)
    }

    /// Per-DOF stress energies `[DOF, deformation]` in Hartree. Available
    /// after [`analyze`](Sith::analyze).
    pub fn energies(&self) -> Result<&DMatrix<f64>> {
        self.energies.as_ref().ok_or_else(|| no_results("energies"))
    }

    /// Total deformation energy per deformation in Hartree. Available after
    /// [`analyze`](Sith::analyze).
    pub fn deformation_energy(&self) -> Result<&RowDVector<f64>> {
        self.deformation_energy
            .as_ref()
            .ok_or_else(|| no_results("deformation_energy"))
    }

    /// Percentage contribution of each DOF to its deformation's total.
    /// Available after [`analyze`](Sith::analyze).
    pub fn proportional_energies(&self) -> Result<&DMatrix<f64>> {
        self.proportional_energies
            .as_ref()
            .ok_or_else(|| no_results("proportional_energies"))
    }

    fn deformed_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.deformed_path.exists() {
            return Err(SithError::File(format!(
                "path does not exist: {}",
                self.deformed_path.display()
            )));
        }
        if !self.deformed_path.is_dir() {
            return Ok(vec![self.deformed_path.clone()]);
        }
        let entries = fs::read_dir(&self.deformed_path).map_err(|e| {
            SithError::File(format!(
                "cannot read directory {}: {}",
                self.deformed_path.display(),
                e
            ))
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "fchk"))
            .collect();
        if paths.is_empty() {
            return Err(SithError::File(format!(
                "directory contains no deformed geometry files (*.fchk): {}",
                self.deformed_path.display()
            )));
        }
        paths.sort();
        debug!("found {} deformed geometry file(s)", paths.len());
        Ok(paths)
    }
}

fn prerequisites_missing() -> SithError {
    SithError::Sequencing("analysis prerequisites missing: call extract() first".to_string())
}

fn no_results(what: &str) -> SithError {
    SithError::Sequencing(format!("no {} available: call analyze() first", what))
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(SithError::File(format!(
            "path does not exist: {}",
            path.display()
        )));
    }
    let content = fs::read_to_string(path)
        .map_err(|e| SithError::File(format!("cannot read {}: {}", path.display(), e)))?;
    let lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
    if lines.is_empty() {
        return Err(SithError::File(format!(
            "file is empty: {}",
            path.display()
        )));
    }
    Ok(lines)
}

/// Removes the configured DOFs, and every DOF touching a configured atom,
/// from the reference geometry. Deformed geometries are never killed
/// directly; they lose DOFs only through reconciliation.
fn apply_kill(reference: &mut Geometry, kill_dofs: &[DofIndex], kill_atoms: &[usize]) {
    let positions: Vec<usize> = reference
        .dim_indices
        .iter()
        .enumerate()
        .filter(|(_, dof)| {
            kill_dofs.contains(dof) || kill_atoms.iter().any(|&atom| dof.contains_atom(atom))
        })
        .map(|(i, _)| i)
        .collect();
    debug!(
        "removing {} DOF(s) from reference '{}'",
        positions.len(),
        reference.name
    );
    reference.kill_dofs(&positions);
}

/// Drops DOFs absent from the reference out of each deformed geometry.
///
/// The asymmetry is intentional: the reference defines the canonical
/// coordinate set, so a reference DOF missing from a deformed structure is a
/// fatal consistency error while the reverse is silently reconciled.
fn reconcile(reference: &Geometry, deformed: &mut [Geometry]) -> Result<()> {
    for geometry in deformed.iter_mut() {
        let extra: Vec<usize> = geometry
            .dim_indices
            .iter()
            .enumerate()
            .filter(|(_, dof)| !reference.dim_indices.contains(dof))
            .map(|(i, _)| i)
            .collect();
        if !extra.is_empty() {
            debug!(
                "dropping {} DOF(s) from '{}' not present in the reference",
                extra.len(),
                geometry.name
            );
            geometry.kill_dofs(&extra);
        }
        for dof in &reference.dim_indices {
            if !geometry.dim_indices.contains(dof) {
                return Err(SithError::Consistency(format!(
                    "reference degree of freedom {:?} is missing in deformed structure '{}'",
                    dof, geometry.name
                )));
            }
        }
    }
    Ok(())
}

/// All structures must agree on atom count, dimensions, and DOF ordering;
/// the displacement columns are aligned purely by position.
fn validate_geometries(reference: &Geometry, deformed: &[Geometry]) -> Result<()> {
    for geometry in deformed {
        if geometry.n_atoms != reference.n_atoms {
            return Err(SithError::Consistency(format!(
                "'{}' has {} atoms but the reference '{}' has {}",
                geometry.name, geometry.n_atoms, reference.name, reference.n_atoms
            )));
        }
        if geometry.dims != reference.dims {
            return Err(SithError::Consistency(format!(
                "'{}' has dimensions {:?} but the reference has {:?}",
                geometry.name, geometry.dims, reference.dims
            )));
        }
        if geometry.dim_indices != reference.dim_indices {
            return Err(SithError::Consistency(format!(
                "'{}' lists the same DOFs as the reference but in a different order",
                geometry.name
            )));
        }
    }
    Ok(())
}

/// Folds a raw angle difference back across the (−π, π] branch cut.
///
/// Angles are reported on a (−π, π] branch, so a structure crossing the
/// boundary shows a spurious near-2π jump under naive subtraction; the fold
/// recovers the short-way-around difference.
fn fold_branch(delta: f64) -> f64 {
    if delta > PI {
        2.0 * PI - delta
    } else if delta < -PI {
        -(delta + 2.0 * PI)
    } else {
        delta
    }
}

/// Full quadratic form `1/2 · ΔQᵀ · H · ΔQ`.
fn total_energy(hessian: &DMatrix<f64>, delta: &DVector<f64>) -> f64 {
    0.5 * delta.dot(&(hessian * delta))
}

/// Quadratic form over the displacement with every row except `j` zeroed.
fn isolated_energy(hessian: &DMatrix<f64>, delta: &DVector<f64>, j: usize) -> f64 {
    let mut isolated = DVector::zeros(delta.len());
    isolated[j] = delta[j];
    0.5 * isolated.dot(&(hessian * &isolated))
}
