//! Checkpoint-file scanning into [`Geometry`] values.
//!
//! Quantum-chemistry packages emit a line-oriented formatted checkpoint
//! ("fchk") file in which each data section is announced by a literal header
//! substring and terminated by the header of a known following section. The
//! [`Extractor`] makes a single forward pass over the lines of one such file,
//! collects the raw section captures, and then builds one completed
//! [`Geometry`] (atoms, energy, redundant internal coordinates, Hessian).
//!
//! Collecting first and building afterwards keeps the scan order-insensitive
//! — headers may appear at any line position — and guarantees that a build
//! failure never leaves a partially-populated geometry observable.

use crate::error::{Result, SithError};
use crate::geometry::Geometry;
use crate::matrix::LtMatrix;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};

const NATOMS_HEADER: &str = "Number of atoms";
const ATOMIC_NUMBERS_HEADER: &str = "Atomic numbers";
const ENERGY_HEADER: &str = "Total Energy";
const DIMS_HEADER: &str = "Redundant internal dimensions";
const DIM_INDICES_HEADER: &str = "Redundant internal coordinate indices";
const RIC_HEADER: &str = "Redundant internal coordinates";
const RIC_END: &str = "ZRed-IntVec";
const CARTESIAN_HEADER: &str = "Current cartesian coordinates";
const CARTESIAN_END: &str = "Force Field";
const HESSIAN_HEADER: &str = "Internal Force Constants";
const HESSIAN_END: &str = "Mulliken Charges";

lazy_static! {
    // Robust floating-point pattern: handles 1.23, -0.032, 1.2e-4, .123, etc.
    static ref FLOAT_RE: String = r"[-+]?(?:\d+\.\d*|\.\d+)(?:[eE][-+]?\d+)?".to_string();

    // Trailing value on a scalar header line, e.g.
    // "Total Energy                               R     -1.15509727E+02"
    static ref SCALAR_TAIL_RE: Regex =
        Regex::new(&format!(r"({})\s*$", *FLOAT_RE)).unwrap();
    static ref INT_TAIL_RE: Regex = Regex::new(r"(\d+)\s*$").unwrap();
}

/// Scans the text lines of one checkpoint file into a [`Geometry`].
pub struct Extractor {
    path: PathBuf,
    name: String,
    lines: Vec<String>,
    geometry: Option<Geometry>,
}

impl Extractor {
    /// Creates an extractor over the lines of the file at `path`.
    ///
    /// The geometry name is derived from the file stem; the lines are taken
    /// as already read so callers control file access and buffering.
    pub fn new(path: &Path, lines: Vec<String>) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "geometry".to_string());
        Self {
            path: path.to_path_buf(),
            name,
            lines,
            geometry: None,
        }
    }

    /// Geometry name derived from the source file stem.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the scan and builds the geometry.
    ///
    /// Fails with a [`SithError::Format`] error when a required section never
    /// appears or a section runs past its end marker, and propagates every
    /// [`Geometry`] build error unchanged.
    pub fn extract(&mut self) -> Result<()> {
        let mut n_atoms: Option<usize> = None;
        let mut atomic_numbers: Option<Vec<usize>> = None;
        let mut energy: Option<f64> = None;
        let mut dim_line: Option<String> = None;
        let mut index_lines: Option<Vec<String>> = None;
        let mut ric_lines: Option<Vec<String>> = None;
        let mut cartesian_lines: Option<Vec<String>> = None;
        let mut hessian_values: Option<Vec<f64>> = None;

        let mut i = 0;
        while i < self.lines.len() {
            let line = self.lines[i].clone();

            if line.contains(NATOMS_HEADER) {
                n_atoms = Some(self.parse_int_tail(&line, NATOMS_HEADER)?);
            } else if line.contains(ATOMIC_NUMBERS_HEADER) {
                let values_line = self.following_line(i, ATOMIC_NUMBERS_HEADER)?;
                let mut numbers = Vec::new();
                for token in values_line.split_whitespace() {
                    numbers.push(token.parse().map_err(|_| {
                        SithError::Format(format!("non-numeric atomic number '{}'", token))
                    })?);
                }
                atomic_numbers = Some(numbers);
                i += 1;
            } else if line.contains(ENERGY_HEADER) {
                energy = Some(self.parse_float_tail(&line, ENERGY_HEADER)?);
            } else if line.contains(DIMS_HEADER) {
                dim_line = Some(self.following_line(i, DIMS_HEADER)?);
                i += 1;
            } else if line.contains(DIM_INDICES_HEADER) {
                // The indices block ends where the RIC value section begins;
                // that header line must be reprocessed by the outer loop.
                let (block, end) = self.capture_until(i + 1, DIM_INDICES_HEADER, RIC_HEADER)?;
                index_lines = Some(block);
                i = end - 1;
            } else if line.contains(RIC_HEADER) {
                let (block, end) = self.capture_until(i + 1, RIC_HEADER, RIC_END)?;
                ric_lines = Some(block);
                i = end;
            } else if line.contains(CARTESIAN_HEADER) {
                let (block, end) =
                    self.capture_until(i + 1, CARTESIAN_HEADER, CARTESIAN_END)?;
                cartesian_lines = Some(block);
                i = end;
            } else if line.contains(HESSIAN_HEADER) {
                let (block, end) = self.capture_until(i + 1, HESSIAN_HEADER, HESSIAN_END)?;
                let mut values = Vec::new();
                for token in block.iter().flat_map(|l| l.split_whitespace()) {
                    values.push(token.parse().map_err(|_| {
                        SithError::Format(format!(
                            "non-numeric value '{}' in force constant block",
                            token
                        ))
                    })?);
                }
                hessian_values = Some(values);
                i = end;
            }

            i += 1;
        }

        let n_atoms = n_atoms.ok_or_else(|| self.missing_section(NATOMS_HEADER))?;
        let atomic_numbers =
            atomic_numbers.ok_or_else(|| self.missing_section(ATOMIC_NUMBERS_HEADER))?;
        let energy = energy.ok_or_else(|| self.missing_section(ENERGY_HEADER))?;
        let dim_line = dim_line.ok_or_else(|| self.missing_section(DIMS_HEADER))?;
        let index_lines =
            index_lines.ok_or_else(|| self.missing_section(DIM_INDICES_HEADER))?;
        let ric_lines = ric_lines.ok_or_else(|| self.missing_section(RIC_HEADER))?;
        let cartesian_lines =
            cartesian_lines.ok_or_else(|| self.missing_section(CARTESIAN_HEADER))?;
        let hessian_values =
            hessian_values.ok_or_else(|| self.missing_section(HESSIAN_HEADER))?;

        let mut geometry = Geometry::new(&self.name, &self.path, n_atoms);
        geometry.energy = Some(energy);
        geometry.build_ric(&dim_line, &index_lines, &ric_lines)?;
        geometry.build_atoms(&cartesian_lines, &atomic_numbers)?;
        geometry.hessian = Some(LtMatrix::new(hessian_values)?.to_full_matrix());

        debug!(
            "extracted '{}': {} atoms, {} DOFs ({} bonds, {} angles, {} dihedrals)",
            geometry.name,
            geometry.n_atoms,
            geometry.dims[0],
            geometry.dims[1],
            geometry.dims[2],
            geometry.dims[3]
        );
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Borrows the extracted geometry.
    ///
    /// Fails with a [`SithError::Sequencing`] error when called before a
    /// successful [`extract`](Extractor::extract).
    pub fn geometry(&self) -> Result<&Geometry> {
        self.geometry.as_ref().ok_or_else(|| {
            SithError::Sequencing(format!(
                "no geometry for '{}': call extract() first",
                self.name
            ))
        })
    }

    /// Takes ownership of the extracted geometry, leaving the extractor
    /// empty. Same sequencing requirement as [`geometry`](Extractor::geometry).
    pub fn take_geometry(&mut self) -> Result<Geometry> {
        self.geometry.take().ok_or_else(|| {
            SithError::Sequencing(format!(
                "no geometry for '{}': call extract() first",
                self.name
            ))
        })
    }

    fn missing_section(&self, header: &str) -> SithError {
        SithError::Format(format!(
            "missing section '{}' in {}",
            header,
            self.path.display()
        ))
    }

    fn following_line(&self, header_index: usize, header: &str) -> Result<String> {
        self.lines
            .get(header_index + 1)
            .cloned()
            .ok_or_else(|| {
                SithError::Format(format!(
                    "section '{}' in {} has no data line",
                    header,
                    self.path.display()
                ))
            })
    }

    /// Collects the lines from `start` up to (not including) the first line
    /// containing `marker`, returning the block and the marker's index.
    fn capture_until(
        &self,
        start: usize,
        header: &str,
        marker: &str,
    ) -> Result<(Vec<String>, usize)> {
        let mut end = start;
        while end < self.lines.len() && !self.lines[end].contains(marker) {
            end += 1;
        }
        if end == self.lines.len() {
            return Err(SithError::Format(format!(
                "section '{}' in {} is not terminated by '{}'",
                header,
                self.path.display(),
                marker
            )));
        }
        Ok((self.lines[start..end].to_vec(), end))
    }

    fn parse_int_tail(&self, line: &str, header: &str) -> Result<usize> {
        let captures = INT_TAIL_RE.captures(line).ok_or_else(|| {
            SithError::Format(format!(
                "could not read integer value from '{}' line in {}",
                header,
                self.path.display()
            ))
        })?;
        captures[1].parse().map_err(|_| {
            SithError::Format(format!("invalid integer on '{}' line", header))
        })
    }

    fn parse_float_tail(&self, line: &str, header: &str) -> Result<f64> {
        let captures = SCALAR_TAIL_RE.captures(line).ok_or_else(|| {
            SithError::Format(format!(
                "could not read value from '{}' line in {}",
                header,
                self.path.display()
            ))
        })?;
        captures[1].parse().map_err(|_| {
            SithError::Format(format!("invalid value on '{}' line", header))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DofIndex;

    // Minimal water-like checkpoint: 3 atoms, 2 bonds, 1 angle.
    fn water_lines() -> Vec<String> {
        let text = "\
water relaxed geometry
Number of atoms                            I                3
Atomic numbers                             I   N=           3
           8           1           1
Total Energy                               R     -7.64262905E+01
Redundant internal dimensions              I   N=           4
           3           2           1           0
Redundant internal coordinate indices      I   N=          12
           1           2           0           0           1           3
           0           0           2           1           3           0
Redundant internal coordinates             R   N=           3
  1.80943000E+00  1.80943000E+00  1.82387341E+00
ZRed-IntVec                                I   N=           3
           1           1           1
Current cartesian coordinates              R   N=           9
  0.00000000E+00  0.00000000E+00  0.00000000E+00  1.80943000E+00  0.00000000E+00
  0.00000000E+00 -4.50923925E-01  1.75228823E+00  0.00000000E+00
Force Field                                I                0
Internal Force Constants                   R   N=           6
  5.00000000E-01  0.00000000E+00  5.00000000E-01  0.00000000E+00  0.00000000E+00
  2.50000000E-01
Mulliken Charges                           R   N=           3
 -3.30000000E-01  1.65000000E-01  1.65000000E-01
";
        text.lines().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_extract_water() {
        let mut extractor = Extractor::new(Path::new("/tmp/water.fchk"), water_lines());
        extractor.extract().unwrap();
        let geo = extractor.geometry().unwrap();
        assert_eq!(geo.name, "water");
        assert_eq!(geo.n_atoms, 3);
        assert_eq!(geo.dims, [3, 2, 1, 0]);
        assert_eq!(geo.dim_indices[0], DofIndex::Bond(1, 2));
        assert_eq!(geo.dim_indices[2], DofIndex::Angle(2, 1, 3));
        assert!((geo.energy.unwrap() + 76.4262905).abs() < 1e-6);
        assert_eq!(geo.atoms.len(), 3);
        assert_eq!(geo.atoms[0].symbol, "O");
        let hessian = geo.hessian.as_ref().unwrap();
        assert_eq!(hessian.nrows(), 3);
        assert_eq!(hessian[(0, 0)], 0.5);
        assert_eq!(hessian[(2, 2)], 0.25);
        assert_eq!(hessian[(2, 0)], 0.0);
    }

    #[test]
    fn test_missing_section() {
        let lines: Vec<String> = water_lines()
            .into_iter()
            .filter(|l| !l.contains("Total Energy"))
            .collect();
        let mut extractor = Extractor::new(Path::new("/tmp/water.fchk"), lines);
        let err = extractor.extract().unwrap_err();
        assert!(err.to_string().contains("missing section 'Total Energy'"));
    }

    #[test]
    fn test_unterminated_section() {
        let mut lines = water_lines();
        lines.retain(|l| !l.contains("Mulliken Charges"));
        let mut extractor = Extractor::new(Path::new("/tmp/water.fchk"), lines);
        let err = extractor.extract().unwrap_err();
        assert!(err.to_string().contains("not terminated by 'Mulliken Charges'"));
    }

    #[test]
    fn test_geometry_before_extract() {
        let extractor = Extractor::new(Path::new("/tmp/water.fchk"), water_lines());
        let err = extractor.geometry().unwrap_err();
        assert!(matches!(err, SithError::Sequencing(_)));
        assert!(err.to_string().contains("no geometry"));
    }

    #[test]
    fn test_build_errors_propagate() {
        // Corrupt one RIC value; the geometry build error must surface as-is.
        let lines: Vec<String> = water_lines()
            .into_iter()
            .map(|l| l.replace("1.82387341E+00", "oops"))
            .collect();
        let mut extractor = Extractor::new(Path::new("/tmp/water.fchk"), lines);
        let err = extractor.extract().unwrap_err();
        assert!(err.to_string().contains("non-numeric value 'oops'"));
        assert!(extractor.geometry().is_err());
    }
}
