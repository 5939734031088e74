//! Unit conversions between atomic units and lab units.
//!
//! Checkpoint files report everything in atomic units: bond lengths in Bohr,
//! angles and dihedrals in radians, energies in Hartree, force constants in
//! Ha/Bohr² and Ha/rad². Reporting layers typically want Angstrom and
//! degrees; these functions convert between the two systems.

use std::f64::consts::PI;

/// Bohr radius in Angstrom
pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;
const ANGSTROM_TO_BOHR: f64 = 1.0 / BOHR_TO_ANGSTROM;

/// Convert a length from Angstrom to Bohr.
pub fn angstrom_to_bohr(a: f64) -> f64 {
    a * ANGSTROM_TO_BOHR
}

/// Convert a length from Bohr to Angstrom.
pub fn bohr_to_angstrom(b: f64) -> f64 {
    b * BOHR_TO_ANGSTROM
}

/// Convert an angle from radians to degrees.
pub fn radian_to_degree(r: f64) -> f64 {
    r * 180.0 / PI
}

/// Convert an angle from degrees to radians.
pub fn degree_to_radian(d: f64) -> f64 {
    d * PI / 180.0
}
