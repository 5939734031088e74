//! Packed lower-triangular storage for symmetric matrices.
//!
//! Checkpoint files store the internal-coordinate Hessian as a flat sequence
//! of its N(N+1)/2 lower-triangular entries in row-major order starting at
//! row 0:
//!
//! ```text
//!    C0 C1 C2 C3
//! R0 0
//! R1 1  2
//! R2 3  4  5
//! R3 6  7  8  9
//! ```
//!
//! [`LtMatrix`] converts between that packed form and the full symmetric
//! `DMatrix` used by the analysis.

use crate::error::{Result, SithError};
use nalgebra::DMatrix;

/// Symmetric matrix stored as a packed lower-triangular sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct LtMatrix {
    values: Vec<f64>,
    dimension: usize,
}

impl LtMatrix {
    /// Wraps a packed lower-triangular sequence.
    ///
    /// Fails with a format error when the length is not a triangular number,
    /// since such a sequence cannot come from a square symmetric matrix.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(SithError::Format(
                "force constant block is empty".to_string(),
            ));
        }
        let (row, col) = Self::row_column_of(values.len() - 1);
        if row != col {
            return Err(SithError::Format(format!(
                "force constant block of length {} is not a packed triangular matrix",
                values.len()
            )));
        }
        Ok(Self {
            values,
            dimension: row + 1,
        })
    }

    /// Repacks a symmetric matrix into lower-triangular form.
    pub fn from_full(matrix: &DMatrix<f64>) -> Self {
        let n = matrix.nrows();
        let mut values = Vec::with_capacity(n * (n + 1) / 2);
        for i in 0..n {
            for j in 0..=i {
                values.push(matrix[(i, j)]);
            }
        }
        Self {
            values,
            dimension: n,
        }
    }

    /// Returns the (row, column) of the nth packed entry, all counted from
    /// zero.
    ///
    /// Uses the closed-form inverse of the triangular-number formula.
    pub fn row_column_of(n: usize) -> (usize, usize) {
        let n = n + 1;
        let y = (((1.0 + 8.0 * n as f64).sqrt() - 1.0) / 2.0).floor() as usize;
        let b = n - y * (y + 1) / 2;
        if b == 0 {
            (y - 1, y - 1)
        } else {
            (y, b - 1)
        }
    }

    /// Returns the packed index of entry (i, j), counted from zero.
    ///
    /// Symmetric: `position_of(i, j) == position_of(j, i)`.
    pub fn position_of(i: usize, j: usize) -> usize {
        let (mut i, mut j) = (i + 1, j + 1);
        if i < j {
            std::mem::swap(&mut i, &mut j);
        }
        i * (i - 1) / 2 + j - 1
    }

    /// Side length of the full matrix.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Entry at (i, j) of the full symmetric matrix.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[Self::position_of(i, j)]
    }

    /// Expands the packed sequence into the full symmetric matrix.
    pub fn to_full_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.dimension, self.dimension, |i, j| self.get(i, j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_column_of_known_values() {
        assert_eq!(LtMatrix::row_column_of(0), (0, 0));
        assert_eq!(LtMatrix::row_column_of(1), (1, 0));
        assert_eq!(LtMatrix::row_column_of(2), (1, 1));
        assert_eq!(LtMatrix::row_column_of(18), (5, 3));
        assert_eq!(LtMatrix::row_column_of(20), (5, 5));
    }

    #[test]
    fn test_position_of_known_values() {
        assert_eq!(LtMatrix::position_of(0, 0), 0);
        assert_eq!(LtMatrix::position_of(3, 4), 13);
        assert_eq!(LtMatrix::position_of(4, 3), 13);
        assert_eq!(LtMatrix::position_of(5, 5), 20);
    }

    #[test]
    fn test_mutual_inverses() {
        for n in 0..210 {
            let (i, j) = LtMatrix::row_column_of(n);
            assert_eq!(LtMatrix::position_of(i, j), n);
            assert_eq!(LtMatrix::position_of(j, i), n);
        }
    }

    #[test]
    fn test_to_full_matrix() {
        // 3x3 matrix packed as [1, 2, 3, 4, 5, 6]
        let lt = LtMatrix::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(lt.dimension(), 3);
        let full = lt.to_full_matrix();
        assert_eq!(full[(0, 0)], 1.0);
        assert_eq!(full[(1, 0)], 2.0);
        assert_eq!(full[(0, 1)], 2.0);
        assert_eq!(full[(1, 1)], 3.0);
        assert_eq!(full[(2, 0)], 4.0);
        assert_eq!(full[(2, 1)], 5.0);
        assert_eq!(full[(2, 2)], 6.0);
        assert_eq!(full.transpose(), full);
    }

    #[test]
    fn test_round_trip_packing() {
        for n in 1..8 {
            let m = DMatrix::from_fn(n, n, |i, j| (i * n + j) as f64).symmetric_part();
            let repacked = LtMatrix::from_full(&m).to_full_matrix();
            assert_eq!(repacked, m);
        }
    }

    #[test]
    fn test_non_triangular_length_rejected() {
        assert!(LtMatrix::new(vec![1.0, 2.0]).is_err());
        assert!(LtMatrix::new(vec![1.0; 7]).is_err());
        assert!(LtMatrix::new(Vec::new()).is_err());
    }
}
