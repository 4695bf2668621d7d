use super::{DenseMatrix, LinearSolver, MatrixAccess, Scalar, SolveError};
use nalgebra::DMatrix;

/// Largest system the dense solver will attempt by default
pub const MAX_DENSE_SIZE: usize = 4000;

/// Pivots smaller than this fraction of the largest pivot mark the matrix as singular
///
/// The test is relative, so an invertible but badly scaled matrix such as `diag(1, 1e-14)` is
/// also reported as [SolveError::Singular]. Lower [NalgebraSolver::pivot_tolerance] (down to
/// `0.0`, which only rejects exact zero pivots) to solve such systems.
pub const PIVOT_TOLERANCE: f64 = 1.0e-13;

/// Dense linear solver built on Nalgebra's LU decomposition (partial pivoting)
///
/// Band matrices are expanded into dense storage before factoring, so memory use is `O(N²)`
/// regardless of the input's storage type.
#[derive(Debug, Clone, Copy)]
pub struct NalgebraSolver {
    pub max_dense_size: usize,
    pub pivot_tolerance: f64,
}

impl Default for NalgebraSolver {
    fn default() -> Self {
        Self {
            max_dense_size: MAX_DENSE_SIZE,
            pivot_tolerance: PIVOT_TOLERANCE,
        }
    }
}

impl LinearSolver for NalgebraSolver {
    fn solve<A: MatrixAccess>(
        &self,
        a: &A,
        b: &DenseMatrix<A::Elem>,
    ) -> Result<DenseMatrix<A::Elem>, SolveError> {
        if !a.is_square() {
            return Err(SolveError::NotSquare {
                rows: a.rows(),
                cols: a.cols(),
            });
        }
        if b.rows() != a.rows() {
            return Err(SolveError::DimensionMismatch {
                expected: a.rows(),
                got: b.rows(),
            });
        }
        if a.rows() > self.max_dense_size {
            return Err(SolveError::ProblemTooLarge {
                size: a.rows(),
                max: self.max_dense_size,
            });
        }

        let n = a.rows();
        let lu = DMatrix::from_fn(n, n, |r, c| a.get(r, c)).lu();

        if !pivots_are_usable(&lu.u(), self.pivot_tolerance) {
            log::debug!("LU factorization of a {}x{} matrix hit a vanishing pivot", n, n);
            return Err(SolveError::Singular);
        }

        let rhs: DMatrix<A::Elem> = b.into();
        lu.solve(&rhs)
            .map(DenseMatrix::from)
            .ok_or(SolveError::Singular)
    }
}

fn pivots_are_usable<T: Scalar>(u: &DMatrix<T>, tolerance: f64) -> bool {
    let pivots: Vec<f64> = u.diagonal().iter().map(|p| p.modulus()).collect();
    let max_pivot = pivots.iter().cloned().fold(0.0, f64::max);

    pivots.is_empty() || (max_pivot > 0.0 && pivots.iter().all(|p| *p > tolerance * max_pivot))
}
