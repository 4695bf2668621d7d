/// Symmetric band storage sharing the dense addressing contract
pub mod band_matrix;
/// Column-major dense storage
pub mod dense_matrix;
/// Products, sums, transposes and inverses over real/complex, dense/band matrices
pub mod matrix_ops;
/// Use Nalgebra's LU decomposition as the dense linear-solve primitive
pub mod nalgebra_solve;

pub use band_matrix::SymmetricBandMatrix;
pub use dense_matrix::DenseMatrix;

use nalgebra::ComplexField;
use num_complex::Complex64;
use thiserror::Error;

/// Matrix entry type: implemented for `f64` and `Complex64`
pub trait Scalar: ComplexField<RealField = f64> + Copy {}

impl<T> Scalar for T where T: ComplexField<RealField = f64> + Copy {}

/// Indexed access shared by every matrix storage type
///
/// Element assembly and the algebra utilities only ever talk to a matrix through this trait,
/// so a dense and a banded target can be filled by the same code.
pub trait MatrixAccess {
    type Elem: Scalar;

    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    /// Read the entry at (`row`, `col`). Panics if the indices are outside the matrix.
    fn get(&self, row: usize, col: usize) -> Self::Elem;

    /// Write the entry at (`row`, `col`). Panics if the indices are outside the matrix.
    ///
    /// Storage types which only keep part of the matrix may ignore writes outside of that part.
    fn set(&mut self, row: usize, col: usize, value: Self::Elem);

    /// Is there room for a value at (`row`, `col`)?
    ///
    /// Band storage returns `false` above its band (and below it, where reads mirror the upper
    /// triangle), so callers can refuse to write entries which would be lost.
    fn stores(&self, row: usize, col: usize) -> bool {
        row < self.rows() && col < self.cols()
    }

    /// Add `value` to the entry at (`row`, `col`)
    fn add_to(&mut self, row: usize, col: usize, value: Self::Elem) {
        let current = self.get(row, col);
        self.set(row, col, current + value);
    }

    fn is_square(&self) -> bool {
        self.rows() == self.cols()
    }
}

/// A dense linear-system solver: find `X` such that `A·X = B`
pub trait LinearSolver {
    /// Solve for `X`. Implementations must return [SolveError::Singular] rather than a
    /// numerically meaningless result when `A` cannot be factored.
    fn solve<A: MatrixAccess>(
        &self,
        a: &A,
        b: &DenseMatrix<A::Elem>,
    ) -> Result<DenseMatrix<A::Elem>, SolveError>;
}

/// Error type for the external solve primitives
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Matrix is singular or nearly singular; cannot solve!")]
    Singular,
    #[error("Matrix is not square ({rows}x{cols}); cannot solve!")]
    NotSquare { rows: usize, cols: usize },
    #[error("Matrix dimensions mismatch (expected {expected} rows, got {got}); cannot solve!")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("Matrices exceeded maximum size ({size} > {max}); cannot solve!")]
    ProblemTooLarge { size: usize, max: usize },
    #[error("Eigensolver failed to converge")]
    NotConverged,
}

/// Solution to an Eigenvalue Problem
#[derive(Debug, Clone)]
pub struct EigenPair {
    /// Eigenvalue (the propagation constant β for periodic problems)
    pub value: Complex64,
    /// Eigenvector over the free Degrees of Freedom
    pub vector: Vec<Complex64>,
}

impl EigenPair {
    /// L2 normalized vector
    pub fn normalized_eigenvector(&self) -> Vec<Complex64> {
        let norm = self.vector.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt();
        if norm == 0.0 {
            return self.vector.clone();
        }
        self.vector.iter().map(|x| *x / norm).collect()
    }
}
