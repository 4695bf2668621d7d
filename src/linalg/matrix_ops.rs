//! Stateless matrix algebra over the [MatrixAccess] contract
//!
//! Every function takes its operands by reference and returns a freshly allocated result.
//! Mixed real/complex operands are supported through `Into` conversions on the element types,
//! so the output scalar usually has to be named at the call site:
//!
//! ```ignore
//! let c: DenseMatrix<Complex64> = product(&real_mat, &complex_mat);
//! ```
//!
//! Band operands are read through the same indexed access as dense ones (there is no
//! band-specific fast path), except for the band-to-band sum/difference/scaling functions
//! which only ever visit the stored upper band.

use super::{DenseMatrix, LinearSolver, MatrixAccess, Scalar, SolveError, SymmetricBandMatrix};
use nalgebra::ComplexField;
use std::ops::{Add, Mul, Sub};

/// Matrix product `A·B`
pub fn product<A, B, T>(a: &A, b: &B) -> DenseMatrix<T>
where
    A: MatrixAccess,
    B: MatrixAccess,
    A::Elem: Into<T>,
    B::Elem: Into<T>,
    T: Scalar,
{
    assert_eq!(
        a.cols(),
        b.rows(),
        "A has {} columns but B has {} rows; cannot compute matrix product!",
        a.cols(),
        b.rows()
    );

    let mut c = DenseMatrix::new(a.rows(), b.cols());
    for i in 0..a.rows() {
        for j in 0..b.cols() {
            let mut sum = T::zero();
            for k in 0..a.cols() {
                let a_ik: T = a.get(i, k).into();
                let b_kj: T = b.get(k, j).into();
                sum += a_ik * b_kj;
            }
            c.set(i, j, sum);
        }
    }
    c
}

/// Matrix-vector product `y = A·x`
pub fn product_vec<A, U, T>(a: &A, x: &[U]) -> Vec<T>
where
    A: MatrixAccess,
    A::Elem: Into<T>,
    U: Copy + Into<T>,
    T: Scalar,
{
    assert_eq!(
        a.cols(),
        x.len(),
        "A has {} columns but x has {} entries; cannot compute matrix-vector product!",
        a.cols(),
        x.len()
    );

    (0..a.rows())
        .map(|i| {
            x.iter().enumerate().fold(T::zero(), |sum, (k, x_k)| {
                let a_ik: T = a.get(i, k).into();
                let x_k: T = (*x_k).into();
                sum + a_ik * x_k
            })
        })
        .collect()
}

/// Scalar product `α·A`
pub fn scale<A, S, T>(alpha: S, a: &A) -> DenseMatrix<T>
where
    A: MatrixAccess,
    A::Elem: Into<T>,
    S: Into<T>,
    T: Scalar,
{
    let alpha: T = alpha.into();
    DenseMatrix::from_fn(a.rows(), a.cols(), |r, c| {
        let a_rc: T = a.get(r, c).into();
        alpha * a_rc
    })
}

/// Scalar product `α·A` for a band matrix. Only the stored band is visited.
pub fn scale_band<S, U, T>(alpha: S, a: &SymmetricBandMatrix<U>) -> SymmetricBandMatrix<T>
where
    S: Into<T>,
    U: Scalar + Into<T>,
    T: Scalar,
{
    let alpha: T = alpha.into();
    let mut scaled = SymmetricBandMatrix::with_bandwidth(a.dimension(), a.bandwidth());
    for ([row, col], value) in a.iter_upper_band() {
        let value: T = value.into();
        scaled.set(row, col, alpha * value);
    }
    scaled
}

/// Element-wise sum `A + B`
pub fn plus<A, B, T>(a: &A, b: &B) -> DenseMatrix<T>
where
    A: MatrixAccess,
    B: MatrixAccess,
    A::Elem: Into<T>,
    B::Elem: Into<T>,
    T: Scalar,
{
    assert_same_shape(a, b, "sum");
    DenseMatrix::from_fn(a.rows(), a.cols(), |r, c| {
        let (a_rc, b_rc): (T, T) = (a.get(r, c).into(), b.get(r, c).into());
        a_rc + b_rc
    })
}

/// Element-wise difference `A - B`
pub fn minus<A, B, T>(a: &A, b: &B) -> DenseMatrix<T>
where
    A: MatrixAccess,
    B: MatrixAccess,
    A::Elem: Into<T>,
    B::Elem: Into<T>,
    T: Scalar,
{
    assert_same_shape(a, b, "difference");
    DenseMatrix::from_fn(a.rows(), a.cols(), |r, c| {
        let (a_rc, b_rc): (T, T) = (a.get(r, c).into(), b.get(r, c).into());
        a_rc - b_rc
    })
}

/// Sum of two band matrices.
///
/// The result's bandwidth is the larger of the two operands' bandwidths; only its upper triangle is computed.
pub fn plus_band<U, V, T>(a: &SymmetricBandMatrix<U>, b: &SymmetricBandMatrix<V>) -> SymmetricBandMatrix<T>
where
    U: Scalar + Into<T>,
    V: Scalar + Into<T>,
    T: Scalar,
{
    combine_bands(a, b, |x, y| x + y)
}

/// Difference of two band matrices (see [plus_band])
pub fn minus_band<U, V, T>(a: &SymmetricBandMatrix<U>, b: &SymmetricBandMatrix<V>) -> SymmetricBandMatrix<T>
where
    U: Scalar + Into<T>,
    V: Scalar + Into<T>,
    T: Scalar,
{
    combine_bands(a, b, |x, y| x - y)
}

fn combine_bands<U, V, T>(
    a: &SymmetricBandMatrix<U>,
    b: &SymmetricBandMatrix<V>,
    op: impl Fn(T, T) -> T,
) -> SymmetricBandMatrix<T>
where
    U: Scalar + Into<T>,
    V: Scalar + Into<T>,
    T: Scalar,
{
    assert_eq!(
        a.dimension(),
        b.dimension(),
        "Band matrices have different dimensions ({} and {}); cannot combine!",
        a.dimension(),
        b.dimension()
    );

    let bandwidth = a.bandwidth().max(b.bandwidth());
    let mut c = SymmetricBandMatrix::with_bandwidth(a.dimension(), bandwidth);
    for col in 0..c.dimension() {
        for row in col.saturating_sub(bandwidth)..=col {
            c.set(row, col, op(a.get(row, col).into(), b.get(row, col).into()));
        }
    }
    c
}

/// Transposed copy of any matrix
pub fn transpose<A: MatrixAccess>(a: &A) -> DenseMatrix<A::Elem> {
    DenseMatrix::from_fn(a.cols(), a.rows(), |r, c| a.get(c, r))
}

/// Conjugate-transposed copy of any matrix (a plain transpose for real matrices)
pub fn conjugate_transpose<A: MatrixAccess>(a: &A) -> DenseMatrix<A::Elem> {
    DenseMatrix::from_fn(a.cols(), a.rows(), |r, c| a.get(c, r).conjugate())
}

/// Conjugate-transposed copy of a band matrix.
///
/// The result stays symmetric, so only its upper band is filled (from the mirrored entries of `a`).
pub fn conjugate_transpose_band<T: Scalar>(a: &SymmetricBandMatrix<T>) -> SymmetricBandMatrix<T> {
    let mut c = SymmetricBandMatrix::with_bandwidth(a.dimension(), a.bandwidth());
    for col in 0..a.dimension() {
        for row in col.saturating_sub(a.bandwidth())..=col {
            c.set(row, col, a.get(col, row).conjugate());
        }
    }
    c
}

/// Compute `A⁻¹` by solving `A·X = I` with an external linear solver.
///
/// `A` must be square. A singular `A` is reported by the solver as [SolveError::Singular].
pub fn inverse<A, S>(a: &A, solver: &S) -> Result<DenseMatrix<A::Elem>, SolveError>
where
    A: MatrixAccess,
    S: LinearSolver,
{
    assert!(
        a.is_square(),
        "Matrix must be square ({}x{}); cannot compute inverse!",
        a.rows(),
        a.cols()
    );

    let identity = DenseMatrix::identity(a.rows());
    solver.solve(a, &identity)
}

fn assert_same_shape<A: MatrixAccess, B: MatrixAccess>(a: &A, b: &B, op_name: &str) {
    assert!(
        a.rows() == b.rows() && a.cols() == b.cols(),
        "Matrices have different shapes ({}x{} and {}x{}); cannot compute {}!",
        a.rows(),
        a.cols(),
        b.rows(),
        b.cols(),
        op_name
    );
}

impl<'a, T: Scalar> Mul<&'a DenseMatrix<T>> for &'a DenseMatrix<T> {
    type Output = DenseMatrix<T>;
    fn mul(self, rhs: &'a DenseMatrix<T>) -> DenseMatrix<T> {
        product(self, rhs)
    }
}

impl<'a, T: Scalar> Add<&'a DenseMatrix<T>> for &'a DenseMatrix<T> {
    type Output = DenseMatrix<T>;
    fn add(self, rhs: &'a DenseMatrix<T>) -> DenseMatrix<T> {
        plus(self, rhs)
    }
}

impl<'a, T: Scalar> Sub<&'a DenseMatrix<T>> for &'a DenseMatrix<T> {
    type Output = DenseMatrix<T>;
    fn sub(self, rhs: &'a DenseMatrix<T>) -> DenseMatrix<T> {
        minus(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::nalgebra_solve::NalgebraSolver;
    use approx::assert_abs_diff_eq;
    use num_complex::Complex64;

    fn mat_a() -> DenseMatrix<f64> {
        DenseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
    }

    fn well_conditioned() -> DenseMatrix<f64> {
        DenseMatrix::from_rows(&[
            vec![4.0, 1.0, 0.5, 0.0],
            vec![1.0, 5.0, 1.0, 0.25],
            vec![0.5, 1.0, 6.0, 1.0],
            vec![0.0, 0.25, 1.0, 3.0],
        ])
    }

    #[test]
    fn real_product() {
        let b = DenseMatrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]);
        let c: DenseMatrix<f64> = product(&mat_a(), &b);

        assert_eq!(c.to_array(), vec![vec![4.0, 5.0], vec![10.0, 11.0]]);
        assert_eq!(&mat_a() * &b, c);
    }

    #[test]
    fn mixed_real_complex_products() {
        let a = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![0.0, 1.0]]);
        let z = DenseMatrix::from_rows(&[
            vec![Complex64::new(0.0, 1.0), Complex64::new(1.0, 0.0)],
            vec![Complex64::new(1.0, 1.0), Complex64::new(0.0, 0.0)],
        ]);

        let az: DenseMatrix<Complex64> = product(&a, &z);
        let za: DenseMatrix<Complex64> = product(&z, &a);
        let aa: DenseMatrix<Complex64> = product(&a, &a);

        assert_eq!(az.get(0, 0), Complex64::new(2.0, 3.0));
        assert_eq!(za.get(0, 1), Complex64::new(1.0, 2.0));
        assert_eq!(aa.get(0, 1), Complex64::new(4.0, 0.0));
    }

    #[test]
    fn band_operands_match_dense() {
        let dense = well_conditioned();
        let band = SymmetricBandMatrix::from_dense(&dense);

        let from_band: DenseMatrix<f64> = product(&band, &dense);
        let from_dense: DenseMatrix<f64> = product(&dense, &dense);

        assert_eq!(from_band, from_dense);
    }

    #[test]
    #[should_panic]
    fn product_dimension_mismatch() {
        let _: DenseMatrix<f64> = product(&mat_a(), &mat_a());
    }

    #[test]
    fn matrix_vector_product() {
        let y: Vec<f64> = product_vec(&mat_a(), &[1.0, 0.0, -1.0]);
        assert_eq!(y, vec![-2.0, -2.0]);

        let yz: Vec<Complex64> = product_vec(&mat_a(), &[Complex64::new(0.0, 1.0); 3]);
        assert_eq!(yz[1], Complex64::new(0.0, 15.0));
    }

    #[test]
    #[should_panic]
    fn matrix_vector_dimension_mismatch() {
        let _: Vec<f64> = product_vec(&mat_a(), &[1.0, 2.0]);
    }

    #[test]
    fn dense_sum_and_difference() {
        let a = mat_a();
        let twice: DenseMatrix<f64> = plus(&a, &a);
        let zero: DenseMatrix<f64> = minus(&a, &a);

        assert_eq!(twice, scale(2.0, &a));
        assert!(zero.as_slice().iter().all(|v| *v == 0.0));
        assert_eq!(&a + &a, twice);
        assert_eq!(&a - &a, zero);
    }

    #[test]
    #[should_panic]
    fn sum_shape_mismatch() {
        let _: DenseMatrix<f64> = plus(&mat_a(), &DenseMatrix::<f64>::identity(2));
    }

    #[test]
    fn band_sum_takes_the_wider_band() {
        let mut narrow = SymmetricBandMatrix::<f64>::with_bandwidth(5, 1);
        let mut wide = SymmetricBandMatrix::<f64>::with_bandwidth(5, 3);
        for i in 0..5 {
            narrow.set(i, i, 1.0);
            wide.set(i, i, 2.0);
        }
        narrow.set(1, 2, 0.5);
        wide.set(0, 3, -4.0);

        let sum: SymmetricBandMatrix<f64> = plus_band(&narrow, &wide);
        let diff: SymmetricBandMatrix<f64> = minus_band(&narrow, &wide);

        assert_eq!(sum.bandwidth(), 3);
        assert_eq!(sum.get(2, 2), 3.0);
        assert_eq!(sum.get(2, 1), 0.5);
        assert_eq!(sum.get(3, 0), -4.0);
        assert_eq!(diff.get(4, 4), -1.0);
        assert_eq!(diff.get(0, 3), 4.0);
    }

    #[test]
    fn complex_band_sum() {
        let real = SymmetricBandMatrix::<f64>::from_dense(&well_conditioned());
        let mut imag = SymmetricBandMatrix::<Complex64>::with_bandwidth(4, 0);
        for i in 0..4 {
            imag.set(i, i, Complex64::new(0.0, 1.0));
        }

        let sum: SymmetricBandMatrix<Complex64> = plus_band(&real, &imag);
        assert_eq!(sum.get(2, 2), Complex64::new(6.0, 1.0));
        assert_eq!(sum.get(1, 0), Complex64::new(1.0, 0.0));
    }

    #[test]
    #[should_panic]
    fn band_sum_dimension_mismatch() {
        let a = SymmetricBandMatrix::<f64>::with_bandwidth(4, 1);
        let b = SymmetricBandMatrix::<f64>::with_bandwidth(5, 1);
        let _: SymmetricBandMatrix<f64> = plus_band(&a, &b);
    }

    #[test]
    fn band_scaling() {
        let band = SymmetricBandMatrix::from_dense(&well_conditioned());
        let scaled: SymmetricBandMatrix<Complex64> = scale_band(Complex64::new(0.0, 2.0), &band);

        assert_eq!(scaled.bandwidth(), band.bandwidth());
        assert_eq!(scaled.get(3, 2), Complex64::new(0.0, 2.0));
        assert_eq!(scaled.get(0, 3), Complex64::new(0.0, 0.0));
    }

    #[test]
    fn transpose_twice() {
        let a = mat_a();
        let at = transpose(&a);

        assert_eq!(at.rows(), 3);
        assert_eq!(at.get(2, 1), 6.0);
        assert_eq!(transpose(&at), a);
    }

    #[test]
    fn conjugate_transposes() {
        let z = DenseMatrix::from_rows(&[vec![Complex64::new(1.0, 2.0), Complex64::new(3.0, -1.0)]]);
        let zh = conjugate_transpose(&z);

        assert_eq!(zh.rows(), 2);
        assert_eq!(zh.get(1, 0), Complex64::new(3.0, 1.0));

        let mut band = SymmetricBandMatrix::<Complex64>::with_bandwidth(3, 1);
        band.set(0, 1, Complex64::new(0.5, 0.5));
        let band_h = conjugate_transpose_band(&band);
        assert_eq!(band_h.get(1, 0), Complex64::new(0.5, -0.5));
    }

    #[test]
    fn inverse_recovers_identity() {
        let a = well_conditioned();
        let a_inv = inverse(&a, &NalgebraSolver::default()).unwrap();
        let id: DenseMatrix<f64> = product(&a, &a_inv);

        for r in 0..4 {
            for c in 0..4 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(id.get(r, c), expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn inverse_of_complex_band() {
        let mut band = SymmetricBandMatrix::<Complex64>::with_bandwidth(3, 1);
        for i in 0..3 {
            band.set(i, i, Complex64::new(2.0, 1.0));
        }
        band.set(0, 1, Complex64::new(0.0, -0.5));

        let inv = inverse(&band, &NalgebraSolver::default()).unwrap();
        let id: DenseMatrix<Complex64> = product(&band, &inv);

        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(id.get(r, c).re, expected, epsilon = 1e-9);
                assert_abs_diff_eq!(id.get(r, c).im, 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn singular_inverse_is_an_error() {
        let singular = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]);
        assert_eq!(
            inverse(&singular, &NalgebraSolver::default()),
            Err(SolveError::Singular)
        );
    }

    #[test]
    #[should_panic]
    fn non_square_inverse() {
        let _ = inverse(&mat_a(), &NalgebraSolver::default());
    }
}
