use super::{DenseMatrix, MatrixAccess, Scalar};
use nalgebra::ComplexField;

/// Entries with a modulus at or below this value are treated as zero when a bandwidth is
/// measured from a dense matrix
pub const BAND_DETECTION_TOLERANCE: f64 = 1.0e-12;

/// Compact storage for square-symmetric band matrices
///
/// Only the upper triangle inside the band is kept: `(bandwidth + 1) * dimension` entries,
/// with (`row`, `col`) stored at `(row - col) + bandwidth + col * (bandwidth + 1)`.
///
/// ```text
///     | a b c . . |
///     | b d e f . |        | . . c f i |
///     | c e g h i |  --->  | . b e h k |   (bandwidth = 2; one packed column per matrix column)
///     | . f h j k |        | a d g j l |
///     | . . i k l |
/// ```
///
/// * Writes into the strict lower triangle, or above the band, are ignored
/// * Reads above the band return zero; reads in the lower triangle are mirrored from `(col, row)`
#[derive(Clone, Debug, PartialEq)]
pub struct SymmetricBandMatrix<T: Scalar> {
    dimension: usize,
    bandwidth: usize,
    values: Vec<T>,
}

impl<T: Scalar> SymmetricBandMatrix<T> {
    /// Construct a zero-filled band matrix.
    ///
    /// The sub- and super-diagonal bandwidths must match since the matrix is symmetric.
    pub fn new(dimension: usize, sub_bandwidth: usize, super_bandwidth: usize) -> Self {
        assert_eq!(
            sub_bandwidth, super_bandwidth,
            "Sub and Super bandwidths must be equal for a symmetric matrix; cannot construct SymmetricBandMatrix!"
        );
        Self::with_bandwidth(dimension, super_bandwidth)
    }

    pub fn with_bandwidth(dimension: usize, bandwidth: usize) -> Self {
        Self {
            dimension,
            bandwidth,
            values: vec![T::zero(); (bandwidth + 1) * dimension],
        }
    }

    /// Build a band matrix from the upper triangle of a dense square matrix.
    ///
    /// The bandwidth is measured (see [measure_bandwidth]); entries above the measured band are dropped.
    pub fn from_dense(dense: &DenseMatrix<T>) -> Self {
        assert!(
            dense.is_square(),
            "Matrix must be square ({}x{}); cannot construct SymmetricBandMatrix!",
            dense.rows(),
            dense.cols()
        );

        let mut band = Self::with_bandwidth(dense.rows(), measure_bandwidth(dense));
        for col in 0..band.dimension {
            for row in col.saturating_sub(band.bandwidth)..=col {
                band.set(row, col, dense.get(row, col));
            }
        }
        band
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored super-diagonals (equal to the number of sub-diagonals)
    pub fn bandwidth(&self) -> usize {
        self.bandwidth
    }

    /// Symmetric matrices are their own transpose
    pub fn transpose(self) -> Self {
        self
    }

    /// The packed backing buffer
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Iterate over the stored upper band as `([row, col], value)`
    pub fn iter_upper_band(&self) -> impl Iterator<Item = ([usize; 2], T)> + '_ {
        (0..self.dimension).flat_map(move |col| {
            (col.saturating_sub(self.bandwidth)..=col)
                .map(move |row| ([row, col], self.values[self.packed_offset(row, col)]))
        })
    }

    /// Expand into a full dense matrix (both triangles populated)
    pub fn to_dense(&self) -> DenseMatrix<T> {
        let mut dense = DenseMatrix::new(self.dimension, self.dimension);
        for ([row, col], value) in self.iter_upper_band() {
            dense.set(row, col, value);
            dense.set(col, row, value);
        }
        dense
    }

    #[inline]
    fn packed_offset(&self, row: usize, col: usize) -> usize {
        (row + self.bandwidth - col) + col * (self.bandwidth + 1)
    }

    /// Location of a stored entry; `None` for the lower triangle and anything above the band
    #[inline]
    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        assert!(
            row < self.dimension,
            "row index ({}) exceeded matrix dimension ({}); cannot access band matrix!",
            row,
            self.dimension
        );
        assert!(
            col < self.dimension,
            "col index ({}) exceeded matrix dimension ({}); cannot access band matrix!",
            col,
            self.dimension
        );

        if row > col || col - row > self.bandwidth {
            None
        } else {
            Some(self.packed_offset(row, col))
        }
    }
}

impl<T: Scalar> MatrixAccess for SymmetricBandMatrix<T> {
    type Elem = T;

    fn rows(&self) -> usize {
        self.dimension
    }

    fn cols(&self) -> usize {
        self.dimension
    }

    fn get(&self, row: usize, col: usize) -> T {
        if row > col {
            return self.get(col, row);
        }
        match self.offset(row, col) {
            Some(offset) => self.values[offset],
            None => T::zero(),
        }
    }

    fn stores(&self, row: usize, col: usize) -> bool {
        row < self.dimension && col < self.dimension && row.abs_diff(col) <= self.bandwidth
    }

    fn set(&mut self, row: usize, col: usize, value: T) {
        if let Some(offset) = self.offset(row, col) {
            self.values[offset] = value;
        }
    }

    fn add_to(&mut self, row: usize, col: usize, value: T) {
        if let Some(offset) = self.offset(row, col) {
            self.values[offset] += value;
        }
    }
}

/// Measure the bandwidth of a square matrix from its upper triangle.
///
/// For each column the first entry above the diagonal (scanning from the top) whose modulus exceeds
/// [BAND_DETECTION_TOLERANCE] sets that column's gap; the largest gap is returned.
/// Entries smaller than the tolerance are not seen, so they never widen the band.
pub fn measure_bandwidth<M: MatrixAccess>(mat: &M) -> usize {
    let mut bandwidth = 0;
    for col in 0..mat.cols() {
        if let Some(row) =
            (0..col.min(mat.rows())).find(|&row| mat.get(row, col).modulus() > BAND_DETECTION_TOLERANCE)
        {
            bandwidth = bandwidth.max(col - row);
        }
    }
    bandwidth
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn tridiagonal(n: usize) -> SymmetricBandMatrix<f64> {
        let mut band = SymmetricBandMatrix::new(n, 1, 1);
        for i in 0..n {
            band.set(i, i, 2.0);
            if i + 1 < n {
                band.set(i, i + 1, -1.0);
            }
        }
        band
    }

    #[test]
    fn storage_size() {
        let band = SymmetricBandMatrix::<f64>::new(10, 3, 3);
        assert_eq!(band.as_slice().len(), 40);
        assert_eq!(band.bandwidth(), 3);
    }

    #[test]
    fn packed_layout() {
        let mut band = SymmetricBandMatrix::<f64>::with_bandwidth(4, 2);
        band.set(1, 3, 7.0);
        band.set(3, 3, 9.0);

        // (row - col) + b + col * (b + 1)
        assert_eq!(band.as_slice()[(1 + 2 - 3) + 3 * 3], 7.0);
        assert_eq!(band.as_slice()[2 + 3 * 3], 9.0);
    }

    #[test]
    fn symmetric_reads() {
        let mut band = SymmetricBandMatrix::<f64>::with_bandwidth(6, 2);
        for col in 0..6usize {
            for row in col.saturating_sub(2)..=col {
                band.set(row, col, (row * 10 + col) as f64 + 0.5);
            }
        }

        for row in 0..6 {
            for col in 0..6 {
                assert_eq!(band.get(row, col), band.get(col, row));
            }
        }
        assert_eq!(band.get(4, 2), 24.5);
    }

    #[test]
    fn lower_triangle_writes_are_ignored() {
        let mut band = SymmetricBandMatrix::<f64>::with_bandwidth(4, 1);
        band.set(0, 1, 3.0);
        band.set(1, 0, 100.0);
        band.add_to(1, 0, 100.0);

        assert_eq!(band.get(1, 0), 3.0);
        assert_eq!(band.get(0, 1), 3.0);
    }

    #[test]
    fn out_of_band_access() {
        let mut band = SymmetricBandMatrix::<f64>::with_bandwidth(5, 1);
        band.set(0, 3, 1.0);
        band.add_to(0, 4, 1.0);

        assert_eq!(band.get(0, 3), 0.0);
        assert_eq!(band.get(3, 0), 0.0);
        assert!(band.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn stored_region() {
        let band = SymmetricBandMatrix::<f64>::with_bandwidth(5, 1);

        assert!(band.stores(0, 1));
        assert!(band.stores(1, 0));
        assert!(band.stores(4, 4));
        assert!(!band.stores(0, 2));
        assert!(!band.stores(3, 1));
        assert!(!band.stores(5, 5));
    }

    #[test]
    fn transpose_is_a_no_op() {
        let band = tridiagonal(5);
        assert_eq!(band.clone().transpose(), band);
    }

    #[test]
    fn measured_from_dense() {
        let dense = DenseMatrix::from_rows(&[
            vec![4.0, 1.0, 0.0, 0.0, 0.0],
            vec![1.0, 4.0, 0.0, 2.0, 0.0],
            vec![0.0, 0.0, 4.0, 1.0, 0.0],
            vec![0.0, 2.0, 1.0, 4.0, 1.0],
            vec![0.0, 0.0, 0.0, 1.0, 4.0],
        ]);

        let band = SymmetricBandMatrix::from_dense(&dense);

        assert_eq!(band.bandwidth(), 2);
        assert_eq!(band.to_dense(), dense);
    }

    #[test]
    fn tiny_entries_do_not_widen_the_band() {
        let mut dense = DenseMatrix::<f64>::identity(4);
        dense.set(0, 3, 1e-14);
        dense.set(3, 0, 1e-14);
        dense.set(1, 2, 0.5);
        dense.set(2, 1, 0.5);

        let band = SymmetricBandMatrix::from_dense(&dense);

        assert_eq!(band.bandwidth(), 1);
        assert_eq!(band.get(0, 3), 0.0);
    }

    #[test]
    fn complex_entries() {
        let mut band = SymmetricBandMatrix::<Complex64>::with_bandwidth(3, 1);
        band.set(1, 2, Complex64::new(1.0, -2.0));

        assert_eq!(band.get(2, 1), Complex64::new(1.0, -2.0));
    }

    #[test]
    fn upper_band_iteration() {
        let band = tridiagonal(3);
        let entries: Vec<_> = band.iter_upper_band().collect();

        assert_eq!(
            entries,
            vec![
                ([0, 0], 2.0),
                ([0, 1], -1.0),
                ([1, 1], 2.0),
                ([1, 2], -1.0),
                ([2, 2], 2.0)
            ]
        );
    }

    #[test]
    #[should_panic]
    fn unequal_bandwidths() {
        let _ = SymmetricBandMatrix::<f64>::new(5, 1, 2);
    }

    #[test]
    #[should_panic]
    fn out_of_bounds_access() {
        let band = SymmetricBandMatrix::<f64>::with_bandwidth(5, 1);
        let _ = band.get(5, 5);
    }
}
