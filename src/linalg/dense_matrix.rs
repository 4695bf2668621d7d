use super::{MatrixAccess, Scalar};
use nalgebra::DMatrix;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Column-major dense matrix with bounds-checked element access
///
/// Entry (`row`, `col`) lives at `row + col * rows` in the backing buffer. This matches
/// nalgebra's storage order, so conversions to and from [DMatrix] are plain buffer copies.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix<T: Scalar> {
    rows: usize,
    cols: usize,
    values: Vec<T>,
}

impl<T: Scalar> DenseMatrix<T> {
    /// Construct a zero-filled `rows` x `cols` matrix
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![T::zero(); rows * cols],
        }
    }

    pub fn identity(dimension: usize) -> Self {
        let mut id = Self::new(dimension, dimension);
        for i in 0..dimension {
            id.values[i + i * dimension] = T::one();
        }
        id
    }

    /// Construct a matrix from a column-major buffer
    pub fn from_column_major(rows: usize, cols: usize, values: Vec<T>) -> Self {
        assert_eq!(
            values.len(),
            rows * cols,
            "Buffer length must equal rows * cols; cannot construct DenseMatrix!"
        );
        Self { rows, cols, values }
    }

    /// Construct a matrix from a row-major 2D array (the inverse of [DenseMatrix::to_array])
    pub fn from_rows(rows: &[Vec<T>]) -> Self {
        let num_rows = rows.len();
        let num_cols = rows.first().map(|r| r.len()).unwrap_or(0);

        let mut mat = Self::new(num_rows, num_cols);
        for (r, row) in rows.iter().enumerate() {
            assert_eq!(
                row.len(),
                num_cols,
                "Row {} has {} entries (expected {}); cannot construct DenseMatrix!",
                r,
                row.len(),
                num_cols
            );
            for (c, value) in row.iter().enumerate() {
                mat.values[r + c * num_rows] = *value;
            }
        }
        mat
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut values = Vec::with_capacity(rows * cols);
        for c in 0..cols {
            for r in 0..rows {
                values.push(f(r, c));
            }
        }
        Self { rows, cols, values }
    }

    /// Reallocate as a zero-filled `rows` x `cols` matrix. Previous contents are discarded.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.values = vec![T::zero(); rows * cols];
    }

    /// Zero every entry without reallocating
    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = T::zero());
    }

    /// Transpose in place: a `R` x `C` matrix becomes `C` x `R`
    pub fn transpose(&mut self) {
        *self = self.transposed();
    }

    /// A transposed copy
    pub fn transposed(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |r, c| self.values[c + r * self.rows])
    }

    /// Export as a row-major 2D array
    pub fn to_array(&self) -> Vec<Vec<T>> {
        (0..self.rows)
            .map(|r| {
                (0..self.cols)
                    .map(|c| self.values[r + c * self.rows])
                    .collect()
            })
            .collect()
    }

    /// The column-major backing buffer
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn into_vec(self) -> Vec<T> {
        self.values
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows,
            "row index ({}) exceeded the number of rows ({}); cannot access matrix!",
            row,
            self.rows
        );
        assert!(
            col < self.cols,
            "col index ({}) exceeded the number of columns ({}); cannot access matrix!",
            col,
            self.cols
        );
        row + col * self.rows
    }
}

impl<T: Scalar> MatrixAccess for DenseMatrix<T> {
    type Elem = T;

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn get(&self, row: usize, col: usize) -> T {
        self.values[self.offset(row, col)]
    }

    fn set(&mut self, row: usize, col: usize, value: T) {
        let offset = self.offset(row, col);
        self.values[offset] = value;
    }

    fn add_to(&mut self, row: usize, col: usize, value: T) {
        let offset = self.offset(row, col);
        self.values[offset] += value;
    }
}

impl<T: Scalar> Index<(usize, usize)> for DenseMatrix<T> {
    type Output = T;
    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.values[self.offset(row, col)]
    }
}

impl<T: Scalar> IndexMut<(usize, usize)> for DenseMatrix<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        let offset = self.offset(row, col);
        &mut self.values[offset]
    }
}

impl<T: Scalar> From<DenseMatrix<T>> for DMatrix<T> {
    fn from(dm: DenseMatrix<T>) -> Self {
        DMatrix::from_vec(dm.rows, dm.cols, dm.values)
    }
}

impl<T: Scalar> From<&DenseMatrix<T>> for DMatrix<T> {
    fn from(dm: &DenseMatrix<T>) -> Self {
        DMatrix::from_column_slice(dm.rows, dm.cols, &dm.values)
    }
}

impl<T: Scalar> From<DMatrix<T>> for DenseMatrix<T> {
    fn from(dm: DMatrix<T>) -> Self {
        let (rows, cols) = dm.shape();
        Self {
            rows,
            cols,
            values: dm.as_slice().to_vec(),
        }
    }
}

impl<T: Scalar> fmt::Display for DenseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for r in 0..self.rows {
            write!(f, "|")?;
            for c in 0..self.cols {
                write!(f, " {:.5}", self.values[r + c * self.rows])?;
            }
            writeln!(f, " |")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn column_major_addressing() {
        let mut dm = DenseMatrix::<f64>::new(2, 3);
        dm.set(1, 2, 5.0);
        dm.set(0, 1, 3.0);

        assert_eq!(dm.as_slice()[1 + 2 * 2], 5.0);
        assert_eq!(dm.as_slice()[1 * 2], 3.0);
        assert_eq!(dm.get(1, 2), 5.0);
        assert_eq!(dm[(0, 1)], 3.0);
    }

    #[test]
    fn to_array_is_row_major() {
        let dm = DenseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);

        assert_eq!(dm.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(
            dm.to_array(),
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
        );
    }

    #[test]
    fn transpose_changes_shape() {
        let mut dm = DenseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        dm.transpose();

        assert_eq!(dm.rows(), 3);
        assert_eq!(dm.cols(), 2);
        assert_eq!(
            dm.to_array(),
            vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]
        );
    }

    #[test]
    fn double_transpose_is_identity() {
        let dm = DenseMatrix::from_fn(4, 7, |r, c| Complex64::new(r as f64, c as f64 * 0.5));
        assert_eq!(dm.transposed().transposed(), dm);
    }

    #[test]
    fn resize_zero_fills() {
        let mut dm = DenseMatrix::<f64>::identity(3);
        dm.resize(2, 5);

        assert_eq!(dm.rows(), 2);
        assert_eq!(dm.cols(), 5);
        assert_eq!(dm.as_slice().len(), 10);
        assert!(dm.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn accumulate_entries() {
        let mut dm = DenseMatrix::<f64>::new(2, 2);
        dm.add_to(1, 0, 0.25);
        dm.add_to(1, 0, 0.5);
        assert_eq!(dm.get(1, 0), 0.75);
    }

    #[test]
    fn nalgebra_round_trip() {
        let dm = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        let na: DMatrix<f64> = (&dm).into();

        assert_eq!(na[(2, 1)], 6.0);
        assert_eq!(DenseMatrix::from(na), dm);
    }

    #[test]
    #[should_panic]
    fn out_of_bounds_row() {
        let dm = DenseMatrix::<f64>::new(3, 3);
        let _ = dm.get(3, 0);
    }

    #[test]
    #[should_panic]
    fn out_of_bounds_col() {
        let mut dm = DenseMatrix::<f64>::new(3, 2);
        dm.set(0, 2, 1.0);
    }

    #[test]
    #[should_panic]
    fn ragged_rows() {
        let _ = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
    }
}
