use std::ops::{Add, Sub};

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Builds a matrix by calling `f(row, col)` in row-major order.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Matrix
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = f(i, j);
            }
        }
        res
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |row| row.len()),
            data
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect()
        }
    }

    /// `self · v` for a column vector `v` of length `cols`.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(v.len(), self.cols);
        self.data
            .iter()
            .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// `selfᵗ · v` for a column vector `v` of length `rows`.
    pub fn transpose_mul_vec(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(v.len(), self.rows);
        let mut res = vec![0.0; self.cols];
        for (row, &scale) in self.data.iter().zip(v) {
            for (acc, &x) in res.iter_mut().zip(row) {
                *acc += x * scale;
            }
        }
        res
    }

    /// Rotates the matrix by 180 degrees (reverses both axes).
    pub fn reversed(&self) -> Matrix {
        Matrix::from_fn(self.rows, self.cols, |i, j| {
            self.data[self.rows - 1 - i][self.cols - 1 - j]
        })
    }

    /// Copies out the `height × width` block whose top-left corner is `(row, col)`.
    pub fn block(&self, row: usize, col: usize, height: usize, width: usize) -> Matrix {
        assert!(row + height <= self.rows && col + width <= self.cols, "block out of bounds");
        Matrix::from_fn(height, width, |i, j| self.data[row + i][col + j])
    }

    /// Overwrites the block at `(row, col)` with `src`.
    pub fn set_block(&mut self, row: usize, col: usize, src: &Matrix) {
        assert!(row + src.rows <= self.rows && col + src.cols <= self.cols, "block out of bounds");
        for i in 0..src.rows {
            self.data[row + i][col..col + src.cols].copy_from_slice(&src.data[i]);
        }
    }

    pub fn sum(&self) -> f64 {
        self.iter().sum()
    }

    /// Elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().flat_map(|row| row.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = self;

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] += rhs.data[i][j];
            }
        }

        res
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = self;

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] -= rhs.data[i][j];
            }
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_vector_products() {
        let m = Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(m.mul_vec(&[1.0, 0.0, -1.0]), vec![-2.0, -2.0]);
        assert_eq!(m.transpose_mul_vec(&[1.0, 1.0]), vec![5.0, 7.0, 9.0]);
        assert_eq!(m.transpose().mul_vec(&[1.0, 1.0]), m.transpose_mul_vec(&[1.0, 1.0]));
    }

    #[test]
    fn reversed_rotates_both_axes() {
        let m = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(m.reversed().data, vec![vec![4.0, 3.0], vec![2.0, 1.0]]);
    }

    #[test]
    fn block_and_set_block() {
        let m = Matrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
        let b = m.block(1, 1, 2, 2);
        assert_eq!(b.data, vec![vec![4.0, 5.0], vec![7.0, 8.0]]);

        let mut z = Matrix::zeros(3, 3);
        z.set_block(0, 1, &b);
        assert_eq!(z.data[0], vec![0.0, 4.0, 5.0]);
        assert_eq!(z.data[1], vec![0.0, 7.0, 8.0]);
        assert_eq!(z.sum(), 24.0);
    }

    #[test]
    fn from_data_accepts_empty() {
        let m = Matrix::from_data(vec![]);
        assert!(m.is_empty());
        assert_eq!(m, Matrix::default());
    }
}
