use crate::error::GraphGradError;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::fmt;
use std::ops::{AddAssign, Index, IndexMut, SubAssign};

/// A dense, row-major matrix of `f64` values.
///
/// `Matrix` is a plain value type: every binary operation shape-checks its
/// operands and returns a fresh matrix. The default value is the empty
/// matrix (zero rows), which the graph layer uses for results that have not
/// been materialized yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a `rows` x `cols` matrix filled with zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::full(rows, cols, 0.0)
    }

    /// Creates a `rows` x `cols` matrix filled with `value`.
    pub fn full(rows: usize, cols: usize, value: f64) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Builds a matrix from a flat row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, GraphGradError> {
        if data.len() != rows * cols {
            return Err(GraphGradError::CreationError {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Builds a matrix from nested rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, GraphGradError> {
        let m = rows.len();
        let n = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(m * n);
        for row in &rows {
            if row.len() != n {
                return Err(GraphGradError::CreationError {
                    expected: n,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Matrix { rows: m, cols: n, data })
    }

    /// Samples a `rows` x `cols` matrix from a normal distribution.
    ///
    /// The generator is supplied by the caller, so initialization stays
    /// reproducible under a seeded rng.
    pub fn random_normal<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        mean: f64,
        std: f64,
        rng: &mut R,
    ) -> Self {
        let data = (0..rows * cols)
            .map(|_| {
                let z: f64 = StandardNormal.sample(rng);
                mean + std * z
            })
            .collect();
        Matrix { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// True for the zero-row matrix, the "not yet materialized" state.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Row-major view of the underlying buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Zeroes every entry in place.
    pub fn clear(&mut self) {
        for v in &mut self.data {
            *v = 0.0;
        }
    }

    fn zip_with(
        &self,
        rhs: &Matrix,
        operation: &str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Matrix, GraphGradError> {
        if self.shape() != rhs.shape() {
            return Err(GraphGradError::ShapeMismatch {
                left: self.shape(),
                right: rhs.shape(),
                operation: operation.to_string(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Elementwise sum.
    pub fn add(&self, rhs: &Matrix) -> Result<Matrix, GraphGradError> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    /// Elementwise difference.
    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix, GraphGradError> {
        self.zip_with(rhs, "sub", |a, b| a - b)
    }

    /// Elementwise (Hadamard) product.
    pub fn mul(&self, rhs: &Matrix) -> Result<Matrix, GraphGradError> {
        self.zip_with(rhs, "mul", |a, b| a * b)
    }

    /// Elementwise quotient.
    pub fn div(&self, rhs: &Matrix) -> Result<Matrix, GraphGradError> {
        self.zip_with(rhs, "div", |a, b| a / b)
    }

    /// Matrix product; requires `self.cols == rhs.rows`.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix, GraphGradError> {
        if self.cols != rhs.rows {
            return Err(GraphGradError::ShapeMismatch {
                left: self.shape(),
                right: rhs.shape(),
                operation: "matmul".to_string(),
            });
        }
        let mut out = Matrix::new(self.rows, rhs.cols);
        for i in 0..self.rows {
            for j in 0..rhs.cols {
                let mut acc = 0.0;
                for k in 0..self.cols {
                    acc += self.data[i * self.cols + k] * rhs.data[k * rhs.cols + j];
                }
                out.data[i * rhs.cols + j] = acc;
            }
        }
        Ok(out)
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::new(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        out
    }

    /// Applies `f` to every entry, returning a new matrix.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Elementwise `max(x, 0)`.
    pub fn relu(&self) -> Matrix {
        self.map(|x| if x > 0.0 { x } else { 0.0 })
    }

    /// Arithmetic mean over all entries; 0.0 for the empty matrix.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.data[row * self.cols + col]
    }
}

/// In-place elementwise sum. Shapes must match.
impl AddAssign<&Matrix> for Matrix {
    fn add_assign(&mut self, rhs: &Matrix) {
        assert_eq!(self.shape(), rhs.shape(), "matrix shapes must match for +=");
        self.data
            .iter_mut()
            .zip(rhs.data.iter())
            .for_each(|(a, &b)| *a += b);
    }
}

/// In-place elementwise difference. Shapes must match.
impl SubAssign<&Matrix> for Matrix {
    fn sub_assign(&mut self, rhs: &Matrix) {
        assert_eq!(self.shape(), rhs.shape(), "matrix shapes must match for -=");
        self.data
            .iter_mut()
            .zip(rhs.data.iter())
            .for_each(|(a, &b)| *a -= b);
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for i in 0..self.rows {
            write!(f, "[")?;
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.data[i * self.cols + j])?;
            }
            writeln!(f, "]")?;
        }
        write!(f, "]")
    }
}
