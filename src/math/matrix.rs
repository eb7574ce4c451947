use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::{Add, Sub, Mul};

use crate::error::{Result, TrainError};
use crate::math::tensor::Tensor;

/// Dense row-major `f64` matrix. A mini-batch is a `(batch, features)`
/// matrix; a bias is a `(1, features)` matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix { rows, cols, data: vec![0.0; rows * cols] }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // (0, 1] on both draws keeps ln() finite.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: N(0, sqrt(2 / rows)), `rows` being the fan-in.
    ///
    /// Weights are stored `(fan_in, fan_out)` so that `x * W` maps a
    /// `(batch, fan_in)` batch to `(batch, fan_out)`.
    pub fn he(rows: usize, cols: usize) -> Matrix {
        Matrix::normal(rows, cols, (2.0 / rows as f64).sqrt())
    }

    /// Xavier (Glorot) initialization: N(0, sqrt(1 / rows)).
    pub fn xavier(rows: usize, cols: usize) -> Matrix {
        Matrix::normal(rows, cols, (1.0 / rows as f64).sqrt())
    }

    fn normal(rows: usize, cols: usize, std_dev: f64) -> Matrix {
        let mut rng = rand::thread_rng();
        let data = (0..rows * cols)
            .map(|_| Matrix::sample_standard_normal(&mut rng) * std_dev)
            .collect();
        Matrix { rows, cols, data }
    }

    /// Stacks equally sized rows into a matrix. Panics on ragged input.
    pub fn from_rows(rows: &[&[f64]]) -> Matrix {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "ragged rows");
            data.extend_from_slice(row);
        }
        Matrix { rows: rows.len(), cols, data }
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
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
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.shape(), other.shape(), "hadamard of mismatched shapes");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a * b).collect(),
        }
    }

    /// Adds a `(1, cols)` row vector to every row.
    pub fn add_row(&self, bias: &Matrix) -> Matrix {
        assert_eq!(bias.rows, 1);
        assert_eq!(bias.cols, self.cols);
        let mut res = self.clone();
        for chunk in res.data.chunks_mut(self.cols) {
            for (x, b) in chunk.iter_mut().zip(&bias.data) {
                *x += b;
            }
        }
        res
    }

    /// Column sums as a `(1, cols)` row vector.
    pub fn sum_rows(&self) -> Matrix {
        let mut res = Matrix::zeros(1, self.cols);
        for chunk in self.data.chunks(self.cols.max(1)) {
            for (acc, x) in res.data.iter_mut().zip(chunk) {
                *acc += x;
            }
        }
        res
    }

    pub fn to_tensor(&self) -> Tensor {
        Tensor { shape: vec![self.rows, self.cols], data: self.data.clone() }
    }

    /// Rebuilds a matrix from a rank-2 tensor of exactly `rows x cols`.
    pub fn from_tensor(tensor: Tensor, rows: usize, cols: usize) -> Result<Matrix> {
        if tensor.shape != [rows, cols] || tensor.data.len() != rows * cols {
            return Err(TrainError::ShapeMismatch {
                expected: vec![rows, cols],
                actual: tensor.shape,
            });
        }
        Ok(Matrix { rows, cols, data: tensor.data })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.shape() != rhs.shape() {
            panic!("Matrices are of incorrect sizes")
        }
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a + b).collect(),
        }
    }
}

impl Sub for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.shape() != rhs.shape() {
            panic!("Matrices are of incorrect sizes")
        }
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a - b).collect(),
        }
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        // i-k-j order walks both operands row-wise.
        for i in 0..self.rows {
            let out = &mut res.data[i * rhs.cols..(i + 1) * rhs.cols];
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == 0.0 {
                    continue;
                }
                let rhs_row = &rhs.data[k * rhs.cols..(k + 1) * rhs.cols];
                for (o, b) in out.iter_mut().zip(rhs_row) {
                    *o += a * b;
                }
            }
        }

        res
    }
}
