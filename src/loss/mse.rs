use crate::math::matrix::Matrix;

/// Reconstruction loss: mean over every element of the batch.
pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²)
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let n = predicted.data.len().max(1) as f64;
        predicted.data.iter().zip(&expected.data)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>() / n
    }

    /// Gradient of the mean: 2 (predicted - expected) / n
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let scale = 2.0 / predicted.data.len().max(1) as f64;
        (predicted - expected).map(|d| d * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_over_all_elements() {
        let p = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let e = Matrix::from_rows(&[&[1.0, 0.0], &[3.0, 6.0]]);
        assert_eq!(MseLoss::loss(&p, &e), 2.0);
        assert_eq!(MseLoss::derivative(&p, &e).data, vec![0.0, 1.0, 0.0, -1.0]);
    }
}
