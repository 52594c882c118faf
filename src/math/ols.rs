//! Ordinary least squares.
//!
//! The forecaster fits `y = slope * x + intercept` where `x` is a day number
//! since 1970 (around 20_000 today). Solving on raw `x` gives a badly
//! conditioned design matrix, so `x` is centred on its mean before solving and
//! the intercept is shifted back afterwards.
//!
//! The solve itself uses SVD, which handles tall (more rows than columns)
//! design matrices directly.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// A fitted straight line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    /// Value at `x = 0`.
    pub intercept: f64,
    /// Mean of the fitted `x` values.
    pub x_mean: f64,
    /// Fitted value at `x_mean`.
    pub y_at_mean: f64,
}

impl LineFit {
    /// Evaluate the line; computed relative to `x_mean` to keep precision.
    pub fn predict(&self, x: f64) -> f64 {
        self.y_at_mean + self.slope * (x - self.x_mean)
    }
}

/// Fit `y = slope * x + intercept`.
///
/// Returns `None` when there are fewer than two points, the slices differ in
/// length, or all `x` values are equal (no slope is defined).
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }

    let x_mean = x.iter().sum::<f64>() / n as f64;
    let sxx: f64 = x.iter().map(|v| (v - x_mean).powi(2)).sum();
    if sxx == 0.0 || !sxx.is_finite() {
        return None;
    }

    let mut design = DMatrix::zeros(n, 2);
    for (i, xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = xi - x_mean;
    }
    let rhs = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &rhs)?;
    let y_at_mean = beta[0];
    let slope = beta[1];

    Some(LineFit {
        slope,
        intercept: y_at_mean - slope * x_mean,
        x_mean,
        y_at_mean,
    })
}
