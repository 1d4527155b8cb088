//! Linear solvers for the calibration system `A x = b`.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MitigationError, MitigationResult};

/// Pivots smaller than this are treated as zero.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Smallest-to-largest pivot ratio below which a matrix is ill-conditioned.
const CONDITION_TOLERANCE: f64 = 1e-7;

/// Relative Tikhonov damping for the least-squares fallback.
const RIDGE_FACTOR: f64 = 1e-6;

/// How the calibration system is solved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    /// Gaussian elimination; a singular or ill-conditioned matrix is an error.
    Exact,
    /// Exact solve for well-conditioned matrices, regularized least squares
    /// otherwise.
    #[default]
    LeastSquares,
}

impl SolveMethod {
    /// Config-file name of the method.
    pub fn name(self) -> &'static str {
        match self {
            SolveMethod::Exact => "exact",
            SolveMethod::LeastSquares => "least_squares",
        }
    }
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolveMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" | "inverse" => Ok(SolveMethod::Exact),
            "least_squares" | "least-squares" | "lstsq" => Ok(SolveMethod::LeastSquares),
            other => Err(format!(
                "unknown solve method '{other}' (expected 'exact' or 'least_squares')"
            )),
        }
    }
}

/// Solve `a x = b` with the given method.
///
/// A matrix whose pivot ratio falls below [`CONDITION_TOLERANCE`] is treated
/// like a singular one.
pub fn solve(
    a: &Array2<f64>,
    b: &Array1<f64>,
    method: SolveMethod,
) -> MitigationResult<Array1<f64>> {
    let reason = match gaussian_elimination(a, b) {
        Some(solution) if solution.pivot_ratio >= CONDITION_TOLERANCE => return Ok(solution.x),
        Some(solution) => format!(
            "matrix is ill-conditioned (pivot ratio {:.1e})",
            solution.pivot_ratio
        ),
        None => "matrix has a zero pivot".to_string(),
    };
    match method {
        SolveMethod::Exact => Err(MitigationError::SingularCalibration(reason)),
        SolveMethod::LeastSquares => {
            debug!(%reason, "falling back to regularized least squares");
            regularized_least_squares(a, b)
        }
    }
}

/// Solution of an eliminated system.
struct Elimination {
    x: Array1<f64>,
    /// Smallest over largest absolute pivot, a cheap conditioning estimate.
    pivot_ratio: f64,
}

/// Gaussian elimination with partial pivoting.
///
/// Returns `None` if a pivot falls below [`PIVOT_TOLERANCE`].
fn gaussian_elimination(a: &Array2<f64>, b: &Array1<f64>) -> Option<Elimination> {
    let n = b.len();
    let mut m = a.clone();
    let mut rhs = b.clone();
    let mut min_pivot = f64::INFINITY;
    let mut max_pivot = 0.0f64;

    for col in 0..n {
        let pivot_row =
            (col..n).max_by(|&i, &j| m[[i, col]].abs().total_cmp(&m[[j, col]].abs()))?;
        let pivot = m[[pivot_row, col]].abs();
        if pivot < PIVOT_TOLERANCE {
            return None;
        }
        min_pivot = min_pivot.min(pivot);
        max_pivot = max_pivot.max(pivot);
        if pivot_row != col {
            for k in 0..n {
                m.swap([col, k], [pivot_row, k]);
            }
            rhs.swap(col, pivot_row);
        }

        for row in col + 1..n {
            let factor = m[[row, col]] / m[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[[row, k]] -= factor * m[[col, k]];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| m[[row, k]] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[[row, row]];
    }
    let pivot_ratio = if n == 0 { 1.0 } else { min_pivot / max_pivot };
    Some(Elimination { x, pivot_ratio })
}

/// Solve `(AᵀA + λI) x = Aᵀb`.
fn regularized_least_squares(a: &Array2<f64>, b: &Array1<f64>) -> MitigationResult<Array1<f64>> {
    let n = b.len();
    let gram = a.t().dot(a);
    let trace: f64 = gram.diag().sum();
    if trace <= 0.0 {
        return Err(MitigationError::SingularCalibration(
            "calibration matrix carries no information".into(),
        ));
    }

    #[allow(clippy::cast_precision_loss)]
    let lambda = RIDGE_FACTOR * trace / n as f64;
    let damped = gram + Array2::<f64>::eye(n) * lambda;
    let rhs = a.t().dot(b);

    gaussian_elimination(&damped, &rhs)
        .map(|solution| solution.x)
        .ok_or_else(|| {
            MitigationError::SingularCalibration("regularized system is still singular".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn approx(a: &Array1<f64>, b: &[f64], tol: f64) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < tol)
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("exact".parse::<SolveMethod>(), Ok(SolveMethod::Exact));
        assert_eq!("least-squares".parse::<SolveMethod>(), Ok(SolveMethod::LeastSquares));
        assert!("svd".parse::<SolveMethod>().is_err());
        assert_eq!(SolveMethod::default(), SolveMethod::LeastSquares);
        assert_eq!(SolveMethod::LeastSquares.to_string(), "least_squares");
    }

    #[test]
    fn test_identity_solve() {
        let a = Array2::<f64>::eye(4);
        let b = array![1.0, 2.0, 3.0, 4.0];
        let x = solve(&a, &b, SolveMethod::Exact).unwrap();
        assert!(approx(&x, &[1.0, 2.0, 3.0, 4.0], 1e-12));
    }

    #[test]
    fn test_pivoting() {
        // Zero on the leading diagonal requires a row swap.
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let b = array![3.0, 5.0];
        let x = solve(&a, &b, SolveMethod::Exact).unwrap();
        assert!(approx(&x, &[5.0, 3.0], 1e-12));
    }

    #[test]
    fn test_readout_matrix_inverse() {
        let a = array![[0.9, 0.2], [0.1, 0.8]];
        let truth = array![700.0, 300.0];
        let b = a.dot(&truth);
        let x = solve(&a, &b, SolveMethod::Exact).unwrap();
        assert!(approx(&x, &[700.0, 300.0], 1e-9));
    }

    #[test]
    fn test_singular_exact_fails() {
        let a = array![[0.5, 0.5], [0.5, 0.5]];
        let b = array![500.0, 500.0];
        let err = solve(&a, &b, SolveMethod::Exact).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_singular_least_squares_recovers() {
        let a = array![[0.5, 0.5], [0.5, 0.5]];
        let b = array![500.0, 500.0];
        let x = solve(&a, &b, SolveMethod::LeastSquares).unwrap();
        // Minimum-norm direction splits the mass evenly.
        assert!((x[0] - x[1]).abs() < 1e-6);
        assert!((x[0] + x[1] - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn test_near_singular_exact_fails() {
        let eps = 5e-10;
        let a = array![[0.5 + eps, 0.5 - eps], [0.5 - eps, 0.5 + eps]];
        let b = array![501.0, 499.0];
        let err = solve(&a, &b, SolveMethod::Exact).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("ill-conditioned"));
    }

    #[test]
    fn test_near_singular_least_squares_stays_bounded() {
        let eps = 5e-10;
        let a = array![[0.5 + eps, 0.5 - eps], [0.5 - eps, 0.5 + eps]];
        let b = array![501.0, 499.0];
        let x = solve(&a, &b, SolveMethod::LeastSquares).unwrap();
        // An exact inverse would put roughly 1e9 on each entry.
        assert!((x[0] - 500.0).abs() < 5.0, "x = {x}");
        assert!((x[1] - 500.0).abs() < 5.0, "x = {x}");
    }

    #[test]
    fn test_well_conditioned_readout_stays_exact() {
        let a = array![[0.6, 0.4], [0.4, 0.6]];
        let truth = array![900.0, 100.0];
        let b = a.dot(&truth);
        let x = solve(&a, &b, SolveMethod::LeastSquares).unwrap();
        assert!(approx(&x, &[900.0, 100.0], 1e-9));
    }

    #[test]
    fn test_zero_matrix_always_fails() {
        let a = Array2::<f64>::zeros((2, 2));
        let b = array![1.0, 0.0];
        assert!(matches!(
            solve(&a, &b, SolveMethod::LeastSquares),
            Err(MitigationError::SingularCalibration(_))
        ));
    }
}
