// Ordinary least squares with an intercept.
//
// Features are standardized before solving the normal equations so that
// columns on very different scales (minutes played vs. goals) do not wreck
// the conditioning; coefficients are mapped back to raw units afterwards.

use serde::Serialize;

/// Pivot magnitude below which the system is treated as singular.
const PIVOT_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegressionError {
    #[error("no observations to fit")]
    Empty,

    #[error("row {row} has {found} features, expected {expected}")]
    DimensionMismatch {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("{observations} observations cannot identify {parameters} parameters")]
    Underdetermined {
        observations: usize,
        parameters: usize,
    },

    #[error("feature {feature} is constant or collinear; the system is singular")]
    Singular { feature: usize },
}

/// A fitted linear model `y = intercept + Σ coefficients[j] * x[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearRegression {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
    pub observations: usize,
}

impl LinearRegression {
    /// Fit by least squares. `rows[i]` is the feature vector for `targets[i]`.
    pub fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Result<Self, RegressionError> {
        let n = rows.len();
        if n == 0 || targets.is_empty() {
            return Err(RegressionError::Empty);
        }
        if targets.len() != n {
            return Err(RegressionError::DimensionMismatch {
                row: n.min(targets.len()),
                found: targets.len(),
                expected: n,
            });
        }
        let k = rows[0].len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != k {
                return Err(RegressionError::DimensionMismatch {
                    row: i,
                    found: row.len(),
                    expected: k,
                });
            }
        }
        if n <= k {
            return Err(RegressionError::Underdetermined {
                observations: n,
                parameters: k + 1,
            });
        }

        let nf = n as f64;
        let y_mean = targets.iter().sum::<f64>() / nf;

        let mut means = vec![0.0; k];
        let mut scales = vec![0.0; k];
        for j in 0..k {
            let m = rows.iter().map(|r| r[j]).sum::<f64>() / nf;
            let var = rows.iter().map(|r| (r[j] - m).powi(2)).sum::<f64>() / nf;
            if var.sqrt() < PIVOT_EPSILON {
                return Err(RegressionError::Singular { feature: j });
            }
            means[j] = m;
            scales[j] = var.sqrt();
        }

        let standardized: Vec<Vec<f64>> = rows
            .iter()
            .map(|r| (0..k).map(|j| (r[j] - means[j]) / scales[j]).collect())
            .collect();

        // Normal equations: (ZᵀZ) β = Zᵀ(y - ȳ)
        let mut gram = vec![vec![0.0; k]; k];
        let mut rhs = vec![0.0; k];
        for (z, y) in standardized.iter().zip(targets) {
            let centered = y - y_mean;
            for a in 0..k {
                rhs[a] += z[a] * centered;
                for b in 0..k {
                    gram[a][b] += z[a] * z[b];
                }
            }
        }

        let beta = solve(gram, rhs)?;

        let coefficients: Vec<f64> = beta.iter().zip(&scales).map(|(b, s)| b / s).collect();
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&means)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        let mut model = LinearRegression {
            intercept,
            coefficients,
            r_squared: 0.0,
            observations: n,
        };

        let ss_tot: f64 = targets.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = rows
            .iter()
            .zip(targets)
            .map(|(r, y)| (y - model.predict(r)).powi(2))
            .sum();
        model.r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

        Ok(model)
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, RegressionError> {
    let k = b.len();
    for col in 0..k {
        let pivot_row = (col..k)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() < PIVOT_EPSILON {
            return Err(RegressionError::Singular { feature: col });
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..k {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..k {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; k];
    for row in (0..k).rev() {
        let tail: f64 = ((row + 1)..k).map(|c| a[row][c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_linear_relation() {
        // y = 1 + 2*x0 - 3*x1
        let rows: Vec<Vec<f64>> = vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![2.0, 3.0],
            vec![3.0, 1.0],
            vec![4.0, 5.0],
            vec![5.0, 2.0],
        ];
        let y: Vec<f64> = rows.iter().map(|r| 1.0 + 2.0 * r[0] - 3.0 * r[1]).collect();
        let model = LinearRegression::fit(&rows, &y).unwrap();
        assert!((model.intercept - 1.0).abs() < 1e-9);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((model.coefficients[1] + 3.0).abs() < 1e-9);
        assert!((model.r_squared - 1.0).abs() < 1e-9);
        assert!((model.predict(&[10.0, 10.0]) - (1.0 + 20.0 - 30.0)).abs() < 1e-8);
    }

    #[test]
    fn mixed_scales_are_handled() {
        // minutes in the thousands next to single-digit goals
        let rows: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![(i % 7) as f64, 500.0 + 137.0 * i as f64])
            .collect();
        let y: Vec<f64> = rows.iter().map(|r| 14.0 + 0.3 * r[0] + 0.0008 * r[1]).collect();
        let model = LinearRegression::fit(&rows, &y).unwrap();
        assert!((model.coefficients[0] - 0.3).abs() < 1e-9);
        assert!((model.coefficients[1] - 0.0008).abs() < 1e-12);
        assert!((model.intercept - 14.0).abs() < 1e-8);
    }

    #[test]
    fn noisy_fit_minimizes_residuals() {
        let rows: Vec<Vec<f64>> = (1..=5).map(|i| vec![i as f64]).collect();
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let model = LinearRegression::fit(&rows, &y).unwrap();
        // Simple regression: slope = 0.6, intercept = 2.2
        assert!((model.coefficients[0] - 0.6).abs() < 1e-12);
        assert!((model.intercept - 2.2).abs() < 1e-12);
        assert!((model.r_squared - 0.6).abs() < 1e-12);
    }

    #[test]
    fn constant_feature_is_singular() {
        let rows: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64, 3.0]).collect();
        let y: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let err = LinearRegression::fit(&rows, &y).unwrap_err();
        assert_eq!(err, RegressionError::Singular { feature: 1 });
    }

    #[test]
    fn collinear_features_are_singular() {
        let rows: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, 2.0 * i as f64]).collect();
        let y: Vec<f64> = (0..6).map(|i| (i * i) as f64).collect();
        assert!(matches!(
            LinearRegression::fit(&rows, &y),
            Err(RegressionError::Singular { .. })
        ));
    }

    #[test]
    fn shape_errors() {
        assert_eq!(LinearRegression::fit(&[], &[]).unwrap_err(), RegressionError::Empty);
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            LinearRegression::fit(&rows, &[1.0, 2.0]),
            Err(RegressionError::DimensionMismatch { row: 1, .. })
        ));
        let rows = vec![vec![1.0, 2.0], vec![2.0, 1.0]];
        assert!(matches!(
            LinearRegression::fit(&rows, &[1.0, 2.0]),
            Err(RegressionError::Underdetermined { .. })
        ));
    }
}
