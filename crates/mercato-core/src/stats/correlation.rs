// Pearson correlation with two-sided p-value and qualitative interpretation.

use crate::stats::distribution::student_t_two_sided;
use serde::Serialize;

/// `|r|` within this distance of 1 (or 0) is treated as exactly 1 (or 0).
const EXACT_EPSILON: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("series lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("need at least {required} points, got {found}")]
    TooFewPoints { found: usize, required: usize },

    #[error("series `{series}` has zero variance; correlation is undefined")]
    ZeroVariance { series: &'static str },
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Pearson product-moment correlation of two series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

impl Correlation {
    pub fn strength(&self) -> Strength {
        Strength::from_r(self.r)
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::from_r(self.r)
    }

    pub fn significance(&self) -> Significance {
        Significance::from_p(self.p_value)
    }

    /// The correlation together with its three qualitative labels.
    pub fn summary(&self) -> CorrelationSummary {
        CorrelationSummary {
            r: self.r,
            p_value: self.p_value,
            n: self.n,
            strength: self.strength().label(),
            direction: self.direction().map(|d| d.label()),
            significance: self.significance().label(),
        }
    }
}

/// Serializable view of a correlation for reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationSummary {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
    pub strength: &'static str,
    pub direction: Option<&'static str>,
    pub significance: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Perfect,
    VeryStrong,
    Strong,
    Moderate,
    Weak,
    VeryWeak,
    None,
}

impl Strength {
    pub fn from_r(r: f64) -> Self {
        let abs = r.abs();
        if (abs - 1.0).abs() < EXACT_EPSILON {
            Strength::Perfect
        } else if abs > 0.8 {
            Strength::VeryStrong
        } else if abs > 0.6 {
            Strength::Strong
        } else if abs > 0.4 {
            Strength::Moderate
        } else if abs > 0.2 {
            Strength::Weak
        } else if abs > EXACT_EPSILON {
            Strength::VeryWeak
        } else {
            Strength::None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strength::Perfect => "Perfect",
            Strength::VeryStrong => "Very strong",
            Strength::Strong => "Strong",
            Strength::Moderate => "Moderate",
            Strength::Weak => "Weak",
            Strength::VeryWeak => "Very weak/negligible",
            Strength::None => "No significant linear correlation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    /// `None` when there is no linear relationship to orient.
    pub fn from_r(r: f64) -> Option<Self> {
        if r.abs() <= EXACT_EPSILON {
            None
        } else if r > 0.0 {
            Some(Direction::Positive)
        } else {
            Some(Direction::Negative)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Positive => "Positive",
            Direction::Negative => "Negative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    Highly,
    Significant,
    NotSignificant,
}

impl Significance {
    pub fn from_p(p: f64) -> Self {
        if p < 0.001 {
            Significance::Highly
        } else if p < 0.05 {
            Significance::Significant
        } else {
            Significance::NotSignificant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Significance::Highly => "Highly significant",
            Significance::Significant => "Significant",
            Significance::NotSignificant => "Not significant",
        }
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Every element equal to the first. Checked on the raw values: a constant
/// series whose mean is inexact still leaves rounding noise in its variance.
fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Pearson r and the two-sided p-value for H0: no linear correlation.
///
/// The p-value uses Student's t with `n - 2` degrees of freedom. With only
/// two points every line fits perfectly and `p` is 1.
pub fn pearson(a: &[f64], b: &[f64]) -> Result<Correlation, StatsError> {
    if a.len() != b.len() {
        return Err(StatsError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let n = a.len();
    if n < 2 {
        return Err(StatsError::TooFewPoints {
            found: n,
            required: 2,
        });
    }

    if is_constant(a) {
        return Err(StatsError::ZeroVariance { series: "a" });
    }
    if is_constant(b) {
        return Err(StatsError::ZeroVariance { series: "b" });
    }

    let mean_a = mean(a);
    let mean_b = mean(b);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 {
        return Err(StatsError::ZeroVariance { series: "a" });
    }
    if syy <= 0.0 {
        return Err(StatsError::ZeroVariance { series: "b" });
    }

    let r = (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0);

    let p_value = if n == 2 {
        1.0
    } else if (r.abs() - 1.0).abs() < EXACT_EPSILON {
        0.0
    } else {
        let df = (n - 2) as f64;
        let t = r * (df / (1.0 - r * r)).sqrt();
        student_t_two_sided(t, df)
    };

    Ok(Correlation { r, p_value, n })
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Pairwise Pearson r between named series. A cell is `None` when that pair
/// is degenerate (zero variance or too short).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == row)?;
        let j = self.labels.iter().position(|l| l == col)?;
        self.values[i][j]
    }
}

pub fn correlation_matrix(series: &[(&str, &[f64])]) -> CorrelationMatrix {
    let labels = series.iter().map(|(name, _)| name.to_string()).collect();
    let values = series
        .iter()
        .map(|(_, a)| {
            series
                .iter()
                .map(|(_, b)| pearson(a, b).ok().map(|c| c.r))
                .collect()
        })
        .collect();
    CorrelationMatrix { labels, values }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_linear_relation() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let c = pearson(&x, &y).unwrap();
        assert!((c.r - 1.0).abs() < 1e-12);
        assert_eq!(c.strength(), Strength::Perfect);
        assert_eq!(c.strength().label(), "Perfect");
        assert_eq!(c.direction(), Some(Direction::Positive));
        assert_eq!(c.p_value, 0.0);
        assert_eq!(c.significance().label(), "Highly significant");
    }

    #[test]
    fn perfect_negative_relation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [8.0, 6.0, 4.0, 2.0];
        let c = pearson(&x, &y).unwrap();
        assert!((c.r + 1.0).abs() < 1e-12);
        assert_eq!(c.strength(), Strength::Perfect);
        assert_eq!(c.direction().map(|d| d.label()), Some("Negative"));
    }

    #[test]
    fn known_r_and_p_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let c = pearson(&x, &y).unwrap();
        assert!((c.r - 0.774_596_669_241_483_4).abs() < 1e-12);
        assert!((c.p_value - 0.124_027_062_657_554_6).abs() < 1e-9);
        assert_eq!(c.strength().label(), "Strong");
        assert_eq!(c.significance().label(), "Not significant");
    }

    #[test]
    fn two_points_have_unit_p_value() {
        let c = pearson(&[1.0, 2.0], &[3.0, 1.0]).unwrap();
        assert!((c.r + 1.0).abs() < 1e-12);
        assert_eq!(c.p_value, 1.0);
    }

    #[test]
    fn zero_variance_is_degenerate() {
        let err = pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, StatsError::ZeroVariance { series: "a" });
        let err = pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).unwrap_err();
        assert_eq!(err, StatsError::ZeroVariance { series: "b" });
    }

    #[test]
    fn constant_series_with_inexact_mean_is_degenerate() {
        let err = pearson(&[0.1, 0.1, 0.1], &[1.0, 2.0, 4.0]).unwrap_err();
        assert_eq!(err, StatsError::ZeroVariance { series: "a" });
        let err = pearson(&[1.0, 2.0, 4.0], &[0.7; 5][..3]).unwrap_err();
        assert_eq!(err, StatsError::ZeroVariance { series: "b" });

        let m = correlation_matrix(&[("fee", &[1.0, 2.0, 4.0][..]), ("flat", &[0.1; 3][..])]);
        assert_eq!(m.get("fee", "flat"), None);
    }

    #[test]
    fn short_or_mismatched_input_rejected() {
        assert!(matches!(
            pearson(&[1.0], &[2.0]),
            Err(StatsError::TooFewPoints { found: 1, .. })
        ));
        assert!(matches!(
            pearson(&[1.0, 2.0], &[2.0]),
            Err(StatsError::LengthMismatch { left: 2, right: 1 })
        ));
    }

    #[test]
    fn strength_bands() {
        assert_eq!(Strength::from_r(0.9).label(), "Very strong");
        assert_eq!(Strength::from_r(-0.7).label(), "Strong");
        assert_eq!(Strength::from_r(0.5).label(), "Moderate");
        assert_eq!(Strength::from_r(0.3).label(), "Weak");
        assert_eq!(Strength::from_r(0.1).label(), "Very weak/negligible");
        assert_eq!(Strength::from_r(0.0).label(), "No significant linear correlation");
        // Band edges are exclusive.
        assert_eq!(Strength::from_r(0.8).label(), "Strong");
        assert_eq!(Strength::from_r(0.2).label(), "Very weak/negligible");
        assert_eq!(Direction::from_r(0.0), None);
    }

    #[test]
    fn significance_bands() {
        assert_eq!(Significance::from_p(0.0005).label(), "Highly significant");
        assert_eq!(Significance::from_p(0.001).label(), "Significant");
        assert_eq!(Significance::from_p(0.049).label(), "Significant");
        assert_eq!(Significance::from_p(0.05).label(), "Not significant");
    }

    #[test]
    fn matrix_has_unit_diagonal_and_none_for_constants() {
        let spend = [1.0, 2.0, 3.0, 5.0];
        let volume = [10.0, 12.0, 15.0, 20.0];
        let flat = [7.0, 7.0, 7.0, 7.0];
        let m = correlation_matrix(&[
            ("spend", &spend[..]),
            ("volume", &volume[..]),
            ("flat", &flat[..]),
        ]);
        assert_eq!(m.labels, vec!["spend", "volume", "flat"]);
        assert!((m.get("spend", "spend").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(m.get("spend", "volume"), m.get("volume", "spend"));
        assert_eq!(m.get("flat", "spend"), None);
        assert_eq!(m.get("missing", "spend"), None);
    }
}
