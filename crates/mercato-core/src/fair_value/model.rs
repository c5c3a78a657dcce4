// Log-linear fair-value model: ln(fee) regressed on season performance and
// age, then residual-based over/under-payment classification.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::info;

use crate::config::FairValueConfig;
use crate::fair_value::features::{FairValueInput, FEATURE_NAMES};
use crate::stats::correlation::{correlation_matrix, CorrelationMatrix};
use crate::stats::regression::{LinearRegression, RegressionError};

/// Fewest training rows that identify the intercept and every feature.
pub const MIN_TRAINING_ROWS: usize = FEATURE_NAMES.len() + 1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FairValueError {
    #[error("only {found} training rows, need at least {required}")]
    InsufficientData { found: usize, required: usize },

    #[error("regression failed: {0}")]
    Regression(#[from] RegressionError),
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferStatus {
    Overpaid,
    Underpaid,
}

impl TransferStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TransferStatus::Overpaid => "Overpaid",
            TransferStatus::Underpaid => "Underpaid",
        }
    }

    /// Alternative wording used in the scouting charts.
    pub fn deal_label(&self) -> &'static str {
        match self {
            TransferStatus::Overpaid => "Overpaid",
            TransferStatus::Underpaid => "Value Deal",
        }
    }
}

/// `residual = observed - predicted`; overpaid iff the residual is positive.
pub fn classify(observed: f64, predicted: f64) -> (f64, TransferStatus) {
    let residual = observed - predicted;
    let status = if residual > 0.0 {
        TransferStatus::Overpaid
    } else {
        TransferStatus::Underpaid
    };
    (residual, status)
}

// ---------------------------------------------------------------------------
// Estimates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairValueEstimate {
    pub player_id: u64,
    pub player_name: String,
    pub to_club_id: Option<u64>,
    pub to_club_name: String,
    pub market_value: f64,
    pub goals: u32,
    pub assists: u32,
    pub minutes_played: u32,
    pub age: i32,
    pub observed_fee: f64,
    pub predicted_fee: f64,
    pub residual: f64,
    pub status: TransferStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCoefficient {
    pub feature: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub intercept: f64,
    pub coefficients: Vec<NamedCoefficient>,
    pub r_squared: f64,
    pub training_rows: usize,
}

/// The most overpaid and most underpaid transfers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremes {
    pub overpaid: Vec<FairValueEstimate>,
    pub underpaid: Vec<FairValueEstimate>,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FairValueModel {
    regression: LinearRegression,
    min_minutes: u32,
}

impl FairValueModel {
    /// Fit on inputs with more than `min_minutes` played, every feature
    /// present, and a positive fee.
    pub fn fit(inputs: &[FairValueInput], config: &FairValueConfig) -> Result<Self, FairValueError> {
        let training: Vec<([f64; 4], f64)> = inputs
            .iter()
            .filter(|i| i.minutes_played > config.min_minutes && i.observed_fee > 0.0)
            .filter_map(|i| i.features().map(|f| (f, i.observed_fee)))
            .collect();

        let required = config.min_training_rows.max(MIN_TRAINING_ROWS);
        if training.len() < required {
            return Err(FairValueError::InsufficientData {
                found: training.len(),
                required,
            });
        }

        let x: Vec<Vec<f64>> = training.iter().map(|(f, _)| f.to_vec()).collect();
        let y: Vec<f64> = training.iter().map(|(_, fee)| fee.ln()).collect();
        let regression = LinearRegression::fit(&x, &y)?;

        info!(
            training_rows = training.len(),
            r_squared = regression.r_squared,
            "fitted fair value model"
        );
        Ok(FairValueModel {
            regression,
            min_minutes: config.min_minutes,
        })
    }

    /// Predicted fee in euros for a feature vector in [`FEATURE_NAMES`] order.
    pub fn predict(&self, features: &[f64; 4]) -> f64 {
        self.regression.predict(features).exp()
    }

    /// Estimates for every input the model would have trained on.
    pub fn evaluate(&self, inputs: &[FairValueInput]) -> Vec<FairValueEstimate> {
        inputs
            .iter()
            .filter(|i| i.minutes_played > self.min_minutes && i.observed_fee > 0.0)
            .filter_map(|i| {
                let features = i.features()?;
                let age = i.age?;
                let predicted = self.predict(&features);
                let (residual, status) = classify(i.observed_fee, predicted);
                Some(FairValueEstimate {
                    player_id: i.player_id,
                    player_name: i.player_name.clone(),
                    to_club_id: i.to_club_id,
                    to_club_name: i.to_club_name.clone(),
                    market_value: i.market_value,
                    goals: i.goals,
                    assists: i.assists,
                    minutes_played: i.minutes_played,
                    age,
                    observed_fee: i.observed_fee,
                    predicted_fee: predicted,
                    residual,
                    status,
                })
            })
            .collect()
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            intercept: self.regression.intercept,
            coefficients: FEATURE_NAMES
                .iter()
                .zip(&self.regression.coefficients)
                .map(|(&feature, &value)| NamedCoefficient { feature, value })
                .collect(),
            r_squared: self.regression.r_squared,
            training_rows: self.regression.observations,
        }
    }
}

/// Top `n` by residual in each direction, largest magnitude first.
pub fn extremes(estimates: &[FairValueEstimate], n: usize) -> Extremes {
    let by_residual = |a: &&FairValueEstimate, b: &&FairValueEstimate| -> Ordering {
        a.residual.total_cmp(&b.residual)
    };

    let mut overpaid: Vec<&FairValueEstimate> = estimates
        .iter()
        .filter(|e| e.status == TransferStatus::Overpaid)
        .collect();
    overpaid.sort_by(|a, b| by_residual(b, a));

    let mut underpaid: Vec<&FairValueEstimate> = estimates
        .iter()
        .filter(|e| e.status == TransferStatus::Underpaid)
        .collect();
    underpaid.sort_by(by_residual);

    Extremes {
        overpaid: overpaid.into_iter().take(n).cloned().collect(),
        underpaid: underpaid.into_iter().take(n).cloned().collect(),
    }
}

/// Observed fee, market value and predicted fee against each other, over
/// estimates with a known (positive) market value.
pub fn value_correlation_matrix(estimates: &[FairValueEstimate]) -> CorrelationMatrix {
    let valued: Vec<&FairValueEstimate> = estimates.iter().filter(|e| e.market_value > 0.0).collect();
    let fee: Vec<f64> = valued.iter().map(|e| e.observed_fee).collect();
    let value: Vec<f64> = valued.iter().map(|e| e.market_value).collect();
    let predicted: Vec<f64> = valued.iter().map(|e| e.predicted_fee).collect();
    correlation_matrix(&[
        ("transfer_fee", &fee[..]),
        ("market_value", &value[..]),
        ("predicted_fee", &predicted[..]),
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
