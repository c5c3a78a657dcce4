// Inflation-adjusted spend.
//
// Two normalizations, kept separate because they answer different questions:
// `add_real_spend` deflates by average cost per transfer against a base
// season, `compute_inflation_index` rebases the median fee of transfers above
// a threshold.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::BaseYear;
use crate::data::records::TransferRecord;
use crate::market::aggregate::SeasonMetrics;
use crate::stats::descriptive::median;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InflationError {
    #[error("no season available to serve as the price base")]
    NoBaseSeason,

    #[error("season {season} has no transfers; cost per transfer is undefined")]
    ZeroTransferCount { season: String },

    #[error("base season {season} has zero cost per transfer")]
    ZeroBaseCost { season: String },
}

// ---------------------------------------------------------------------------
// Cost-per-transfer deflation
// ---------------------------------------------------------------------------

/// Fill `cost_per_transfer` and `real_spend_billion` on a calendar-ordered
/// season table.
///
/// `real_spend = spend_billion * base_cost / cost_per_transfer`. The base
/// season keeps its nominal spend exactly; a season with zero spend has zero
/// real spend.
pub fn add_real_spend(
    metrics: &[SeasonMetrics],
    base: BaseYear,
) -> Result<Vec<SeasonMetrics>, InflationError> {
    let base_idx = match base {
        BaseYear::Earliest if !metrics.is_empty() => 0,
        BaseYear::Latest if !metrics.is_empty() => metrics.len() - 1,
        _ => return Err(InflationError::NoBaseSeason),
    };

    let mut costs = Vec::with_capacity(metrics.len());
    for m in metrics {
        if m.transfer_count == 0 {
            return Err(InflationError::ZeroTransferCount {
                season: m.season.clone(),
            });
        }
        costs.push(m.total_spend / m.transfer_count as f64);
    }

    let base_cost = costs[base_idx];
    if base_cost == 0.0 {
        return Err(InflationError::ZeroBaseCost {
            season: metrics[base_idx].season.clone(),
        });
    }

    let out = metrics
        .iter()
        .zip(&costs)
        .enumerate()
        .map(|(i, (m, &cost))| {
            let real = if i == base_idx {
                m.spend_billion
            } else if cost == 0.0 {
                0.0
            } else {
                m.spend_billion * base_cost / cost
            };
            let mut row = m.clone();
            row.cost_per_transfer = Some(cost);
            row.real_spend_billion = Some(real);
            row
        })
        .collect();

    info!(
        base_season = %metrics[base_idx].season,
        base_cost, "applied cost-per-transfer deflation"
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Median price index
// ---------------------------------------------------------------------------

/// One row of the median-fee price index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InflationIndexRow {
    pub season: String,
    pub median_fee: Option<f64>,
    pub inflation_index: Option<f64>,
    pub spend_billion: f64,
    pub real_spend_billion: Option<f64>,
}

/// Median fee per season over transfers with `fee >= min_fee_threshold`,
/// rebased to the base season's median.
///
/// Seasons come from `metrics` (and keep its order); a season with no
/// transfer above the threshold has no index and no real spend.
pub fn compute_inflation_index(
    rows: &[TransferRecord],
    metrics: &[SeasonMetrics],
    min_fee_threshold: f64,
    base: BaseYear,
) -> Result<Vec<InflationIndexRow>, InflationError> {
    let mut fees: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in rows.iter().filter(|t| t.fee() >= min_fee_threshold) {
        fees.entry(row.transfer_season.as_str())
            .or_default()
            .push(row.fee());
    }

    let medians: Vec<Option<f64>> = metrics
        .iter()
        .map(|m| fees.get(m.season.as_str()).and_then(|f| median(f)))
        .collect();

    let mut with_median = medians
        .iter()
        .enumerate()
        .filter_map(|(i, med)| med.map(|v| (i, v)));
    let (base_idx, base_median) = match base {
        BaseYear::Earliest => with_median.next(),
        BaseYear::Latest => with_median.last(),
    }
    .ok_or(InflationError::NoBaseSeason)?;

    if base_median <= 0.0 {
        return Err(InflationError::ZeroBaseCost {
            season: metrics[base_idx].season.clone(),
        });
    }

    let out: Vec<InflationIndexRow> = metrics
        .iter()
        .zip(&medians)
        .map(|(m, med)| {
            let index = med.map(|v| v / base_median);
            InflationIndexRow {
                season: m.season.clone(),
                median_fee: *med,
                inflation_index: index,
                spend_billion: m.spend_billion,
                real_spend_billion: index.map(|i| m.spend_billion / i),
            }
        })
        .collect();

    debug!(
        base_season = %metrics[base_idx].season,
        base_median,
        seasons_without_median = medians.iter().filter(|m| m.is_none()).count(),
        "computed median price index"
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
