// Calendar-year spend series and growth between two years.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::warn;

use crate::data::records::TransferRecord;
use crate::market::aggregate::BILLION;
use crate::season::{derive_start_year, YearRange};
use crate::stats::descriptive::stable_sum;

/// Spend for transfers whose season starts in `start_year`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualSpend {
    pub start_year: i32,
    pub total_spend: f64,
    pub spend_billion: f64,
    pub transfer_count: usize,
    pub avg_fee_million: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub start_year: i32,
    pub end_year: i32,
    pub start_spend: f64,
    pub end_spend: f64,
    /// Written as `"inf"` / `"-inf"` when the start year had no spend.
    #[serde(serialize_with = "serialize_growth")]
    pub growth_percent: f64,
}

fn serialize_growth<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_none()
    } else if value.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

/// Aggregate by derived start year inside `year_range`, ascending.
pub fn annual_spend(rows: &[TransferRecord], year_range: YearRange) -> Vec<AnnualSpend> {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for row in rows {
        if let Some(year) = derive_start_year(&row.transfer_season) {
            if year_range.contains(year) {
                by_year.entry(year).or_default().push(row.fee());
            }
        }
    }

    by_year
        .into_iter()
        .map(|(start_year, fees)| {
            let total_spend = stable_sum(&fees);
            let transfer_count = fees.len();
            AnnualSpend {
                start_year,
                total_spend,
                spend_billion: total_spend / BILLION,
                transfer_count,
                avg_fee_million: (transfer_count > 0)
                    .then(|| total_spend / transfer_count as f64 / 1e6),
            }
        })
        .collect()
}

/// Percentage change from `base` to `last`.
///
/// From a zero base, any increase is `+inf` and no change is `0`.
pub fn spend_growth_percent(base: f64, last: f64) -> f64 {
    if base == 0.0 {
        if last == 0.0 {
            0.0
        } else {
            f64::INFINITY.copysign(last)
        }
    } else {
        (last - base) / base * 100.0
    }
}

/// Growth between two years of the series. A year with no transfers counts
/// as zero spend.
pub fn growth_between(series: &[AnnualSpend], start_year: i32, end_year: i32) -> GrowthSummary {
    let spend_in = |year: i32| {
        series
            .iter()
            .find(|s| s.start_year == year)
            .map(|s| s.total_spend)
            .unwrap_or_else(|| {
                warn!(year, "no transfers for year, treating spend as zero");
                0.0
            })
    };
    let start_spend = spend_in(start_year);
    let end_spend = spend_in(end_year);
    GrowthSummary {
        start_year,
        end_year,
        start_spend,
        end_spend,
        growth_percent: spend_growth_percent(start_spend, end_spend),
    }
}
