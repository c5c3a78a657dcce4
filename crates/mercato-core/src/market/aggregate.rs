// Per-season aggregation of the cleaned transfer table.
//
// One parameterized pass serves every per-season table: the full season
// metrics, the paid-only efficiency table, and the focus windows.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::AggregationConfig;
use crate::data::records::TransferRecord;
use crate::season::{derive_start_year, SeasonCalendar, YearRange};
use crate::stats::descriptive::{median, stable_sum};

pub const BILLION: f64 = 1e9;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationOptions {
    /// Inclusive start-year scope; `None` keeps every season.
    pub year_range: Option<YearRange>,
    /// When false, zero-fee rows are left out of the sums, counts and medians.
    pub include_free_transfers: bool,
    /// When false, `total_market_value` and `value_billion` stay `None`.
    pub compute_market_value: bool,
}

impl AggregationOptions {
    pub fn from_config(config: &AggregationConfig) -> Self {
        AggregationOptions {
            year_range: Some(config.year_range),
            include_free_transfers: config.include_free_transfers,
            compute_market_value: config.compute_market_value,
        }
    }

    /// Every season, every fee, with market value.
    pub fn all() -> Self {
        AggregationOptions {
            year_range: None,
            include_free_transfers: true,
            compute_market_value: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Season metrics
// ---------------------------------------------------------------------------

/// One row per season. The derived columns (`delta_billion` onwards) are
/// filled in by the efficiency and inflation stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonMetrics {
    pub season: String,
    pub start_year: Option<i32>,
    pub total_spend: f64,
    pub total_market_value: Option<f64>,
    pub transfer_count: usize,
    pub spend_billion: f64,
    pub value_billion: Option<f64>,
    pub avg_fee: Option<f64>,
    pub median_fee: Option<f64>,
    pub delta_billion: Option<f64>,
    pub premium_percent: Option<f64>,
    pub cost_per_transfer: Option<f64>,
    pub real_spend_billion: Option<f64>,
}

/// Group `rows` by `transfer_season` and aggregate each group.
///
/// `transfer_count` counts rows with a player id; rows without one still
/// contribute their fee and value to the sums. The output follows the
/// calendar; seasons the calendar does not know come last.
pub fn aggregate_by_season(
    rows: &[TransferRecord],
    options: &AggregationOptions,
    calendar: &SeasonCalendar,
) -> Vec<SeasonMetrics> {
    let mut groups: BTreeMap<&str, Vec<&TransferRecord>> = BTreeMap::new();
    let mut out_of_scope = 0usize;
    for row in rows {
        if let Some(range) = options.year_range {
            if !range.contains_season(&row.transfer_season) {
                out_of_scope += 1;
                continue;
            }
        }
        if !options.include_free_transfers && row.fee() <= 0.0 {
            continue;
        }
        groups.entry(row.transfer_season.as_str()).or_default().push(row);
    }

    let mut metrics: Vec<SeasonMetrics> = groups
        .into_iter()
        .map(|(season, members)| season_metrics(season, &members, options))
        .collect();

    let unknown: Vec<&str> = metrics
        .iter()
        .filter(|m| !calendar.contains(&m.season))
        .map(|m| m.season.as_str())
        .collect();
    if !unknown.is_empty() {
        warn!(seasons = ?unknown, "seasons missing from the calendar are ordered last");
    }

    sort_by_calendar(&mut metrics, calendar);
    debug!(
        seasons = metrics.len(),
        out_of_scope, "aggregated transfers by season"
    );
    metrics
}

fn season_metrics(
    season: &str,
    members: &[&TransferRecord],
    options: &AggregationOptions,
) -> SeasonMetrics {
    let fees: Vec<f64> = members.iter().map(|t| t.fee()).collect();
    let total_spend = stable_sum(&fees);
    let transfer_count = members.iter().filter(|t| t.player_id.is_some()).count();

    let total_market_value = if options.compute_market_value {
        let values: Vec<f64> = members.iter().map(|t| t.market_value()).collect();
        Some(stable_sum(&values))
    } else {
        None
    };

    SeasonMetrics {
        season: season.to_string(),
        start_year: derive_start_year(season),
        total_spend,
        total_market_value,
        transfer_count,
        spend_billion: total_spend / BILLION,
        value_billion: total_market_value.map(|v| v / BILLION),
        avg_fee: (transfer_count > 0).then(|| total_spend / transfer_count as f64),
        median_fee: median(&fees),
        delta_billion: None,
        premium_percent: None,
        cost_per_transfer: None,
        real_spend_billion: None,
    }
}

/// Reorder season rows against the calendar.
pub fn sort_by_calendar(metrics: &mut [SeasonMetrics], calendar: &SeasonCalendar) {
    metrics.sort_by_cached_key(|m| calendar.sort_key(&m.season));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
