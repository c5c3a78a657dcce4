// Pipeline orchestration: one run turns the loaded tables into every output
// table.
//
// Order of stages:
// 1. Clean the transfer table (fatal on failure)
// 2. Season metrics + cost-per-transfer real spend (fatal on failure)
// 3. Median price index
// 4. Paid-only efficiency, focus windows, correlations
// 5. Calendar-year growth
// 6. League flows and spend by country (needs clubs)
// 7. Fair-value model and league scouting (needs players, appearances, games)
// 8. Age/value analyses (needs players)
//
// Stages after 2 never abort the run: a failure is logged and recorded in
// `PipelineReport::skipped`.

use std::fmt::Display;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::age_value::{age_profile, age_value_by_activity, age_value_by_last_season, AgeBucket, AgeValuePoint};
use crate::clean::{clean_transfers, CleanError};
use crate::config::AnalysisConfig;
use crate::data::loader::{load_datasets, Datasets, LoadError};
use crate::data::records::TransferRecord;
use crate::fair_value::features::{build_fair_value_inputs, JoinCounts};
use crate::fair_value::model::{extremes, value_correlation_matrix, Extremes, FairValueEstimate, FairValueModel, ModelSummary};
use crate::fair_value::scouting::{league_scouting_efficiency, ScoutingReport};
use crate::market::aggregate::{aggregate_by_season, AggregationOptions, SeasonMetrics};
use crate::market::efficiency::{analyze_efficiency, focus_window, season_correlation_matrix, spend_value_correlation, spend_volume_correlation};
use crate::market::growth::{annual_spend, growth_between, AnnualSpend, GrowthSummary};
use crate::market::inflation::{add_real_spend, compute_inflation_index, InflationError, InflationIndexRow};
use crate::market::leagues::{league_flows, spend_by_country, ClubLeagueIndex, CountrySpendTable, LeagueFlows};
use crate::stats::correlation::{CorrelationMatrix, CorrelationSummary};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to load input data: {0}")]
    Load(#[from] LoadError),

    #[error("failed to clean transfers: {0}")]
    Clean(#[from] CleanError),

    #[error("failed to normalize season spend: {0}")]
    Inflation(#[from] InflationError),
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// An analysis that did not run, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedAnalysis {
    pub analysis: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusWindow {
    pub seasons: Vec<String>,
    pub rows: Vec<SeasonMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub spend_volume: Option<CorrelationSummary>,
    pub spend_value: Option<CorrelationSummary>,
    pub season_matrix: CorrelationMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairValueReport {
    pub join_counts: JoinCounts,
    pub model: ModelSummary,
    pub estimates: Vec<FairValueEstimate>,
    pub extremes: Extremes,
    pub value_matrix: CorrelationMatrix,
    pub scouting: Option<ScoutingReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeValueReport {
    pub by_last_season: Vec<AgeValuePoint>,
    pub by_activity: Vec<AgeValuePoint>,
    pub last_season_profile: Vec<AgeBucket>,
    pub activity_profile: Vec<AgeBucket>,
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub season_metrics: Vec<SeasonMetrics>,
    pub inflation_index: Option<Vec<InflationIndexRow>>,
    pub efficiency: Vec<SeasonMetrics>,
    pub focus_windows: Vec<FocusWindow>,
    pub correlations: CorrelationReport,
    pub annual_spend: Vec<AnnualSpend>,
    pub growth: GrowthSummary,
    pub league_flows: Option<LeagueFlows>,
    pub spend_by_country: Option<CountrySpendTable>,
    pub fair_value: Option<FairValueReport>,
    pub age_value: Option<AgeValueReport>,
    pub skipped: Vec<SkippedAnalysis>,
}

impl PipelineReport {
    fn skip(&mut self, analysis: &'static str, reason: impl Display) {
        warn!(analysis, %reason, "analysis skipped");
        self.skipped.push(SkippedAnalysis {
            analysis,
            reason: reason.to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Load the tables named in `config.data_paths` under `base_dir`, then run.
pub fn run_from_dir(base_dir: &Path, config: &AnalysisConfig) -> Result<PipelineReport, PipelineError> {
    let datasets = load_datasets(base_dir, &config.data_paths)?;
    run(config, &datasets)
}

pub fn run(config: &AnalysisConfig, data: &Datasets) -> Result<PipelineReport, PipelineError> {
    let calendar = config.calendar();
    let transfers = clean_transfers(&data.transfers)?;
    info!(rows = transfers.len(), seasons = calendar.len(), "pipeline started");

    // Season metrics
    let options = AggregationOptions::from_config(&config.aggregation);
    let metrics = aggregate_by_season(&transfers, &options, &calendar);
    let season_metrics = add_real_spend(&metrics, config.inflation.real_spend_base)?;

    // Efficiency
    let efficiency = analyze_efficiency(&transfers, &calendar);
    let focus_windows = config
        .efficiency
        .focus_windows
        .iter()
        .map(|seasons| FocusWindow {
            seasons: seasons.clone(),
            rows: focus_window(&efficiency, seasons),
        })
        .collect();

    // Growth
    let series = annual_spend(&transfers, config.growth.year_range);
    let growth = growth_between(&series, config.growth.start_year, config.growth.end_year);

    let mut report = PipelineReport {
        season_metrics,
        inflation_index: None,
        efficiency,
        focus_windows,
        correlations: CorrelationReport {
            spend_volume: None,
            spend_value: None,
            season_matrix: season_correlation_matrix(&metrics),
        },
        annual_spend: series,
        growth,
        league_flows: None,
        spend_by_country: None,
        fair_value: None,
        age_value: None,
        skipped: Vec::new(),
    };

    match compute_inflation_index(
        &transfers,
        &metrics,
        config.inflation.min_fee_threshold,
        config.inflation.index_base,
    ) {
        Ok(index) => report.inflation_index = Some(index),
        Err(e) => report.skip("inflation_index", e),
    }

    match spend_volume_correlation(&metrics) {
        Ok(c) => report.correlations.spend_volume = Some(c.summary()),
        Err(e) => report.skip("spend_volume_correlation", e),
    }
    match spend_value_correlation(&report.efficiency) {
        Ok(c) => report.correlations.spend_value = Some(c.summary()),
        Err(e) => report.skip("spend_value_correlation", e),
    }

    let index = match &data.clubs {
        Ok(clubs) => Some(ClubLeagueIndex::from_clubs(clubs)),
        Err(e) => {
            report.skip("league_flows", e);
            report.skip("spend_by_country", e);
            None
        }
    };
    if let Some(index) = &index {
        report.league_flows = Some(league_flows(
            &transfers,
            index,
            &config.leagues.flow_season,
            &config.leagues.flow_codes,
        ));
        report.spend_by_country = Some(spend_by_country(
            &transfers,
            index,
            config.aggregation.year_range,
        ));
    }

    run_fair_value(config, data, &transfers, index.as_ref(), &mut report);
    run_age_value(config, data, &mut report);

    info!(
        seasons = report.season_metrics.len(),
        skipped = report.skipped.len(),
        "pipeline finished"
    );
    Ok(report)
}

fn run_fair_value(
    config: &AnalysisConfig,
    data: &Datasets,
    transfers: &[TransferRecord],
    index: Option<&ClubLeagueIndex>,
    report: &mut PipelineReport,
) {
    let (players, appearances, games) = match (&data.players, &data.appearances, &data.games) {
        (Ok(p), Ok(a), Ok(g)) => (p, a, g),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            report.skip("fair_value", e);
            return;
        }
    };

    let fv = &config.fair_value;
    let (inputs, join_counts) = build_fair_value_inputs(transfers, players, appearances, games, fv);
    let model = match FairValueModel::fit(&inputs, fv) {
        Ok(model) => model,
        Err(e) => {
            report.skip("fair_value", e);
            return;
        }
    };

    let estimates = model.evaluate(&inputs);
    let scouting = match index {
        Some(index) => Some(league_scouting_efficiency(&estimates, index)),
        None => {
            report.skip("league_scouting", "clubs table unavailable");
            None
        }
    };

    report.fair_value = Some(FairValueReport {
        join_counts,
        model: model.summary(),
        extremes: extremes(&estimates, fv.top_n),
        value_matrix: value_correlation_matrix(&estimates),
        estimates,
        scouting,
    });
}

fn run_age_value(config: &AnalysisConfig, data: &Datasets, report: &mut PipelineReport) {
    let players = match &data.players {
        Ok(players) => players,
        Err(e) => {
            report.skip("age_value", e);
            return;
        }
    };
    let av = &config.age_value;
    let by_last_season = age_value_by_last_season(players, av.last_season, av.reference_year);
    let by_activity = age_value_by_activity(
        players,
        av.reference_date,
        av.high_value_threshold,
        av.reference_year,
    );
    report.age_value = Some(AgeValueReport {
        last_season_profile: age_profile(&by_last_season),
        activity_profile: age_profile(&by_activity),
        by_last_season,
        by_activity,
    });
}
