// Output tables for the charting collaborators.
//
// Column names are part of the interface and must not change. Undefined
// values (`None`) are written as empty cells.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::fair_value::model::FairValueEstimate;
use crate::market::aggregate::SeasonMetrics;
use crate::market::inflation::InflationIndexRow;
use crate::pipeline::{CorrelationReport, PipelineReport, SkippedAnalysis};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write CSV {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("failed to write JSON {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Row shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SeasonMetricsRow<'a> {
    #[serde(rename = "Anno-Calcistico")]
    season: &'a str,
    #[serde(rename = "Spesa_Mld_EUR")]
    spend_billion: f64,
    #[serde(rename = "Volume_Trasferimenti")]
    transfer_count: usize,
    #[serde(rename = "Valore_Totale_Mld_EURO")]
    value_billion: Option<f64>,
    #[serde(rename = "Costo_Medio_Unitario")]
    cost_per_transfer: Option<f64>,
    #[serde(rename = "Spesa_Reale_Mld_EUR")]
    real_spend_billion: Option<f64>,
}

#[derive(Serialize)]
struct EfficiencyRow<'a> {
    #[serde(rename = "Anno-Calcistico")]
    season: &'a str,
    #[serde(rename = "Spesa_Mld_EUR")]
    spend_billion: f64,
    #[serde(rename = "Valore_Totale_Mld_EURO")]
    value_billion: Option<f64>,
    #[serde(rename = "Delta_Assoluto")]
    delta_billion: Option<f64>,
    #[serde(rename = "Premium_Percentuale")]
    premium_percent: Option<f64>,
}

#[derive(Serialize)]
struct InflationRow<'a> {
    #[serde(rename = "Anno-Calcistico")]
    season: &'a str,
    #[serde(rename = "Mediana_EUR")]
    median_fee: Option<f64>,
    #[serde(rename = "Indice_Inflazione")]
    inflation_index: Option<f64>,
    #[serde(rename = "Spesa_Mld_EUR")]
    spend_billion: f64,
    #[serde(rename = "Spesa_Reale_Mld_EUR")]
    real_spend_billion: Option<f64>,
}

#[derive(Serialize)]
struct FairValueRow<'a> {
    player_id: u64,
    player_name: &'a str,
    to_club_name: &'a str,
    goals: u32,
    assists: u32,
    minutes_played: u32,
    age: i32,
    transfer_fee: f64,
    predicted_fee: f64,
    residual: f64,
    status: &'static str,
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_rows<W, T, I>(writer: W, rows: I) -> Result<(), csv::Error>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_season_metrics<W: Write>(writer: W, metrics: &[SeasonMetrics]) -> Result<(), csv::Error> {
    write_rows(
        writer,
        metrics.iter().map(|m| SeasonMetricsRow {
            season: &m.season,
            spend_billion: m.spend_billion,
            transfer_count: m.transfer_count,
            value_billion: m.value_billion,
            cost_per_transfer: m.cost_per_transfer,
            real_spend_billion: m.real_spend_billion,
        }),
    )
}

pub fn write_efficiency<W: Write>(writer: W, metrics: &[SeasonMetrics]) -> Result<(), csv::Error> {
    write_rows(
        writer,
        metrics.iter().map(|m| EfficiencyRow {
            season: &m.season,
            spend_billion: m.spend_billion,
            value_billion: m.value_billion,
            delta_billion: m.delta_billion,
            premium_percent: m.premium_percent,
        }),
    )
}

pub fn write_inflation_index<W: Write>(writer: W, rows: &[InflationIndexRow]) -> Result<(), csv::Error> {
    write_rows(
        writer,
        rows.iter().map(|r| InflationRow {
            season: &r.season,
            median_fee: r.median_fee,
            inflation_index: r.inflation_index,
            spend_billion: r.spend_billion,
            real_spend_billion: r.real_spend_billion,
        }),
    )
}

pub fn write_fair_value<W: Write>(writer: W, estimates: &[FairValueEstimate]) -> Result<(), csv::Error> {
    write_rows(
        writer,
        estimates.iter().map(|e| FairValueRow {
            player_id: e.player_id,
            player_name: &e.player_name,
            to_club_name: &e.to_club_name,
            goals: e.goals,
            assists: e.assists,
            minutes_played: e.minutes_played,
            age: e.age,
            transfer_fee: e.observed_fee,
            predicted_fee: e.predicted_fee,
            residual: e.residual,
            status: e.status.label(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Summary<'a> {
    seasons: usize,
    correlations: &'a CorrelationReport,
    growth: &'a crate::market::growth::GrowthSummary,
    fair_value: Option<FairValueSummary<'a>>,
    league_flows_unresolved: Option<usize>,
    spend_by_country_unresolved: Option<usize>,
    skipped: &'a [SkippedAnalysis],
}

#[derive(Serialize)]
struct FairValueSummary<'a> {
    model: &'a crate::fair_value::model::ModelSummary,
    join_counts: &'a crate::fair_value::features::JoinCounts,
    estimates: usize,
    top_overpaid: Vec<&'a str>,
    top_underpaid: Vec<&'a str>,
    value_matrix: &'a crate::stats::correlation::CorrelationMatrix,
}

fn summary(report: &PipelineReport) -> Summary<'_> {
    Summary {
        seasons: report.season_metrics.len(),
        correlations: &report.correlations,
        growth: &report.growth,
        fair_value: report.fair_value.as_ref().map(|fv| FairValueSummary {
            model: &fv.model,
            join_counts: &fv.join_counts,
            estimates: fv.estimates.len(),
            top_overpaid: fv.extremes.overpaid.iter().map(|e| e.player_name.as_str()).collect(),
            top_underpaid: fv.extremes.underpaid.iter().map(|e| e.player_name.as_str()).collect(),
            value_matrix: &fv.value_matrix,
        }),
        league_flows_unresolved: report.league_flows.as_ref().map(|f| f.unresolved),
        spend_by_country_unresolved: report.spend_by_country.as_ref().map(|c| c.unresolved),
        skipped: &report.skipped,
    }
}

// ---------------------------------------------------------------------------
// Report directory
// ---------------------------------------------------------------------------

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_file<F>(dir: &Path, name: &str, written: &mut Vec<PathBuf>, write: F) -> Result<(), ExportError>
where
    F: FnOnce(File) -> Result<(), csv::Error>,
{
    let path = dir.join(name);
    let file = create(&path)?;
    write(file).map_err(|source| ExportError::Csv {
        path: path.clone(),
        source,
    })?;
    written.push(path);
    Ok(())
}

/// Write every table in `report` into `dir`, creating it if needed.
/// Tables of skipped analyses are not written. Returns the files written.
pub fn write_report(dir: &Path, report: &PipelineReport) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::new();

    csv_file(dir, "season_metrics.csv", &mut written, |f| {
        write_season_metrics(f, &report.season_metrics)
    })?;
    csv_file(dir, "efficiency.csv", &mut written, |f| {
        write_efficiency(f, &report.efficiency)
    })?;
    for (i, window) in report.focus_windows.iter().enumerate() {
        csv_file(dir, &format!("efficiency_focus_{}.csv", i + 1), &mut written, |f| {
            write_efficiency(f, &window.rows)
        })?;
    }
    if let Some(index) = &report.inflation_index {
        csv_file(dir, "inflation_index.csv", &mut written, |f| {
            write_inflation_index(f, index)
        })?;
    }
    csv_file(dir, "annual_spend.csv", &mut written, |f| {
        write_rows(f, &report.annual_spend)
    })?;
    if let Some(flows) = &report.league_flows {
        csv_file(dir, "league_flows.csv", &mut written, |f| write_rows(f, &flows.flows))?;
    }
    if let Some(countries) = &report.spend_by_country {
        csv_file(dir, "spend_by_country.csv", &mut written, |f| {
            write_rows(f, &countries.rows)
        })?;
    }
    if let Some(fv) = &report.fair_value {
        csv_file(dir, "fair_value.csv", &mut written, |f| {
            write_fair_value(f, &fv.estimates)
        })?;
        if let Some(scouting) = &fv.scouting {
            csv_file(dir, "league_scouting.csv", &mut written, |f| {
                write_rows(f, &scouting.leagues)
            })?;
        }
    }
    if let Some(av) = &report.age_value {
        csv_file(dir, "age_value_last_season.csv", &mut written, |f| {
            write_rows(f, &av.by_last_season)
        })?;
        csv_file(dir, "age_value_activity.csv", &mut written, |f| {
            write_rows(f, &av.by_activity)
        })?;
        csv_file(dir, "age_profile_last_season.csv", &mut written, |f| {
            write_rows(f, &av.last_season_profile)
        })?;
        csv_file(dir, "age_profile_activity.csv", &mut written, |f| {
            write_rows(f, &av.activity_profile)
        })?;
    }

    let path = dir.join("summary.json");
    let file = create(&path)?;
    serde_json::to_writer_pretty(file, &summary(report)).map_err(|source| ExportError::Json {
        path: path.clone(),
        source,
    })?;
    written.push(path);

    info!(dir = %dir.display(), files = written.len(), "wrote report");
    Ok(written)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
