// Configuration loading and parsing (config/analysis.toml).

use crate::season::{SeasonCalendar, YearRange};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything a pipeline run needs, passed explicitly into each stage.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub seasons: SeasonsConfig,
    pub aggregation: AggregationConfig,
    pub efficiency: EfficiencyConfig,
    pub inflation: InflationConfig,
    pub growth: GrowthConfig,
    pub fair_value: FairValueConfig,
    pub leagues: LeaguesConfig,
    pub age_value: AgeValueConfig,
    pub data_paths: DataPaths,
    pub output: OutputConfig,
}

impl AnalysisConfig {
    /// The canonical chronological season list for this run.
    pub fn calendar(&self) -> SeasonCalendar {
        self.seasons.calendar().unwrap_or_else(|| SeasonCalendar::from_labels(Vec::<String>::new()))
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// `[seasons]`: either an explicit `list`, or `first`..=`last`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeasonsConfig {
    pub first: String,
    pub last: String,
    #[serde(default)]
    pub list: Vec<String>,
}

impl SeasonsConfig {
    pub fn calendar(&self) -> Option<SeasonCalendar> {
        if self.list.is_empty() {
            SeasonCalendar::between(&self.first, &self.last)
        } else {
            Some(SeasonCalendar::from_labels(self.list.iter().cloned()))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    pub year_range: YearRange,
    #[serde(default = "default_true")]
    pub include_free_transfers: bool,
    #[serde(default = "default_true")]
    pub compute_market_value: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EfficiencyConfig {
    /// Optional sub-windows reported on their own, each with its own ordering.
    #[serde(default)]
    pub focus_windows: Vec<Vec<String>>,
}

/// Which end of the season calendar is the price reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseYear {
    Earliest,
    Latest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InflationConfig {
    pub min_fee_threshold: f64,
    #[serde(default = "default_real_spend_base")]
    pub real_spend_base: BaseYear,
    #[serde(default = "default_index_base")]
    pub index_base: BaseYear,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrowthConfig {
    pub year_range: YearRange,
    pub start_year: i32,
    pub end_year: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FairValueConfig {
    /// Transfer window analysed, e.g. `"23/24"`.
    pub season: String,
    /// `games.csv` season whose performances feed the model (2023 = 23/24).
    pub performance_season: i32,
    /// Only transfers strictly above this fee enter the model.
    pub min_fee: f64,
    /// Training rows need strictly more minutes than this.
    pub min_minutes: u32,
    pub min_training_rows: usize,
    pub positions: Vec<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaguesConfig {
    pub flow_season: String,
    pub flow_codes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgeValueConfig {
    pub last_season: i32,
    pub reference_year: i32,
    pub reference_date: chrono::NaiveDate,
    pub high_value_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub transfers: String,
    pub clubs: String,
    pub players: String,
    pub appearances: String,
    pub games: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: String,
}

fn default_true() -> bool {
    true
}

fn default_real_spend_base() -> BaseYear {
    BaseYear::Latest
}

fn default_index_base() -> BaseYear {
    BaseYear::Earliest
}

fn default_top_n() -> usize {
    3
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

const CONFIG_FILE: &str = "analysis.toml";

/// Load and validate `config/analysis.toml` relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<AnalysisConfig, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config = parse_config(&text, &path)?;
    validate(&config)?;
    Ok(config)
}

fn parse_config(text: &str, path: &Path) -> Result<AnalysisConfig, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&path, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", path.display(), target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to `base_dir`, copying default
/// config files first.
pub fn load_config(base_dir: &Path) -> Result<AnalysisConfig, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate(config: &AnalysisConfig) -> Result<(), ConfigError> {
    match config.seasons.calendar() {
        Some(cal) if !cal.is_empty() => {}
        _ => {
            return Err(invalid(
                "seasons",
                format!(
                    "could not build a season list from first={:?} last={:?}",
                    config.seasons.first, config.seasons.last
                ),
            ))
        }
    }

    for (field, range) in [
        ("aggregation.year_range", config.aggregation.year_range),
        ("growth.year_range", config.growth.year_range),
    ] {
        if range.end < range.start {
            return Err(invalid(
                field,
                format!("end {} is before start {}", range.end, range.start),
            ));
        }
    }

    let threshold = config.inflation.min_fee_threshold;
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(invalid(
            "inflation.min_fee_threshold",
            format!("must be a positive number, got {threshold}"),
        ));
    }

    let fv = &config.fair_value;
    let min_rows = crate::fair_value::model::MIN_TRAINING_ROWS;
    if fv.min_training_rows < min_rows {
        return Err(invalid(
            "fair_value.min_training_rows",
            format!(
                "must be at least {min_rows} (one more than the number of features), got {}",
                fv.min_training_rows
            ),
        ));
    }
    if fv.positions.is_empty() {
        return Err(invalid("fair_value.positions", "must list at least one position"));
    }
    if crate::season::derive_start_year(&fv.season).is_none() {
        return Err(invalid(
            "fair_value.season",
            format!("{:?} is not a YY/YY season", fv.season),
        ));
    }

    if config.output.dir.trim().is_empty() {
        return Err(invalid("output.dir", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: returns the repository root holding `defaults/`
    /// (works whether `cargo test` runs from the crate dir or the repo root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("../../defaults").exists() {
            cwd.join("../..")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    fn default_text() -> String {
        fs::read_to_string(project_root().join("defaults").join(CONFIG_FILE)).unwrap()
    }

    /// Write `text` as config/analysis.toml under a fresh temp dir.
    fn temp_config(name: &str, text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), text).unwrap();
        tmp
    }

    #[test]
    fn load_default_config() {
        let tmp = temp_config("mercato_config_defaults", &default_text());
        let config = load_config_from(&tmp).expect("defaults should load");

        assert_eq!(config.seasons.first, "10/11");
        assert_eq!(config.seasons.last, "23/24");
        assert_eq!(config.calendar().len(), 14);
        assert_eq!(config.aggregation.year_range, YearRange::new(2010, 2023));
        assert!(config.aggregation.include_free_transfers);
        assert_eq!(config.growth.year_range, YearRange::new(2010, 2024));
        assert!((config.inflation.min_fee_threshold - 1_000_000.0).abs() < f64::EPSILON);
        assert_eq!(config.inflation.real_spend_base, BaseYear::Latest);
        assert_eq!(config.inflation.index_base, BaseYear::Earliest);
        assert_eq!(config.fair_value.season, "23/24");
        assert_eq!(config.fair_value.performance_season, 2023);
        assert_eq!(config.fair_value.min_minutes, 500);
        assert_eq!(config.fair_value.min_training_rows, 5);
        assert_eq!(config.fair_value.positions, vec!["Attack"]);
        assert_eq!(config.leagues.flow_codes.len(), 5);
        assert_eq!(config.data_paths.transfers, "data/transfers.csv");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn explicit_season_list_overrides_range() {
        let text = default_text().replace(
            "last = \"23/24\"",
            "last = \"23/24\"\nlist = [\"20/21\", \"21/22\", \"22/23\"]",
        );
        let tmp = temp_config("mercato_config_season_list", &text);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.calendar().labels(), &["20/21", "21/22", "22/23"]);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_reversed_year_range() {
        let text = default_text().replace("year_range = [2010, 2023]", "year_range = [2023, 2010]");
        let tmp = temp_config("mercato_config_reversed_range", &text);
        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "aggregation.year_range")
            }
            other => panic!("expected ValidationError, got {:?}", other),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_positive_fee_threshold() {
        let text = default_text().replace(
            "min_fee_threshold = 1_000_000.0",
            "min_fee_threshold = 0.0",
        );
        let tmp = temp_config("mercato_config_zero_threshold", &text);
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "inflation.min_fee_threshold"));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_too_few_training_rows() {
        let text = default_text().replace("min_training_rows = 5", "min_training_rows = 2");
        let tmp = temp_config("mercato_config_few_training_rows", &text);
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "fair_value.min_training_rows"));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_malformed_season_bounds() {
        let text = default_text().replace("first = \"10/11\"", "first = \"ten\"");
        let tmp = temp_config("mercato_config_bad_season", &text);
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "seasons"));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("mercato_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_config("mercato_config_invalid_toml", "[seasons\nfirst = ");
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_then_skips() {
        let tmp = std::env::temp_dir().join("mercato_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), default_text()).unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config").join(CONFIG_FILE).exists());

        let copied_again = ensure_config_files(&tmp).unwrap();
        assert!(copied_again.is_empty());

        load_config(&tmp).expect("copied defaults should load");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("mercato_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = ensure_config_files(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }
}
