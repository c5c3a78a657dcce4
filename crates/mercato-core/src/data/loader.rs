// CSV loading for the transfer dataset.
//
// Each table has a private raw serde struct mirroring the CSV columns and a
// reader-based loader that converts raw rows into typed records, skipping
// malformed rows with a warning. Path-based wrappers add the file-level
// failure modes (missing file, no usable rows).

use crate::config::DataPaths;
use crate::data::records::{
    AppearanceRecord, ClubRecord, GameRecord, PlayerRecord, TransferRecord,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{} contains no parseable rows", path.display())]
    Empty { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// `transfers.csv` row. Numeric cells that fail to parse are coerced to
/// missing rather than rejecting the row; extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawTransfer {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    player_id: Option<u64>,
    #[serde(default)]
    player_name: String,
    transfer_season: String,
    #[serde(default)]
    transfer_date: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    transfer_fee: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    market_value_in_eur: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    from_club_id: Option<u64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    to_club_id: Option<u64>,
    #[serde(default)]
    from_club_name: String,
    #[serde(default)]
    to_club_name: String,
}

#[derive(Debug, Deserialize)]
struct RawClub {
    club_id: u64,
    #[serde(default)]
    domestic_competition_id: String,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    player_id: u64,
    #[serde(default)]
    date_of_birth: String,
    #[serde(default)]
    position: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    last_season: Option<i32>,
    #[serde(default)]
    contract_expiration_date: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    market_value_in_eur: Option<f64>,
}

/// Goals, assists and minutes are read as f64 because some exports write
/// them with a trailing `.0`. An empty or unparseable stat cell counts as 0
/// so the rest of the appearance is kept.
#[derive(Debug, Deserialize)]
struct RawAppearance {
    game_id: u64,
    player_id: u64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    goals: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    assists: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    minutes_played: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawGame {
    game_id: u64,
    season: i32,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` date, tolerating a trailing time component
/// (`1995-02-05 00:00:00`). Empty or malformed values are `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(0..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn count_stat(value: Option<f64>) -> u32 {
    let value = value.unwrap_or(0.0);
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

/// Deserialize every row of a CSV stream, skipping rows that fail.
fn read_rows<R: Read, T: DeserializeOwned>(rdr: R, table: &str) -> Result<Vec<T>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    // Surface unreadable input (I/O, invalid UTF-8 header) as a hard error.
    reader.headers()?;
    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(raw) => rows.push(raw),
            Err(e) => {
                warn!(table, row = idx + 1, "skipping malformed row: {}", e);
            }
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn transfers_from_reader<R: Read>(rdr: R) -> Result<Vec<TransferRecord>, csv::Error> {
    let raw: Vec<RawTransfer> = read_rows(rdr, "transfers")?;
    Ok(raw
        .into_iter()
        .map(|r| TransferRecord {
            player_id: r.player_id,
            player_name: r.player_name.trim().to_string(),
            transfer_season: r.transfer_season.trim().to_string(),
            transfer_date: parse_date(&r.transfer_date),
            transfer_fee: r.transfer_fee.filter(|v| v.is_finite()),
            market_value_in_eur: r.market_value_in_eur.filter(|v| v.is_finite()),
            from_club_id: r.from_club_id,
            to_club_id: r.to_club_id,
            from_club_name: r.from_club_name.trim().to_string(),
            to_club_name: r.to_club_name.trim().to_string(),
        })
        .collect())
}

fn clubs_from_reader<R: Read>(rdr: R) -> Result<Vec<ClubRecord>, csv::Error> {
    let raw: Vec<RawClub> = read_rows(rdr, "clubs")?;
    Ok(raw
        .into_iter()
        .map(|r| ClubRecord {
            club_id: r.club_id,
            domestic_competition_id: non_empty(&r.domestic_competition_id),
        })
        .collect())
}

fn players_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, csv::Error> {
    let raw: Vec<RawPlayer> = read_rows(rdr, "players")?;
    Ok(raw
        .into_iter()
        .map(|r| PlayerRecord {
            player_id: r.player_id,
            date_of_birth: parse_date(&r.date_of_birth),
            position: non_empty(&r.position),
            last_season: r.last_season,
            contract_expiration_date: parse_date(&r.contract_expiration_date),
            market_value_in_eur: r.market_value_in_eur.filter(|v| v.is_finite()),
        })
        .collect())
}

fn appearances_from_reader<R: Read>(rdr: R) -> Result<Vec<AppearanceRecord>, csv::Error> {
    let raw: Vec<RawAppearance> = read_rows(rdr, "appearances")?;
    Ok(raw
        .into_iter()
        .map(|r| AppearanceRecord {
            game_id: r.game_id,
            player_id: r.player_id,
            goals: count_stat(r.goals),
            assists: count_stat(r.assists),
            minutes_played: count_stat(r.minutes_played),
        })
        .collect())
}

fn games_from_reader<R: Read>(rdr: R) -> Result<Vec<GameRecord>, csv::Error> {
    let raw: Vec<RawGame> = read_rows(rdr, "games")?;
    Ok(raw
        .into_iter()
        .map(|r| GameRecord {
            game_id: r.game_id,
            season: r.season,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn load_table<T>(
    path: &Path,
    table: &str,
    parse: fn(File) -> Result<Vec<T>, csv::Error>,
) -> Result<Vec<T>, LoadError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let rows = parse(file).map_err(|e| LoadError::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;
    if rows.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    info!(table, rows = rows.len(), "loaded {}", path.display());
    Ok(rows)
}

/// Load `transfers.csv`.
pub fn load_transfers(path: &Path) -> Result<Vec<TransferRecord>, LoadError> {
    load_table(path, "transfers", transfers_from_reader)
}

/// Load `clubs.csv`.
pub fn load_clubs(path: &Path) -> Result<Vec<ClubRecord>, LoadError> {
    load_table(path, "clubs", clubs_from_reader)
}

/// Load `players.csv`.
pub fn load_players(path: &Path) -> Result<Vec<PlayerRecord>, LoadError> {
    load_table(path, "players", players_from_reader)
}

/// Load `appearances.csv`.
pub fn load_appearances(path: &Path) -> Result<Vec<AppearanceRecord>, LoadError> {
    load_table(path, "appearances", appearances_from_reader)
}

/// Load `games.csv`.
pub fn load_games(path: &Path) -> Result<Vec<GameRecord>, LoadError> {
    load_table(path, "games", games_from_reader)
}

// ---------------------------------------------------------------------------
// Dataset bundle
// ---------------------------------------------------------------------------

/// An auxiliary table: its failure only disables the analyses that need it.
pub type AuxTable<T> = Result<Vec<T>, LoadError>;

/// Every input table of one pipeline run.
#[derive(Debug)]
pub struct Datasets {
    pub transfers: Vec<TransferRecord>,
    pub clubs: AuxTable<ClubRecord>,
    pub players: AuxTable<PlayerRecord>,
    pub appearances: AuxTable<AppearanceRecord>,
    pub games: AuxTable<GameRecord>,
}

/// Load all five tables relative to `base_dir`. The transfers table is
/// required; the others are returned with their individual outcome.
pub fn load_datasets(base_dir: &Path, paths: &DataPaths) -> Result<Datasets, LoadError> {
    let transfers = load_transfers(&base_dir.join(&paths.transfers))?;

    let clubs = load_clubs(&base_dir.join(&paths.clubs));
    let players = load_players(&base_dir.join(&paths.players));
    let appearances = load_appearances(&base_dir.join(&paths.appearances));
    let games = load_games(&base_dir.join(&paths.games));

    for (table, err) in [
        ("clubs", clubs.as_ref().err()),
        ("players", players.as_ref().err()),
        ("appearances", appearances.as_ref().err()),
        ("games", games.as_ref().err()),
    ] {
        if let Some(e) = err {
            warn!(table, "auxiliary table unavailable: {}", e);
        }
    }

    Ok(Datasets {
        transfers,
        clubs,
        players,
        appearances,
        games,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFER_HEADER: &str = "player_id,transfer_season,transfer_date,transfer_fee,market_value_in_eur,from_club_id,to_club_id,from_club_name,to_club_name,player_name";

    // -- Transfers --

    #[test]
    fn transfers_parse_all_columns() {
        let csv_data = format!(
            "{TRANSFER_HEADER}\n\
             1,21/22,2021-07-01,50000000.0,45000000.0,10,20,Inter,Chelsea,Romelu Lukaku"
        );
        let rows = transfers_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        let t = &rows[0];
        assert_eq!(t.player_id, Some(1));
        assert_eq!(t.transfer_season, "21/22");
        assert_eq!(t.transfer_date, NaiveDate::from_ymd_opt(2021, 7, 1));
        assert_eq!(t.transfer_fee, Some(50_000_000.0));
        assert_eq!(t.market_value_in_eur, Some(45_000_000.0));
        assert_eq!(t.from_club_id, Some(10));
        assert_eq!(t.to_club_id, Some(20));
        assert_eq!(t.to_club_name, "Chelsea");
        assert_eq!(t.player_name, "Romelu Lukaku");
    }

    #[test]
    fn transfers_missing_fee_and_value_are_none() {
        let csv_data = format!(
            "{TRANSFER_HEADER}\n\
             2,22/23,2022-08-01,,,10,20,A,B,Free Agent"
        );
        let rows = transfers_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(rows[0].transfer_fee, None);
        assert_eq!(rows[0].market_value_in_eur, None);
    }

    #[test]
    fn transfers_non_numeric_cells_coerced_to_none() {
        let csv_data = format!(
            "{TRANSFER_HEADER}\n\
             x,22/23,not-a-date,free,?,,20,A,B,Loan Return"
        );
        let rows = transfers_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player_id, None);
        assert_eq!(rows[0].transfer_date, None);
        assert_eq!(rows[0].transfer_fee, None);
        assert_eq!(rows[0].market_value_in_eur, None);
        assert_eq!(rows[0].from_club_id, None);
    }

    #[test]
    fn transfers_without_season_column_skip_every_row() {
        let csv_data = "player_id,transfer_fee\n1,100\n2,200";
        let rows = transfers_from_reader(csv_data.as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn transfers_extra_columns_ignored() {
        let csv_data = format!(
            "{TRANSFER_HEADER},extra\n\
             1,21/22,2021-07-01,1.0,2.0,10,20,A,B,Name,whatever"
        );
        let rows = transfers_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    // -- Clubs / players / appearances / games --

    #[test]
    fn clubs_blank_competition_is_none() {
        let csv_data = "club_id,domestic_competition_id\n1,GB1\n2,";
        let clubs = clubs_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(clubs[0].domestic_competition_id.as_deref(), Some("GB1"));
        assert_eq!(clubs[1].domestic_competition_id, None);
    }

    #[test]
    fn players_parse_dates_with_time_suffix() {
        let csv_data = "\
player_id,date_of_birth,position,last_season,contract_expiration_date,market_value_in_eur
7,1995-02-05 00:00:00,Attack,2023,2026-06-30 00:00:00,80000000";
        let players = players_from_reader(csv_data.as_bytes()).unwrap();
        let p = &players[0];
        assert_eq!(p.date_of_birth, NaiveDate::from_ymd_opt(1995, 2, 5));
        assert_eq!(p.position.as_deref(), Some("Attack"));
        assert_eq!(p.last_season, Some(2023));
        assert_eq!(p.contract_expiration_date, NaiveDate::from_ymd_opt(2026, 6, 30));
        assert_eq!(p.market_value_in_eur, Some(80_000_000.0));
    }

    #[test]
    fn appearances_round_fractional_counts() {
        let csv_data = "game_id,player_id,goals,assists,minutes_played\n1,7,1.0,0,90.0";
        let apps = appearances_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(apps[0].goals, 1);
        assert_eq!(apps[0].assists, 0);
        assert_eq!(apps[0].minutes_played, 90);
    }

    #[test]
    fn appearances_with_blank_stats_keep_their_minutes() {
        let csv_data = "game_id,player_id,goals,assists,minutes_played\n1,7,,0,90\n2,7,1,n/a,\n";
        let apps = appearances_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!((apps[0].goals, apps[0].assists, apps[0].minutes_played), (0, 0, 90));
        assert_eq!((apps[1].goals, apps[1].assists, apps[1].minutes_played), (1, 0, 0));
    }

    #[test]
    fn malformed_game_rows_skipped() {
        let csv_data = "game_id,season\n1,2023\nbad,2023\n3,2022";
        let games = games_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[1], GameRecord { game_id: 3, season: 2022 });
    }

    // -- Path-based failure modes --

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("mercato_loader_missing/transfers.csv");
        let err = load_transfers(&path).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn header_only_file_is_empty() {
        let dir = std::env::temp_dir().join("mercato_loader_header_only");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("transfers.csv");
        std::fs::write(&path, format!("{TRANSFER_HEADER}\n")).unwrap();

        let err = load_transfers(&path).unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn parse_date_variants() {
        assert_eq!(parse_date("2024-01-31"), NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(parse_date(" 2024-01-31 12:00:00 "), NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("31/01/2024"), None);
    }
}
