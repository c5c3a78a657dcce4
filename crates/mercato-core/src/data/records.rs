// Typed rows of the five input tables.

use chrono::NaiveDate;

/// One row of `transfers.csv`.
///
/// `transfer_fee` and `market_value_in_eur` stay optional until the cleaner
/// fills them; a missing fee is a free transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub player_id: Option<u64>,
    pub player_name: String,
    pub transfer_season: String,
    pub transfer_date: Option<NaiveDate>,
    pub transfer_fee: Option<f64>,
    pub market_value_in_eur: Option<f64>,
    pub from_club_id: Option<u64>,
    pub to_club_id: Option<u64>,
    pub from_club_name: String,
    pub to_club_name: String,
}

impl TransferRecord {
    /// Fee with a missing value read as zero.
    pub fn fee(&self) -> f64 {
        self.transfer_fee.unwrap_or(0.0)
    }

    /// Market value with a missing value read as zero.
    pub fn market_value(&self) -> f64 {
        self.market_value_in_eur.unwrap_or(0.0)
    }
}

/// One row of `clubs.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClubRecord {
    pub club_id: u64,
    pub domestic_competition_id: Option<String>,
}

/// One row of `players.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub player_id: u64,
    pub date_of_birth: Option<NaiveDate>,
    pub position: Option<String>,
    pub last_season: Option<i32>,
    pub contract_expiration_date: Option<NaiveDate>,
    pub market_value_in_eur: Option<f64>,
}

/// One row of `appearances.csv`: a player's output in a single game.
#[derive(Debug, Clone, PartialEq)]
pub struct AppearanceRecord {
    pub game_id: u64,
    pub player_id: u64,
    pub goals: u32,
    pub assists: u32,
    pub minutes_played: u32,
}

/// One row of `games.csv`. `season` is the calendar start year (2023 = 23/24).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRecord {
    pub game_id: u64,
    pub season: i32,
}
