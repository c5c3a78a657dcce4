// Joins transfers, player profiles and season performance into model inputs.

use std::collections::{HashMap, HashSet};

use chrono::Datelike;
use serde::Serialize;
use tracing::info;

use crate::config::FairValueConfig;
use crate::data::records::{AppearanceRecord, GameRecord, PlayerRecord, TransferRecord};

/// Names of the regression features, in the order of [`FairValueInput::features`].
pub const FEATURE_NAMES: [&str; 4] = ["goals", "assists", "minutes_played", "age"];

/// One transfer joined to its player's profile and season totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairValueInput {
    pub player_id: u64,
    pub player_name: String,
    pub to_club_id: Option<u64>,
    pub to_club_name: String,
    pub observed_fee: f64,
    pub market_value: f64,
    pub goals: u32,
    pub assists: u32,
    pub minutes_played: u32,
    /// `None` when the birth date is unknown.
    pub age: Option<i32>,
}

impl FairValueInput {
    /// Feature vector in [`FEATURE_NAMES`] order; `None` if any is missing.
    pub fn features(&self) -> Option<[f64; 4]> {
        let age = self.age?;
        Some([
            self.goals as f64,
            self.assists as f64,
            self.minutes_played as f64,
            age as f64,
        ])
    }
}

/// How many transfers each join stage dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinCounts {
    pub candidates: usize,
    pub missing_player: usize,
    pub wrong_position: usize,
    pub no_performance: usize,
    pub joined: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SeasonTotals {
    goals: u32,
    assists: u32,
    minutes_played: u32,
}

/// Per-player goal/assist/minute totals over games of `season`.
fn season_totals(
    appearances: &[AppearanceRecord],
    games: &[GameRecord],
    season: i32,
) -> HashMap<u64, SeasonTotals> {
    let season_games: HashSet<u64> = games
        .iter()
        .filter(|g| g.season == season)
        .map(|g| g.game_id)
        .collect();

    let mut totals: HashMap<u64, SeasonTotals> = HashMap::new();
    for a in appearances.iter().filter(|a| season_games.contains(&a.game_id)) {
        let t = totals.entry(a.player_id).or_default();
        t.goals += a.goals;
        t.assists += a.assists;
        t.minutes_played += a.minutes_played;
    }
    totals
}

/// Transfers of the target season above `min_fee`, restricted to players in
/// the configured positions, with their performance-season totals.
///
/// A transfer is kept only if its player has a profile and at least one
/// appearance in the performance season.
pub fn build_fair_value_inputs(
    transfers: &[TransferRecord],
    players: &[PlayerRecord],
    appearances: &[AppearanceRecord],
    games: &[GameRecord],
    config: &FairValueConfig,
) -> (Vec<FairValueInput>, JoinCounts) {
    let totals = season_totals(appearances, games, config.performance_season);
    let profiles: HashMap<u64, &PlayerRecord> = players.iter().map(|p| (p.player_id, p)).collect();

    let mut counts = JoinCounts::default();
    let mut inputs = Vec::new();

    for t in transfers
        .iter()
        .filter(|t| t.transfer_season == config.season && t.fee() > config.min_fee)
    {
        counts.candidates += 1;
        let Some(profile) = t.player_id.and_then(|id| profiles.get(&id)) else {
            counts.missing_player += 1;
            continue;
        };
        let in_position = profile
            .position
            .as_deref()
            .is_some_and(|pos| config.positions.iter().any(|p| p == pos));
        if !in_position {
            counts.wrong_position += 1;
            continue;
        }
        let Some(stats) = totals.get(&profile.player_id) else {
            counts.no_performance += 1;
            continue;
        };

        inputs.push(FairValueInput {
            player_id: profile.player_id,
            player_name: t.player_name.clone(),
            to_club_id: t.to_club_id,
            to_club_name: t.to_club_name.clone(),
            observed_fee: t.fee(),
            market_value: t.market_value(),
            goals: stats.goals,
            assists: stats.assists,
            minutes_played: stats.minutes_played,
            age: profile
                .date_of_birth
                .map(|dob| config.performance_season - dob.year()),
        });
    }
    counts.joined = inputs.len();

    info!(
        season = %config.season,
        candidates = counts.candidates,
        missing_player = counts.missing_player,
        wrong_position = counts.wrong_position,
        no_performance = counts.no_performance,
        joined = counts.joined,
        "built fair value inputs"
    );
    (inputs, counts)
}
