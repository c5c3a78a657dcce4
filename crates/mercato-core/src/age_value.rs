// Age versus market value of the player population.
//
// Two selections of "current" players exist and are kept side by side:
// players whose last season is a given year, and players still under
// contract or valued above a threshold.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::data::records::PlayerRecord;
use crate::stats::descriptive::{mean, median};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgeValuePoint {
    pub player_id: u64,
    pub age: i32,
    pub market_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBucket {
    pub age: i32,
    pub players: usize,
    pub median_value: f64,
    pub mean_value: f64,
}

fn point(player: &PlayerRecord, reference_year: i32) -> Option<AgeValuePoint> {
    let born = player.date_of_birth?;
    let value = player.market_value_in_eur.filter(|v| *v > 0.0)?;
    Some(AgeValuePoint {
        player_id: player.player_id,
        age: reference_year - born.year(),
        market_value: value,
    })
}

/// Players whose `last_season` equals `season`.
pub fn age_value_by_last_season(
    players: &[PlayerRecord],
    season: i32,
    reference_year: i32,
) -> Vec<AgeValuePoint> {
    let points: Vec<AgeValuePoint> = players
        .iter()
        .filter(|p| p.last_season == Some(season))
        .filter_map(|p| point(p, reference_year))
        .collect();
    debug!(season, points = points.len(), "age/value by last season");
    points
}

/// Players with a contract running to at least `reference_date`, or valued
/// at `high_value_threshold` or more.
pub fn age_value_by_activity(
    players: &[PlayerRecord],
    reference_date: NaiveDate,
    high_value_threshold: f64,
    reference_year: i32,
) -> Vec<AgeValuePoint> {
    let points: Vec<AgeValuePoint> = players
        .iter()
        .filter(|p| {
            let under_contract = p
                .contract_expiration_date
                .is_some_and(|d| d >= reference_date);
            let high_value = p
                .market_value_in_eur
                .is_some_and(|v| v >= high_value_threshold);
            under_contract || high_value
        })
        .filter_map(|p| point(p, reference_year))
        .collect();
    debug!(%reference_date, points = points.len(), "age/value by activity");
    points
}

/// Median and mean market value per age, youngest first.
pub fn age_profile(points: &[AgeValuePoint]) -> Vec<AgeBucket> {
    let mut by_age: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for p in points {
        by_age.entry(p.age).or_default().push(p.market_value);
    }
    by_age
        .into_iter()
        .filter_map(|(age, values)| {
            Some(AgeBucket {
                age,
                players: values.len(),
                median_value: median(&values)?,
                mean_value: mean(&values)?,
            })
        })
        .collect()
}
