// Which destination leagues buy below fair value.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::fair_value::model::FairValueEstimate;
use crate::market::leagues::ClubLeagueIndex;
use crate::stats::descriptive::stable_sum;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueScouting {
    pub code: String,
    pub league: String,
    pub country: String,
    pub transfers: usize,
    pub total_spend: f64,
    /// Σ of how far each underpaid transfer came in below its fair value.
    pub savings: f64,
    /// `savings / total_spend * 100`; `None` when nothing was spent.
    pub efficiency_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoutingReport {
    pub leagues: Vec<LeagueScouting>,
    /// Estimates whose destination club has no known league.
    pub unresolved: usize,
}

/// Aggregate estimates by destination league, best efficiency first.
pub fn league_scouting_efficiency(
    estimates: &[FairValueEstimate],
    index: &ClubLeagueIndex,
) -> ScoutingReport {
    let mut groups: HashMap<&str, Vec<&FairValueEstimate>> = HashMap::new();
    let mut unresolved = 0usize;
    for e in estimates {
        match index.league_of(e.to_club_id) {
            Some(info) => groups.entry(info.code).or_default().push(e),
            None => unresolved += 1,
        }
    }

    let mut leagues: Vec<LeagueScouting> = groups
        .into_iter()
        .filter_map(|(code, members)| {
            let info = crate::market::leagues::lookup_league(code)?;
            let fees: Vec<f64> = members.iter().map(|e| e.observed_fee).collect();
            let savings: Vec<f64> = members.iter().map(|e| (-e.residual).max(0.0)).collect();
            let total_spend = stable_sum(&fees);
            let savings = stable_sum(&savings);
            Some(LeagueScouting {
                code: info.code.to_string(),
                league: info.league.to_string(),
                country: info.country.to_string(),
                transfers: members.len(),
                total_spend,
                savings,
                efficiency_percent: (total_spend > 0.0).then(|| savings / total_spend * 100.0),
            })
        })
        .collect();

    leagues.sort_by(|a, b| {
        let ea = a.efficiency_percent.unwrap_or(f64::NEG_INFINITY);
        let eb = b.efficiency_percent.unwrap_or(f64::NEG_INFINITY);
        eb.total_cmp(&ea).then_with(|| a.code.cmp(&b.code))
    });

    if unresolved > 0 {
        debug!(unresolved, "estimates without a destination league dropped");
    }
    ScoutingReport { leagues, unresolved }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::ClubRecord;
    use crate::fair_value::model::{classify, TransferStatus};

    fn estimate(club: Option<u64>, observed: f64, predicted: f64) -> FairValueEstimate {
        let (residual, status) = classify(observed, predicted);
        FairValueEstimate {
            player_id: 1,
            player_name: "P".into(),
            to_club_id: club,
            to_club_name: String::new(),
            market_value: 0.0,
            goals: 0,
            assists: 0,
            minutes_played: 900,
            age: 25,
            observed_fee: observed,
            predicted_fee: predicted,
            residual,
            status,
        }
    }

    fn index() -> ClubLeagueIndex {
        ClubLeagueIndex::from_clubs(&[
            ClubRecord {
                club_id: 1,
                domestic_competition_id: Some("GB1".into()),
            },
            ClubRecord {
                club_id: 2,
                domestic_competition_id: Some("IT1".into()),
            },
        ])
    }

    #[test]
    fn savings_only_count_underpaid() {
        let estimates = vec![
            estimate(Some(1), 40e6, 50e6), // saved 10m
            estimate(Some(1), 60e6, 30e6), // overpaid
            estimate(Some(2), 10e6, 15e6), // saved 5m
            estimate(None, 1e6, 2e6),
            estimate(Some(7), 1e6, 2e6),
        ];
        assert_eq!(estimates[1].status, TransferStatus::Overpaid);

        let report = league_scouting_efficiency(&estimates, &index());
        assert_eq!(report.unresolved, 2);
        assert_eq!(report.leagues.len(), 2);

        let italy = &report.leagues[0];
        assert_eq!(italy.code, "IT1");
        assert_eq!(italy.savings, 5e6);
        assert_eq!(italy.efficiency_percent, Some(50.0));

        let england = &report.leagues[1];
        assert_eq!(england.transfers, 2);
        assert_eq!(england.total_spend, 100e6);
        assert_eq!(england.savings, 10e6);
        assert_eq!(england.efficiency_percent, Some(10.0));
    }
}
