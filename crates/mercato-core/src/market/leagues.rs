// League lookup and league-level money flows.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::data::records::{ClubRecord, TransferRecord};
use crate::season::YearRange;
use crate::stats::descriptive::stable_sum;

// ---------------------------------------------------------------------------
// Static league table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeagueInfo {
    pub code: &'static str,
    pub country: &'static str,
    pub league: &'static str,
}

const fn league(code: &'static str, country: &'static str, name: &'static str) -> LeagueInfo {
    LeagueInfo {
        code,
        country,
        league: name,
    }
}

/// Domestic competition codes as they appear in `clubs.csv`.
pub static LEAGUES: &[LeagueInfo] = &[
    league("GB1", "United Kingdom", "Premier League"),
    league("ES1", "Spain", "LaLiga"),
    league("IT1", "Italy", "Serie A"),
    league("L1", "Germany", "Bundesliga"),
    league("DE1", "Germany", "Bundesliga"),
    league("FR1", "France", "Ligue 1"),
    league("NL1", "Netherlands", "Eredivisie"),
    league("PO1", "Portugal", "Liga Portugal"),
    league("BE1", "Belgium", "Jupiler Pro League"),
    league("TR1", "Turkey", "Super Lig"),
    league("RU1", "Russia", "Premier Liga"),
    league("SC1", "United Kingdom", "Scottish Premiership"),
    league("UKR1", "Ukraine", "Premier Liga"),
    league("GR1", "Greece", "Super League 1"),
    league("DK1", "Denmark", "Superliga"),
    league("A1", "Austria", "Bundesliga"),
    league("C1", "Switzerland", "Super League"),
    league("MLS1", "United States", "Major League Soccer"),
    league("BRA1", "Brazil", "Serie A"),
    league("AR1N", "Argentina", "Liga Profesional"),
    league("GB2", "United Kingdom", "Championship"),
    league("ES2", "Spain", "LaLiga2"),
    league("IT2", "Italy", "Serie B"),
    league("L2", "Germany", "2. Bundesliga"),
    league("FR2", "France", "Ligue 2"),
];

/// Case-insensitive lookup of a competition code.
pub fn lookup_league(code: &str) -> Option<&'static LeagueInfo> {
    let code = code.trim();
    LEAGUES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

// ---------------------------------------------------------------------------
// Club -> league index
// ---------------------------------------------------------------------------

/// Maps club ids to their domestic competition code.
#[derive(Debug, Clone, Default)]
pub struct ClubLeagueIndex {
    codes: HashMap<u64, String>,
}

impl ClubLeagueIndex {
    pub fn from_clubs(clubs: &[ClubRecord]) -> Self {
        let codes: HashMap<u64, String> = clubs
            .iter()
            .filter_map(|c| {
                c.domestic_competition_id
                    .as_ref()
                    .map(|code| (c.club_id, code.trim().to_uppercase()))
            })
            .collect();
        debug!(clubs = codes.len(), "built club league index");
        ClubLeagueIndex { codes }
    }

    pub fn code_of(&self, club_id: Option<u64>) -> Option<&str> {
        club_id.and_then(|id| self.codes.get(&id)).map(String::as_str)
    }

    pub fn league_of(&self, club_id: Option<u64>) -> Option<&'static LeagueInfo> {
        self.code_of(club_id).and_then(lookup_league)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// League flows
// ---------------------------------------------------------------------------

/// Purchases (league as destination) and sales (league as origin).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueFlow {
    pub code: String,
    pub league: String,
    pub purchases_amount: f64,
    pub purchases_count: usize,
    pub sales_amount: f64,
    pub sales_count: usize,
}

impl LeagueFlow {
    pub fn net_spend(&self) -> f64 {
        self.purchases_amount - self.sales_amount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueFlows {
    pub season: String,
    pub flows: Vec<LeagueFlow>,
    /// Transfers of the season where neither club resolved to a league.
    pub unresolved: usize,
}

/// Money in and out of each league in `codes` for one season, in `codes`
/// order.
pub fn league_flows(
    rows: &[TransferRecord],
    index: &ClubLeagueIndex,
    season: &str,
    codes: &[String],
) -> LeagueFlows {
    let season_rows: Vec<&TransferRecord> =
        rows.iter().filter(|t| t.transfer_season == season).collect();

    let unresolved = season_rows
        .iter()
        .filter(|t| index.code_of(t.to_club_id).is_none() && index.code_of(t.from_club_id).is_none())
        .count();

    let flows = codes
        .iter()
        .map(|code| {
            let purchases: Vec<f64> = season_rows
                .iter()
                .filter(|t| index.code_of(t.to_club_id).is_some_and(|c| c.eq_ignore_ascii_case(code)))
                .map(|t| t.fee())
                .collect();
            let sales: Vec<f64> = season_rows
                .iter()
                .filter(|t| index.code_of(t.from_club_id).is_some_and(|c| c.eq_ignore_ascii_case(code)))
                .map(|t| t.fee())
                .collect();
            LeagueFlow {
                code: code.clone(),
                league: lookup_league(code)
                    .map(|l| l.league.to_string())
                    .unwrap_or_else(|| code.clone()),
                purchases_amount: stable_sum(&purchases),
                purchases_count: purchases.len(),
                sales_amount: stable_sum(&sales),
                sales_count: sales.len(),
            }
        })
        .collect();

    LeagueFlows {
        season: season.to_string(),
        flows,
        unresolved,
    }
}

// ---------------------------------------------------------------------------
// Spend by country
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySpend {
    pub country: String,
    pub total_spend: f64,
    pub spend_billion: f64,
    pub transfer_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySpendTable {
    pub rows: Vec<CountrySpend>,
    /// Transfers whose destination club has no known league.
    pub unresolved: usize,
}

/// Destination-country spend over the seasons in `year_range`, largest first.
pub fn spend_by_country(
    rows: &[TransferRecord],
    index: &ClubLeagueIndex,
    year_range: YearRange,
) -> CountrySpendTable {
    let mut by_country: HashMap<&'static str, Vec<f64>> = HashMap::new();
    let mut unresolved = 0usize;
    for row in rows.iter().filter(|t| year_range.contains_season(&t.transfer_season)) {
        match index.league_of(row.to_club_id) {
            Some(info) => by_country.entry(info.country).or_default().push(row.fee()),
            None => unresolved += 1,
        }
    }

    let mut table: Vec<CountrySpend> = by_country
        .into_iter()
        .map(|(country, fees)| {
            let total_spend = stable_sum(&fees);
            CountrySpend {
                country: country.to_string(),
                total_spend,
                spend_billion: total_spend / 1e9,
                transfer_count: fees.len(),
            }
        })
        .collect();
    table.sort_by(|a, b| {
        b.total_spend
            .total_cmp(&a.total_spend)
            .then_with(|| a.country.cmp(&b.country))
    });

    debug!(countries = table.len(), unresolved, "aggregated spend by country");
    CountrySpendTable {
        rows: table,
        unresolved,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
