// Market-level analyses over the cleaned transfer table.

pub mod aggregate;
pub mod efficiency;
pub mod growth;
pub mod inflation;
pub mod leagues;

pub use aggregate::{aggregate_by_season, AggregationOptions, SeasonMetrics};
pub use inflation::{add_real_spend, compute_inflation_index, InflationError, InflationIndexRow};
pub use leagues::ClubLeagueIndex;
