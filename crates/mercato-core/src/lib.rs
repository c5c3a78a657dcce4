// Library root: re-exports all modules so the CLI and integration tests can
// reach every pipeline stage.

pub mod age_value;
pub mod clean;
pub mod config;
pub mod data;
pub mod export;
pub mod fair_value;
pub mod market;
pub mod pipeline;
pub mod season;
pub mod stats;
