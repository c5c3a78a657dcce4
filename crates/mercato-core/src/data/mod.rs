// Input tables: typed records and their CSV loaders.

pub mod loader;
pub mod records;

pub use loader::{load_datasets, Datasets, LoadError};
pub use records::{AppearanceRecord, ClubRecord, GameRecord, PlayerRecord, TransferRecord};
