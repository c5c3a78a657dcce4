// Player fair-value estimation and scouting efficiency.

pub mod features;
pub mod model;
pub mod scouting;

pub use features::{build_fair_value_inputs, FairValueInput, JoinCounts};
pub use model::{classify, FairValueError, FairValueEstimate, FairValueModel, TransferStatus};
pub use scouting::league_scouting_efficiency;
