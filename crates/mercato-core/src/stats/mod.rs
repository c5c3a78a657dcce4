// Statistics used by the analyses: descriptive summaries, Pearson
// correlation, and least-squares regression.

pub mod correlation;
pub mod descriptive;
pub mod distribution;
pub mod regression;

pub use correlation::{correlation_matrix, pearson, Correlation, CorrelationMatrix, StatsError};
pub use regression::{LinearRegression, RegressionError};
