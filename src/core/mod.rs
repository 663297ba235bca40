mod comparison;
mod error;
mod histogram;
mod monte_carlo;
mod projection;
mod types;
mod withdrawal;

pub use comparison::compare;
pub use error::EngineError;
pub use histogram::{DEFAULT_HISTOGRAM_BINS, histogram};
pub use monte_carlo::{CancellationFlag, SIMULATION_TYPE, simulate, summarize_bucket};
pub use projection::{MAX_AGE, horizon_years, project, summarize};
pub use types::{
    BalancePoint, Histogram, HistogramBin, HistogramStats, MonteCarloConfig, MonteCarloResult,
    MonteCarloYearSummary, NamedScenario, ProjectionInput, ProjectionRow, ProjectionSummary,
    Rates, ScenarioComparison,
};
pub use withdrawal::{Withdrawal, WithdrawalPhase, WithdrawalSchedule};
