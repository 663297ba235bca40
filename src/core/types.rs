use serde::{Deserialize, Serialize};

/// Caller-supplied planning inputs. Rates are percentages (7.0 means 7%).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionInput {
    pub current_year: i32,
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_salary: f64,
    pub annual_contribution: f64,
    pub salary_growth_rate: f64,
    pub current_nest_egg: f64,
    pub rate_of_return_before_retirement: f64,
    pub spending_at_retirement: f64,
    pub slowdown_age: u32,
    pub spending_at_slowdown: f64,
    pub rate_of_return_in_retirement: f64,
    pub inflation_in_retirement: f64,
}

/// Percentage inputs converted to decimal fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub ror_before: f64,
    pub ror_in: f64,
    pub salary_growth: f64,
    pub inflation: f64,
    pub contribution: f64,
}

impl Rates {
    pub fn from_input(input: &ProjectionInput) -> Self {
        Self {
            ror_before: input.rate_of_return_before_retirement / 100.0,
            ror_in: input.rate_of_return_in_retirement / 100.0,
            salary_growth: input.salary_growth_rate / 100.0,
            inflation: input.inflation_in_retirement / 100.0,
            contribution: input.annual_contribution / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionRow {
    pub year: i32,
    pub age: u32,
    pub starting_balance: f64,
    pub interest: f64,
    pub salary: f64,
    pub contribution: f64,
    #[serde(rename = "active_retirement")]
    pub active_ret: f64,
    #[serde(rename = "slow_retirement")]
    pub slow_ret: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalancePoint {
    pub year: i32,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionSummary {
    pub years: Vec<BalancePoint>,
    pub final_balance: f64,
    pub max_nest_egg: f64,
    pub total_retirement_dollars: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloYearSummary {
    pub year: i32,
    pub worst_case: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub best_case: f64,
    pub all_results: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarloConfig {
    pub iterations: u32,
    /// Base seed for the per-trial generators; drawn from OS entropy when absent.
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: 500,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloResult {
    pub iterations: u32,
    pub seed: u64,
    pub results: Vec<MonteCarloYearSummary>,
    pub simulation_type: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub stats: HistogramStats,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedScenario {
    pub name: String,
    #[serde(flatten)]
    pub input: ProjectionInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    pub name: String,
    pub final_balance: f64,
    pub max_nest_egg: f64,
    pub total_retirement_dollars: f64,
    pub years: Vec<BalancePoint>,
}
