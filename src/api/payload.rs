use serde::Deserialize;

use crate::config::ServerConfig;
use crate::core::{
    DEFAULT_HISTOGRAM_BINS, MAX_AGE, MonteCarloConfig, NamedScenario, ProjectionInput,
};

const MAX_HISTOGRAM_BINS: u32 = 1_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloPayload {
    #[serde(flatten)]
    pub input: ProjectionInput,
    pub iterations: Option<u32>,
    pub seed: Option<u64>,
    pub histogram_year: Option<i32>,
    pub histogram_bins: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ComparePayload {
    pub scenarios: Vec<NamedScenario>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramRequest {
    pub year: i32,
    pub bins: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloRequest {
    pub input: ProjectionInput,
    pub config: MonteCarloConfig,
    pub histogram: Option<HistogramRequest>,
}

/// Structural checks the engine itself does not make.
pub fn validate_input(input: &ProjectionInput) -> Result<(), String> {
    if !(1..=9999).contains(&input.current_year) {
        return Err("currentYear must be between 1 and 9999".to_string());
    }

    if input.current_age > MAX_AGE {
        return Err(format!("currentAge must be <= {MAX_AGE}"));
    }

    if input.retirement_age < input.current_age {
        return Err("retirementAge must be >= currentAge".to_string());
    }

    for (name, value) in [
        ("currentSalary", input.current_salary),
        ("annualContribution", input.annual_contribution),
        ("salaryGrowthRate", input.salary_growth_rate),
        ("currentNestEgg", input.current_nest_egg),
        (
            "rateOfReturnBeforeRetirement",
            input.rate_of_return_before_retirement,
        ),
        ("spendingAtRetirement", input.spending_at_retirement),
        ("spendingAtSlowdown", input.spending_at_slowdown),
        ("rateOfReturnInRetirement", input.rate_of_return_in_retirement),
        ("inflationInRetirement", input.inflation_in_retirement),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }

    Ok(())
}

impl MonteCarloPayload {
    pub fn into_request(self, config: &ServerConfig) -> Result<MonteCarloRequest, String> {
        validate_input(&self.input)?;

        let iterations = self.iterations.unwrap_or(config.default_iterations);
        if iterations == 0 || iterations > config.max_iterations {
            return Err(format!(
                "iterations must be between 1 and {}",
                config.max_iterations
            ));
        }

        let bins = self.histogram_bins.unwrap_or(DEFAULT_HISTOGRAM_BINS);
        if !(1..=MAX_HISTOGRAM_BINS).contains(&bins) {
            return Err(format!(
                "histogramBins must be between 1 and {MAX_HISTOGRAM_BINS}"
            ));
        }

        let histogram = match self.histogram_year {
            Some(year) => {
                let first = self.input.current_year;
                let last = first + (MAX_AGE - self.input.current_age) as i32;
                if !(first..=last).contains(&year) {
                    return Err(format!("histogramYear must be between {first} and {last}"));
                }
                Some(HistogramRequest { year, bins })
            }
            None => None,
        };

        Ok(MonteCarloRequest {
            input: self.input,
            config: MonteCarloConfig {
                iterations,
                seed: self.seed,
            },
            histogram,
        })
    }
}

impl ComparePayload {
    pub fn validate(&self, config: &ServerConfig) -> Result<(), String> {
        if self.scenarios.is_empty() {
            return Err("scenarios must not be empty".to_string());
        }
        if self.scenarios.len() > config.max_compare_scenarios {
            return Err(format!(
                "at most {} scenarios can be compared",
                config.max_compare_scenarios
            ));
        }
        for scenario in &self.scenarios {
            if scenario.name.trim().is_empty() {
                return Err("scenario name must not be empty".to_string());
            }
            validate_input(&scenario.input)
                .map_err(|msg| format!("scenario '{}': {msg}", scenario.name))?;
        }
        Ok(())
    }
}
