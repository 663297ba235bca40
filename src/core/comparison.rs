use super::projection::{project, summarize};
use super::types::{NamedScenario, ScenarioComparison};

/// Projects each scenario and reports the figures shown side by side.
pub fn compare(scenarios: &[NamedScenario]) -> Vec<ScenarioComparison> {
    scenarios
        .iter()
        .map(|scenario| {
            let summary = summarize(&project(&scenario.input));
            ScenarioComparison {
                name: scenario.name.clone(),
                final_balance: summary.final_balance,
                max_nest_egg: summary.max_nest_egg,
                total_retirement_dollars: summary.total_retirement_dollars,
                years: summary.years,
            }
        })
        .collect()
}
