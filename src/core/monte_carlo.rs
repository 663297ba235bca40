use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

use super::error::EngineError;
use super::projection::{
    MAX_AGE, accumulation_year, calendar_horizon, retirement_ending_balance,
};
use super::types::{
    MonteCarloConfig, MonteCarloResult, MonteCarloYearSummary, ProjectionInput, Rates,
};
use super::withdrawal::WithdrawalSchedule;

pub const SIMULATION_TYPE: &str = "Monte Carlo with Random Inflation (4-7%)";

const RANDOM_INFLATION_MIN: f64 = 0.04;
const RANDOM_INFLATION_MAX: f64 = 0.07;

/// Shared stop signal for one simulation request.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Repeats the projection `config.iterations` times with a random retirement
/// inflation each year and summarises every calendar year up to age 100.
pub fn simulate(
    input: &ProjectionInput,
    config: &MonteCarloConfig,
    cancel: &CancellationFlag,
) -> Result<MonteCarloResult, EngineError> {
    let started = Instant::now();
    let horizon = calendar_horizon(input);
    let base_seed = config.seed.unwrap_or_else(rand::random);
    let rates = Rates::from_input(input);
    let completed = AtomicU32::new(0);

    let trajectories = (0..config.iterations)
        .into_par_iter()
        .map(|trial| {
            if cancel.is_cancelled() {
                return None;
            }
            let mut rng = StdRng::seed_from_u64(derive_seed(base_seed, trial));
            let path = simulate_trial(input, &rates, horizon, &mut rng);
            completed.fetch_add(1, Ordering::Relaxed);
            Some(path)
        })
        .collect::<Option<Vec<_>>>();

    let Some(trajectories) = trajectories else {
        return Err(EngineError::Cancelled {
            completed: completed.load(Ordering::Relaxed),
            requested: config.iterations,
        });
    };

    let results = aggregate(
        input.current_year,
        horizon,
        config.iterations as usize,
        trajectories,
    );

    debug!(
        iterations = config.iterations,
        horizon,
        seed = base_seed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "monte carlo simulation finished"
    );

    Ok(MonteCarloResult {
        iterations: config.iterations,
        seed: base_seed,
        results,
        simulation_type: SIMULATION_TYPE,
    })
}

/// Ending balance for each of the `horizon` years of one trial. A trial that
/// runs out early repeats its last balance for the remaining years.
fn simulate_trial(
    input: &ProjectionInput,
    rates: &Rates,
    horizon: usize,
    rng: &mut impl Rng,
) -> Vec<f64> {
    let mut path = Vec::with_capacity(horizon);
    let mut balance = input.current_nest_egg;
    let mut salary = input.current_salary;
    let mut age = input.current_age;

    while age < input.retirement_age && path.len() < horizon {
        balance = accumulation_year(balance, salary, rates).ending_balance;
        salary *= 1.0 + rates.salary_growth;
        path.push(balance);
        age += 1;
    }

    let mut schedule = WithdrawalSchedule::new(input);
    while age <= MAX_AGE && balance > 0.0 && path.len() < horizon {
        let interest = balance * rates.ror_in;
        let inflation = rng.gen_range(RANDOM_INFLATION_MIN..RANDOM_INFLATION_MAX);
        let withdrawal = schedule.draw(age);
        schedule.grow(withdrawal.phase, inflation);
        balance = retirement_ending_balance(balance, interest, withdrawal.amount);
        path.push(balance);
        age += 1;
    }

    path.resize(horizon, balance);
    path
}

fn aggregate(
    start_year: i32,
    horizon: usize,
    iterations: usize,
    trajectories: Vec<Vec<f64>>,
) -> Vec<MonteCarloYearSummary> {
    let mut buckets = (0..horizon)
        .map(|_| Vec::with_capacity(iterations))
        .collect::<Vec<Vec<f64>>>();
    for path in trajectories {
        for (bucket, balance) in buckets.iter_mut().zip(path) {
            bucket.push(balance);
        }
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(offset, values)| summarize_bucket(start_year + offset as i32, values))
        .collect()
}

/// Order statistics at indices 0, n/4, n/2, 3n/4 and n-1 of the sorted
/// bucket. No interpolation.
pub fn summarize_bucket(year: i32, mut values: Vec<f64>) -> MonteCarloYearSummary {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n == 0 {
        return MonteCarloYearSummary {
            year,
            worst_case: 0.0,
            p25: 0.0,
            median: 0.0,
            p75: 0.0,
            best_case: 0.0,
            all_results: values,
        };
    }

    MonteCarloYearSummary {
        year,
        worst_case: values[0],
        p25: values[n / 4],
        median: values[n / 2],
        p75: values[(3 * n) / 4],
        best_case: values[n - 1],
        all_results: values,
    }
}

fn derive_seed(base_seed: u64, trial: u32) -> u64 {
    splitmix64(base_seed ^ ((trial as u64) << 32))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
