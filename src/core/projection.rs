use super::types::{BalancePoint, ProjectionInput, ProjectionRow, ProjectionSummary, Rates};
use super::withdrawal::WithdrawalSchedule;

/// Last age that is ever simulated.
pub const MAX_AGE: u32 = 100;

/// Number of calendar years from `current_age` through `MAX_AGE` inclusive.
pub fn horizon_years(current_age: u32) -> usize {
    if current_age > MAX_AGE {
        0
    } else {
        (MAX_AGE - current_age + 1) as usize
    }
}

/// `horizon_years`, further capped so the last calendar year fits in an `i32`.
pub(crate) fn calendar_horizon(input: &ProjectionInput) -> usize {
    let representable = i64::from(i32::MAX) - i64::from(input.current_year) + 1;
    horizon_years(input.current_age).min(representable as usize)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct AccumulationYear {
    pub interest: f64,
    pub contribution: f64,
    pub ending_balance: f64,
}

pub(crate) fn accumulation_year(balance: f64, salary: f64, rates: &Rates) -> AccumulationYear {
    let interest = balance * rates.ror_before;
    let contribution = salary * rates.contribution;
    AccumulationYear {
        interest,
        contribution,
        ending_balance: clamp_balance(balance + interest + contribution),
    }
}

pub(crate) fn retirement_ending_balance(balance: f64, interest: f64, withdrawal: f64) -> f64 {
    clamp_balance(balance + interest - withdrawal)
}

fn clamp_balance(ending: f64) -> f64 {
    if ending < 0.0 { 0.0 } else { ending }
}

/// Year-by-year trajectory from `current_year` until the balance runs out or
/// age passes 100.
pub fn project(input: &ProjectionInput) -> Vec<ProjectionRow> {
    let horizon = calendar_horizon(input);
    let mut rows = Vec::with_capacity(horizon);
    if horizon == 0 {
        return rows;
    }

    let rates = Rates::from_input(input);
    let mut year = input.current_year;
    let mut age = input.current_age;
    let mut balance = input.current_nest_egg;
    let mut salary = input.current_salary;

    while age < input.retirement_age && rows.len() < horizon {
        let step = accumulation_year(balance, salary, &rates);
        rows.push(ProjectionRow {
            year,
            age,
            starting_balance: balance,
            interest: step.interest,
            salary,
            contribution: step.contribution,
            active_ret: 0.0,
            slow_ret: 0.0,
            ending_balance: step.ending_balance,
        });

        balance = step.ending_balance;
        salary *= 1.0 + rates.salary_growth;
        year = year.saturating_add(1);
        age += 1;
    }

    let mut schedule = WithdrawalSchedule::new(input);
    while rows.len() < horizon && balance > 0.0 {
        let interest = balance * rates.ror_in;
        let withdrawal = schedule.draw(age);
        let ending_balance = retirement_ending_balance(balance, interest, withdrawal.amount);
        rows.push(ProjectionRow {
            year,
            age,
            starting_balance: balance,
            interest,
            salary: 0.0,
            contribution: 0.0,
            active_ret: withdrawal.active_amount(),
            slow_ret: withdrawal.slow_amount(),
            ending_balance,
        });

        schedule.grow(withdrawal.phase, rates.inflation);
        balance = ending_balance;
        year = year.saturating_add(1);
        age += 1;
    }

    rows
}

pub fn summarize(rows: &[ProjectionRow]) -> ProjectionSummary {
    let years = rows
        .iter()
        .map(|row| BalancePoint {
            year: row.year,
            balance: row.ending_balance,
        })
        .collect::<Vec<_>>();
    let final_balance = rows.last().map(|row| row.ending_balance).unwrap_or(0.0);
    let max_nest_egg = rows
        .iter()
        .map(|row| row.ending_balance)
        .max_by(f64::total_cmp)
        .unwrap_or(0.0);
    let total_retirement_dollars = rows.iter().map(|row| row.active_ret + row.slow_ret).sum();

    ProjectionSummary {
        years,
        final_balance,
        max_nest_egg,
        total_retirement_dollars,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    pub(crate) fn sample_input() -> ProjectionInput {
        ProjectionInput {
            current_year: 2025,
            current_age: 60,
            retirement_age: 65,
            current_salary: 100_000.0,
            annual_contribution: 10.0,
            salary_growth_rate: 3.0,
            current_nest_egg: 500_000.0,
            rate_of_return_before_retirement: 7.0,
            spending_at_retirement: 40_000.0,
            slowdown_age: 75,
            spending_at_slowdown: 25_000.0,
            rate_of_return_in_retirement: 5.0,
            inflation_in_retirement: 3.0,
        }
    }

    #[test]
    fn oracle_first_accumulation_rows_match_hand_calculation() {
        let rows = project(&sample_input());

        let first = rows[0];
        assert_eq!(first.year, 2025);
        assert_eq!(first.age, 60);
        assert_approx(first.starting_balance, 500_000.0);
        assert_approx(first.interest, 35_000.0);
        assert_approx(first.salary, 100_000.0);
        assert_approx(first.contribution, 10_000.0);
        assert_approx(first.ending_balance, 545_000.0);
        assert_eq!(first.active_ret, 0.0);
        assert_eq!(first.slow_ret, 0.0);

        // 545000 * 1.07 + 103000 * 0.10 = 583150 + 10300
        let second = rows[1];
        assert_approx(second.salary, 103_000.0);
        assert_approx(second.interest, 38_150.0);
        assert_approx(second.contribution, 10_300.0);
        assert_approx(second.ending_balance, 593_450.0);
    }

    #[test]
    fn oracle_retirement_starts_at_retirement_age_with_initial_spending() {
        let rows = project(&sample_input());
        let retirement = rows.iter().find(|row| row.age == 65).expect("age 65 row");

        assert_eq!(retirement.year, 2030);
        assert_eq!(retirement.active_ret, 40_000.0);
        assert_eq!(retirement.slow_ret, 0.0);
        assert_eq!(retirement.salary, 0.0);
        assert_eq!(retirement.contribution, 0.0);
        assert_approx(
            retirement.interest,
            retirement.starting_balance * 0.05,
        );
        assert_approx(
            retirement.ending_balance,
            retirement.starting_balance * 1.05 - 40_000.0,
        );

        let next = rows.iter().find(|row| row.age == 66).expect("age 66 row");
        assert_approx(next.active_ret, 41_200.0);
        assert_approx(next.starting_balance, retirement.ending_balance);
    }

    #[test]
    fn oracle_slow_phase_uses_input_then_inflates() {
        let rows = project(&sample_input());
        let at_75 = rows.iter().find(|row| row.age == 75).expect("age 75 row");
        let at_76 = rows.iter().find(|row| row.age == 76).expect("age 76 row");

        assert_eq!(at_75.active_ret, 0.0);
        assert_eq!(at_75.slow_ret, 25_000.0);
        assert_approx(at_76.slow_ret, 25_750.0);
    }

    #[test]
    fn phase_switch_matches_age_bands() {
        let mut input = sample_input();
        input.slowdown_age = 70;
        input.current_nest_egg = 5_000_000.0;
        let rows = project(&input);

        for row in &rows {
            match row.age {
                60..=64 => {
                    assert_eq!(row.active_ret, 0.0);
                    assert_eq!(row.slow_ret, 0.0);
                    assert!(row.salary > 0.0);
                    assert!(row.contribution > 0.0);
                }
                65..=69 => {
                    assert!(row.active_ret > 0.0);
                    assert_eq!(row.slow_ret, 0.0);
                }
                _ => {
                    assert_eq!(row.active_ret, 0.0);
                    assert!(row.slow_ret > 0.0);
                }
            }
        }
        assert_eq!(rows.last().map(|row| row.age), Some(100));
    }

    #[test]
    fn slowdown_before_current_age_starts_in_slow_mode() {
        let mut input = sample_input();
        input.retirement_age = 60;
        input.slowdown_age = 55;
        let rows = project(&input);

        assert_eq!(rows[0].age, 60);
        assert_eq!(rows[0].active_ret, 0.0);
        assert_eq!(rows[0].slow_ret, 25_000.0);
    }

    #[test]
    fn depleting_balance_emits_terminal_zero_row_then_stops() {
        let mut input = sample_input();
        input.current_age = 65;
        input.retirement_age = 65;
        input.current_nest_egg = 50_000.0;
        input.rate_of_return_in_retirement = 0.0;
        input.inflation_in_retirement = 0.0;
        let rows = project(&input);

        assert_eq!(rows.len(), 2);
        assert_approx(rows[0].ending_balance, 10_000.0);
        assert_eq!(rows[1].ending_balance, 0.0);
        assert_eq!(rows[1].active_ret, 40_000.0);
    }

    #[test]
    fn zero_starting_balance_at_retirement_emits_no_retirement_rows() {
        let mut input = sample_input();
        input.retirement_age = 60;
        input.current_nest_egg = 0.0;
        assert!(project(&input).is_empty());
    }

    #[test]
    fn negative_accumulation_balance_is_clamped_to_zero() {
        let mut input = sample_input();
        input.current_nest_egg = -1_000.0;
        input.annual_contribution = 0.0;
        let rows = project(&input);

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].starting_balance, -1_000.0);
        assert_approx(rows[0].interest, -70.0);
        for row in &rows {
            assert_eq!(row.ending_balance, 0.0);
        }
        assert_eq!(rows[1].starting_balance, 0.0);
    }

    #[test]
    fn years_near_i32_max_stop_at_last_representable_year() {
        let mut input = sample_input();
        input.current_year = i32::MAX - 2;
        let rows = project(&input);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows.last().map(|row| row.year), Some(i32::MAX));
        assert_eq!(rows.last().map(|row| row.age), Some(62));

        input.current_year = i32::MAX;
        input.current_age = 65;
        assert_eq!(project(&input).len(), 1);
    }

    #[test]
    fn current_age_over_hundred_yields_no_rows() {
        let mut input = sample_input();
        input.current_age = 101;
        input.retirement_age = 101;
        assert!(project(&input).is_empty());
    }

    #[test]
    fn retirement_age_past_hundred_is_bounded_by_horizon() {
        let mut input = sample_input();
        input.retirement_age = 120;
        let rows = project(&input);
        assert_eq!(rows.len(), horizon_years(input.current_age));
        assert_eq!(rows.last().map(|row| row.age), Some(100));
        assert!(rows.iter().all(|row| row.active_ret == 0.0 && row.slow_ret == 0.0));
    }

    #[test]
    fn summary_reports_final_max_and_total_withdrawals() {
        let mut input = sample_input();
        input.current_age = 65;
        input.retirement_age = 65;
        input.current_nest_egg = 50_000.0;
        input.rate_of_return_in_retirement = 0.0;
        input.inflation_in_retirement = 0.0;
        let summary = summarize(&project(&input));

        assert_eq!(summary.years.len(), 2);
        assert_eq!(summary.years[0].year, 2025);
        assert_approx(summary.years[0].balance, 10_000.0);
        assert_eq!(summary.final_balance, 0.0);
        assert_approx(summary.max_nest_egg, 10_000.0);
        assert_approx(summary.total_retirement_dollars, 80_000.0);
    }

    #[test]
    fn summary_of_no_rows_is_zeroed() {
        let summary = summarize(&[]);
        assert!(summary.years.is_empty());
        assert_eq!(summary.final_balance, 0.0);
        assert_eq!(summary.max_nest_egg, 0.0);
        assert_eq!(summary.total_retirement_dollars, 0.0);
    }

    #[test]
    fn repeated_projection_is_bit_identical() {
        let input = sample_input();
        let a = project(&input);
        let b = project(&input);
        assert_eq!(a.len(), b.len());
        for (left, right) in a.iter().zip(b.iter()) {
            assert_eq!(left.ending_balance.to_bits(), right.ending_balance.to_bits());
            assert_eq!(left, right);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_rows_are_bounded_non_negative_and_year_ascending(
            current_age in 0_u32..=110,
            years_to_retirement in 0_u32..=50,
            slowdown_offset in 0_u32..=60,
            salary in 0.0_f64..500_000.0,
            contribution in -20.0_f64..50.0,
            salary_growth in -10.0_f64..15.0,
            nest_egg in -100_000.0_f64..5_000_000.0,
            ror_before in -30.0_f64..30.0,
            ror_in in -30.0_f64..30.0,
            spending in 0.0_f64..300_000.0,
            slow_spending in 0.0_f64..300_000.0,
            inflation in -5.0_f64..15.0,
        ) {
            let input = ProjectionInput {
                current_year: 2025,
                current_age,
                retirement_age: current_age + years_to_retirement,
                current_salary: salary,
                annual_contribution: contribution,
                salary_growth_rate: salary_growth,
                current_nest_egg: nest_egg,
                rate_of_return_before_retirement: ror_before,
                spending_at_retirement: spending,
                slowdown_age: current_age.saturating_sub(10) + slowdown_offset,
                spending_at_slowdown: slow_spending,
                rate_of_return_in_retirement: ror_in,
                inflation_in_retirement: inflation,
            };
            let rows = project(&input);

            prop_assert!(rows.len() <= horizon_years(current_age));
            for (idx, row) in rows.iter().enumerate() {
                prop_assert_eq!(row.year, 2025 + idx as i32);
                prop_assert_eq!(row.age, current_age + idx as u32);
                prop_assert!(row.age <= MAX_AGE);
                prop_assert!(row.ending_balance >= 0.0);
            }
        }

        #[test]
        fn prop_non_negative_inputs_keep_retirement_balances_non_negative(
            current_age in 0_u32..=100,
            years_to_retirement in 0_u32..=40,
            nest_egg in 0.0_f64..5_000_000.0,
            ror_in in -20.0_f64..20.0,
            spending in 0.0_f64..500_000.0,
            slow_spending in 0.0_f64..500_000.0,
        ) {
            let mut input = sample_input();
            input.current_age = current_age;
            input.retirement_age = current_age + years_to_retirement;
            input.slowdown_age = current_age + years_to_retirement / 2 + 5;
            input.current_nest_egg = nest_egg;
            input.rate_of_return_in_retirement = ror_in;
            input.spending_at_retirement = spending;
            input.spending_at_slowdown = slow_spending;

            for row in project(&input) {
                prop_assert!(row.ending_balance >= 0.0);
                prop_assert!(row.starting_balance >= 0.0);
            }
        }

        #[test]
        fn prop_accumulation_is_monotone_for_non_negative_rates(
            nest_egg in 0.0_f64..5_000_000.0,
            salary in 0.0_f64..500_000.0,
            contribution in 0.0_f64..50.0,
            salary_growth in 0.0_f64..15.0,
            ror_before in 0.0_f64..30.0,
            years_to_retirement in 0_u32..=40,
        ) {
            let mut input = sample_input();
            input.current_age = 30;
            input.retirement_age = 30 + years_to_retirement;
            input.current_nest_egg = nest_egg;
            input.current_salary = salary;
            input.annual_contribution = contribution;
            input.salary_growth_rate = salary_growth;
            input.rate_of_return_before_retirement = ror_before;

            let rows = project(&input);
            for row in rows.iter().filter(|row| row.age < input.retirement_age) {
                prop_assert!(row.ending_balance >= row.starting_balance);
                prop_assert_eq!(row.active_ret, 0.0);
                prop_assert_eq!(row.slow_ret, 0.0);
            }
        }
    }
}
