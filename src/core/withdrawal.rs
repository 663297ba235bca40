use super::types::ProjectionInput;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WithdrawalPhase {
    Active,
    Slow,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Withdrawal {
    pub phase: WithdrawalPhase,
    pub amount: f64,
}

impl Withdrawal {
    pub fn active_amount(self) -> f64 {
        match self.phase {
            WithdrawalPhase::Active => self.amount,
            WithdrawalPhase::Slow => 0.0,
        }
    }

    pub fn slow_amount(self) -> f64 {
        match self.phase {
            WithdrawalPhase::Active => 0.0,
            WithdrawalPhase::Slow => self.amount,
        }
    }
}

/// Two spending streams switched on age. The slow stream starts at the
/// slowdown spending figure the first year it is drawn; each stream only
/// grows after a year in which it was drawn.
#[derive(Debug, Clone)]
pub struct WithdrawalSchedule {
    slowdown_age: u32,
    spending_at_slowdown: f64,
    active_amount: f64,
    slow_amount: f64,
    slow_entered: bool,
}

impl WithdrawalSchedule {
    pub fn new(input: &ProjectionInput) -> Self {
        Self {
            slowdown_age: input.slowdown_age,
            spending_at_slowdown: input.spending_at_slowdown,
            active_amount: input.spending_at_retirement,
            slow_amount: 0.0,
            slow_entered: false,
        }
    }

    pub fn phase_for(&self, age: u32) -> WithdrawalPhase {
        if age < self.slowdown_age {
            WithdrawalPhase::Active
        } else {
            WithdrawalPhase::Slow
        }
    }

    pub fn draw(&mut self, age: u32) -> Withdrawal {
        let phase = self.phase_for(age);
        let amount = match phase {
            WithdrawalPhase::Active => self.active_amount,
            WithdrawalPhase::Slow => {
                if !self.slow_entered {
                    self.slow_entered = true;
                    self.slow_amount = self.spending_at_slowdown;
                }
                self.slow_amount
            }
        };
        Withdrawal { phase, amount }
    }

    pub fn grow(&mut self, phase: WithdrawalPhase, inflation: f64) {
        match phase {
            WithdrawalPhase::Active => self.active_amount *= 1.0 + inflation,
            WithdrawalPhase::Slow => self.slow_amount *= 1.0 + inflation,
        }
    }
}
