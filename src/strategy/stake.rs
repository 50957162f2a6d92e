//! Stake sizing and the run-scoped bankroll.
//!
//! A stake is a fixed share of the balance observed at the start of the
//! run, floored at a minimum and truncated to whole currency units.

use rust_decimal::Decimal;
use tracing::debug;

use crate::types::RuleId;

pub struct StakeCalculator {
    min_stake: Decimal,
}

impl StakeCalculator {
    pub fn new(min_stake: Decimal) -> Self {
        Self { min_stake }
    }

    /// `max(total * percent, min_stake)`, truncated.
    pub fn stake(&self, total_balance: Decimal, rule: RuleId) -> Decimal {
        let raw = total_balance * rule.percent();
        let stake = raw.max(self.min_stake).trunc();
        debug!(
            rule = %rule,
            total = %total_balance,
            raw = %raw,
            stake = %stake,
            "Stake sized"
        );
        stake
    }
}

/// Balance bookkeeping for one bet run.
///
/// `total` is fixed once observed; `available` only decreases, by exactly
/// the stake of each confirmed bet.
#[derive(Debug, Clone)]
pub struct Bankroll {
    total: Decimal,
    available: Decimal,
}

impl Bankroll {
    pub fn new(total: Decimal) -> Self {
        Self {
            total,
            available: total,
        }
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn available(&self) -> Decimal {
        self.available
    }

    pub fn can_afford(&self, stake: Decimal) -> bool {
        self.available >= stake
    }

    /// Debit a confirmed stake. Returns `false` (and changes nothing) if
    /// the stake exceeds the available balance.
    pub fn commit(&mut self, stake: Decimal) -> bool {
        if !self.can_afford(stake) {
            return false;
        }
        self.available -= stake;
        true
    }

    /// Sum of all committed stakes.
    pub fn committed(&self) -> Decimal {
        self.total - self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stake_floor_applies() {
        // 5% of 100 is 5, below the floor of 20.
        let calc = StakeCalculator::new(dec!(20));
        assert_eq!(calc.stake(dec!(100), RuleId::RuleOne), dec!(20));
    }

    #[test]
    fn test_stake_percent_applies_above_floor() {
        let calc = StakeCalculator::new(dec!(20));
        assert_eq!(calc.stake(dec!(1000), RuleId::RuleOne), dec!(50));
    }

    #[test]
    fn test_stake_truncates_fractional_units() {
        let calc = StakeCalculator::new(dec!(20));
        // 5% of 1234 = 61.70
        assert_eq!(calc.stake(dec!(1234), RuleId::RuleOne), dec!(61));
    }

    #[test]
    fn test_bankroll_commit() {
        let mut bank = Bankroll::new(dec!(100));
        assert!(bank.commit(dec!(20)));
        assert!(bank.commit(dec!(20)));
        assert_eq!(bank.available(), dec!(60));
        assert_eq!(bank.committed(), dec!(40));
        assert_eq!(bank.total(), dec!(100));
    }

    #[test]
    fn test_bankroll_refuses_overdraw() {
        let mut bank = Bankroll::new(dec!(30));
        assert!(bank.commit(dec!(20)));
        assert!(!bank.can_afford(dec!(20)));
        assert!(!bank.commit(dec!(20)));
        assert_eq!(bank.available(), dec!(10));
        assert!(bank.available() >= Decimal::ZERO);
    }
}
