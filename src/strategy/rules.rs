//! Rule definitions.
//!
//! Every rule is a variant of `RuleId` carrying its predicate thresholds,
//! stake percent and backed price point as data. Dispatch is a single
//! `match`; there is no user-defined rule at runtime.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::config::LeagueLists;
use crate::types::{Fixture, PriceIndex, RuleId};

/// Static parameters of a rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleSpec {
    pub id: RuleId,
    /// Share of the day's bankroll staked per wager.
    pub percent: Decimal,
    /// Price point the rule backs.
    pub price_index: PriceIndex,
    pub description: &'static str,
}

/// Inclusive price band.
struct Band {
    min: Decimal,
    max: Decimal,
}

impl Band {
    fn contains(&self, price: Option<Decimal>) -> bool {
        price.map(|p| p >= self.min && p <= self.max).unwrap_or(false)
    }
}

const RULE_ONE_FIRST_WIN: Band = Band {
    min: dec!(1.20),
    max: dec!(1.80),
};
const RULE_ONE_MIN_SECOND_WIN: Decimal = dec!(4.00);

impl RuleId {
    pub fn spec(&self) -> RuleSpec {
        match self {
            RuleId::RuleOne => RuleSpec {
                id: *self,
                percent: dec!(0.05),
                price_index: PriceIndex::FirstWin,
                description: "Home favourite: 1 in [1.20, 1.80] and 2 at 4.00 or longer",
            },
            RuleId::RuleTest => RuleSpec {
                id: *self,
                percent: dec!(0.01),
                price_index: PriceIndex::FirstWin,
                description: "Any fixture where 1 is shorter than 2",
            },
        }
    }

    pub fn percent(&self) -> Decimal {
        self.spec().percent
    }

    pub fn price_index(&self) -> PriceIndex {
        self.spec().price_index
    }

    /// Whether `fixture` belongs in this rule's bucket.
    pub fn matches(&self, fixture: &Fixture, leagues: &LeagueLists) -> bool {
        if leagues.is_excluded(*self, &fixture.league_link) {
            return false;
        }
        let prices = &fixture.prices;
        match self {
            RuleId::RuleOne => {
                RULE_ONE_FIRST_WIN.contains(prices.first_win)
                    && prices
                        .second_win
                        .map(|p| p >= RULE_ONE_MIN_SECOND_WIN)
                        .unwrap_or(false)
            }
            RuleId::RuleTest => match (prices.first_win, prices.second_win) {
                (Some(first), Some(second)) => first < second,
                _ => false,
            },
        }
    }
}
