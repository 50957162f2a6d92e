//! Result statistics over a date range.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::types::{MatchResult, RuleId, Wager};

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultCounts {
    pub total: usize,
    pub first_win: usize,
    pub tie: usize,
    pub second_win: usize,
    pub no_result: usize,
}

impl ResultCounts {
    fn add(&mut self, result: MatchResult) {
        self.total += 1;
        match result {
            MatchResult::FirstWin => self.first_win += 1,
            MatchResult::Tie => self.tie += 1,
            MatchResult::SecondWin => self.second_win += 1,
            MatchResult::NoResult => self.no_result += 1,
        }
    }

    /// Count of a single result.
    pub fn get(&self, result: MatchResult) -> usize {
        match result {
            MatchResult::FirstWin => self.first_win,
            MatchResult::Tie => self.tie,
            MatchResult::SecondWin => self.second_win,
            MatchResult::NoResult => self.no_result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Every wager in the range.
    pub period: ResultCounts,
    /// Wagers in the range on an included league.
    pub included: ResultCounts,
}

impl StatsReport {
    pub fn log(&self, label: &str) {
        for (scope, counts) in [("period", &self.period), ("included", &self.included)] {
            info!(
                label,
                scope,
                from = %self.from,
                to = %self.to,
                total = counts.total,
                first_win = counts.first_win,
                tie = counts.tie,
                second_win = counts.second_win,
                no_result = counts.no_result,
                "Result statistics"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Count results of wagers whose fixture date lies in `[from, to]`.
pub fn aggregate<'a>(
    wagers: impl IntoIterator<Item = &'a Wager>,
    from: NaiveDate,
    to: NaiveDate,
    included_leagues: &[String],
) -> StatsReport {
    let mut report = StatsReport {
        from,
        to,
        period: ResultCounts::default(),
        included: ResultCounts::default(),
    };

    for wager in wagers {
        let date = wager.fixture.date();
        if date < from || date > to {
            continue;
        }
        report.period.add(wager.result);
        if included_leagues.contains(&wager.fixture.league_link) {
            report.included.add(wager.result);
        }
    }

    report
}

/// `aggregate` split by rule. Every rule gets an entry.
pub fn aggregate_by_rule(
    wagers: &[Wager],
    from: NaiveDate,
    to: NaiveDate,
    included_leagues: &[String],
) -> BTreeMap<RuleId, StatsReport> {
    RuleId::ALL
        .iter()
        .map(|rule| {
            let report = aggregate(
                wagers.iter().filter(|w| w.rule == *rule),
                from,
                to,
                included_leagues,
            );
            (*rule, report)
        })
        .collect()
}
