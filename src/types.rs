//! Shared types for the BETBOT pipeline.
//!
//! These types form the data model used across all modules.
//! They are kept free of I/O so that the site, storage, strategy
//! and engine modules can depend on them without circular references.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// The five price points quoted for a football fixture.
///
/// A missing price (the site renders a dash) is `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricePoints {
    pub first_win: Option<Decimal>,
    pub tie: Option<Decimal>,
    pub second_win: Option<Decimal>,
    pub first_win_or_tie: Option<Decimal>,
    pub second_win_or_tie: Option<Decimal>,
}

impl PricePoints {
    pub fn get(&self, index: PriceIndex) -> Option<Decimal> {
        match index {
            PriceIndex::FirstWin => self.first_win,
            PriceIndex::Tie => self.tie,
            PriceIndex::SecondWin => self.second_win,
            PriceIndex::FirstWinOrTie => self.first_win_or_tie,
            PriceIndex::SecondWinOrTie => self.second_win_or_tie,
        }
    }
}

/// Which price point a rule backs.
///
/// The position is the index of the price element inside a fixture row on
/// the live line page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceIndex {
    FirstWin,
    Tie,
    SecondWin,
    FirstWinOrTie,
    SecondWinOrTie,
}

impl PriceIndex {
    pub const ALL: &'static [PriceIndex] = &[
        PriceIndex::FirstWin,
        PriceIndex::Tie,
        PriceIndex::SecondWin,
        PriceIndex::FirstWinOrTie,
        PriceIndex::SecondWinOrTie,
    ];

    pub fn position(&self) -> usize {
        match self {
            PriceIndex::FirstWin => 0,
            PriceIndex::Tie => 1,
            PriceIndex::SecondWin => 2,
            PriceIndex::FirstWinOrTie => 3,
            PriceIndex::SecondWinOrTie => 4,
        }
    }
}

impl fmt::Display for PriceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceIndex::FirstWin => write!(f, "1"),
            PriceIndex::Tie => write!(f, "X"),
            PriceIndex::SecondWin => write!(f, "2"),
            PriceIndex::FirstWinOrTie => write!(f, "1X"),
            PriceIndex::SecondWinOrTie => write!(f, "X2"),
        }
    }
}

/// A scheduled football fixture with its quoted prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub league: String,
    /// Path of the league page relative to the site's football line.
    pub league_link: String,
    /// Kick-off in site-local time.
    pub date_time: NaiveDateTime,
    pub first_team: String,
    pub second_team: String,
    pub prices: PricePoints,
}

/// Identity of a fixture independent of its (volatile) prices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureKey {
    pub league_link: String,
    pub date_time: NaiveDateTime,
    pub first_team: String,
    pub second_team: String,
}

impl Fixture {
    pub fn key(&self) -> FixtureKey {
        FixtureKey {
            league_link: self.league_link.clone(),
            date_time: self.date_time,
            first_team: self.first_team.clone(),
            second_team: self.second_team.clone(),
        }
    }

    /// Calendar day of kick-off.
    pub fn date(&self) -> NaiveDate {
        self.date_time.date()
    }

    /// Helper to build a test fixture with sensible defaults.
    #[cfg(test)]
    pub fn sample(first_team: &str, second_team: &str, date_time: NaiveDateTime) -> Self {
        use rust_decimal_macros::dec;
        Fixture {
            league: "Spain. La Liga".to_string(),
            league_link: "118593-spain-la-liga".to_string(),
            date_time,
            first_team: first_team.to_string(),
            second_team: second_team.to_string(),
            prices: PricePoints {
                first_win: Some(dec!(1.55)),
                tie: Some(dec!(4.10)),
                second_win: Some(dec!(5.80)),
                first_win_or_tie: Some(dec!(1.14)),
                second_win_or_tie: Some(dec!(2.45)),
            },
        }
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {} ({})",
            self.date_time.format("%d.%m %H:%M"),
            self.first_team,
            self.second_team,
            self.league,
        )
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The fixed set of wagering rules. Behaviour per rule lives in
/// `strategy::rules`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    RuleOne,
    RuleTest,
}

impl RuleId {
    /// All rules in declared (betting) order.
    pub const ALL: &'static [RuleId] = &[RuleId::RuleOne, RuleId::RuleTest];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::RuleOne => "RULE_ONE",
            RuleId::RuleTest => "RULE_TEST",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RULE_ONE" | "FIRST_RULE" => Ok(RuleId::RuleOne),
            "RULE_TEST" | "TEST_RULE" => Ok(RuleId::RuleTest),
            _ => Err(anyhow::anyhow!("Unknown rule: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Wager
// ---------------------------------------------------------------------------

/// Whether a bet was attempted for a wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WagerOutcome {
    Pending,
    Placed,
    NotPlaced,
}

impl WagerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WagerOutcome::Pending => "PENDING",
            WagerOutcome::Placed => "PLACED",
            WagerOutcome::NotPlaced => "NOT_PLACED",
        }
    }
}

impl std::str::FromStr for WagerOutcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(WagerOutcome::Pending),
            "PLACED" => Ok(WagerOutcome::Placed),
            "NOT_PLACED" => Ok(WagerOutcome::NotPlaced),
            _ => Err(anyhow::anyhow!("Unknown wager outcome: {s}")),
        }
    }
}

/// Final result of the fixture a wager refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchResult {
    NoResult,
    FirstWin,
    Tie,
    SecondWin,
}

impl MatchResult {
    pub fn from_score(first_goals: u32, second_goals: u32) -> Self {
        match first_goals.cmp(&second_goals) {
            std::cmp::Ordering::Greater => MatchResult::FirstWin,
            std::cmp::Ordering::Equal => MatchResult::Tie,
            std::cmp::Ordering::Less => MatchResult::SecondWin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchResult::NoResult => "NO_RESULT",
            MatchResult::FirstWin => "FIRST_WIN",
            MatchResult::Tie => "TIE",
            MatchResult::SecondWin => "SECOND_WIN",
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MatchResult {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NO_RESULT" => Ok(MatchResult::NoResult),
            "FIRST_WIN" => Ok(MatchResult::FirstWin),
            "TIE" => Ok(MatchResult::Tie),
            "SECOND_WIN" => Ok(MatchResult::SecondWin),
            _ => Err(anyhow::anyhow!("Unknown match result: {s}")),
        }
    }
}

/// A fixture committed to a rule bucket, with its betting outcome and
/// eventual result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wager {
    pub id: Uuid,
    pub rule: RuleId,
    pub fixture: Fixture,
    pub outcome: WagerOutcome,
    pub result: MatchResult,
}

impl Wager {
    /// A freshly committed wager: pending, no result.
    pub fn new(fixture: Fixture, rule: RuleId) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule,
            fixture,
            outcome: WagerOutcome::Pending,
            result: MatchResult::NoResult,
        }
    }

    /// Whether the bet executor already decided this wager.
    pub fn is_decided(&self) -> bool {
        self.outcome != WagerOutcome::Pending
    }
}

impl fmt::Display for Wager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {}",
            self.rule,
            self.fixture,
            self.outcome.as_str(),
            self.result,
        )
    }
}

/// Balance observed at the start of a bet run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub date: NaiveDate,
    pub amount: Decimal,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Relative calendar day: 0 = today, 1 = tomorrow, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayWindow(pub u32);

impl DayWindow {
    /// Windows 0..horizon.
    pub fn all(horizon: u32) -> impl Iterator<Item = DayWindow> {
        (0..horizon).map(DayWindow)
    }

    pub fn date(&self, today: NaiveDate) -> NaiveDate {
        today + Duration::days(i64::from(self.0))
    }

    /// Instant after which a bet run is assumed to have committed this
    /// window: the day before at `cutover_time`.
    pub fn cutover(&self, today: NaiveDate, cutover_time: NaiveTime) -> NaiveDateTime {
        (self.date(today) - Duration::days(1)).and_time(cutover_time)
    }
}

/// Values scoped to a single pipeline run, threaded through each stage.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub now: NaiveDateTime,
}

impl RunContext {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Context stamped with the local wall clock.
    pub fn local() -> Self {
        Self::new(Local::now().naive_local())
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Fatal run errors. Anything recoverable is absorbed per wager and
/// recorded in the stage report instead.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Fetch failure: {0:#}")]
    Fetch(anyhow::Error),

    #[error("Store failure: {0:#}")]
    Store(anyhow::Error),

    #[error("Session fault: {0:#}")]
    Session(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
