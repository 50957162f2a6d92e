//! Result matcher.
//!
//! Second pass over committed wagers: once a fixture is old enough to be
//! finished, the completed-results listing for its day is scraped and each
//! row is matched back to a wager by date and team-name prefix. The site
//! often decorates team names in the results listing ("Real Madrid B" for
//! a line entry of "Real Madrid"), hence prefixes rather than equality.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::site::{CompletedRow, Scraper, Session};
use crate::storage::Store;
use crate::types::{MatchResult, RunContext, RunError, Wager};

/// Markers in the first team text of rows that are not the main fixture:
/// aggregate goal markets, amateur duplicates and `/`-joined pairs.
const SKIP_TEAM_MARKERS: &[&str] = &["(голы)", "(люб)", "(goals)", "(amateur)", "/"];

/// Score cells carrying a goal-market label instead of a score.
const SKIP_SCORE_MARKERS: &[&str] = &["Голы", "Goals"];

const TEAM_SEPARATOR: &str = " - ";

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

/// A completed row reduced to what matching needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub date: NaiveDate,
    pub first_team: String,
    pub second_team: String,
    pub first_goals: u32,
    pub second_goals: u32,
}

impl ParsedRow {
    pub fn result(&self) -> MatchResult {
        MatchResult::from_score(self.first_goals, self.second_goals)
    }

    /// Same day, and both stored team names are prefixes of the listed ones.
    pub fn matches(&self, wager: &Wager) -> bool {
        wager.fixture.date() == self.date
            && self.first_team.starts_with(wager.fixture.first_team.as_str())
            && self.second_team.starts_with(wager.fixture.second_team.as_str())
    }
}

/// Parse a score cell: `"2 : 2 (1:1)"` -> `(2, 2)`.
///
/// Spaces are dropped, anything from the first `(` on is ignored.
pub fn parse_score(score: &str) -> Option<(u32, u32)> {
    if SKIP_SCORE_MARKERS.iter().any(|m| score.contains(m)) {
        return None;
    }
    let compact: String = score.chars().filter(|c| !c.is_whitespace()).collect();
    let full_time = compact.split('(').next()?;
    let (first, second) = full_time.split_once(':')?;
    Some((first.parse().ok()?, second.parse().ok()?))
}

/// Parse a completed row, `None` for rows that must be skipped.
pub fn parse_row(row: &CompletedRow) -> Option<ParsedRow> {
    let mut teams = row.teams.split(TEAM_SEPARATOR);
    let first_team = teams.next()?.trim();
    let second_team = teams.next()?.trim();
    if first_team.is_empty() || second_team.is_empty() {
        return None;
    }
    if SKIP_TEAM_MARKERS.iter().any(|m| first_team.contains(m)) {
        return None;
    }
    let (first_goals, second_goals) = parse_score(&row.score)?;

    Some(ParsedRow {
        date: row.date_time.date(),
        first_team: first_team.to_string(),
        second_team: second_team.to_string(),
        first_goals,
        second_goals,
    })
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub days: usize,
    pub rows: usize,
    pub matched: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    NothingToScan,
    Scanned(ScanReport),
}

pub struct ResultMatcher {
    delay: Duration,
}

impl ResultMatcher {
    /// `delay_hours`: how long after kick-off a fixture counts as finished.
    pub fn new(delay_hours: i64) -> Self {
        Self {
            delay: Duration::hours(delay_hours),
        }
    }

    /// Wagers without a result whose fixture should be over, by day.
    async fn due(
        &self,
        ctx: &RunContext,
        store: &dyn Store,
    ) -> Result<BTreeMap<NaiveDate, Vec<Wager>>, RunError> {
        let threshold = ctx.now - self.delay;
        let mut by_day: BTreeMap<NaiveDate, Vec<Wager>> = BTreeMap::new();
        for wager in store.get_without_result().await.map_err(RunError::Store)? {
            if wager.result == MatchResult::NoResult && wager.fixture.date_time < threshold {
                by_day.entry(wager.fixture.date()).or_default().push(wager);
            }
        }
        for wagers in by_day.values_mut() {
            wagers.sort_by_key(|w| w.fixture.date_time);
        }
        Ok(by_day)
    }

    pub async fn run(
        &self,
        ctx: &RunContext,
        scraper: &dyn Scraper,
        store: &dyn Store,
    ) -> Result<ScanOutcome, RunError> {
        let by_day = self.due(ctx, store).await?;
        if by_day.is_empty() {
            info!("Nothing to scan");
            return Ok(ScanOutcome::NothingToScan);
        }
        info!(
            days = by_day.len(),
            wagers = by_day.values().map(Vec::len).sum::<usize>(),
            "Scanning results"
        );

        let mut session = scraper.open_session().await.map_err(RunError::Session)?;
        let result = self.scan(session.as_mut(), store, by_day).await;
        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close session");
        }

        let report = result?;
        info!(
            matched = report.matched,
            unmatched = report.unmatched,
            rows = report.rows,
            "Result scan complete"
        );
        Ok(ScanOutcome::Scanned(report))
    }

    async fn scan(
        &self,
        session: &mut dyn Session,
        store: &dyn Store,
        by_day: BTreeMap<NaiveDate, Vec<Wager>>,
    ) -> Result<ScanReport, RunError> {
        let mut report = ScanReport::default();

        for (date, mut unmatched) in by_day {
            report.days += 1;
            let rows = session
                .fetch_completed(date)
                .await
                .map_err(RunError::Session)?;
            debug!(date = %date, rows = rows.len(), pending = unmatched.len(), "Results fetched");

            for row in &rows {
                if unmatched.is_empty() {
                    break;
                }
                report.rows += 1;
                let Some(parsed) = parse_row(row) else {
                    debug!(teams = %row.teams, score = %row.score, "Row skipped");
                    continue;
                };
                // First matching wager picks the fixture; every rule's
                // wager on that fixture takes the result.
                let Some(key) = unmatched
                    .iter()
                    .find(|w| parsed.matches(w))
                    .map(|w| w.fixture.key())
                else {
                    continue;
                };
                let (settled, rest): (Vec<Wager>, Vec<Wager>) = unmatched
                    .into_iter()
                    .partition(|w| w.fixture.key() == key);
                unmatched = rest;

                for mut wager in settled {
                    wager.result = parsed.result();
                    store.update(&wager).await.map_err(RunError::Store)?;
                    report.matched += 1;
                    info!(
                        wager = %wager,
                        listed = %row.teams,
                        score = %row.score,
                        "Result matched"
                    );
                }
            }

            for wager in &unmatched {
                debug!(wager = %wager, "No result found");
            }
            report.unmatched += unmatched.len();
        }

        Ok(report)
    }
}
