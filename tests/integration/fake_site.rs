//! Fake betting site for integration testing.
//!
//! Provides a deterministic `Scraper` whose sessions bet against an
//! in-memory balance and serve a scripted results listing. All state is
//! shared behind `Arc<Mutex<_>>` so tests can change the line between
//! runs and inspect what the bot did.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use betbot::site::{
    CompletedRow, Credentials, LoginStatus, PricePoint, Scraper, Session, Submission,
};
use betbot::types::{Fixture, PriceIndex, PricePoints};

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

/// A fixture with explicit 1 / X / 2 prices.
pub fn fixture(league: &str, kick_off: &str, teams: (&str, &str), prices: (f64, f64, f64)) -> Fixture {
    let price = |p: f64| Decimal::try_from(p).ok();
    Fixture {
        league: league.to_string(),
        league_link: league.to_lowercase().replace(' ', "-"),
        date_time: at(kick_off),
        first_team: teams.0.to_string(),
        second_team: teams.1.to_string(),
        prices: PricePoints {
            first_win: price(prices.0),
            tie: price(prices.1),
            second_win: price(prices.2),
            first_win_or_tie: None,
            second_win_or_tie: None,
        },
    }
}

#[derive(Debug, Default)]
pub struct SiteState {
    /// Fixtures listed per league link.
    pub line: HashMap<String, Vec<Fixture>>,
    /// League links whose page fails to load.
    pub broken_leagues: HashSet<String>,
    pub balance: Decimal,
    pub verification: bool,
    /// First-team names whose bets the site refuses.
    pub refuse: HashSet<String>,
    /// Completed results listing.
    pub completed: Vec<CompletedRow>,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub bets: Vec<(String, PriceIndex, Decimal)>,
}

#[derive(Clone, Default)]
pub struct FakeSite {
    pub state: Arc<Mutex<SiteState>>,
}

impl FakeSite {
    pub fn new(balance: Decimal) -> Self {
        let site = Self::default();
        site.state.lock().unwrap().balance = balance;
        site
    }

    /// Replace the listed line with `fixtures`.
    pub fn list(&self, fixtures: Vec<Fixture>) {
        let mut state = self.state.lock().unwrap();
        state.line.clear();
        for f in fixtures {
            state.line.entry(f.league_link.clone()).or_default().push(f);
        }
    }

    pub fn complete(&self, kick_off: &str, teams: &str, score: &str) {
        self.state.lock().unwrap().completed.push(CompletedRow {
            date_time: at(kick_off),
            teams: teams.to_string(),
            score: score.to_string(),
        });
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, SiteState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Scraper for FakeSite {
    async fn fetch_league_links(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let mut links: Vec<String> = state
            .line
            .keys()
            .chain(state.broken_leagues.iter())
            .cloned()
            .collect();
        links.sort();
        Ok(links)
    }

    async fn fetch_fixtures(&self, league_link: &str) -> Result<Vec<Fixture>> {
        let state = self.state.lock().unwrap();
        if state.broken_leagues.contains(league_link) {
            return Err(anyhow!("league page {league_link} timed out"));
        }
        Ok(state.line.get(league_link).cloned().unwrap_or_default())
    }

    async fn open_session(&self) -> Result<Box<dyn Session>> {
        self.state.lock().unwrap().sessions_opened += 1;
        Ok(Box::new(FakeSession {
            state: self.state.clone(),
        }))
    }
}

struct FakeSession {
    state: Arc<Mutex<SiteState>>,
}

#[async_trait]
impl Session for FakeSession {
    async fn authenticate(&mut self, credentials: &Credentials) -> Result<LoginStatus> {
        if credentials.login.is_empty() {
            return Err(anyhow!("login form rejected empty login"));
        }
        Ok(if self.state.lock().unwrap().verification {
            LoginStatus::VerificationRequired
        } else {
            LoginStatus::LoggedIn
        })
    }

    async fn balance(&mut self) -> Result<Decimal> {
        Ok(self.state.lock().unwrap().balance)
    }

    async fn locate_price_points(&mut self, fixture: &Fixture) -> Result<Vec<PricePoint>> {
        let state = self.state.lock().unwrap();
        let listed = state
            .line
            .get(&fixture.league_link)
            .and_then(|fs| fs.iter().find(|f| f.key() == fixture.key()));
        Ok(match listed {
            Some(f) => PriceIndex::ALL
                .iter()
                .map(|index| PricePoint {
                    index: *index,
                    element: f.first_team.clone(),
                    price: f.prices.get(*index),
                })
                .collect(),
            None => Vec::new(),
        })
    }

    async fn submit_stake(&mut self, point: &PricePoint, amount: Decimal) -> Result<Submission> {
        let mut state = self.state.lock().unwrap();
        if state.refuse.contains(&point.element) {
            return Ok(Submission::Rejected("Odds have changed".into()));
        }
        if amount > state.balance {
            return Ok(Submission::Rejected("Insufficient funds".into()));
        }
        state.balance -= amount;
        state.bets.push((point.element.clone(), point.index, amount));
        Ok(Submission::Confirmed)
    }

    async fn dismiss_rejection(&mut self) -> Result<()> {
        Ok(())
    }

    async fn fetch_completed(&mut self, date: NaiveDate) -> Result<Vec<CompletedRow>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .completed
            .iter()
            .filter(|r| r.date_time.date() == date)
            .cloned()
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().unwrap().sessions_closed += 1;
        Ok(())
    }
}
