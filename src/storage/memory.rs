//! In-memory store.
//!
//! Same contract as the SQLite store, kept in a mutex-guarded vector.
//! Backs the unit and integration test suites.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::Store;
use crate::types::{BankSnapshot, MatchResult, RuleId, Wager};

#[derive(Debug, Default)]
struct State {
    wagers: Vec<Wager>,
    bet_runs: Vec<NaiveDateTime>,
    snapshots: BTreeMap<NaiveDate, BankSnapshot>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }

    /// Copy of every stored wager, ascending by kick-off.
    pub fn wagers(&self) -> Result<Vec<Wager>> {
        let mut wagers = self.lock()?.wagers.clone();
        wagers.sort_by_key(|w| w.fixture.date_time);
        Ok(wagers)
    }

    pub fn bet_runs(&self) -> Result<Vec<NaiveDateTime>> {
        Ok(self.lock()?.bet_runs.clone())
    }
}

fn sorted(mut wagers: Vec<Wager>) -> Vec<Wager> {
    wagers.sort_by_key(|w| w.fixture.date_time);
    wagers
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_by_date(&self, rule: RuleId, date: NaiveDate) -> Result<Vec<Wager>> {
        let state = self.lock()?;
        Ok(sorted(
            state
                .wagers
                .iter()
                .filter(|w| w.rule == rule && w.fixture.date() == date)
                .cloned()
                .collect(),
        ))
    }

    async fn save(&self, wager: &Wager) -> Result<()> {
        let mut state = self.lock()?;
        let key = wager.fixture.key();
        if state
            .wagers
            .iter()
            .any(|w| w.id == wager.id || (w.rule == wager.rule && w.fixture.key() == key))
        {
            bail!("Wager already committed: {wager}");
        }
        state.wagers.push(wager.clone());
        Ok(())
    }

    async fn update(&self, wager: &Wager) -> Result<()> {
        let mut state = self.lock()?;
        let stored = state
            .wagers
            .iter_mut()
            .find(|w| w.id == wager.id)
            .ok_or_else(|| anyhow!("Wager {} not found", wager.id))?;
        stored.outcome = wager.outcome;
        stored.result = wager.result;
        Ok(())
    }

    async fn delete(&self, wager: &Wager) -> Result<()> {
        self.lock()?.wagers.retain(|w| w.id != wager.id);
        Ok(())
    }

    async fn last_bet_run(&self) -> Result<Option<NaiveDateTime>> {
        Ok(self.lock()?.bet_runs.iter().max().copied())
    }

    async fn save_bet_run(&self, at: NaiveDateTime) -> Result<()> {
        self.lock()?.bet_runs.push(at);
        Ok(())
    }

    async fn save_bank_snapshot(&self, snapshot: &BankSnapshot) -> Result<()> {
        self.lock()?
            .snapshots
            .entry(snapshot.date)
            .or_insert_with(|| snapshot.clone());
        Ok(())
    }

    async fn bank_snapshot(&self, date: NaiveDate) -> Result<Option<BankSnapshot>> {
        Ok(self.lock()?.snapshots.get(&date).cloned())
    }

    async fn get_without_result(&self) -> Result<Vec<Wager>> {
        let state = self.lock()?;
        Ok(sorted(
            state
                .wagers
                .iter()
                .filter(|w| w.result == MatchResult::NoResult)
                .cloned()
                .collect(),
        ))
    }

    async fn get_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Wager>> {
        let state = self.lock()?;
        Ok(sorted(
            state
                .wagers
                .iter()
                .filter(|w| {
                    let d = w.fixture.date();
                    d >= from && d <= to
                })
                .cloned()
                .collect(),
        ))
    }
}
