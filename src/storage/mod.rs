//! Persistence layer.
//!
//! Defines the `Store` trait the engine commits wagers through, with a
//! SQLite implementation for production and an in-memory one for tests
//! and dry runs. Calls are awaited one at a time by the sequential
//! stages, so the engine treats them as strongly consistent.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::types::{BankSnapshot, RuleId, Wager};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Durable storage for wagers, the bet-run marker and bank snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Wagers committed to `rule` whose fixture kicks off on `date`,
    /// ascending by kick-off.
    async fn get_by_date(&self, rule: RuleId, date: NaiveDate) -> Result<Vec<Wager>>;

    /// Persist a new wager. Fails if the same fixture is already committed
    /// to the same rule.
    async fn save(&self, wager: &Wager) -> Result<()>;

    /// Overwrite outcome and result of an existing wager.
    async fn update(&self, wager: &Wager) -> Result<()>;

    async fn delete(&self, wager: &Wager) -> Result<()>;

    /// Timestamp of the last completed bet run, `None` if there never was one.
    async fn last_bet_run(&self) -> Result<Option<NaiveDateTime>>;

    async fn save_bet_run(&self, at: NaiveDateTime) -> Result<()>;

    /// Record the balance for a day. The first snapshot of a day is kept.
    async fn save_bank_snapshot(&self, snapshot: &BankSnapshot) -> Result<()>;

    async fn bank_snapshot(&self, date: NaiveDate) -> Result<Option<BankSnapshot>>;

    /// All wagers still lacking a final result.
    async fn get_without_result(&self) -> Result<Vec<Wager>>;

    /// All wagers whose fixture date is within `[from, to]`.
    async fn get_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Wager>>;
}
