//! SQLite-backed store.
//!
//! Schema is created on connect. Decimals are stored as text to keep
//! exact odds and balances; timestamps as `%Y-%m-%d %H:%M:%S` text so
//! that lexical order equals chronological order.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use super::Store;
use crate::types::{BankSnapshot, Fixture, PricePoints, RuleId, Wager};

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Bet-run markers keep sub-second precision; the fraction is omitted when
/// zero, so text order is still time order.
const MARKER_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_WAGER: &str = r#"
    SELECT id, rule, league, league_link, date_time, first_team, second_team,
           first_win, tie, second_win, first_win_or_tie, second_win_or_tie,
           outcome, result
    FROM wagers
"#;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create the schema if needed.
    ///
    /// File databases need `?mode=rwc` in the URL to be created on first
    /// use. An in-memory database lives per connection, so the pool is
    /// pinned to a single connection in that case.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to open database {database_url}"))?;

        let store = Self { pool };
        store.init().await?;
        info!(database_url, "Store ready");
        Ok(store)
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wagers (
                id TEXT PRIMARY KEY,
                rule TEXT NOT NULL,
                league TEXT NOT NULL,
                league_link TEXT NOT NULL,
                date_time TEXT NOT NULL,
                game_date TEXT NOT NULL,
                first_team TEXT NOT NULL,
                second_team TEXT NOT NULL,
                first_win TEXT,
                tie TEXT,
                second_win TEXT,
                first_win_or_tie TEXT,
                second_win_or_tie TEXT,
                outcome TEXT NOT NULL,
                result TEXT NOT NULL,
                UNIQUE (rule, league_link, date_time, first_team, second_team)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create wagers table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS wagers_rule_date ON wagers (rule, game_date)")
            .execute(&self.pool)
            .await
            .context("Failed to create wagers index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bet_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ran_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create bet_runs table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bank_snapshots (
                date TEXT PRIMARY KEY,
                amount TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create bank_snapshots table")?;

        Ok(())
    }

    async fn fetch_wagers<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<Vec<Wager>> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to query wagers")?;
        rows.iter().map(row_to_wager).collect()
    }
}

fn price_text(price: Option<Decimal>) -> Option<String> {
    price.map(|p| p.to_string())
}

fn parse_price(row: &SqliteRow, column: &str) -> Result<Option<Decimal>> {
    let text: Option<String> = row.try_get(column)?;
    text.map(|t| Decimal::from_str(&t).with_context(|| format!("Bad decimal in {column}: {t}")))
        .transpose()
}

fn row_to_wager(row: &SqliteRow) -> Result<Wager> {
    let id: String = row.try_get("id")?;
    let rule: String = row.try_get("rule")?;
    let date_time: String = row.try_get("date_time")?;
    let outcome: String = row.try_get("outcome")?;
    let result: String = row.try_get("result")?;

    Ok(Wager {
        id: Uuid::parse_str(&id).with_context(|| format!("Bad wager id: {id}"))?,
        rule: rule.parse()?,
        fixture: Fixture {
            league: row.try_get("league")?,
            league_link: row.try_get("league_link")?,
            date_time: NaiveDateTime::parse_from_str(&date_time, DATE_TIME_FORMAT)
                .with_context(|| format!("Bad date_time: {date_time}"))?,
            first_team: row.try_get("first_team")?,
            second_team: row.try_get("second_team")?,
            prices: PricePoints {
                first_win: parse_price(row, "first_win")?,
                tie: parse_price(row, "tie")?,
                second_win: parse_price(row, "second_win")?,
                first_win_or_tie: parse_price(row, "first_win_or_tie")?,
                second_win_or_tie: parse_price(row, "second_win_or_tie")?,
            },
        },
        outcome: outcome.parse()?,
        result: result.parse()?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_by_date(&self, rule: RuleId, date: NaiveDate) -> Result<Vec<Wager>> {
        let sql = format!("{SELECT_WAGER} WHERE rule = ? AND game_date = ? ORDER BY date_time");
        self.fetch_wagers(
            sqlx::query(&sql)
                .bind(rule.as_str())
                .bind(date.format(DATE_FORMAT).to_string()),
        )
        .await
    }

    async fn save(&self, wager: &Wager) -> Result<()> {
        let f = &wager.fixture;
        sqlx::query(
            r#"
            INSERT INTO wagers (
                id, rule, league, league_link, date_time, game_date, first_team, second_team,
                first_win, tie, second_win, first_win_or_tie, second_win_or_tie, outcome, result
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(wager.id.to_string())
        .bind(wager.rule.as_str())
        .bind(&f.league)
        .bind(&f.league_link)
        .bind(f.date_time.format(DATE_TIME_FORMAT).to_string())
        .bind(f.date().format(DATE_FORMAT).to_string())
        .bind(&f.first_team)
        .bind(&f.second_team)
        .bind(price_text(f.prices.first_win))
        .bind(price_text(f.prices.tie))
        .bind(price_text(f.prices.second_win))
        .bind(price_text(f.prices.first_win_or_tie))
        .bind(price_text(f.prices.second_win_or_tie))
        .bind(wager.outcome.as_str())
        .bind(wager.result.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save wager {wager}"))?;

        debug!(id = %wager.id, rule = %wager.rule, "Wager saved");
        Ok(())
    }

    async fn update(&self, wager: &Wager) -> Result<()> {
        let done = sqlx::query("UPDATE wagers SET outcome = ?, result = ? WHERE id = ?")
            .bind(wager.outcome.as_str())
            .bind(wager.result.as_str())
            .bind(wager.id.to_string())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update wager {}", wager.id))?;

        if done.rows_affected() == 0 {
            bail!("Wager {} not found", wager.id);
        }
        Ok(())
    }

    async fn delete(&self, wager: &Wager) -> Result<()> {
        sqlx::query("DELETE FROM wagers WHERE id = ?")
            .bind(wager.id.to_string())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete wager {}", wager.id))?;
        debug!(id = %wager.id, rule = %wager.rule, "Wager deleted");
        Ok(())
    }

    async fn last_bet_run(&self) -> Result<Option<NaiveDateTime>> {
        let row = sqlx::query("SELECT MAX(ran_at) AS ran_at FROM bet_runs")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read last bet run")?;
        let ran_at: Option<String> = row.try_get("ran_at")?;
        ran_at
            .map(|t| {
                NaiveDateTime::parse_from_str(&t, MARKER_FORMAT)
                    .with_context(|| format!("Bad bet run timestamp: {t}"))
            })
            .transpose()
    }

    async fn save_bet_run(&self, at: NaiveDateTime) -> Result<()> {
        sqlx::query("INSERT INTO bet_runs (ran_at) VALUES (?)")
            .bind(at.format(MARKER_FORMAT).to_string())
            .execute(&self.pool)
            .await
            .context("Failed to save bet run")?;
        Ok(())
    }

    async fn save_bank_snapshot(&self, snapshot: &BankSnapshot) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO bank_snapshots (date, amount) VALUES (?, ?)")
            .bind(snapshot.date.format(DATE_FORMAT).to_string())
            .bind(snapshot.amount.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to save bank snapshot")?;
        Ok(())
    }

    async fn bank_snapshot(&self, date: NaiveDate) -> Result<Option<BankSnapshot>> {
        let row = sqlx::query("SELECT amount FROM bank_snapshots WHERE date = ?")
            .bind(date.format(DATE_FORMAT).to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read bank snapshot")?;

        row.map(|r| {
            let amount: String = r.try_get("amount")?;
            Ok(BankSnapshot {
                date,
                amount: Decimal::from_str(&amount)
                    .with_context(|| format!("Bad snapshot amount: {amount}"))?,
            })
        })
        .transpose()
    }

    async fn get_without_result(&self) -> Result<Vec<Wager>> {
        let sql = format!("{SELECT_WAGER} WHERE result = 'NO_RESULT' ORDER BY date_time");
        self.fetch_wagers(sqlx::query(&sql)).await
    }

    async fn get_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Wager>> {
        let sql = format!("{SELECT_WAGER} WHERE game_date BETWEEN ? AND ? ORDER BY date_time");
        self.fetch_wagers(
            sqlx::query(&sql)
                .bind(from.format(DATE_FORMAT).to_string())
                .bind(to.format(DATE_FORMAT).to_string()),
        )
        .await
    }
}
