//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Site credentials are referenced by env-var name in the config and
//! resolved at runtime. League inclusion/exclusion lists are plain text
//! files (one league link per line) loaded once at start-up.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::RuleId;

/// Format used for wall-clock settings such as `cutover_time`.
const TIME_FORMAT: &str = "%H:%M";

/// Upper bound for `result_delay_hours` (one week).
const MAX_RESULT_DELAY_HOURS: i64 = 24 * 7;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub site: SiteConfig,
    pub leagues: LeaguesConfig,
    pub storage: StorageConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub name: String,
    /// Number of day-windows reconciled (2 = today and tomorrow).
    pub horizon_days: u32,
    /// Wall-clock time on the day before a window after which a bet run
    /// freezes that window.
    pub cutover_time: String,
    /// Wall-clock time on the day before kick-off from which a wager may
    /// be bet.
    pub bet_start_time: String,
    /// Floor for a single stake.
    pub min_stake: Decimal,
    /// Width of the collector worker pool.
    #[serde(default = "default_collector_workers")]
    pub collector_workers: usize,
    /// Hours after kick-off before a fixture is assumed finished.
    pub result_delay_hours: i64,
}

impl BotConfig {
    pub fn cutover_time(&self) -> Result<NaiveTime> {
        parse_time(&self.cutover_time).context("Invalid bot.cutover_time")
    }

    pub fn bet_start_time(&self) -> Result<NaiveTime> {
        parse_time(&self.bet_start_time).context("Invalid bot.bet_start_time")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    /// WebDriver endpoint (chromedriver, selenium grid, ...).
    pub webdriver_url: String,
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Bounded wait for an expected page element.
    pub wait_timeout_secs: u64,
    pub login_env: String,
    pub password_env: String,
}

fn default_collector_workers() -> usize {
    crate::engine::collector::DEFAULT_WORKERS
}

fn default_headless() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct LeaguesConfig {
    /// Leagues counted in the "included" statistics slice.
    pub included: PathBuf,
    /// Per-rule league exclusion lists.
    #[serde(default)]
    pub exclusions: HashMap<RuleId, PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub database_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.bot.cutover_time()?;
        config.bot.bet_start_time()?;
        if config.bot.collector_workers == 0 {
            anyhow::bail!("bot.collector_workers must be at least 1");
        }
        if config.bot.horizon_days == 0 {
            anyhow::bail!("bot.horizon_days must be at least 1");
        }
        if !(0..=MAX_RESULT_DELAY_HOURS).contains(&config.bot.result_delay_hours) {
            anyhow::bail!(
                "bot.result_delay_hours must be within 0..={MAX_RESULT_DELAY_HOURS}, got {}",
                config.bot.result_delay_hours
            );
        }
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .with_context(|| format!("Expected HH:MM, got {value:?}"))
}

// ---------------------------------------------------------------------------
// League lists
// ---------------------------------------------------------------------------

/// League link lists, read once and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct LeagueLists {
    pub included: Vec<String>,
    exclusions: HashMap<RuleId, HashSet<String>>,
}

impl LeagueLists {
    pub fn new(included: Vec<String>, exclusions: HashMap<RuleId, HashSet<String>>) -> Self {
        Self { included, exclusions }
    }

    pub fn load(cfg: &LeaguesConfig) -> Result<Self> {
        let included = read_links(&cfg.included)?;
        let mut exclusions = HashMap::new();
        for (rule, path) in &cfg.exclusions {
            let links = read_links(path)?;
            exclusions.insert(*rule, links.into_iter().collect());
        }
        Ok(Self { included, exclusions })
    }

    /// Whether `league_link` is excluded for `rule`.
    pub fn is_excluded(&self, rule: RuleId, league_link: &str) -> bool {
        self.exclusions
            .get(&rule)
            .map(|set| set.contains(league_link))
            .unwrap_or(false)
    }

    pub fn exclusion_count(&self, rule: RuleId) -> usize {
        self.exclusions.get(&rule).map(HashSet::len).unwrap_or(0)
    }
}

/// Read one league link per line; blank lines and `#` comments are skipped.
fn read_links(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read league list: {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect())
}
