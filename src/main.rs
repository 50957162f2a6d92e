//! BETBOT: rule-driven football wagering bot
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the store and the site adapter, and runs one stage of the
//! pipeline per invocation (scheduling is left to cron or a timer).

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use betbot::config::{self, LeagueLists};
use betbot::dashboard::{self, DashboardState};
use betbot::engine::executor::{BetExecutor, BetRunOutcome};
use betbot::engine::pipeline::Pipeline;
use betbot::engine::results::{ResultMatcher, ScanOutcome};
use betbot::engine::stats;
use betbot::site::{Credentials, WebDriverSite};
use betbot::storage::{SqliteStore, Store};
use betbot::types::{RuleId, RunContext};

const BANNER: &str = r#"
 ____  _____ _____ ____   ___ _____
| __ )| ____|_   _| __ ) / _ \_   _|
|  _ \|  _|   | | |  _ \| | | || |
| |_) | |___  | | | |_) | |_| || |
|____/|_____| |_| |____/ \___/ |_|

  Rule-driven football wagering
  v0.1.0
"#;

/// BETBOT - collect, classify, commit and bet football fixtures.
#[derive(Parser, Debug)]
#[command(name = "betbot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Skip ASCII art banner
    #[arg(long, global = true)]
    no_banner: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect, classify, commit and place due bets
    Run,

    /// Collect, classify and commit without betting
    Classify,

    /// Match finished fixtures against committed wagers
    Results,

    /// Print result statistics for a date range
    Stats(StatsArgs),

    /// Serve the read-only reporting API
    Serve,
}

#[derive(Parser, Debug)]
struct StatsArgs {
    /// First day of the range (YYYY-MM-DD), defaults to 30 days before `to`
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD), defaults to today
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Scan for results before counting
    #[arg(long)]
    scan: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let path = cli.config.to_string_lossy().to_string();
    let cfg = config::AppConfig::load(&path)?;

    init_logging();

    if !cli.no_banner {
        println!("{BANNER}");
    }
    info!(
        bot_name = %cfg.bot.name,
        horizon_days = cfg.bot.horizon_days,
        cutover = %cfg.bot.cutover_time,
        bet_start = %cfg.bot.bet_start_time,
        "BETBOT starting up"
    );

    let leagues = LeagueLists::load(&cfg.leagues)?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::connect(&cfg.storage.database_url).await?);
    let ctx = RunContext::local();

    match cli.command {
        Commands::Run => {
            let site = WebDriverSite::new(&cfg.site, &ctx)?;
            let executor = bet_executor(&cfg)?;
            let pipeline = Pipeline::new(&cfg.bot, leagues)?;
            let report = pipeline.run(&ctx, &site, store.as_ref(), &executor).await?;
            match report.bets {
                BetRunOutcome::NoGamesToBet => info!(
                    fixtures = report.fixtures,
                    created = report.reconcile.created,
                    "Committed, no games to bet yet"
                ),
                BetRunOutcome::Completed(bets) => info!(
                    fixtures = report.fixtures,
                    placed = bets.placed,
                    not_placed = bets.not_placed,
                    skipped = bets.skipped,
                    available = %bets.available_balance,
                    "Run complete"
                ),
            }
        }
        Commands::Classify => {
            let site = WebDriverSite::new(&cfg.site, &ctx)?;
            let pipeline = Pipeline::new(&cfg.bot, leagues)?;
            let (fixtures, report) = pipeline.commit(&ctx, &site, store.as_ref()).await?;
            for (rule, wagers) in &report.wagers {
                info!(rule = %rule, wagers = wagers.len(), "Committed bucket");
            }
            info!(fixtures, created = report.created, deleted = report.deleted, "Classify complete");
        }
        Commands::Results => {
            let site = WebDriverSite::new(&cfg.site, &ctx)?;
            scan_results(&cfg, &ctx, &site, store.as_ref()).await?;
        }
        Commands::Stats(args) => {
            if args.scan {
                let site = WebDriverSite::new(&cfg.site, &ctx)?;
                scan_results(&cfg, &ctx, &site, store.as_ref()).await?;
            }
            let to = args.to.unwrap_or_else(|| ctx.today());
            let from = args.from.unwrap_or(to - Duration::days(30));
            if from > to {
                anyhow::bail!("--from {from} is after --to {to}");
            }
            let wagers = store.get_between(from, to).await?;
            for (rule, report) in stats::aggregate_by_rule(&wagers, from, to, &leagues.included) {
                report.log(rule.as_str());
            }
        }
        Commands::Serve => {
            if !cfg.dashboard.enabled {
                warn!("Reporting API disabled in config (dashboard.enabled = false)");
                return Ok(());
            }
            let state = Arc::new(DashboardState::new(store.clone(), leagues));
            dashboard::serve(state, cfg.dashboard.port).await?;
        }
    }

    Ok(())
}

fn bet_executor(cfg: &config::AppConfig) -> Result<BetExecutor> {
    let credentials = Credentials {
        login: config::AppConfig::resolve_env(&cfg.site.login_env)?,
        password: SecretString::new(config::AppConfig::resolve_env(&cfg.site.password_env)?),
    };
    let bet_start = cfg.bot.bet_start_time().context("Invalid bet start time")?;
    Ok(BetExecutor::new(bet_start, cfg.bot.min_stake, credentials))
}

async fn scan_results(
    cfg: &config::AppConfig,
    ctx: &RunContext,
    site: &WebDriverSite,
    store: &dyn Store,
) -> Result<()> {
    let matcher = ResultMatcher::new(cfg.bot.result_delay_hours);
    match matcher.run(ctx, site, store).await? {
        ScanOutcome::NothingToScan => info!("No finished fixtures awaiting results"),
        ScanOutcome::Scanned(report) => info!(
            days = report.days,
            matched = report.matched,
            unmatched = report.unmatched,
            "Results updated"
        ),
    }
    let pending = store.get_without_result().await?;
    for rule in RuleId::ALL {
        let count = pending.iter().filter(|w| w.rule == *rule).count();
        info!(rule = %rule, pending = count, "Wagers awaiting a result");
    }
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("betbot=info"));

    let json_logging = std::env::var("BETBOT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
