//! Stage wiring for one invocation.
//!
//! `commit` runs collect -> classify -> reconcile; `run` continues into
//! the bet executor with the reconciled buckets.

use tracing::info;

use super::collector;
use super::executor::{BetExecutor, BetRunOutcome};
use super::reconciler::{ReconcileReport, Reconciler};
use crate::config::{BotConfig, LeagueLists};
use crate::site::Scraper;
use crate::storage::Store;
use crate::strategy;
use crate::types::{RuleId, RunContext, RunError};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub fixtures: usize,
    pub reconcile: ReconcileReport,
    pub bets: BetRunOutcome,
}

pub struct Pipeline {
    workers: usize,
    leagues: LeagueLists,
    reconciler: Reconciler,
}

impl Pipeline {
    pub fn new(bot: &BotConfig, leagues: LeagueLists) -> Result<Self, RunError> {
        let cutover = bot
            .cutover_time()
            .map_err(|e| RunError::Config(format!("{e:#}")))?;
        Ok(Self {
            workers: bot.collector_workers,
            leagues,
            reconciler: Reconciler::new(cutover, bot.horizon_days),
        })
    }

    /// Collect, classify and reconcile. Returns the committed buckets and
    /// the number of fixtures collected.
    pub async fn commit(
        &self,
        ctx: &RunContext,
        scraper: &dyn Scraper,
        store: &dyn Store,
    ) -> Result<(usize, ReconcileReport), RunError> {
        let fixtures = collector::collect(scraper, self.workers).await?;
        let buckets = strategy::classify(&fixtures, RuleId::ALL, &self.leagues);
        let report = self.reconciler.reconcile(ctx, store, &buckets).await?;
        Ok((fixtures.len(), report))
    }

    pub async fn run(
        &self,
        ctx: &RunContext,
        scraper: &dyn Scraper,
        store: &dyn Store,
        executor: &BetExecutor,
    ) -> Result<PipelineReport, RunError> {
        info!(now = %ctx.now, "Pipeline starting");
        let (fixtures, reconcile) = self.commit(ctx, scraper, store).await?;
        let bets = executor.run(ctx, scraper, store, &reconcile.wagers).await?;
        Ok(PipelineReport {
            fixtures,
            reconcile,
            bets,
        })
    }
}
