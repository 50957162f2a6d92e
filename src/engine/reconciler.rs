//! Freeze/commit reconciliation.
//!
//! Merges fresh rule buckets with the wagers already committed to the
//! store, one rule and one day-window at a time. A window whose cutover
//! precedes the last bet run is frozen: its committed wagers are returned
//! untouched and fresh data for that day is ignored. Otherwise the window
//! is live and the store is brought in line with the fresh bucket.

use chrono::{NaiveDate, NaiveTime};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use crate::storage::Store;
use crate::types::{DayWindow, Fixture, FixtureKey, RuleId, RunContext, RunError, Wager};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Committed wagers per rule, ascending by kick-off.
    pub wagers: BTreeMap<RuleId, Vec<Wager>>,
    /// Rule/day windows returned as persisted.
    pub frozen: usize,
    /// Rule/day windows synced from fresh data.
    pub live: usize,
    pub created: usize,
    pub deleted: usize,
}

pub struct Reconciler {
    cutover_time: NaiveTime,
    horizon: u32,
}

impl Reconciler {
    pub fn new(cutover_time: NaiveTime, horizon: u32) -> Self {
        Self {
            cutover_time,
            horizon,
        }
    }

    pub async fn reconcile(
        &self,
        ctx: &RunContext,
        store: &dyn Store,
        buckets: &BTreeMap<RuleId, Vec<Fixture>>,
    ) -> Result<ReconcileReport, RunError> {
        let last_bet_run = store.last_bet_run().await.map_err(RunError::Store)?;
        let today = ctx.today();
        let mut report = ReconcileReport::default();

        for (rule, fresh) in buckets {
            let mut committed = Vec::new();

            for window in DayWindow::all(self.horizon) {
                let date = window.date(today);
                let cutover = window.cutover(today, self.cutover_time);
                let frozen = last_bet_run.map(|at| at > cutover).unwrap_or(false);

                let wagers = if frozen {
                    report.frozen += 1;
                    let persisted = store
                        .get_by_date(*rule, date)
                        .await
                        .map_err(RunError::Store)?;
                    debug!(
                        rule = %rule,
                        date = %date,
                        wagers = persisted.len(),
                        "Window frozen"
                    );
                    persisted
                } else {
                    report.live += 1;
                    self.sync_window(*rule, date, fresh, store, &mut report)
                        .await?
                };
                committed.extend(wagers);
            }

            committed.sort_by_key(|w| w.fixture.date_time);
            report.wagers.insert(*rule, committed);
        }

        info!(
            frozen = report.frozen,
            live = report.live,
            created = report.created,
            deleted = report.deleted,
            "Reconciliation complete"
        );

        Ok(report)
    }

    /// Bring the store in line with the fresh bucket for one live window.
    async fn sync_window(
        &self,
        rule: RuleId,
        date: NaiveDate,
        fresh: &[Fixture],
        store: &dyn Store,
        report: &mut ReconcileReport,
    ) -> Result<Vec<Wager>, RunError> {
        let mut seen = HashSet::new();
        let fresh: Vec<&Fixture> = fresh
            .iter()
            .filter(|f| f.date() == date && seen.insert(f.key()))
            .collect();
        let fresh_keys: HashSet<FixtureKey> = fresh.iter().map(|f| f.key()).collect();

        let persisted = store
            .get_by_date(rule, date)
            .await
            .map_err(RunError::Store)?;

        let mut kept = Vec::with_capacity(persisted.len());
        for wager in persisted {
            if wager.is_decided() || fresh_keys.contains(&wager.fixture.key()) {
                kept.push(wager);
            } else {
                debug!(rule = %rule, wager = %wager, "Dropping stale wager");
                store.delete(&wager).await.map_err(RunError::Store)?;
                report.deleted += 1;
            }
        }

        let kept_keys: HashSet<FixtureKey> = kept.iter().map(|w| w.fixture.key()).collect();
        for fixture in fresh {
            if kept_keys.contains(&fixture.key()) {
                continue;
            }
            let wager = Wager::new(fixture.clone(), rule);
            store.save(&wager).await.map_err(RunError::Store)?;
            debug!(rule = %rule, wager = %wager, "Wager committed");
            report.created += 1;
            kept.push(wager);
        }

        Ok(kept)
    }
}
