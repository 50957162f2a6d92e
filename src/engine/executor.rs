//! Bet executor.
//!
//! Drives one site session through the betting run:
//!
//! ```text
//! Idle -> SessionOpen -> LoggedIn | VerificationRequired -> RuleLoop -> BetAttempt* -> Done
//! Idle -> NoGamesToBet
//! ```
//!
//! Stakes are sized against the balance observed once at the start of the
//! run. A failed attempt is recorded on the wager and the run moves on;
//! a session fault ends the run without writing the bet-run marker.

use chrono::{Duration, NaiveTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::site::{Credentials, LoginStatus, Scraper, Session, Submission};
use crate::storage::Store;
use crate::strategy::stake::{Bankroll, StakeCalculator};
use crate::types::{BankSnapshot, RuleId, RunContext, RunError, Wager, WagerOutcome};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Why a single bet attempt ended without a placed bet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The fixture or its price element is no longer on the page.
    PricePointNotFound,
    /// The site refused the stake.
    SubmissionRejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetAttempt {
    pub wager_id: Uuid,
    pub rule: RuleId,
    pub stake: Decimal,
    pub outcome: WagerOutcome,
    pub failure: Option<AttemptFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetRunReport {
    pub login: LoginStatus,
    pub total_balance: Decimal,
    pub available_balance: Decimal,
    pub placed: usize,
    pub not_placed: usize,
    /// Eligible wagers left pending because the balance ran out.
    pub skipped: usize,
    pub attempts: Vec<BetAttempt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BetRunOutcome {
    NoGamesToBet,
    Completed(BetRunReport),
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub struct BetExecutor {
    bet_start_time: NaiveTime,
    stakes: StakeCalculator,
    credentials: Credentials,
}

impl BetExecutor {
    pub fn new(bet_start_time: NaiveTime, min_stake: Decimal, credentials: Credentials) -> Self {
        Self {
            bet_start_time,
            stakes: StakeCalculator::new(min_stake),
            credentials,
        }
    }

    /// Whether betting has opened for `wager` at the run's `now`.
    ///
    /// Betting opens the day before kick-off at the configured start time.
    pub fn is_eligible(&self, ctx: &RunContext, wager: &Wager) -> bool {
        let opens = (wager.fixture.date() - Duration::days(1)).and_time(self.bet_start_time);
        wager.outcome == WagerOutcome::Pending && ctx.now > opens
    }

    /// Eligible wagers per rule in declared order, ascending by kick-off.
    fn eligible(
        &self,
        ctx: &RunContext,
        wagers: &BTreeMap<RuleId, Vec<Wager>>,
    ) -> Vec<(RuleId, Vec<Wager>)> {
        RuleId::ALL
            .iter()
            .filter_map(|rule| {
                let mut due: Vec<Wager> = wagers
                    .get(rule)?
                    .iter()
                    .filter(|w| self.is_eligible(ctx, w))
                    .cloned()
                    .collect();
                due.sort_by_key(|w| w.fixture.date_time);
                (!due.is_empty()).then_some((*rule, due))
            })
            .collect()
    }

    pub async fn run(
        &self,
        ctx: &RunContext,
        scraper: &dyn Scraper,
        store: &dyn Store,
        wagers: &BTreeMap<RuleId, Vec<Wager>>,
    ) -> Result<BetRunOutcome, RunError> {
        let plan = self.eligible(ctx, wagers);
        if plan.is_empty() {
            info!("No games to bet");
            return Ok(BetRunOutcome::NoGamesToBet);
        }

        info!(
            rules = plan.len(),
            wagers = plan.iter().map(|(_, w)| w.len()).sum::<usize>(),
            "Starting bet run"
        );

        let mut session = scraper.open_session().await.map_err(RunError::Session)?;

        let result = match self.drive(ctx, session.as_mut(), store, plan).await {
            Ok(report) => store
                .save_bet_run(ctx.now)
                .await
                .map(|_| report)
                .map_err(RunError::Store),
            Err(e) => Err(e),
        };

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close session");
        }

        let report = result?;
        info!(
            placed = report.placed,
            not_placed = report.not_placed,
            skipped = report.skipped,
            total = %report.total_balance,
            available = %report.available_balance,
            "Bet run complete"
        );
        Ok(BetRunOutcome::Completed(report))
    }

    async fn drive(
        &self,
        ctx: &RunContext,
        session: &mut dyn Session,
        store: &dyn Store,
        plan: Vec<(RuleId, Vec<Wager>)>,
    ) -> Result<BetRunReport, RunError> {
        let login = session
            .authenticate(&self.credentials)
            .await
            .map_err(RunError::Session)?;
        if login == LoginStatus::VerificationRequired {
            warn!(login = %self.credentials.login, "Account verification required, continuing");
        }

        let balance = session.balance().await.map_err(RunError::Session)?;
        store
            .save_bank_snapshot(&BankSnapshot {
                date: ctx.today(),
                amount: balance,
            })
            .await
            .map_err(RunError::Store)?;
        info!(balance = %balance, "Balance observed");

        let mut bank = Bankroll::new(balance);
        let mut report = BetRunReport {
            login,
            total_balance: bank.total(),
            available_balance: bank.available(),
            placed: 0,
            not_placed: 0,
            skipped: 0,
            attempts: Vec::new(),
        };

        for (rule, due) in plan {
            let stake = self.stakes.stake(bank.total(), rule);
            let due_count = due.len();
            info!(rule = %rule, wagers = due_count, stake = %stake, "Betting rule");

            for (i, mut wager) in due.into_iter().enumerate() {
                if !bank.can_afford(stake) {
                    let left = due_count - i;
                    report.skipped += left;
                    warn!(
                        rule = %rule,
                        available = %bank.available(),
                        stake = %stake,
                        left,
                        "Insufficient balance, stopping rule"
                    );
                    break;
                }

                debug!(rule = %rule, wager = %wager, stake = %stake, "Attempting bet");
                let failure = self.attempt(session, &wager, stake, &mut bank).await?;
                wager.outcome = match failure {
                    None => WagerOutcome::Placed,
                    Some(_) => WagerOutcome::NotPlaced,
                };
                store.update(&wager).await.map_err(RunError::Store)?;

                match wager.outcome {
                    WagerOutcome::Placed => report.placed += 1,
                    _ => report.not_placed += 1,
                }
                report.attempts.push(BetAttempt {
                    wager_id: wager.id,
                    rule,
                    stake,
                    outcome: wager.outcome,
                    failure,
                });
            }
        }

        report.available_balance = bank.available();
        Ok(report)
    }

    /// One bet attempt. `Ok(None)` means the bet was placed.
    async fn attempt(
        &self,
        session: &mut dyn Session,
        wager: &Wager,
        stake: Decimal,
        bank: &mut Bankroll,
    ) -> Result<Option<AttemptFailure>, RunError> {
        let index = wager.rule.price_index();
        let points = session
            .locate_price_points(&wager.fixture)
            .await
            .map_err(RunError::Session)?;

        let Some(point) = points.into_iter().find(|p| p.index == index) else {
            warn!(wager = %wager, price = %index, "Price point not found");
            return Ok(Some(AttemptFailure::PricePointNotFound));
        };

        match session
            .submit_stake(&point, stake)
            .await
            .map_err(RunError::Session)?
        {
            Submission::Confirmed => {
                bank.commit(stake);
                info!(
                    wager = %wager,
                    price = %index,
                    odds = ?point.price,
                    stake = %stake,
                    available = %bank.available(),
                    "Bet placed"
                );
                Ok(None)
            }
            Submission::Rejected(reason) => {
                warn!(wager = %wager, reason = %reason, "Bet rejected");
                session.dismiss_rejection().await.map_err(RunError::Session)?;
                Ok(Some(AttemptFailure::SubmissionRejected(reason)))
            }
        }
    }
}
