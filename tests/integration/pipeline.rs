//! Multi-day pipeline simulation against the fake site.

use std::collections::HashMap;

use rust_decimal_macros::dec;
use secrecy::SecretString;

use betbot::config::{BotConfig, LeagueLists};
use betbot::engine::executor::{BetExecutor, BetRunOutcome};
use betbot::engine::pipeline::Pipeline;
use betbot::storage::MemoryStore;
use betbot::site::Credentials;
use betbot::types::{RuleId, RunContext, RunError, WagerOutcome};

use crate::fake_site::{at, fixture, FakeSite};

pub fn bot_config() -> BotConfig {
    BotConfig {
        name: "betbot-test".to_string(),
        horizon_days: 2,
        cutover_time: "22:59".to_string(),
        bet_start_time: "23:00".to_string(),
        min_stake: dec!(20),
        collector_workers: 4,
        result_delay_hours: 3,
    }
}

pub fn executor() -> BetExecutor {
    BetExecutor::new(
        bot_config().bet_start_time().unwrap(),
        dec!(20),
        Credentials {
            login: "player".to_string(),
            password: SecretString::new("hunter2".to_string()),
        },
    )
}

pub fn pipeline() -> Pipeline {
    Pipeline::new(&bot_config(), LeagueLists::default()).unwrap()
}

/// Line as listed on 2026-10-19.
pub fn opening_line(site: &FakeSite) {
    site.list(vec![
        // 1 in band, 2 long: both rules.
        fixture("Spain La Liga", "2026-10-19 21:00", ("Sevilla", "Getafe"), (1.50, 4.00, 6.00)),
        fixture("Spain La Liga", "2026-10-20 19:00", ("Betis", "Cadiz"), (1.70, 3.60, 4.80)),
        // 1 shorter than 2 only.
        fixture("Italy Serie A", "2026-10-20 20:45", ("Lazio", "Roma"), (2.40, 3.20, 2.90)),
        // Away favourite: no rule.
        fixture("France Ligue 1", "2026-10-19 18:00", ("Brest", "Lyon"), (3.50, 3.40, 2.10)),
        // Outside the two-day horizon.
        fixture("Spain La Liga", "2026-10-22 21:00", ("Girona", "Elche"), (1.40, 4.50, 7.00)),
    ]);
}

fn counts(buckets: &std::collections::BTreeMap<RuleId, Vec<betbot::types::Wager>>) -> Vec<(RuleId, usize)> {
    buckets.iter().map(|(rule, w)| (*rule, w.len())).collect()
}

#[tokio::test]
async fn test_commit_buckets_fixtures_within_horizon() {
    let site = FakeSite::new(dec!(1000));
    opening_line(&site);
    let store = MemoryStore::new();

    let ctx = RunContext::new(at("2026-10-19 12:00"));
    let (fixtures, report) = pipeline().commit(&ctx, &site, &store).await.unwrap();

    assert_eq!(fixtures, 5);
    assert_eq!(
        counts(&report.wagers),
        vec![(RuleId::RuleOne, 2), (RuleId::RuleTest, 3)]
    );
    assert_eq!((report.created, report.deleted, report.frozen), (5, 0, 0));
    assert_eq!(store.wagers().unwrap().len(), 5);
    assert_eq!(site.state().sessions_opened, 0);
}

#[tokio::test]
async fn test_midday_run_bets_only_todays_fixtures() {
    let site = FakeSite::new(dec!(1000));
    opening_line(&site);
    let store = MemoryStore::new();

    // Betting on today's fixtures opened yesterday at 23:00.
    let ctx = RunContext::new(at("2026-10-19 12:00"));
    let report = pipeline().run(&ctx, &site, &store, &executor()).await.unwrap();

    let BetRunOutcome::Completed(bets) = report.bets else {
        panic!("today's fixtures are due");
    };
    // Sevilla - Getafe under both rules.
    assert_eq!(bets.placed, 2);
    assert_eq!(bets.available_balance, dec!(1000) - dec!(50) - dec!(20));
    assert_eq!(store.bet_runs().unwrap(), vec![at("2026-10-19 12:00")]);
    let pending = store
        .wagers()
        .unwrap()
        .iter()
        .filter(|w| w.outcome == WagerOutcome::Pending)
        .count();
    assert_eq!(pending, 3);
}

#[tokio::test]
async fn test_evening_run_then_frozen_morning() {
    let site = FakeSite::new(dec!(1000));
    opening_line(&site);
    let store = MemoryStore::new();
    let pipeline = pipeline();
    let executor = executor();

    // Evening: everything on today and tomorrow is due.
    let evening = RunContext::new(at("2026-10-19 23:05"));
    let report = pipeline.run(&evening, &site, &store, &executor).await.unwrap();
    let BetRunOutcome::Completed(bets) = report.bets else {
        panic!("expected a bet run");
    };
    // RULE_ONE 2 x 50, RULE_TEST 3 x 20.
    assert_eq!((bets.placed, bets.not_placed, bets.skipped), (5, 0, 0));
    assert_eq!(bets.total_balance, dec!(1000));
    assert_eq!(bets.available_balance, dec!(840));
    assert_eq!(site.state().balance, dec!(840));
    {
        let state = site.state();
        assert_eq!((state.sessions_opened, state.sessions_closed), (1, 1));
    }

    // Overnight the line moves: Betis - Cadiz is pulled, Lazio - Roma is
    // repriced and a new fixture appears for the 20th.
    site.list(vec![
        fixture("Italy Serie A", "2026-10-20 20:45", ("Lazio", "Roma"), (2.10, 3.30, 3.40)),
        fixture("Spain La Liga", "2026-10-20 16:15", ("Osasuna", "Alaves"), (1.60, 3.80, 5.50)),
        fixture("Spain La Liga", "2026-10-21 20:00", ("Mallorca", "Celta"), (1.75, 3.50, 4.20)),
    ]);

    let morning = RunContext::new(at("2026-10-20 10:00"));
    let report = pipeline.run(&morning, &site, &store, &executor).await.unwrap();

    // The 20th was committed by last night's run and stays as it was.
    assert_eq!(report.reconcile.frozen, RuleId::ALL.len());
    let on_20th: Vec<String> = report
        .reconcile
        .wagers
        .values()
        .flatten()
        .filter(|w| w.fixture.date() == at("2026-10-20 00:00").date())
        .map(|w| w.fixture.first_team.clone())
        .collect();
    assert_eq!(on_20th, vec!["Betis", "Betis", "Lazio"]);

    // The 21st is live and not yet open for betting.
    assert_eq!(report.bets, BetRunOutcome::NoGamesToBet);
    assert_eq!(site.state().sessions_opened, 1);
    let mallorca = store
        .wagers()
        .unwrap()
        .into_iter()
        .filter(|w| w.fixture.first_team == "Mallorca")
        .count();
    assert_eq!(mallorca, 2);
    assert_eq!(store.bet_runs().unwrap(), vec![at("2026-10-19 23:05")]);
}

#[tokio::test]
async fn test_rerun_same_evening_places_nothing_twice() {
    let site = FakeSite::new(dec!(1000));
    opening_line(&site);
    let store = MemoryStore::new();
    let pipeline = pipeline();
    let executor = executor();

    pipeline
        .run(&RunContext::new(at("2026-10-19 23:05")), &site, &store, &executor)
        .await
        .unwrap();
    let report = pipeline
        .run(&RunContext::new(at("2026-10-19 23:40")), &site, &store, &executor)
        .await
        .unwrap();

    assert_eq!(report.bets, BetRunOutcome::NoGamesToBet);
    assert_eq!(report.reconcile.created, 0);
    assert_eq!(site.state().bets.len(), 5);
}

#[tokio::test]
async fn test_refused_bets_are_recorded_not_placed() {
    let site = FakeSite::new(dec!(1000));
    opening_line(&site);
    site.state().refuse.insert("Betis".to_string());
    let store = MemoryStore::new();

    let ctx = RunContext::new(at("2026-10-19 23:05"));
    let report = pipeline().run(&ctx, &site, &store, &executor()).await.unwrap();
    let BetRunOutcome::Completed(bets) = report.bets else {
        panic!("expected a bet run");
    };

    assert_eq!((bets.placed, bets.not_placed), (3, 2));
    assert_eq!(bets.available_balance, dec!(1000) - dec!(50) - dec!(20) - dec!(20));
    let not_placed: Vec<_> = store
        .wagers()
        .unwrap()
        .into_iter()
        .filter(|w| w.outcome == WagerOutcome::NotPlaced)
        .map(|w| w.fixture.first_team)
        .collect();
    assert_eq!(not_placed, vec!["Betis", "Betis"]);
}

#[tokio::test]
async fn test_broken_league_aborts_before_commit() {
    let site = FakeSite::new(dec!(1000));
    opening_line(&site);
    site.state()
        .broken_leagues
        .insert("england-premier-league".to_string());
    let store = MemoryStore::new();

    let ctx = RunContext::new(at("2026-10-19 23:05"));
    let err = pipeline().run(&ctx, &site, &store, &executor()).await.unwrap_err();

    assert!(matches!(err, RunError::Fetch(_)));
    assert!(store.wagers().unwrap().is_empty());
    assert!(store.bet_runs().unwrap().is_empty());
    assert_eq!(site.state().sessions_opened, 0);
}

#[tokio::test]
async fn test_excluded_league_skipped_for_that_rule_only() {
    let site = FakeSite::new(dec!(1000));
    opening_line(&site);
    let store = MemoryStore::new();
    let leagues = LeagueLists::new(
        Vec::new(),
        HashMap::from([(RuleId::RuleOne, ["spain-la-liga".to_string()].into())]),
    );
    let pipeline = Pipeline::new(&bot_config(), leagues).unwrap();

    let ctx = RunContext::new(at("2026-10-19 12:00"));
    let (_, report) = pipeline.commit(&ctx, &site, &store).await.unwrap();

    assert!(report.wagers.get(&RuleId::RuleOne).map_or(true, Vec::is_empty));
    assert_eq!(report.wagers[&RuleId::RuleTest].len(), 3);
}

#[test]
fn test_bad_cutover_is_config_error() {
    let mut cfg = bot_config();
    cfg.cutover_time = "25:99".to_string();
    let err = Pipeline::new(&cfg, LeagueLists::default()).err().unwrap();
    assert!(matches!(err, RunError::Config(_)));
}
