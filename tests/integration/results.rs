//! Result scanning and statistics after a bet run.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use betbot::engine::results::{ResultMatcher, ScanOutcome};
use betbot::engine::stats;
use betbot::storage::{MemoryStore, Store};
use betbot::types::{MatchResult, RuleId, RunContext};

use crate::fake_site::{at, FakeSite};
use crate::pipeline::{executor, opening_line, pipeline};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn after_evening_run() -> (FakeSite, MemoryStore) {
    let site = FakeSite::new(dec!(1000));
    opening_line(&site);
    let store = MemoryStore::new();
    pipeline()
        .run(&RunContext::new(at("2026-10-19 23:05")), &site, &store, &executor())
        .await
        .unwrap();
    (site, store)
}

#[tokio::test]
async fn test_results_then_stats() {
    let (site, store) = after_evening_run().await;
    site.complete("2026-10-19 21:00", "Sevilla (голы) - Getafe (голы)", "5 : 3");
    site.complete("2026-10-19 21:00", "Sevilla - Getafe", "2 : 1 (1 : 0)");
    site.complete("2026-10-20 19:00", "Betis B - Cadiz B", "1 : 1");
    site.complete("2026-10-20 20:45", "Lazio - Roma", "0 : 2 (0 : 1)");

    let ctx = RunContext::new(at("2026-10-21 12:00"));
    let outcome = ResultMatcher::new(3).run(&ctx, &site, &store).await.unwrap();
    let ScanOutcome::Scanned(report) = outcome else {
        panic!("expected a scan");
    };
    assert_eq!((report.days, report.matched, report.unmatched), (2, 5, 0));
    assert!(store.get_without_result().await.unwrap().is_empty());

    let wagers = store
        .get_between(date("2026-10-19"), date("2026-10-20"))
        .await
        .unwrap();
    let included = vec!["spain-la-liga".to_string()];
    let by_rule = stats::aggregate_by_rule(&wagers, date("2026-10-19"), date("2026-10-20"), &included);

    let one = &by_rule[&RuleId::RuleOne];
    assert_eq!(one.period.total, 2);
    assert_eq!(one.period.get(MatchResult::FirstWin), 1);
    assert_eq!(one.period.get(MatchResult::Tie), 1);

    let test = &by_rule[&RuleId::RuleTest];
    assert_eq!(test.period.total, 3);
    assert_eq!(test.period.second_win, 1);
    // Lazio - Roma is outside the included leagues.
    assert_eq!(test.included.total, 2);
    assert_eq!(test.included.second_win, 0);
}

#[tokio::test]
async fn test_unfinished_fixtures_wait_for_the_delay() {
    let (site, store) = after_evening_run().await;
    site.complete("2026-10-19 21:00", "Sevilla - Getafe", "2 : 1");

    // Only the 19th is three hours past kick-off.
    let ctx = RunContext::new(at("2026-10-20 12:00"));
    let ScanOutcome::Scanned(report) = ResultMatcher::new(3).run(&ctx, &site, &store).await.unwrap()
    else {
        panic!("expected a scan");
    };
    assert_eq!((report.days, report.matched), (1, 2));
    assert_eq!(store.get_without_result().await.unwrap().len(), 3);

    // Nothing left that is due: no session is opened.
    let opened = site.state().sessions_opened;
    let outcome = ResultMatcher::new(3).run(&ctx, &site, &store).await.unwrap();
    assert_eq!(outcome, ScanOutcome::NothingToScan);
    assert_eq!(site.state().sessions_opened, opened);
}

#[tokio::test]
async fn test_missing_result_leaves_wager_open() {
    let (site, store) = after_evening_run().await;
    site.complete("2026-10-20 20:45", "Lazio - Roma", "Goals");

    let ctx = RunContext::new(at("2026-10-21 12:00"));
    let ScanOutcome::Scanned(report) = ResultMatcher::new(3).run(&ctx, &site, &store).await.unwrap()
    else {
        panic!("expected a scan");
    };
    assert_eq!(report.matched, 0);
    assert_eq!(report.unmatched, 5);

    let stats = stats::aggregate(
        &store.wagers().unwrap(),
        date("2026-10-19"),
        date("2026-10-20"),
        &[],
    );
    assert_eq!(stats.period.no_result, 5);
    assert_eq!(stats.included.total, 0);
}
