//! Fixture collector.
//!
//! Fetches the league list once, then every league page through a
//! bounded pool of concurrent requests. The batch is all-or-nothing: the
//! first failed league fails the collection and drops the fetches still
//! in flight.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::site::Scraper;
use crate::types::{Fixture, RunError};

/// Default width of the fetch pool.
pub const DEFAULT_WORKERS: usize = 8;

/// Collect every fixture currently listed on the football line.
///
/// Result order is unspecified.
pub async fn collect(scraper: &dyn Scraper, workers: usize) -> Result<Vec<Fixture>, RunError> {
    let links = scraper
        .fetch_league_links()
        .await
        .map_err(RunError::Fetch)?;
    info!(leagues = links.len(), workers, "Collecting fixtures");

    let per_league: Vec<Vec<Fixture>> = stream::iter(links)
        .map(|link| async move {
            let fixtures = scraper
                .fetch_fixtures(&link)
                .await
                .map_err(|e| RunError::Fetch(e.context(format!("league {link}"))))?;
            debug!(league = %link, fixtures = fixtures.len(), "League fetched");
            Ok::<_, RunError>(fixtures)
        })
        .buffer_unordered(workers.max(1))
        .try_collect()
        .await?;

    let fixtures: Vec<Fixture> = per_league.into_iter().flatten().collect();

    let mut per_day: BTreeMap<_, usize> = BTreeMap::new();
    for f in &fixtures {
        *per_day.entry(f.date()).or_default() += 1;
    }
    for (date, count) in &per_day {
        info!(date = %date, fixtures = count, "Fixtures collected for day");
    }
    info!(total = fixtures.len(), "Collection complete");

    Ok(fixtures)
}
