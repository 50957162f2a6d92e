//! Strategy: rule classification and stake sizing.

pub mod rules;
pub mod stake;

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::LeagueLists;
use crate::types::{Fixture, RuleId};

/// Partition fixtures into rule buckets.
///
/// Pure: every rule in `rules` gets a key (possibly with an empty list),
/// each rule evaluates independently, and a fixture may land in several
/// buckets. Bucket order follows input order.
pub fn classify(
    fixtures: &[Fixture],
    rules: &[RuleId],
    leagues: &LeagueLists,
) -> BTreeMap<RuleId, Vec<Fixture>> {
    let mut buckets = BTreeMap::new();
    for rule in rules {
        let matched: Vec<Fixture> = fixtures
            .iter()
            .filter(|f| rule.matches(f, leagues))
            .cloned()
            .collect();
        debug!(rule = %rule, matched = matched.len(), "Rule evaluated");
        buckets.insert(*rule, matched);
    }

    info!(
        fixtures = fixtures.len(),
        buckets = ?buckets.iter().map(|(r, v)| (r.as_str(), v.len())).collect::<Vec<_>>(),
        "Classification complete"
    );

    buckets
}
