//! One generator run: fetch, build, render, remember.

use crate::config::Config;
use crate::errors::Result;
use relays::metrics_defs::{
    BUCKETS, DROPPED_KEYS, FETCH_DURATION, FETCH_NOT_MODIFIED, MALFORMED_RECORDS, PAGES_WRITTEN,
    RELAYS, RENDER_DURATION,
};
use relays::onionoo::{FetchOutcome, OnionooClient};
use relays::timestamp::TimestampStore;
use relays::{RelaySet, counter, gauge, histogram};
use std::time::Instant;

#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Onionoo had nothing newer than the stored token. Nothing was written.
    NotModified,
    Written { relays: usize, pages: usize },
}

pub async fn run(config: &Config, store: &dyn TimestampStore) -> Result<RunOutcome> {
    let since = store.load()?;
    let client = OnionooClient::new(&config.onionoo)?;

    let started = Instant::now();
    let outcome = client.fetch_details(since.as_deref()).await?;
    histogram!(FETCH_DURATION).record(started.elapsed().as_secs_f64());

    let snapshot = match outcome {
        FetchOutcome::NotModified => {
            tracing::info!(since = since.as_deref(), "No onionoo update since last run");
            counter!(FETCH_NOT_MODIFIED).increment(1);
            return Ok(RunOutcome::NotModified);
        }
        FetchOutcome::Updated(snapshot) => snapshot,
    };

    let set = RelaySet::build(snapshot.details.relays, snapshot.details.relays_published);
    record_set_metrics(&set);

    let started = Instant::now();
    let stats = site::write_site(&set, &config.site)?;
    histogram!(RENDER_DURATION).record(started.elapsed().as_secs_f64());
    counter!(PAGES_WRITTEN).increment(stats.pages as u64);

    // Only after the site is complete, so a failed run is redone in full.
    store.store(&snapshot.freshness)?;

    Ok(RunOutcome::Written {
        relays: set.relays().len(),
        pages: stats.pages,
    })
}

fn record_set_metrics(set: &RelaySet) {
    let stats = set.index().stats();

    gauge!(RELAYS).set(set.relays().len() as f64);
    counter!(MALFORMED_RECORDS).increment(set.malformed_records() as u64);
    counter!(DROPPED_KEYS).increment(stats.dropped_keys as u64);

    for category in set.index().categories() {
        let buckets = set.index().buckets(category).map_or(0, |b| b.len());
        gauge!(BUCKETS, "category" => category.as_str()).set(buckets as f64);
    }

    tracing::info!(
        relays = set.relays().len(),
        malformed_records = set.malformed_records(),
        contributions = stats.contributions,
        dropped_keys = stats.dropped_keys,
        "Built relay set"
    );
}
