//! Sorted bucket listings for the families and networks overview pages.

use relays::{Bucket, BucketKey, Category, RelaySet};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Bandwidth,
    ExitCount,
    MiddleCount,
    FirstSeen,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::Bandwidth,
        SortKey::ExitCount,
        SortKey::MiddleCount,
        SortKey::FirstSeen,
    ];

    /// File name suffix, as in `misc/families-by-bandwidth.html`.
    pub const fn slug(&self) -> &'static str {
        match self {
            SortKey::Bandwidth => "by-bandwidth",
            SortKey::ExitCount => "by-exit-count",
            SortKey::MiddleCount => "by-middle-count",
            SortKey::FirstSeen => "by-first-seen",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            SortKey::Bandwidth => "bandwidth",
            SortKey::ExitCount => "exit count",
            SortKey::MiddleCount => "middle count",
            SortKey::FirstSeen => "first seen",
        }
    }
}

pub struct Row<'a> {
    pub key: &'a BucketKey,
    pub bucket: &'a Bucket,
    /// Oldest first_seen among the members, if known.
    pub first_seen: Option<&'a str>,
}

/// Every bucket of `category`, largest first by `sort`. Ties go to the higher
/// bandwidth, then to the lower key.
pub fn sorted_rows(set: &RelaySet, category: Category, sort: SortKey) -> Vec<Row<'_>> {
    let Ok(buckets) = set.index().buckets(category) else {
        return Vec::new();
    };

    let mut rows: Vec<Row<'_>> = buckets
        .iter()
        .map(|(key, bucket)| Row {
            key,
            bucket,
            first_seen: oldest_first_seen(set, bucket),
        })
        .collect();

    rows.sort_by(|a, b| {
        compare(sort, b, a)
            .then_with(|| b.bucket.bandwidth().cmp(&a.bucket.bandwidth()))
            .then_with(|| a.key.cmp(b.key))
    });
    rows
}

fn compare(sort: SortKey, a: &Row<'_>, b: &Row<'_>) -> Ordering {
    match sort {
        SortKey::Bandwidth => a.bucket.bandwidth().cmp(&b.bucket.bandwidth()),
        SortKey::ExitCount => a.bucket.exit_count().cmp(&b.bucket.exit_count()),
        SortKey::MiddleCount => a.bucket.middle_count().cmp(&b.bucket.middle_count()),
        // None sorts below any date
        SortKey::FirstSeen => a.first_seen.cmp(&b.first_seen),
    }
}

fn oldest_first_seen<'a>(set: &'a RelaySet, bucket: &'a Bucket) -> Option<&'a str> {
    if let Some(family) = bucket.family() {
        return (!family.first_seen.is_empty()).then_some(family.first_seen.as_str());
    }

    bucket
        .members()
        .iter()
        .map(|&m| set.relays()[m].first_seen.as_str())
        .filter(|first_seen| !first_seen.is_empty())
        .min()
}
