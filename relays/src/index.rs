//! Grouping indices over a ranked relay collection.
//!
//! The index is a two level mapping, category -> bucket key -> bucket. It is
//! built in a single pass over the relays; buckets are created on the first
//! contribution to their key and hold the member positions in canonical
//! (bandwidth ranked) order together with running aggregates.
//!
//! ```text
//! country
//!   ├─ "us" → Bucket { members: [0, 3], bandwidth: 1400, exit: 1, middle: 1 }
//!   └─ "de" → Bucket { ... }
//! flag
//!   ├─ "Exit"  → Bucket { ... }
//!   └─ "Guard" → Bucket { ... }
//! ```

use crate::key::BucketKey;
use crate::types::Relay;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A grouping dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    As,
    Contact,
    Country,
    Family,
    Flag,
    Platform,
    FirstSeen,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::As,
        Category::Contact,
        Category::Country,
        Category::Family,
        Category::Flag,
        Category::Platform,
        Category::FirstSeen,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::As => "as",
            Category::Contact => "contact",
            Category::Country => "country",
            Category::Family => "family",
            Category::Flag => "flag",
            Category::Platform => "platform",
            Category::FirstSeen => "first_seen",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Autonomous system details, taken from the first relay seen in the AS.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkInfo {
    pub country: Option<String>,
    pub country_name: Option<String>,
    pub as_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FamilyInfo {
    /// Contact of the first relay seen in the family.
    pub contact: Option<String>,
    pub contact_md5: String,
    /// Oldest non-empty first_seen timestamp among the members.
    pub first_seen: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BucketExtra {
    None,
    Network(NetworkInfo),
    Family(FamilyInfo),
}

impl BucketExtra {
    fn new(category: Category, relay: &Relay) -> Self {
        match category {
            Category::As => BucketExtra::Network(NetworkInfo {
                country: relay.country.clone(),
                country_name: relay.country_name.clone(),
                as_name: relay.as_name.clone(),
            }),
            Category::Family => BucketExtra::Family(FamilyInfo {
                contact: relay.contact.clone(),
                contact_md5: relay.contact_md5.clone(),
                first_seen: String::new(),
            }),
            _ => BucketExtra::None,
        }
    }
}

/// Aggregate state for one key of one category.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    members: Vec<usize>,
    bandwidth: u128,
    exit_count: usize,
    middle_count: usize,
    extra: BucketExtra,
}

impl Bucket {
    fn new(category: Category, first: &Relay) -> Self {
        Bucket {
            members: Vec::new(),
            bandwidth: 0,
            exit_count: 0,
            middle_count: 0,
            extra: BucketExtra::new(category, first),
        }
    }

    fn add(&mut self, position: usize, relay: &Relay) {
        self.members.push(position);
        self.bandwidth += u128::from(relay.observed_bandwidth);

        if relay.is_exit() {
            self.exit_count += 1;
        } else {
            self.middle_count += 1;
        }

        if let BucketExtra::Family(family) = &mut self.extra
            && !relay.first_seen.is_empty()
            && (family.first_seen.is_empty() || relay.first_seen < family.first_seen)
        {
            family.first_seen = relay.first_seen.clone();
        }
    }

    /// Positions of the members in the ranked relay collection.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sum of the members' observed bandwidth in bytes per second.
    pub fn bandwidth(&self) -> u128 {
        self.bandwidth
    }

    pub fn exit_count(&self) -> usize {
        self.exit_count
    }

    pub fn middle_count(&self) -> usize {
        self.middle_count
    }

    pub fn extra(&self) -> &BucketExtra {
        &self.extra
    }

    pub fn network(&self) -> Option<&NetworkInfo> {
        match &self.extra {
            BucketExtra::Network(network) => Some(network),
            _ => None,
        }
    }

    pub fn family(&self) -> Option<&FamilyInfo> {
        match &self.extra {
            BucketExtra::Family(family) => Some(family),
            _ => None,
        }
    }
}

pub type BucketMap = IndexMap<BucketKey, Bucket>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregationStats {
    /// Contributions that landed in a bucket.
    pub contributions: usize,
    /// Candidate keys rejected by key validation.
    pub dropped_keys: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Index {
    pub(crate) categories: BTreeMap<Category, BucketMap>,
    pub(crate) stats: AggregationStats,
}

impl Index {
    /// Builds every category in one pass over `relays`, which must already be
    /// ranked.
    pub fn build(relays: &[Relay]) -> Self {
        let mut index = Index::default();

        for (position, relay) in relays.iter().enumerate() {
            index.contribute(Category::As, relay.as_number.as_deref(), position, relay);
            index.contribute(Category::Country, relay.country.as_deref(), position, relay);
            index.contribute(Category::Platform, relay.platform.as_deref(), position, relay);

            for flag in &relay.flags {
                index.contribute(Category::Flag, Some(flag), position, relay);
            }

            if relay.has_family() {
                for member in &relay.effective_family {
                    index.contribute(Category::Family, Some(member), position, relay);
                }
            }

            index.contribute(
                Category::FirstSeen,
                Some(relay.first_seen_date()),
                position,
                relay,
            );
            index.contribute(Category::Contact, Some(&relay.contact_md5), position, relay);
        }

        index
    }

    fn contribute(
        &mut self,
        category: Category,
        value: Option<&str>,
        position: usize,
        relay: &Relay,
    ) {
        let Some(value) = value else {
            return;
        };

        let key = match BucketKey::parse(value) {
            Ok(key) => key,
            Err(err) => {
                tracing::debug!(%category, fingerprint = %relay.fingerprint, error = %err, "Dropping key");
                self.stats.dropped_keys += 1;
                return;
            }
        };

        let bucket = self
            .categories
            .entry(category)
            .or_default()
            .entry(key)
            .or_insert_with(|| Bucket::new(category, relay));

        // A relay listing the same flag or family member twice is counted once.
        if bucket.members.last() == Some(&position) {
            return;
        }

        bucket.add(position, relay);
        self.stats.contributions += 1;
    }

    pub fn stats(&self) -> AggregationStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::is_valid_key;
    use crate::rank::rank_by_bandwidth;
    use crate::testutils::RelayBuilder;

    fn ranked(mut relays: Vec<Relay>) -> Vec<Relay> {
        rank_by_bandwidth(&mut relays);
        relays
    }

    fn sample_relays() -> Vec<Relay> {
        ranked(vec![
            RelayBuilder::new("A")
                .bandwidth(500)
                .flags(&["Exit", "Running", "Guard"])
                .country("us")
                .as_number("AS1")
                .as_name("First Network")
                .platform("Tor 0.4.8.1 on Linux")
                .contact("alice <alice AT example DOT com>")
                .family(&["A", "C"])
                .first_seen("2019-05-01 10:00:00")
                .build(),
            RelayBuilder::new("B")
                .bandwidth(900)
                .flags(&["Running"])
                .country("us")
                .as_number("AS2")
                .platform("Tor 0.4.8.1 on FreeBSD 14.0")
                .first_seen("2021-01-01 00:00:00")
                .build(),
            RelayBuilder::new("C")
                .bandwidth(500)
                .flags(&["Running", "Guard"])
                .country("!!invalid!!")
                .as_number("AS1")
                .as_name("Renamed Network")
                .platform("Tor 0.4.8.1")
                .contact("alice <alice AT example DOT com>")
                .family(&["A", "C"])
                .first_seen("2018-02-03 04:05:06")
                .build(),
            RelayBuilder::new("D")
                .flags(&["Exit", "Running"])
                .country("de")
                .family(&["D"])
                .first_seen("2021-01-01 12:00:00")
                .build(),
        ])
    }

    #[test]
    fn test_two_relay_country_scenario() {
        let relays = ranked(vec![
            RelayBuilder::new("A")
                .bandwidth(500)
                .flags(&["Exit"])
                .country("us")
                .as_number("AS1")
                .build(),
            RelayBuilder::new("B")
                .bandwidth(900)
                .country("us")
                .as_number("AS2")
                .build(),
        ]);
        assert_eq!(relays[0].fingerprint, "B");
        assert_eq!(relays[1].fingerprint, "A");

        let index = Index::build(&relays);
        let us = &index.categories[&Category::Country]["us"];
        assert_eq!(us.members(), &[0, 1]);
        assert_eq!(us.bandwidth(), 1400);
        assert_eq!(us.exit_count(), 1);
        assert_eq!(us.middle_count(), 1);
    }

    #[test]
    fn test_aggregate_consistency() {
        let relays = sample_relays();
        let index = Index::build(&relays);

        for buckets in index.categories.values() {
            for bucket in buckets.values() {
                let bandwidth: u128 = bucket
                    .members()
                    .iter()
                    .map(|&m| u128::from(relays[m].observed_bandwidth))
                    .sum();
                assert_eq!(bucket.bandwidth(), bandwidth);
                assert_eq!(bucket.exit_count() + bucket.middle_count(), bucket.len());

                let exits = bucket.members().iter().filter(|&&m| relays[m].is_exit()).count();
                assert_eq!(bucket.exit_count(), exits);
            }
        }
    }

    #[test]
    fn test_bandwidth_total_exceeds_u64() {
        let half = u64::MAX / 2 + 1;
        let relays = ranked(vec![
            RelayBuilder::new("A").bandwidth(half).country("us").build(),
            RelayBuilder::new("B").bandwidth(half).country("us").build(),
        ]);

        let index = Index::build(&relays);
        let us = &index.categories[&Category::Country]["us"];
        assert_eq!(us.len(), 2);
        assert_eq!(us.bandwidth(), 2 * u128::from(half));
        assert!(us.bandwidth() > u128::from(u64::MAX));
    }

    #[test]
    fn test_member_order_follows_ranking() {
        let relays = sample_relays();
        let index = Index::build(&relays);

        for buckets in index.categories.values() {
            for bucket in buckets.values() {
                assert!(bucket.members().windows(2).all(|w| w[0] < w[1]));
            }
        }

        // A and C tie on bandwidth, A came first
        let running = &index.categories[&Category::Flag]["Running"];
        let order: Vec<_> = running
            .members()
            .iter()
            .map(|&m| relays[m].fingerprint.as_str())
            .collect();
        assert_eq!(order, ["B", "A", "C", "D"]);
    }

    #[test]
    fn test_idempotent() {
        let relays = sample_relays();
        assert_eq!(Index::build(&relays), Index::build(&relays));
    }

    #[test]
    fn test_invalid_keys_are_dropped() {
        let relays = sample_relays();
        let index = Index::build(&relays);

        for buckets in index.categories.values() {
            assert!(buckets.keys().all(|k| is_valid_key(k)));
        }

        let countries = &index.categories[&Category::Country];
        assert!(countries.get("!!invalid!!").is_none());
        assert_eq!(countries.len(), 2);

        // C still lands in its other categories
        let c = relays.iter().position(|r| r.fingerprint == "C").unwrap();
        assert!(index.categories[&Category::Flag]["Guard"].members().contains(&c));
        assert!(
            index.categories[&Category::FirstSeen]["2018-02-03"]
                .members()
                .contains(&c)
        );
        assert!(
            index.categories[&Category::Contact][relays[c].contact_md5.as_str()]
                .members()
                .contains(&c)
        );
        assert_eq!(index.stats().dropped_keys, 1);
    }

    #[test]
    fn test_zero_bandwidth_relay_participates() {
        let relays = sample_relays();
        let index = Index::build(&relays);

        let d = relays.iter().position(|r| r.fingerprint == "D").unwrap();
        assert_eq!(d, relays.len() - 1);

        let de = &index.categories[&Category::Country]["de"];
        assert_eq!(de.members(), &[d]);
        assert_eq!(de.bandwidth(), 0);
        assert_eq!(de.exit_count(), 1);
    }

    #[test]
    fn test_malformed_platform_skips_platform_only() {
        let relays = sample_relays();
        let index = Index::build(&relays);

        let platforms = &index.categories[&Category::Platform];
        assert_eq!(platforms.len(), 2);
        assert_eq!(platforms["Linux"].len(), 1);
        assert_eq!(platforms["FreeBSD"].len(), 1);
    }

    #[test]
    fn test_network_info_from_first_member() {
        let relays = sample_relays();
        let index = Index::build(&relays);

        let as1 = &index.categories[&Category::As]["AS1"];
        assert_eq!(as1.len(), 2);
        assert_eq!(as1.bandwidth(), 1000);
        let network = as1.network().unwrap();
        assert_eq!(network.as_name.as_deref(), Some("First Network"));
        assert_eq!(network.country.as_deref(), Some("us"));
        assert!(as1.family().is_none());
    }

    #[test]
    fn test_contact_buckets() {
        let relays = sample_relays();
        let index = Index::build(&relays);
        let contacts = &index.categories[&Category::Contact];

        // A and C share a contact, B and D have none
        assert_eq!(contacts.len(), 2);
        let empty = &contacts["d41d8cd98f00b204e9800998ecf8427e"];
        let order: Vec<_> = empty
            .members()
            .iter()
            .map(|&m| relays[m].fingerprint.as_str())
            .collect();
        assert_eq!(order, ["B", "D"]);
    }

    #[test]
    fn test_family_buckets() {
        let relays = ranked(vec![
            RelayBuilder::new("X")
                .bandwidth(300)
                .flags(&["Exit"])
                .contact("ops")
                .family(&["X", "Y", "Z"])
                .first_seen("2020-06-01 00:00:00")
                .build(),
            RelayBuilder::new("Y")
                .bandwidth(200)
                .family(&["X", "Y", "Z"])
                .first_seen("2017-03-04 00:00:00")
                .build(),
            RelayBuilder::new("Z")
                .bandwidth(100)
                .family(&["X", "Y", "Z"])
                .first_seen("2019-01-01 00:00:00")
                .build(),
            RelayBuilder::new("S").bandwidth(1000).family(&["S"]).build(),
            RelayBuilder::new("N").bandwidth(50).build(),
        ]);
        let index = Index::build(&relays);
        let families = &index.categories[&Category::Family];

        assert_eq!(families.len(), 3);
        assert!(families.get("S").is_none());

        for key in ["X", "Y", "Z"] {
            let bucket = &families[key];
            assert_eq!(bucket.len(), 3);
            assert_eq!(bucket.bandwidth(), 600);
            assert_eq!(bucket.exit_count(), 1);

            let family = bucket.family().unwrap();
            assert_eq!(family.first_seen, "2017-03-04 00:00:00");
            assert_eq!(family.contact.as_deref(), Some("ops"));
        }

        // Singleton and absent families never contribute
        let s = relays.iter().position(|r| r.fingerprint == "S").unwrap();
        let n = relays.iter().position(|r| r.fingerprint == "N").unwrap();
        for bucket in families.values() {
            assert!(!bucket.members().contains(&s));
            assert!(!bucket.members().contains(&n));
        }
    }

    #[test]
    fn test_duplicate_flags_counted_once() {
        let relays = vec![
            RelayBuilder::new("A")
                .bandwidth(10)
                .flags(&["Exit", "Exit"])
                .build(),
        ];
        let index = Index::build(&relays);
        let exit = &index.categories[&Category::Flag]["Exit"];
        assert_eq!(exit.len(), 1);
        assert_eq!(exit.bandwidth(), 10);
    }

    #[test]
    fn test_flag_keys_keep_case() {
        let relays = vec![RelayBuilder::new("A").flags(&["HSDir", "hsdir"]).build()];
        let index = Index::build(&relays);
        let flags = &index.categories[&Category::Flag];
        assert!(flags.contains_key("HSDir"));
        assert!(flags.contains_key("hsdir"));
    }

    #[test]
    fn test_category_from_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert_eq!(
            "nickname".parse::<Category>(),
            Err(UnknownCategory("nickname".to_string()))
        );
    }
}
