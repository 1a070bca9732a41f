use crate::index::{Category, Index};
use crate::normalize::normalize;
use crate::query::QueryError;
use crate::rank::rank_by_bandwidth;
use crate::types::{RawRelay, Relay};

/// One snapshot: the ranked relays and the indices built over them.
///
/// Built once per run and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct RelaySet {
    relays: Vec<Relay>,
    index: Index,
    malformed_records: usize,
    relays_published: Option<String>,
}

impl RelaySet {
    /// Normalizes, ranks and indexes a snapshot.
    pub fn build(raw: Vec<RawRelay>, relays_published: Option<String>) -> Self {
        let mut malformed_records = 0;
        let mut relays: Vec<Relay> = raw
            .into_iter()
            .map(|raw| {
                let had_platform = raw.platform.is_some();
                let relay = normalize(raw);
                if had_platform && relay.platform.is_none() {
                    malformed_records += 1;
                }
                relay
            })
            .collect();

        rank_by_bandwidth(&mut relays);
        let index = Index::build(&relays);

        RelaySet {
            relays,
            index,
            malformed_records,
            relays_published,
        }
    }

    /// All relays, highest bandwidth first.
    pub fn relays(&self) -> &[Relay] {
        &self.relays
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn malformed_records(&self) -> usize {
        self.malformed_records
    }

    pub fn relays_published(&self) -> Option<&str> {
        self.relays_published.as_deref()
    }

    /// The relays of a bucket, in bucket order.
    pub fn resolve_members(
        &self,
        category: Category,
        key: &str,
    ) -> Result<Vec<&Relay>, QueryError> {
        let bucket = self.index.bucket(category, key)?;
        Ok(bucket.members().iter().map(|&m| &self.relays[m]).collect())
    }
}
