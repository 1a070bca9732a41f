use crate::types::Relay;

/// Sorts relays by observed bandwidth, highest first.
///
/// The sort is stable: relays with equal bandwidth keep their relative order.
/// The resulting order is the canonical order for every index and listing.
pub fn rank_by_bandwidth(relays: &mut [Relay]) {
    relays.sort_by(|a, b| b.observed_bandwidth.cmp(&a.observed_bandwidth));
}
