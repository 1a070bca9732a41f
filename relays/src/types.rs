use serde::Deserialize;

pub const EXIT_FLAG: &str = "Exit";

/// A relay as served by the Onionoo details document.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawRelay {
    #[serde(default)]
    pub nickname: String,
    pub fingerprint: String,
    pub observed_bandwidth: Option<u64>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(rename = "as")]
    pub as_number: Option<String>,
    pub as_name: Option<String>,
    pub country: Option<String>,
    pub country_name: Option<String>,
    pub platform: Option<String>,
    pub contact: Option<String>,
    #[serde(default)]
    pub effective_family: Vec<String>,
    #[serde(default)]
    pub first_seen: String,
    pub last_seen: Option<String>,
    #[serde(default)]
    pub or_addresses: Vec<String>,
    #[serde(default)]
    pub running: bool,
    pub consensus_weight: Option<u64>,
}

/// A normalized relay record. See [`crate::normalize`].
#[derive(Clone, Debug, PartialEq)]
pub struct Relay {
    pub nickname: String,
    pub fingerprint: String,
    pub observed_bandwidth: u64,
    pub flags: Vec<String>,
    pub as_number: Option<String>,
    pub as_name: Option<String>,
    pub country: Option<String>,
    pub country_name: Option<String>,
    /// Operating system token, e.g. "Linux". None if missing or unparsable.
    pub platform: Option<String>,
    pub contact: Option<String>,
    /// Hex MD5 of `contact` (of "" when there is no contact).
    pub contact_md5: String,
    pub effective_family: Vec<String>,
    pub first_seen: String,
    pub last_seen: Option<String>,
    pub or_addresses: Vec<String>,
    pub running: bool,
    pub consensus_weight: u64,
}

impl Relay {
    pub fn is_exit(&self) -> bool {
        self.flags.iter().any(|flag| flag == EXIT_FLAG)
    }

    /// The date part of `first_seen` ("2019-10-03 12:00:00" -> "2019-10-03").
    pub fn first_seen_date(&self) -> &str {
        self.first_seen
            .split(' ')
            .next()
            .unwrap_or(&self.first_seen)
    }

    /// Only families of more than one relay are grouped.
    pub fn has_family(&self) -> bool {
        self.effective_family.len() > 1
    }
}

/// The Onionoo details document, reduced to the parts we use.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Details {
    pub relays_published: Option<String>,
    #[serde(default)]
    pub relays: Vec<RawRelay>,
}
