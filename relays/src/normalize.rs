//! Repairs raw relay records before ranking and aggregation.

use crate::types::{RawRelay, Relay};
use md5::{Digest, Md5};

const PLATFORM_SEPARATOR: &str = " on ";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("platform {0:?} does not name an operating system")]
    Platform(String),
}

/// Reduces a platform string to its operating system token.
///
/// "Tor 0.3.4.9 on Linux" -> "Linux", "Tor 0.4.8.1 on GNU/Linux" -> "Linux",
/// "Tor 0.4.8.1 on FreeBSD 14.0" -> "FreeBSD".
pub fn trim_platform(platform: &str) -> Result<String, MalformedRecord> {
    let malformed = || MalformedRecord::Platform(platform.to_string());

    let (_, os) = platform
        .split_once(PLATFORM_SEPARATOR)
        .ok_or_else(malformed)?;
    let os = os.split(' ').next().unwrap_or_default();
    let os = os.rsplit('/').next().unwrap_or_default();

    if os.is_empty() {
        return Err(malformed());
    }
    Ok(os.to_string())
}

/// Hex encoded MD5 of the contact string, used in place of the contact itself
/// wherever a stable identifier is needed.
pub fn contact_md5(contact: Option<&str>) -> String {
    hex::encode(Md5::digest(contact.unwrap_or_default().as_bytes()))
}

/// Normalizes a single record. A malformed platform only clears the
/// platform; the rest of the record is kept.
pub fn normalize(raw: RawRelay) -> Relay {
    let platform = raw.platform.as_deref().and_then(|p| match trim_platform(p) {
        Ok(os) => Some(os),
        Err(err) => {
            tracing::debug!(fingerprint = %raw.fingerprint, error = %err, "Dropping platform");
            None
        }
    });
    let contact_md5 = contact_md5(raw.contact.as_deref());

    Relay {
        nickname: raw.nickname,
        fingerprint: raw.fingerprint,
        observed_bandwidth: raw.observed_bandwidth.unwrap_or(0),
        flags: raw.flags,
        as_number: raw.as_number,
        as_name: raw.as_name,
        country: raw.country,
        country_name: raw.country_name,
        platform,
        contact: raw.contact,
        contact_md5,
        effective_family: raw.effective_family,
        first_seen: raw.first_seen,
        last_seen: raw.last_seen,
        or_addresses: raw.or_addresses,
        running: raw.running,
        consensus_weight: raw.consensus_weight.unwrap_or(0),
    }
}
