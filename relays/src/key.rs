//! Bucket keys.
//!
//! Every bucket key ends up as a single path segment in the generated site,
//! so only `[A-Za-z0-9_-]+` is accepted. Anything else never becomes a key.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Returns true if `s` is non-empty and made only of ASCII letters, digits,
/// underscores and hyphens.
pub fn is_valid_key(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid bucket key: {0:?}")]
pub struct InvalidKey(pub String);

/// A string that passed [`is_valid_key`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey(String);

impl BucketKey {
    pub fn parse(s: &str) -> Result<Self, InvalidKey> {
        if is_valid_key(s) {
            Ok(BucketKey(s.to_string()))
        } else {
            Err(InvalidKey(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for BucketKey {
    type Error = InvalidKey;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        BucketKey::parse(s)
    }
}

impl Deref for BucketKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

// Lets bucket maps be probed with a plain &str.
impl Borrow<str> for BucketKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BucketKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
