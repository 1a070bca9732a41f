use thiserror::Error;

use crate::config::ConfigError;
use relays::onionoo::FetchError;
use relays::timestamp::TimestampError;
use site::SiteError;

pub type Result<T, E = AlliumError> = std::result::Result<T, E>;

/// Errors that end a generator run
#[derive(Error, Debug)]
pub enum AlliumError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("freshness token: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("writing site failed: {0}")]
    Site(#[from] SiteError),

    #[error("could not install metrics recorder: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
