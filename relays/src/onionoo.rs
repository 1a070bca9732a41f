//! Fetches the relay snapshot from the Onionoo details endpoint.

use crate::config::OnionooConfig;
use crate::timestamp::http_date_now;
use crate::types::Details;
use reqwest::header::{IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

const RETRIABLE_STATUS_CODES: &[StatusCode] = &[
    StatusCode::TOO_MANY_REQUESTS,     // 429
    StatusCode::INTERNAL_SERVER_ERROR, // 500
    StatusCode::BAD_GATEWAY,           // 502
    StatusCode::SERVICE_UNAVAILABLE,   // 503
    StatusCode::GATEWAY_TIMEOUT,       // 504
];

/// Upper bound for a single backoff sleep.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(600);

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("onionoo request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("onionoo responded with {0}")]
    Status(StatusCode),
    #[error("onionoo unavailable after {0} retries")]
    RetriesExceeded(u32),
}

/// A freshly fetched details document.
#[derive(Debug)]
pub struct Snapshot {
    pub details: Details,
    /// Sent back as If-Modified-Since on the next run.
    pub freshness: String,
}

#[derive(Debug)]
pub enum FetchOutcome {
    /// Nothing changed since the freshness token we sent.
    NotModified,
    Updated(Snapshot),
}

pub struct OnionooClient {
    client: reqwest::Client,
    url: Url,
    retries: u32,
    retry_base_delay: Duration,
}

impl OnionooClient {
    pub fn new(config: &OnionooConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("allium/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(OnionooClient {
            client,
            url: config.url.clone(),
            retries: config.retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    pub async fn fetch_details(
        &self,
        if_modified_since: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        let mut retries = 0;

        loop {
            let mut request = self.client.get(self.url.clone());
            if let Some(since) = if_modified_since {
                request = request.header(IF_MODIFIED_SINCE, since);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::NOT_MODIFIED {
                return Ok(FetchOutcome::NotModified);
            }

            if !status.is_success() {
                if !RETRIABLE_STATUS_CODES.contains(&status) {
                    return Err(FetchError::Status(status));
                }
                if retries >= self.retries {
                    return Err(FetchError::RetriesExceeded(retries));
                }

                let delay = backoff_delay(self.retry_base_delay, retries);
                tracing::warn!(%status, retry = retries + 1, ?delay, "Retrying onionoo fetch");
                sleep(delay).await;
                retries += 1;
                continue;
            }

            let freshness = response
                .headers()
                .get(LAST_MODIFIED)
                .and_then(|value| value.to_str().ok())
                .map(String::from)
                .unwrap_or_else(http_date_now);

            let details = response.json::<Details>().await?;
            tracing::info!(
                relays = details.relays.len(),
                published = ?details.relays_published,
                "Fetched onionoo details"
            );

            return Ok(FetchOutcome::Updated(Snapshot { details, freshness }));
        }
    }
}

/// `base * 2^retry`, capped at [`MAX_RETRY_DELAY`].
fn backoff_delay(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(retry)).min(MAX_RETRY_DELAY)
}
