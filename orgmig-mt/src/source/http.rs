//! Source client for the source system's migration API
//!
//! JSON endpoints under a base URL, authenticated with a bearer token and
//! paced by a minimum-interval rate limiter.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::records::*;
use super::{SourceClient, SourceError, SourceResult};

const USER_AGENT: &str = concat!("orgmig/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const RATE_LIMIT_MS: u64 = 100;

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

pub struct HttpSourceClient {
    http_client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    rate_limiter: Arc<RateLimiter>,
}

impl HttpSourceClient {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> SourceResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path`, `None` on 404
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> SourceResult<Option<T>> {
        self.rate_limiter.wait().await;

        let url = self.url(path);
        tracing::debug!(url = %url, "Querying source API");

        let mut request = self.http_client.get(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), error_text));
        }

        let body = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(Some(body))
    }

    /// GET a collection; a 404 is an empty collection
    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> SourceResult<Vec<T>> {
        Ok(self.get_optional(path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    async fn fetch_organization(&self, org_id: i64) -> SourceResult<Option<SourceOrg>> {
        self.get_optional(&format!("orgs/{}", org_id)).await
    }

    async fn fetch_topups(&self, org_id: i64) -> SourceResult<Vec<SourceTopUp>> {
        self.get_list(&format!("orgs/{}/topups", org_id)).await
    }

    async fn fetch_topup_usage(&self, topup_id: i64) -> SourceResult<Vec<SourceTopUpCredit>> {
        self.get_list(&format!("topups/{}/credits", topup_id)).await
    }

    async fn fetch_languages(&self, org_id: i64) -> SourceResult<Vec<SourceLanguage>> {
        self.get_list(&format!("orgs/{}/languages", org_id)).await
    }

    async fn fetch_channels(&self, org_id: i64) -> SourceResult<Vec<SourceChannel>> {
        self.get_list(&format!("orgs/{}/channels", org_id)).await
    }

    async fn fetch_channel_counts(&self, channel_id: i64) -> SourceResult<Vec<SourceChannelCount>> {
        self.get_list(&format!("channels/{}/counts", channel_id)).await
    }

    async fn fetch_channel_sync_history(&self, channel_id: i64) -> SourceResult<Vec<SourceSyncEvent>> {
        self.get_list(&format!("channels/{}/sync_events", channel_id)).await
    }

    async fn fetch_contact_fields(&self, org_id: i64) -> SourceResult<Vec<SourceContactField>> {
        self.get_list(&format!("orgs/{}/contact_fields", org_id)).await
    }

    async fn fetch_contacts(&self, org_id: i64) -> SourceResult<Vec<SourceContact>> {
        self.get_list(&format!("orgs/{}/contacts", org_id)).await
    }

    async fn fetch_contact_groups(&self, org_id: i64) -> SourceResult<Vec<SourceContactGroup>> {
        self.get_list(&format!("orgs/{}/contact_groups", org_id)).await
    }

    async fn fetch_group_members(&self, group_id: i64) -> SourceResult<Vec<SourceGroupMember>> {
        self.get_list(&format!("contact_groups/{}/members", group_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_normalizes_base_url() {
        let client = HttpSourceClient::new("https://live.example.org/api/", None).unwrap();
        assert_eq!(client.base_url(), "https://live.example.org/api");
        assert_eq!(client.url("/orgs/4"), "https://live.example.org/api/orgs/4");
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(50);

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[tokio::test]
    async fn test_unreachable_source_is_network_error() {
        let client = HttpSourceClient::new("http://127.0.0.1:9", None).unwrap();
        let err = client.fetch_organization(1).await.unwrap_err();
        assert!(matches!(err, SourceError::Network(_)));
    }
}
