use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::{debug, info, warn};
use url::Url;

use super::errors::FeedApiError;
use super::retry::RetryPolicy;
use crate::config::FeedConfig;
use crate::models::FeedPage;

/// Client for the upstream feed endpoint
#[derive(Clone)]
pub struct FeedApi {
    client: reqwest::Client,
    endpoint: Url,
    retry_policy: RetryPolicy,
}

impl FeedApi {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedApiError> {
        let endpoint = Url::parse(&config.api_url)
            .map_err(|e| FeedApiError::Other(format!("Invalid feed URL {}: {}", config.api_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| FeedApiError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch one page of records, validating its shape
    pub async fn fetch_page(&self) -> Result<FeedPage, FeedApiError> {
        let page = self
            .retry_policy
            .execute("fetch_page", || async {
                debug!("[fetch_page] GET {}", self.endpoint);

                let response = self
                    .client
                    .get(self.endpoint.clone())
                    .send()
                    .await
                    .map_err(FeedApiError::from_reqwest)?;

                let status = response.status();
                debug!("[fetch_page] Response: {}", status);

                if !status.is_success() {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<failed to read response body>".to_string());
                    warn!(
                        "[fetch_page] Error response - Status: {}, Body: {}",
                        status.as_u16(),
                        body
                    );
                    return Err(FeedApiError::from_status(status.as_u16(), body));
                }

                let body = response.text().await.map_err(FeedApiError::from_reqwest)?;
                serde_json::from_str::<FeedPage>(&body).map_err(|e| {
                    warn!("[fetch_page] Response did not match the feed schema: {}", e);
                    FeedApiError::Schema(e.to_string())
                })
            })
            .await?;

        info!(
            "Fetched {} videos ({} available upstream)",
            page.data.len(),
            page.total
        );
        Ok(page)
    }
}
