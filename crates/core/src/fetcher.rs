use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::config::ScraperConfig;
use crate::error::FetchError;

pub fn build_http_client(config: &ScraperConfig) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .gzip(true)
        .brotli(true)
        .http2_adaptive_window(true)
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(2)
        .timeout(config.timeout())
        .build()
        .map_err(FetchError::Client)
}

/// Headers for page and script fetches. The site checks that the referer is its own root.
pub fn page_headers(referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, value);
    }
    headers
}

pub fn search_headers(referer: &str) -> HeaderMap {
    let mut headers = page_headers(referer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers
}

/// Single GET returning the body text. Any non-2xx status is a `FetchError::Http`.
#[instrument(skip(client, headers), fields(url = %url))]
pub async fn fetch_text(
    client: &Client,
    url: &str,
    headers: HeaderMap,
    timeout: Duration,
) -> Result<String, FetchError> {
    let start_time = std::time::Instant::now();
    let resp = client
        .get(url)
        .headers(headers)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = resp.status();
    debug!(status = %status, elapsed_ms = start_time.elapsed().as_millis() as u64, "fetched");
    if !status.is_success() {
        return Err(FetchError::Http {
            url: url.to_string(),
            status,
        });
    }
    resp.text()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))
}

/// True for statuses the search endpoint uses to reject a stale token.
pub fn is_token_rejection(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND
}
