use metrics::counter;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::config::DEFAULT_TOKEN_TTL;
use crate::error::FetchError;
use crate::locator::ScriptLocator;
use crate::monitoring::TOKEN_REFRESHES;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Access token scraped from the site bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    /// Endpoint discovered alongside the token, relative to the site root.
    pub search_path: Option<String>,
    /// Unix timestamp (seconds) when the token was scraped.
    pub acquired_at: u64,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, search_path: Option<String>) -> Self {
        Self::acquired_at(value, search_path, now_secs())
    }

    pub fn acquired_at(value: impl Into<String>, search_path: Option<String>, acquired_at: u64) -> Self {
        Self {
            value: value.into(),
            search_path,
            acquired_at,
        }
    }

    /// Seconds since the token was scraped
    pub fn age(&self) -> u64 {
        now_secs().saturating_sub(self.acquired_at)
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl.as_secs()
    }
}

/// Holds the one token the process is using.
///
/// Build it once and share it (`Arc<TokenCache>`) with every client. Writes
/// replace the whole entry; concurrent refreshes are funnelled through a gate
/// so callers that queued behind a refresh reuse its result.
///
/// The gate is held for the whole refresh, network calls included, so a slow
/// refresh blocks other refreshers for up to the request timeout per fetch.
/// [`TokenCache::current`] never waits on it.
#[derive(Debug)]
pub struct TokenCache {
    entry: RwLock<Option<AccessToken>>,
    ttl: Duration,
    refresh_gate: Mutex<()>,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL)
    }
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Cache pre-populated with `token`, e.g. one restored by the caller.
    pub fn with_token(token: AccessToken, ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(Some(token)),
            ttl,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached token if present and not expired.
    pub async fn current(&self) -> Option<AccessToken> {
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|t| !t.is_expired(self.ttl))
            .cloned()
    }

    pub async fn is_expired(&self) -> bool {
        self.entry
            .read()
            .await
            .as_ref()
            .is_none_or(|t| t.is_expired(self.ttl))
    }

    pub async fn replace(&self, token: Option<AccessToken>) {
        *self.entry.write().await = token;
    }

    pub async fn invalidate(&self) {
        debug!("access token invalidated");
        self.replace(None).await;
    }

    /// Re-scrapes the token: application bundles first, then every script.
    /// The outcome, including "nothing found", replaces the cached entry.
    pub async fn refresh(&self, locator: &ScriptLocator) -> Result<Option<AccessToken>, FetchError> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked(locator).await
    }

    /// Returns the cached token, refreshing first if it is missing or expired.
    pub async fn ensure_fresh(&self, locator: &ScriptLocator) -> Result<Option<AccessToken>, FetchError> {
        if let Some(token) = self.current().await {
            return Ok(Some(token));
        }
        let _gate = self.refresh_gate.lock().await;
        if let Some(token) = self.current().await {
            debug!("token refreshed by a concurrent caller");
            return Ok(Some(token));
        }
        self.refresh_locked(locator).await
    }

    /// Refreshes after the site rejected `rejected`. If another caller has
    /// already swapped in a different token, that one is returned instead.
    pub async fn refresh_rejected(
        &self,
        locator: &ScriptLocator,
        rejected: &str,
    ) -> Result<Option<AccessToken>, FetchError> {
        let _gate = self.refresh_gate.lock().await;
        if let Some(token) = self.current().await
            && token.value != rejected
        {
            debug!("rejected token already replaced");
            return Ok(Some(token));
        }
        self.refresh_locked(locator).await
    }

    #[instrument(skip(self, locator))]
    async fn refresh_locked(&self, locator: &ScriptLocator) -> Result<Option<AccessToken>, FetchError> {
        counter!(TOKEN_REFRESHES).increment(1);
        let mut found = locator.fetch_api_key(false).await?;
        if found.is_none() {
            info!("access token not found in app bundles, trying all scripts");
            found = locator.fetch_api_key(true).await?;
        }
        let token = found.map(|info| AccessToken::new(info.token, info.search_path));
        self.replace(token.clone()).await;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::fetcher::build_http_client;
    use mockito::Server;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn locator_for(server: &Server) -> ScriptLocator {
        let config = ScraperConfig::with_base_url(server.url());
        let client = build_http_client(&config).unwrap();
        ScriptLocator::new(client, config)
    }

    #[test]
    fn token_expiry_boundaries() {
        let fresh = AccessToken::acquired_at("k", None, now_secs() - 1);
        assert!(!fresh.is_expired(DAY));

        let stale = AccessToken::acquired_at("k", None, now_secs() - DAY.as_secs() - 1);
        assert!(stale.is_expired(DAY));

        let exactly_a_day = AccessToken::acquired_at("k", None, now_secs() - DAY.as_secs());
        assert!(exactly_a_day.is_expired(DAY));
    }

    #[tokio::test]
    async fn empty_cache_is_expired() {
        let cache = TokenCache::default();
        assert!(cache.is_expired().await);
        assert_eq!(cache.current().await, None);
    }

    #[tokio::test]
    async fn stale_token_is_not_current() {
        let stale = AccessToken::acquired_at("old", None, now_secs() - DAY.as_secs() - 60);
        let cache = TokenCache::with_token(stale, DAY);
        assert!(cache.is_expired().await);
        assert_eq!(cache.current().await, None);
    }

    #[tokio::test]
    async fn replace_and_invalidate() {
        let cache = TokenCache::new(DAY);
        cache.replace(Some(AccessToken::new("abc", None))).await;
        assert!(!cache.is_expired().await);
        assert_eq!(cache.current().await.map(|t| t.value), Some("abc".to_string()));

        cache.invalidate().await;
        assert!(cache.is_expired().await);
    }

    #[tokio::test]
    async fn refresh_falls_back_to_all_scripts() {
        let mut server = Server::new_async().await;
        let root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"<script src="/_app-main.js"></script><script src="/vendor.js"></script>"#)
            .expect(2)
            .create_async()
            .await;
        let _app = server
            .mock("GET", "/_app-main.js")
            .with_status(200)
            .with_body("noop()")
            .expect(2)
            .create_async()
            .await;
        let _vendor = server
            .mock("GET", "/vendor.js")
            .with_status(200)
            .with_body(r#"fetch("/api/find/".concat("be").concat("ef"),{method:"POST"})"#)
            .create_async()
            .await;

        let cache = TokenCache::new(DAY);
        let token = cache.refresh(&locator_for(&server)).await.unwrap().unwrap();
        assert_eq!(token.value, "beef");
        assert_eq!(token.search_path.as_deref(), Some("api/find/"));
        assert_eq!(cache.current().await, Some(token));
        root.assert_async().await;
    }

    #[tokio::test]
    async fn refresh_stores_none_when_nothing_found() {
        let mut server = Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;
        let cache = TokenCache::with_token(AccessToken::new("old", None), DAY);
        let token = cache.refresh(&locator_for(&server)).await.unwrap();
        assert_eq!(token, None);
        assert!(cache.is_expired().await);
    }

    #[tokio::test]
    async fn ensure_fresh_skips_network_for_valid_token() {
        let mut server = Server::new_async().await;
        let root = server
            .mock("GET", "/")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;
        let cache = TokenCache::with_token(AccessToken::new("cached", None), DAY);
        let token = cache.ensure_fresh(&locator_for(&server)).await.unwrap();
        assert_eq!(token.map(|t| t.value), Some("cached".to_string()));
        root.assert_async().await;
    }

    #[tokio::test]
    async fn concurrent_ensure_fresh_refreshes_once() {
        let mut server = Server::new_async().await;
        let root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"<script src="/_app-x.js"></script>"#)
            .expect(1)
            .create_async()
            .await;
        let _script = server
            .mock("GET", "/_app-x.js")
            .with_status(200)
            .with_body(r#"users:{id:"shared"}"#)
            .create_async()
            .await;

        let cache = TokenCache::new(DAY);
        let locator = locator_for(&server);
        let (a, b) = tokio::join!(cache.ensure_fresh(&locator), cache.ensure_fresh(&locator));
        assert_eq!(a.unwrap().map(|t| t.value), Some("shared".to_string()));
        assert_eq!(b.unwrap().map(|t| t.value), Some("shared".to_string()));
        root.assert_async().await;
    }

    #[tokio::test]
    async fn refresh_rejected_reuses_newer_token() {
        let mut server = Server::new_async().await;
        let root = server
            .mock("GET", "/")
            .expect(0)
            .create_async()
            .await;
        let cache = TokenCache::with_token(AccessToken::new("newer", None), DAY);
        let token = cache
            .refresh_rejected(&locator_for(&server), "older")
            .await
            .unwrap();
        assert_eq!(token.map(|t| t.value), Some("newer".to_string()));
        root.assert_async().await;
    }
}
