//! Search client for the site's undocumented search endpoint.
//!
//! The endpoint has accepted the token both as a URL suffix and inside the
//! request body across deployments, so each search tries the URL form first
//! and falls back to the body form. A 404 on the URL form means the token was
//! rotated: the cache is refreshed once and the search restarts.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::ScraperConfig;
use crate::error::{FetchError, RequestShape, SearchError};
use crate::fetcher::{build_http_client, is_token_rejection, search_headers};
use crate::locator::ScriptLocator;
use crate::models::{SearchModifier, SearchQuery, SearchResultPage};
use crate::monitoring::SEARCH_ATTEMPTS;
use crate::normalize::{RawSearchResponse, normalize};
use crate::payload::build_search_payload;
use crate::title::fetch_game_title;
use crate::token::{AccessToken, TokenCache};

/// Refresh-and-restart cycles allowed per search after a token rejection.
pub const MAX_TOKEN_RETRIES: u32 = 1;

enum UrlAttempt {
    Success(SearchResultPage),
    Rejected,
    Failed(String),
}

fn record_attempt(shape: RequestShape, outcome: &'static str) {
    counter!(SEARCH_ATTEMPTS, "shape" => shape.to_string(), "outcome" => outcome)
        .increment(1);
}

#[derive(Debug, Clone)]
pub struct HltbClient {
    http: Client,
    config: ScraperConfig,
    tokens: Arc<TokenCache>,
    locator: ScriptLocator,
}

impl HltbClient {
    /// Client with its own token cache.
    pub fn new(config: ScraperConfig) -> Result<Self, FetchError> {
        let tokens = Arc::new(TokenCache::new(config.token_ttl()));
        Self::with_cache(config, tokens)
    }

    /// Client sharing `tokens` with other clients in the process.
    pub fn with_cache(config: ScraperConfig, tokens: Arc<TokenCache>) -> Result<Self, FetchError> {
        let http = build_http_client(&config)?;
        let locator = ScriptLocator::new(http.clone(), config.clone());
        Ok(Self {
            http,
            config,
            tokens,
            locator,
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    /// Validates the term before touching the network.
    pub async fn search_term(
        &self,
        term: &str,
        modifier: SearchModifier,
        page: u32,
    ) -> Result<SearchResultPage, SearchError> {
        let query = SearchQuery::new(term)?
            .with_modifier(modifier)
            .with_page(page);
        self.search(&query).await
    }

    #[instrument(skip(self), fields(term = %query.term(), page = query.page()))]
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResultPage, SearchError> {
        if query.term().trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let mut token = self
            .tokens
            .ensure_fresh(&self.locator)
            .await?
            .ok_or(SearchError::NoToken)?;
        let mut retries = 0;

        loop {
            let endpoint = self.search_endpoint(&token)?;
            match self.attempt_token_in_url(&endpoint, &token, query).await {
                UrlAttempt::Success(page) => return Ok(page),
                UrlAttempt::Rejected if retries < MAX_TOKEN_RETRIES => {
                    retries += 1;
                    warn!("search endpoint rejected the token, refreshing");
                    token = self
                        .tokens
                        .refresh_rejected(&self.locator, &token.value)
                        .await?
                        .ok_or(SearchError::NoToken)?;
                    continue;
                }
                UrlAttempt::Rejected => {
                    warn!("token rejected again after refresh, trying token in body");
                }
                UrlAttempt::Failed(reason) => {
                    debug!(reason = %reason, "token-in-url attempt failed, trying token in body");
                }
            }
            return self.attempt_token_in_body(&endpoint, &token, query).await;
        }
    }

    /// Runs [`Self::search`] until `cancel` resolves. In-flight requests are
    /// dropped on cancellation.
    pub async fn search_until<C>(&self, query: &SearchQuery, cancel: C) -> Result<SearchResultPage, SearchError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                info!("search cancelled");
                Err(SearchError::Cancelled)
            }
            res = self.search(query) => res,
        }
    }

    /// Resolves a game's display title from its detail page.
    pub async fn get_title(&self, game_id: u64) -> Result<Option<String>, FetchError> {
        fetch_game_title(&self.http, &self.config, game_id).await
    }

    pub async fn get_title_until<C>(&self, game_id: u64, cancel: C) -> Result<Option<String>, FetchError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => Err(FetchError::Cancelled),
            res = self.get_title(game_id) => res,
        }
    }

    /// Search endpoint with a trailing slash; the URL form appends the token.
    fn search_endpoint(&self, token: &AccessToken) -> Result<String, SearchError> {
        let path = token
            .search_path
            .as_deref()
            .unwrap_or(&self.config.search_path)
            .trim_start_matches('/');
        let mut endpoint = self
            .config
            .site_root()?
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{path}: {e}")))?
            .to_string();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        Ok(endpoint)
    }

    async fn attempt_token_in_url(&self, endpoint: &str, token: &AccessToken, query: &SearchQuery) -> UrlAttempt {
        let shape = RequestShape::TokenInUrl;
        let url = format!("{endpoint}{}", token.value);
        let payload = build_search_payload(query, self.config.page_size, None);
        debug!(url = %url, "searching with token in url");

        let resp = match self
            .http
            .post(&url)
            .headers(search_headers(&self.config.base_url))
            .timeout(self.config.timeout())
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                record_attempt(shape, "error");
                return UrlAttempt::Failed(FetchError::from_reqwest(&url, e).to_string());
            }
        };

        let status = resp.status();
        if is_token_rejection(status) {
            record_attempt(shape, "rejected");
            return UrlAttempt::Rejected;
        }
        if !status.is_success() {
            record_attempt(shape, "error");
            return UrlAttempt::Failed(format!("HTTP status {status}"));
        }
        match resp.json::<RawSearchResponse>().await {
            Ok(raw) => {
                record_attempt(shape, "success");
                info!(shape = %shape, "search succeeded");
                UrlAttempt::Success(normalize(&raw))
            }
            Err(e) => {
                record_attempt(shape, "error");
                UrlAttempt::Failed(format!("undecodable response: {e}"))
            }
        }
    }

    async fn attempt_token_in_body(
        &self,
        endpoint: &str,
        token: &AccessToken,
        query: &SearchQuery,
    ) -> Result<SearchResultPage, SearchError> {
        let shape = RequestShape::TokenInBody;
        let payload = build_search_payload(query, self.config.page_size, Some(&token.value));
        debug!(url = %endpoint, "searching with token in body");

        let resp = self
            .http
            .post(endpoint)
            .headers(search_headers(&self.config.base_url))
            .timeout(self.config.timeout())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                record_attempt(shape, "error");
                SearchError::Attempt {
                    shape,
                    status: None,
                    message: FetchError::from_reqwest(endpoint, e).to_string(),
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            record_attempt(shape, "error");
            warn!(shape = %shape, status = %status, "search failed");
            return Err(SearchError::Attempt {
                shape,
                status: Some(status),
                message: format!("search endpoint returned {status}"),
            });
        }
        let raw: RawSearchResponse = resp.json().await.map_err(|e| {
            record_attempt(shape, "error");
            if e.is_timeout() {
                SearchError::Attempt {
                    shape,
                    status: Some(status),
                    message: FetchError::from_reqwest(endpoint, e).to_string(),
                }
            } else {
                SearchError::Decode(e.to_string())
            }
        })?;
        record_attempt(shape, "success");
        info!(shape = %shape, "search succeeded");
        Ok(normalize(&raw))
    }
}
