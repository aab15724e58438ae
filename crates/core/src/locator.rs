use metrics::counter;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

use crate::config::ScraperConfig;
use crate::error::FetchError;
use crate::extractor::{self, ScriptInfo};
use crate::fetcher::{fetch_text, page_headers};
use crate::monitoring::TOKEN_EXTRACT_FAILURES;

/// Build-hash marker carried by the main application bundle.
pub const APP_BUNDLE_MARKER: &str = "_app-";

/// Collects `<script src>` URLs from the landing page, resolved against `base`.
/// Unless `parse_all` is set only application bundles are kept.
pub fn candidate_script_urls(html: &str, base: &Url, parse_all: bool) -> Vec<Url> {
    if html.is_empty() {
        return Vec::new();
    }
    let document = Html::parse_document(html);
    let Ok(sel) = Selector::parse("script[src]") else {
        return Vec::new();
    };
    document
        .select(&sel)
        .filter_map(|el| el.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .filter_map(|src| match base.join(src) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(src, error = %e, "skipping unresolvable script src");
                None
            }
        })
        .filter(|url| parse_all || url.path().contains(APP_BUNDLE_MARKER))
        .collect()
}

/// Fetches the landing page and its scripts to discover the access token.
#[derive(Debug, Clone)]
pub struct ScriptLocator {
    client: Client,
    config: ScraperConfig,
}

impl ScriptLocator {
    pub fn new(client: Client, config: ScraperConfig) -> Self {
        Self { client, config }
    }

    #[instrument(skip(self))]
    pub async fn list_candidate_scripts(&self, parse_all: bool) -> Result<Vec<Url>, FetchError> {
        let base = self.config.site_root()?;
        let html = fetch_text(
            &self.client,
            base.as_str(),
            page_headers(base.as_str()),
            self.config.timeout(),
        )
        .await?;
        let urls = candidate_script_urls(&html, &base, parse_all);
        debug!(count = urls.len(), "candidate scripts");
        Ok(urls)
    }

    /// Walks the candidate scripts and returns the first one that yields a token.
    /// A script that fails to download is logged and skipped; only a failed
    /// landing page fetch is an error.
    #[instrument(skip(self))]
    pub async fn fetch_api_key(&self, parse_all: bool) -> Result<Option<ScriptInfo>, FetchError> {
        let referer = self.config.site_root()?;
        let scripts = self.list_candidate_scripts(parse_all).await?;
        for script_url in scripts {
            let body = match fetch_text(
                &self.client,
                script_url.as_str(),
                page_headers(referer.as_str()),
                self.config.timeout(),
            )
            .await
            {
                Ok(body) => body,
                Err(e) => {
                    warn!(script = %script_url, error = %e, "failed to fetch script");
                    continue;
                }
            };
            if let Some(info) = extractor::extract(&body) {
                info!(
                    script = %script_url,
                    search_path = info.search_path.as_deref().unwrap_or("(default)"),
                    "found access token"
                );
                return Ok(Some(info));
            }
            counter!(TOKEN_EXTRACT_FAILURES).increment(1);
            debug!(script = %script_url, "no token in script");
        }
        warn!(parse_all, "could not find access token in any candidate script");
        Ok(None)
    }
}
