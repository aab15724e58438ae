use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::{instrument, warn};

use crate::config::ScraperConfig;
use crate::error::FetchError;
use crate::fetcher::{fetch_text, page_headers};

const TITLE_PREFIX: &str = "How long is ";
const TITLE_SUFFIX: &str = " | HowLongToBeat";

/// Pulls the game name out of a detail page's `<title>`.
///
/// Expects `How long is <TITLE> | HowLongToBeat`; any other shape falls back
/// to the trimmed title text. `None` only when there is no usable title.
pub fn cut_game_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("title").ok()?;
    let raw = document.select(&sel).next()?.text().collect::<String>();
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    match text
        .strip_prefix(TITLE_PREFIX)
        .and_then(|rest| rest.strip_suffix(TITLE_SUFFIX))
        .map(str::trim)
    {
        Some(title) if !title.is_empty() => Some(title.to_string()),
        _ => {
            warn!(title = text, "unexpected title format");
            Some(text.to_string())
        }
    }
}

/// `{site root}game?id=<game_id>`
pub fn game_url(config: &ScraperConfig, game_id: u64) -> Result<Url, FetchError> {
    let mut url = config
        .site_root()?
        .join("game")
        .map_err(|e| FetchError::InvalidUrl(format!("game: {e}")))?;
    let qs = serde_urlencoded::to_string([("id", game_id)])
        .unwrap_or_else(|_| format!("id={game_id}"));
    url.set_query(Some(&qs));
    Ok(url)
}

#[instrument(skip(client, config))]
pub async fn fetch_game_title(
    client: &Client,
    config: &ScraperConfig,
    game_id: u64,
) -> Result<Option<String>, FetchError> {
    let root = config.site_root()?;
    let url = game_url(config, game_id)?;
    let html = fetch_text(client, url.as_str(), page_headers(root.as_str()), config.timeout()).await?;
    Ok(cut_game_title(&html))
}
