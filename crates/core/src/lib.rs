//! Scraping client for HowLongToBeat completion times.
//!
//! The site has no public API. Searches go through an undocumented endpoint
//! guarded by a token that lives in the site's JavaScript bundle, so the
//! client scrapes that token, caches it, and re-scrapes when it is rotated.

pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod locator;
pub mod models;
pub mod monitoring;
pub mod normalize;
pub mod payload;
pub mod title;
pub mod token;

pub use client::HltbClient;
pub use config::ScraperConfig;
pub use error::{FetchError, RequestShape, SearchError};
pub use models::{GameResult, SearchModifier, SearchQuery, SearchResultPage};
pub use token::{AccessToken, TokenCache};
