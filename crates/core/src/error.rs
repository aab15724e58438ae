//! Error types surfaced by the scraping client.
//!
//! Soft conditions (no token in a script, missing title, absent durations)
//! are never errors; they come back as `None` or empty values.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure reaching the site: root page, script, or game detail page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {status} for {url}")]
    Http { url: String, status: StatusCode },
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Where the access token travelled in a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    TokenInUrl,
    TokenInBody,
}

impl std::fmt::Display for RequestShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestShape::TokenInUrl => write!(f, "token-in-url"),
            RequestShape::TokenInBody => write!(f, "token-in-body"),
        }
    }
}

fn status_suffix(status: &Option<StatusCode>) -> String {
    status.map(|s| format!(" with {s}")).unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search term is empty")]
    EmptyQuery,
    #[error("no access token could be extracted from the site scripts")]
    NoToken,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("search attempt ({shape}) failed{}: {message}", status_suffix(.status))]
    Attempt {
        shape: RequestShape,
        status: Option<StatusCode>,
        message: String,
    },
    #[error("could not decode search response: {0}")]
    Decode(String),
    #[error("search cancelled")]
    Cancelled,
}

impl SearchError {
    /// HTTP status of the last failed attempt, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SearchError::Attempt { status, .. } => *status,
            SearchError::Fetch(FetchError::Http { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
