use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Narrows which entries the site returns for a search.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SearchModifier {
    #[default]
    None,
    IsolateDlc,
    IsolateMods,
    IsolateHacks,
    HideDlc,
}

impl SearchModifier {
    /// Value the search endpoint expects in `searchOptions.games.modifier`.
    pub fn as_wire(self) -> &'static str {
        match self {
            SearchModifier::None => "",
            SearchModifier::IsolateDlc => "only_dlc",
            SearchModifier::IsolateMods => "only_mods",
            SearchModifier::IsolateHacks => "only_hacks",
            SearchModifier::HideDlc => "hide_dlc",
        }
    }
}

impl From<&str> for SearchModifier {
    fn from(s: &str) -> Self {
        match s {
            "only_dlc" | "IsolateDlc" => SearchModifier::IsolateDlc,
            "only_mods" | "IsolateMods" => SearchModifier::IsolateMods,
            "only_hacks" | "IsolateHacks" => SearchModifier::IsolateHacks,
            "hide_dlc" | "HideDlc" => SearchModifier::HideDlc,
            _ => SearchModifier::None,
        }
    }
}

/// A validated search request. The term is never empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
    modifier: SearchModifier,
    page: u32,
}

impl SearchQuery {
    pub fn new(term: &str) -> Result<Self, SearchError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        Ok(Self {
            term: term.to_string(),
            modifier: SearchModifier::None,
            page: 1,
        })
    }

    pub fn with_modifier(mut self, modifier: SearchModifier) -> Self {
        self.modifier = modifier;
        self
    }

    /// Pages are 1-based; 0 is clamped to 1.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn modifier(&self) -> SearchModifier {
        self.modifier
    }

    /// Whitespace-separated terms as sent in `searchTerms`.
    pub fn terms(&self) -> Vec<String> {
        self.term.split_whitespace().map(str::to_string).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameResult {
    pub id: String,
    pub name: String,
    pub alias: Option<String>,
    pub main_story_hours: Option<f64>,
    pub extras_hours: Option<f64>,
    pub completionist_hours: Option<f64>,
    pub platforms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultPage {
    /// Relevance order as returned by the site.
    pub results: Vec<GameResult>,
    pub total_count: u64,
    pub current_page: u32,
    pub last_page: u32,
}
