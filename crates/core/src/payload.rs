use serde::Serialize;

use crate::models::SearchQuery;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    pub search_type: &'static str,
    pub search_terms: Vec<String>,
    pub search_page: u32,
    pub size: u32,
    pub search_options: SearchOptions,
    pub use_cache: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchOptions {
    pub games: GameOptions,
    pub users: UserOptions,
    pub lists: ListOptions,
    pub filter: String,
    pub sort: u32,
    pub randomizer: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameOptions {
    pub user_id: u64,
    pub platform: String,
    pub sort_category: &'static str,
    pub range_category: &'static str,
    pub range_time: RangeTime,
    pub gameplay: Gameplay,
    pub range_year: RangeYear,
    pub modifier: &'static str,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RangeTime {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Gameplay {
    pub perspective: String,
    pub flow: String,
    pub genre: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RangeYear {
    pub min: String,
    pub max: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserOptions {
    pub sort_category: &'static str,
    /// Access token, only sent when it travels in the body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    pub sort_category: &'static str,
}

/// Payload for the search endpoint. `body_token` is embedded as
/// `searchOptions.users.id` when the token goes in the body.
pub fn build_search_payload(query: &SearchQuery, page_size: u32, body_token: Option<&str>) -> SearchPayload {
    SearchPayload {
        search_type: "games",
        search_terms: query.terms(),
        search_page: query.page(),
        size: page_size,
        search_options: SearchOptions {
            games: GameOptions {
                user_id: 0,
                platform: String::new(),
                sort_category: "popular",
                range_category: "main",
                range_time: RangeTime::default(),
                gameplay: Gameplay::default(),
                range_year: RangeYear::default(),
                modifier: query.modifier().as_wire(),
            },
            users: UserOptions {
                sort_category: "postcount",
                id: body_token.map(str::to_string),
            },
            lists: ListOptions {
                sort_category: "follows",
            },
            filter: String::new(),
            sort: 0,
            randomizer: 0,
        },
        use_cache: true,
    }
}
