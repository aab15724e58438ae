//! Maps the site's search response onto [`SearchResultPage`].
//!
//! The raw schema is loose: ids arrive as numbers or strings, durations are
//! seconds and may be missing, platforms are one comma-joined string. Every
//! field is optional here so a schema drift degrades to `None` instead of a
//! decode failure.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::models::{GameResult, SearchResultPage};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSearchResponse {
    #[serde(deserialize_with = "lenient_u64")]
    pub count: Option<u64>,
    #[serde(deserialize_with = "lenient_u32")]
    pub page_current: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub page_total: Option<u32>,
    #[serde(deserialize_with = "lenient_games")]
    pub data: Vec<RawGame>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawGame {
    pub game_id: Value,
    #[serde(deserialize_with = "lenient_string")]
    pub game_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub game_alias: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub comp_main: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub comp_plus: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub comp_100: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    pub profile_platform: Option<String>,
}

/// Numbers, or strings holding a number. Anything else is unknown.
fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(value_to_f64(&Value::deserialize(d)?).filter(|v| v.is_finite()))
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value.as_u64().or_else(|| {
        value_to_f64(&value)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as u64)
    }))
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_u64(d)?.and_then(|v| u32::try_from(v).ok()))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// `null` or a non-array is an empty list; entries that are not objects are dropped.
fn lenient_games<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RawGame>, D::Error> {
    let Value::Array(items) = Value::deserialize(d)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(game) => Some(game),
            Err(e) => {
                debug!(error = %e, "skipping malformed search entry");
                None
            }
        })
        .collect())
}

/// Seconds to hours, rounded to one decimal. Missing or negative input is unknown.
pub fn seconds_to_hours(seconds: Option<f64>) -> Option<f64> {
    let seconds = seconds?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds / 3600.0 * 10.0).round() / 10.0)
}

pub fn split_platforms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn normalize_game(raw: &RawGame) -> GameResult {
    GameResult {
        id: id_to_string(&raw.game_id),
        name: raw.game_name.clone().unwrap_or_default(),
        alias: raw
            .game_alias
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string),
        main_story_hours: seconds_to_hours(raw.comp_main),
        extras_hours: seconds_to_hours(raw.comp_plus),
        completionist_hours: seconds_to_hours(raw.comp_100),
        platforms: raw
            .profile_platform
            .as_deref()
            .map(split_platforms)
            .unwrap_or_default(),
    }
}

pub fn normalize(raw: &RawSearchResponse) -> SearchResultPage {
    let results: Vec<GameResult> = raw.data.iter().map(normalize_game).collect();
    SearchResultPage {
        total_count: raw.count.unwrap_or(results.len() as u64),
        current_page: raw.page_current.unwrap_or(1),
        last_page: raw.page_total.unwrap_or(1),
        results,
    }
}
