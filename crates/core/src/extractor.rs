//! Recovers the search access token from the site's bundled JavaScript.
//!
//! The bundle is minified and rebuilt on every deploy, so each strategy is a
//! pure `script -> Option<token>` function tried in order. A strategy that
//! finds nothing is normal; the caller moves on to the next script.

use regex::Regex;
use std::sync::OnceLock;

pub type ExtractStrategy = fn(&str) -> Option<String>;

/// Tried in order, first hit wins.
pub const STRATEGIES: &[(&str, ExtractStrategy)] = &[
    ("users-id", users_id_assignment),
    ("fetch-concat", fetch_concat_chain),
    ("api-path-concat", api_path_concat_chain),
];

/// What one script revealed about the search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInfo {
    pub token: String,
    /// Endpoint path relative to the site root, e.g. `api/find/`.
    pub search_path: Option<String>,
}

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn users_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r#"users\s*:\s*\{\s*id\s*:\s*"([^"]+)""#)
}

fn fetch_api_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r#"fetch\(\s*["'](/api/[^"']*)["']"#)
}

fn api_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r#"["']/api/\w+/["']"#)
}

fn concat_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Minifiers emit `.concat("x")`; some builds show `.+concat("x")`.
    get_regex(&RE, r#"\A\s*[.+]{1,2}\s*concat\(\s*["']([^"']*)["']\s*\)"#)
}

/// Literal arguments of a `.concat("a").concat("b")...` chain at the start of `rest`,
/// plus the byte length of the chain.
fn concat_chain(rest: &str) -> (Vec<&str>, usize) {
    let re = concat_link_regex();
    let mut parts = Vec::new();
    let mut offset = 0;
    while let Some(caps) = re.captures(&rest[offset..]) {
        let (Some(whole), Some(part)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        parts.push(part.as_str());
        offset += whole.end();
    }
    (parts, offset)
}

fn joined(parts: &[&str]) -> Option<String> {
    let token = parts.concat();
    if token.is_empty() { None } else { Some(token) }
}

/// `users: { id: "<token>" }`
pub fn users_id_assignment(script: &str) -> Option<String> {
    users_id_regex()
        .captures(script)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `fetch("/api/<x>/".concat("a").concat("b"), ...)`
pub fn fetch_concat_chain(script: &str) -> Option<String> {
    fetch_api_regex().find_iter(script).find_map(|m| {
        let (parts, _) = concat_chain(&script[m.end()..]);
        joined(&parts)
    })
}

/// `"/api/<x>/".concat("a").concat("b")` anywhere in the script.
pub fn api_path_concat_chain(script: &str) -> Option<String> {
    api_path_regex().find_iter(script).find_map(|m| {
        let (parts, _) = concat_chain(&script[m.end()..]);
        joined(&parts)
    })
}

/// Runs the strategies in order and returns the first token found.
pub fn extract_token(script: &str) -> Option<String> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let token = strategy(script)?;
        tracing::debug!(strategy = *name, "token matched");
        Some(token)
    })
}

/// Finds the endpoint of the `fetch` call whose concatenated suffix is `token`.
/// Leading `/` is stripped so the path joins onto the site root.
pub fn extract_search_path(script: &str, token: &str) -> Option<String> {
    fetch_api_regex().captures_iter(script).find_map(|caps| {
        let whole = caps.get(0)?;
        let endpoint = caps.get(1)?.as_str();
        let rest = &script[whole.end()..];
        let (parts, len) = concat_chain(rest);
        let is_call_argument = rest[len..].trim_start().starts_with(',');
        if is_call_argument && parts.concat() == token {
            Some(endpoint.trim_start_matches('/').to_string())
        } else {
            None
        }
    })
}

pub fn extract(script: &str) -> Option<ScriptInfo> {
    let token = extract_token(script)?;
    let search_path = extract_search_path(script, &token);
    Some(ScriptInfo { token, search_path })
}
