//! Blocking HTTP client for the remote country API.
//!
//! No timeouts are configured; a failed call is reported through
//! [`FetchError`] and rendered inline, never escalated.

use crate::config;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("Failed to fetch from API: {0}")]
    Status(u16),
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        match &e {
            ureq::Error::Status(code, _) => Self::Status(*code),
            ureq::Error::Transport(_) => Self::Network(e.to_string()),
        }
    }
}

/// One entry of the `GET /search?q=` response array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub iso: String,
    pub name: String,
    #[serde(default)]
    pub snippet: Option<String>,
}

pub struct ApiClient {
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// `GET {base}/country/{id}`. The payload is an arbitrary JSON object,
    /// rendered verbatim by the caller.
    pub fn country(&self, iso: &str) -> Result<Value, FetchError> {
        let url = format!("{}/country/{}", self.base, urlencode(iso));
        let response = ureq::get(&url)
            .set("User-Agent", config::USER_AGENT)
            .call()?;
        response
            .into_json()
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }

    /// `GET {base}/search?q={query}`. An empty or missing array means no
    /// results.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>, FetchError> {
        let url = format!("{}/search?q={}", self.base, urlencode(query));
        let response = ureq::get(&url)
            .set("User-Agent", config::USER_AGENT)
            .call()?;
        let body = response
            .into_json()
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
        parse_search_body(body)
    }
}

/// Some deployments answer `/search` with `null` instead of `[]` when
/// nothing matches; both count as no results.
fn parse_search_body(body: Value) -> Result<Vec<SearchHit>, FetchError> {
    if body.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(body).map_err(|e| FetchError::InvalidResponse(e.to_string()))
}

/// Percent-encodes a path/query component, byte-wise over the UTF-8 form.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
