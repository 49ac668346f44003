//! Detail and search resolution, routed by the active data-source mode.
//!
//! MOCK lookups resolve synchronously; API calls run on spawned worker
//! threads. Either way the outcome travels through one mpsc channel and is
//! applied by the event loop in arrival order, so a slow response can
//! overwrite a newer one (last to resolve wins). Nothing is cancelled or
//! retried.

use crate::api::{ApiClient, FetchError, SearchHit};
use crate::config;
use crate::features::FeatureSet;
use serde_json::{Value, json};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{error, info, warn};

/// Where detail and search data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Mock,
    Api,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Mock => Self::Api,
            Self::Api => Self::Mock,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mock => "MOCK",
            Self::Api => "API",
        }
    }

    /// One-line status shown when the mode is switched. Switching has no
    /// other side effect.
    pub fn status_line(self) -> &'static str {
        match self {
            Self::Mock => "Running in MOCK mode (demo data).",
            Self::Api => "Running in API mode. Click country to fetch details from API.",
        }
    }
}

/// A country payload plus the label it is rendered under.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRecord {
    pub label: String,
    pub payload: Value,
}

/// A resolved fetch, delivered to the event loop.
#[derive(Debug)]
pub enum FetchOutcome {
    Details(DetailRecord),
    Search(Vec<SearchHit>),
    SearchFailed(String),
}

/// Everything a detail fetch can fall back on when the API or the sample
/// table has nothing to offer.
pub struct DetailFallback<'a> {
    pub name: Option<&'a str>,
    pub pct: Option<f64>,
    pub properties: &'a Value,
}

/// Fixed sample records used in MOCK mode.
fn mock_table(iso: &str) -> Option<Value> {
    match iso {
        "US" => Some(json!({
            "forest_area": "310M ha",
            "co2_absorption": "430 Mt/year",
            "species": ["oak", "pine"]
        })),
        "BR" => Some(json!({
            "forest_area": "497M ha",
            "co2_absorption": "1200 Mt/year",
            "species": ["rubber tree", "mahogany"]
        })),
        "IN" => Some(json!({
            "forest_area": "71M ha",
            "co2_absorption": "90 Mt/year",
            "species": ["banyan", "teak"]
        })),
        _ => None,
    }
}

/// MOCK-mode payload: the sample record, or a record synthesized from the
/// fallback percentage and tagged as mock data.
pub fn mock_details(iso: &str, fallback_pct: Option<f64>) -> Value {
    mock_table(iso).unwrap_or_else(|| {
        let area = match fallback_pct {
            Some(p) => format!("{}%", fmt_num(p)),
            None => "N/A%".to_string(),
        };
        json!({ "forest_area": area, "note": "Mock data" })
    })
}

/// Case-insensitive substring search over the loaded feature names.
pub fn search_features(set: &FeatureSet, query: &str) -> Vec<SearchHit> {
    let q = query.to_lowercase();
    set.features
        .iter()
        .filter(|f| f.name.to_lowercase().contains(&q))
        .map(|f| SearchHit {
            iso: f.iso.clone().unwrap_or_default(),
            name: f.name.clone(),
            snippet: None,
        })
        .collect()
}

/// Shapes an API detail response into the record the UI renders. Failures
/// become an `{"error": …}` payload labelled with the country identifier.
fn api_detail_record(iso: &str, name: Option<String>, result: Result<Value, FetchError>) -> DetailRecord {
    match result {
        Ok(payload) => {
            info!(iso = %iso, "country details fetched");
            DetailRecord {
                label: name.unwrap_or_else(|| iso.to_string()),
                payload,
            }
        }
        Err(e) => {
            error!(iso = %iso, error = %e, "detail fetch failed");
            DetailRecord {
                label: iso.to_string(),
                payload: json!({ "error": e.to_string() }),
            }
        }
    }
}

pub struct Resolver {
    pub mode: Mode,
    /// Label of the most recently rendered detail record, if any.
    pub last_selected: Option<String>,
    tx: Sender<FetchOutcome>,
}

impl Resolver {
    pub fn new(mode: Mode, tx: Sender<FetchOutcome>) -> Self {
        Self {
            mode,
            last_selected: None,
            tx,
        }
    }

    /// Resolves country details by mode. MOCK and the no-identifier fallback
    /// complete immediately; API mode answers later through the channel.
    pub fn fetch_details(&self, iso: Option<&str>, fallback: DetailFallback<'_>) {
        let Some(iso) = iso.filter(|s| !s.is_empty()) else {
            warn!("no identifier for country; rendering fallback properties");
            let _ = self.tx.send(FetchOutcome::Details(DetailRecord {
                label: fallback.name.unwrap_or("Country").to_string(),
                payload: fallback.properties.clone(),
            }));
            return;
        };

        match self.mode {
            Mode::Mock => {
                let _ = self.tx.send(FetchOutcome::Details(DetailRecord {
                    label: iso.to_string(),
                    payload: mock_details(iso, fallback.pct),
                }));
            }
            Mode::Api => {
                let tx = self.tx.clone();
                let iso = iso.to_string();
                let name = fallback.name.map(|s| s.to_string());
                thread::spawn(move || {
                    let client = ApiClient::new(config::API_BASE);
                    let record = api_detail_record(&iso, name, client.country(&iso));
                    let _ = tx.send(FetchOutcome::Details(record));
                });
            }
        }
    }

    /// Runs a search by mode. Returns false for an empty query (a no-op).
    pub fn search(&self, query: &str, set: &FeatureSet) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }

        match self.mode {
            Mode::Mock => {
                let hits = search_features(set, query);
                info!(query = %query, hits = hits.len(), "mock search");
                let _ = self.tx.send(FetchOutcome::Search(hits));
            }
            Mode::Api => {
                let tx = self.tx.clone();
                let query = query.to_string();
                thread::spawn(move || {
                    let client = ApiClient::new(config::API_BASE);
                    let outcome = match client.search(&query) {
                        Ok(hits) => {
                            info!(query = %query, hits = hits.len(), "api search");
                            FetchOutcome::Search(hits)
                        }
                        Err(e) => {
                            error!(query = %query, error = %e, "search fetch failed");
                            FetchOutcome::SearchFailed(e.to_string())
                        }
                    };
                    let _ = tx.send(outcome);
                });
            }
        }
        true
    }
}

/// Formats a percentage the way the detail payloads expect: integral values
/// without a trailing ".0".
fn fmt_num(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("{}", p as i64)
    } else {
        format!("{}", p)
    }
}
