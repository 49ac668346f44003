//! Application state and input handling.

use crate::api::SearchHit;
use crate::config;
use crate::features::FeatureSet;
use crate::map_draw::MapView;
use crate::resolver::{DetailFallback, DetailRecord, FetchOutcome, Resolver};
use crossterm::event::KeyCode;
use std::sync::mpsc::{self, Receiver};
use tracing::{error, info, warn};

const DEFAULT_PROMPT: &str = "Hover to see quick stats. Click for more details.";

/// What the left-hand list is currently showing.
pub enum ResultsPane {
    /// No search active: the full country list.
    Hidden,
    /// A search request is in flight.
    Searching,
    NoResults,
    Error(String),
    Hits(Vec<SearchHit>),
}

pub struct AppState {
    pub features: FeatureSet,
    pub map: MapView,
    pub resolver: Resolver,
    rx: Receiver<FetchOutcome>,
    /// Index into the country list (the hover analog).
    pub selected: usize,
    pub results: ResultsPane,
    pub result_selected: usize,
    pub search_input: String,
    pub editing_search: bool,
    pub summary: String,
    pub detail: Option<DetailRecord>,
}

impl AppState {
    pub fn new(geojson_path: &str) -> Self {
        let (tx, rx) = mpsc::channel();

        let (features, summary) = match FeatureSet::load(geojson_path) {
            Ok(set) => {
                info!(count = set.len(), path = geojson_path, "loaded country features");
                (set, DEFAULT_PROMPT.to_string())
            }
            Err(e) => {
                error!(error = %e, path = geojson_path, "failed to load map data");
                (
                    FeatureSet::default(),
                    format!("Error loading map data: {}", e),
                )
            }
        };
        let map = MapView::new(&features);

        Self {
            features,
            map,
            resolver: Resolver::new(config::DEFAULT_MODE, tx),
            rx,
            selected: 0,
            results: ResultsPane::Hidden,
            result_selected: 0,
            search_input: String::new(),
            editing_search: false,
            summary,
            detail: None,
        }
    }

    /// Drains every outcome delivered since the last tick, in arrival order.
    /// A stale response can therefore overwrite a newer one.
    pub fn poll_outcomes(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Details(rec) => {
                self.resolver.last_selected = Some(rec.label.clone());
                self.detail = Some(rec);
            }
            FetchOutcome::Search(hits) => {
                self.result_selected = 0;
                self.results = if hits.is_empty() {
                    ResultsPane::NoResults
                } else {
                    ResultsPane::Hits(hits)
                };
            }
            FetchOutcome::SearchFailed(msg) => {
                self.results = ResultsPane::Error(msg);
            }
        }
    }

    /// Index of the hovered country when the country list is showing.
    pub fn hovered(&self) -> Option<usize> {
        match self.results {
            ResultsPane::Hidden if !self.features.is_empty() => Some(self.selected),
            _ => None,
        }
    }

    /// Returns true when the app should quit.
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        if self.editing_search {
            self.handle_search_input(key);
            return false;
        }

        use KeyCode::*;
        match key {
            Char('q') => return true,
            Char('/') => self.editing_search = true,
            Char('m') => {
                self.resolver.mode = self.resolver.mode.toggled();
                self.summary = self.resolver.mode.status_line().to_string();
                info!(mode = self.resolver.mode.label(), "mode switched");
            }
            Up => self.move_selection(-1),
            Down => self.move_selection(1),
            Enter => self.activate(),
            Esc => self.close_results(),
            // map viewport
            Char('w') => self.map.pan(0.0, 0.25),
            Char('s') => self.map.pan(0.0, -0.25),
            Char('a') => self.map.pan(-0.25, 0.0),
            Char('d') => self.map.pan(0.25, 0.0),
            Char('+') | Char('=') => self.map.zoom(0.5),
            Char('-') => self.map.zoom(2.0),
            Char('r') => self.map.reset(),
            _ => {}
        }
        false
    }

    fn handle_search_input(&mut self, key: KeyCode) {
        use KeyCode::*;
        match key {
            Esc => self.editing_search = false,
            Enter => {
                self.editing_search = false;
                self.run_search();
            }
            Backspace => {
                self.search_input.pop();
            }
            Char(c) => self.search_input.push(c),
            _ => {}
        }
    }

    fn run_search(&mut self) {
        if self.resolver.search(&self.search_input, &self.features) {
            self.results = ResultsPane::Searching;
            self.result_selected = 0;
        }
    }

    fn move_selection(&mut self, delta: i64) {
        let len = match &self.results {
            ResultsPane::Hidden => self.features.len(),
            ResultsPane::Hits(hits) => hits.len(),
            _ => 0,
        };
        if len == 0 {
            return;
        }
        let on_countries = matches!(self.results, ResultsPane::Hidden);
        let idx = if on_countries {
            &mut self.selected
        } else {
            &mut self.result_selected
        };
        let new = (*idx as i64 + delta).clamp(0, len as i64 - 1);
        *idx = new as usize;

        if on_countries {
            self.show_hover_summary();
        }
    }

    /// The hover summary: name plus percentage, prompting for a click.
    fn show_hover_summary(&mut self) {
        if let Some(feature) = self.features.features.get(self.selected) {
            self.summary = format!(
                "{}\nEstimated forest cover: {}%\nClick for details.",
                feature.display_name(),
                feature.pct,
            );
        }
    }

    fn activate(&mut self) {
        if matches!(self.results, ResultsPane::Hidden) {
            self.click_selected_country();
            return;
        }
        let hit = match &self.results {
            ResultsPane::Hits(hits) => hits.get(self.result_selected).cloned(),
            _ => None,
        };
        if let Some(hit) = hit {
            self.locate_and_fetch(&hit);
        }
    }

    /// The click handler: resolve the identifier through the alias chain
    /// (done at load time) and hand off to the resolver.
    fn click_selected_country(&mut self) {
        let Some(feature) = self.features.features.get(self.selected) else {
            return;
        };
        self.resolver.fetch_details(
            feature.iso.as_deref(),
            DetailFallback {
                name: Some(feature.display_name()),
                pct: Some(feature.pct),
                properties: &feature.properties,
            },
        );
    }

    /// A clicked search result pans the map to the feature's bounds and opens
    /// its details. An identifier we never loaded degrades to a plain detail
    /// fetch with no pan.
    fn locate_and_fetch(&mut self, hit: &SearchHit) {
        let iso = if hit.iso.is_empty() { None } else { Some(hit.iso.as_str()) };
        match iso.and_then(|iso| self.features.by_iso(iso)) {
            Some(feature) => {
                self.map.fit_bounds(feature.bounds);
                self.resolver.fetch_details(
                    feature.iso.as_deref(),
                    DetailFallback {
                        name: Some(feature.display_name()),
                        pct: Some(feature.pct),
                        properties: &feature.properties,
                    },
                );
            }
            None => {
                warn!(iso = %hit.iso, name = %hit.name, "search hit not in loaded features");
                let props = serde_json::json!({ "name": hit.name.clone() });
                self.resolver.fetch_details(
                    iso,
                    DetailFallback {
                        name: Some(hit.name.as_str()),
                        pct: None,
                        properties: &props,
                    },
                );
            }
        }
    }

    /// Leaving the results list is the hover-end path: with nothing selected
    /// the summary reverts to the prompt and the detail panel hides.
    fn close_results(&mut self) {
        self.results = ResultsPane::Hidden;
        if self.resolver.last_selected.is_none() {
            self.summary = DEFAULT_PROMPT.to_string();
            self.detail = None;
        }
    }
}
