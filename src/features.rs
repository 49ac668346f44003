//! Country features: GeoJSON loading, forest-cover percentages and the
//! threshold buckets used to color them.

use geo::{Area, BoundingRect, Geometry, MultiPolygon, Polygon, Rect};
use geojson::GeoJson;
use ratatui::style::Color;
use serde_json::Value;
use std::{fs, str::FromStr};
use thiserror::Error;
use tracing::debug;

/// Property keys checked, in order, for the country identifier.
const ISO_ALIASES: [&str; 4] = ["iso_a2", "ISO_A2", "iso", "ADM0_A3"];

#[derive(Error, Debug)]
pub enum DataError {
    #[error("GeoJSON not found at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("GeoJSON document is not a FeatureCollection")]
    NotACollection,
}

/// One country polygon plus the properties the UI cares about.
pub struct CountryFeature {
    pub name: String,
    pub iso: Option<String>,
    /// Forest-cover percentage, 0..=100. Assigned exactly once at load time.
    pub pct: f64,
    pub geometry: MultiPolygon<f64>,
    pub bounds: Rect<f64>,
    /// Original property bag, kept as the detail-panel fallback payload.
    pub properties: Value,
}

impl CountryFeature {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { "Unknown" } else { &self.name }
    }
}

#[derive(Default)]
pub struct FeatureSet {
    pub features: Vec<CountryFeature>,
}

impl FeatureSet {
    /// Loads the country polygons from a GeoJSON FeatureCollection and
    /// guarantees every feature ends up with a percentage: values present in
    /// the data are coerced, missing ones are derived from the name hash.
    pub fn load(path: &str) -> Result<Self, DataError> {
        let txt = fs::read_to_string(path).map_err(|source| DataError::Read {
            path: path.to_string(),
            source,
        })?;
        let raw = GeoJson::from_str(&txt)?;
        let GeoJson::FeatureCollection(fc) = raw else {
            return Err(DataError::NotACollection);
        };

        let mut features = Vec::new();
        for feature in fc.features {
            let props = feature.properties.unwrap_or_default();

            let name = props
                .get("name")
                .or_else(|| props.get("ADMIN"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let iso = extract_iso(&props);
            let pct = props
                .get("forest_pct")
                .and_then(coerce_pct)
                .unwrap_or_else(|| synthetic_pct(&name));

            let Some(gj) = feature.geometry else { continue };
            let geom: Geometry<f64> = gj.value.try_into()?;
            let mp = match geom {
                Geometry::Polygon(p) => p.into(),
                Geometry::MultiPolygon(m) => m,
                _ => continue,
            };
            let mp = drop_small_fragments(mp);
            let Some(bounds) = mp.bounding_rect() else { continue };

            debug!(name = %name, iso = iso.as_deref().unwrap_or(""), pct, "loaded feature");
            features.push(CountryFeature {
                name,
                iso,
                pct,
                geometry: mp,
                bounds,
                properties: Value::Object(props),
            });
        }

        Ok(Self { features })
    }

    pub fn by_iso(&self, iso: &str) -> Option<&CountryFeature> {
        self.features.iter().find(|f| f.iso.as_deref() == Some(iso))
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

/// Resolves the country identifier from the property bag, trying each known
/// alias in order.
pub fn extract_iso(props: &serde_json::Map<String, Value>) -> Option<String> {
    ISO_ALIASES
        .iter()
        .find_map(|key| props.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

/// Coerces a `forest_pct` property to a number. String values have everything
/// but digits and dots stripped before parsing ("34.5%" -> 34.5).
pub fn coerce_pct(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

/// Stable demo percentage for features that carry no `forest_pct`.
///
/// Rolling hash over the UTF-16 units of the lower-cased name,
/// `h = (h << 5) - h + unit`, with the shift wrapping at 32 bits, reduced to
/// `10 + |h % 80|`. The same name always yields the same value in [10, 89].
pub fn synthetic_pct(name: &str) -> f64 {
    let lower = name.to_lowercase();
    let mut h: i64 = 0;
    for unit in lower.encode_utf16() {
        h = (((h as i32).wrapping_shl(5)) as i64) - h + i64::from(unit);
    }
    (10 + (h % 80).abs()) as f64
}

/// Fill-color bucket for a forest-cover percentage. The three thresholds
/// partition the whole numeric range; `Unknown` covers an absent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverBucket {
    Dark,
    Medium,
    Light,
    Unknown,
}

impl CoverBucket {
    pub fn from_pct(pct: Option<f64>) -> Self {
        match pct {
            None => Self::Unknown,
            Some(p) if p > 50.0 => Self::Dark,
            Some(p) if p > 20.0 => Self::Medium,
            Some(_) => Self::Light,
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Dark => Color::Rgb(0x00, 0x44, 0x1b),
            Self::Medium => Color::Rgb(0x2e, 0x8b, 0x57),
            Self::Light => Color::Rgb(0x98, 0xfb, 0x98),
            Self::Unknown => Color::Rgb(0xcc, 0xcc, 0xcc),
        }
    }
}

/// Keeps only polygons whose area is at least 20% of the largest one, so a
/// country's outlying islets don't clutter the canvas.
fn drop_small_fragments(mp: MultiPolygon<f64>) -> MultiPolygon<f64> {
    if mp.0.len() <= 1 {
        return mp;
    }
    let areas: Vec<f64> = mp.0.iter().map(Polygon::unsigned_area).collect();
    let max_area = areas.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let threshold = max_area * 0.20;
    let filtered: Vec<Polygon<f64>> = mp
        .0
        .into_iter()
        .zip(areas)
        .filter(|(_, area)| *area >= threshold)
        .map(|(poly, _)| poly)
        .collect();
    MultiPolygon(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn synthetic_pct_is_deterministic_and_in_range() {
        let names = [
            "Brazil",
            "United States of America",
            "India",
            "Côte d'Ivoire",
            "japan",
            "",
        ];
        for name in names {
            let a = synthetic_pct(name);
            let b = synthetic_pct(name);
            assert_eq!(a, b, "unstable value for {:?}", name);
            assert!((10.0..=89.0).contains(&a), "{:?} -> {}", name, a);
        }
    }

    #[test]
    fn synthetic_pct_is_case_insensitive() {
        assert_eq!(synthetic_pct("Brazil"), synthetic_pct("BRAZIL"));
    }

    #[test]
    fn buckets_partition_the_range() {
        assert_eq!(CoverBucket::from_pct(Some(50.1)), CoverBucket::Dark);
        assert_eq!(CoverBucket::from_pct(Some(100.0)), CoverBucket::Dark);
        assert_eq!(CoverBucket::from_pct(Some(50.0)), CoverBucket::Medium);
        assert_eq!(CoverBucket::from_pct(Some(20.1)), CoverBucket::Medium);
        assert_eq!(CoverBucket::from_pct(Some(20.0)), CoverBucket::Light);
        assert_eq!(CoverBucket::from_pct(Some(0.0)), CoverBucket::Light);
        assert_eq!(CoverBucket::from_pct(None), CoverBucket::Unknown);
    }

    #[test]
    fn bucket_colors_match_the_palette() {
        assert_eq!(CoverBucket::Dark.color(), Color::Rgb(0x00, 0x44, 0x1b));
        assert_eq!(CoverBucket::Unknown.color(), Color::Rgb(0xcc, 0xcc, 0xcc));
    }

    #[test]
    fn coerce_pct_handles_numbers_and_strings() {
        assert_eq!(coerce_pct(&json!(42)), Some(42.0));
        assert_eq!(coerce_pct(&json!(34.5)), Some(34.5));
        assert_eq!(coerce_pct(&json!("34.5%")), Some(34.5));
        assert_eq!(coerce_pct(&json!("about 17 percent")), Some(17.0));
        assert_eq!(coerce_pct(&json!("no digits here")), None);
        assert_eq!(coerce_pct(&json!(null)), None);
        assert_eq!(coerce_pct(&json!(["nope"])), None);
    }

    #[test]
    fn iso_aliases_are_checked_in_order() {
        let props = json!({"ADM0_A3": "BRA", "iso_a2": "BR"});
        let props = props.as_object().unwrap();
        assert_eq!(extract_iso(props), Some("BR".to_string()));

        let props = json!({"ADM0_A3": "BRA", "ISO_A2": "BR"});
        let props = props.as_object().unwrap();
        assert_eq!(extract_iso(props), Some("BR".to_string()));

        let props = json!({"ADM0_A3": "BRA"});
        let props = props.as_object().unwrap();
        assert_eq!(extract_iso(props), Some("BRA".to_string()));

        let props = json!({"name": "Atlantis"});
        let props = props.as_object().unwrap();
        assert_eq!(extract_iso(props), None);
    }

    fn write_temp(doc: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(doc.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_assigns_missing_percentages_from_the_name_hash() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"name": "Brazil", "iso_a2": "BR"},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [-60.0, -10.0], [-40.0, -10.0], [-40.0, 5.0], [-60.0, 5.0], [-60.0, -10.0]
                ]]}
            }]
        }"#;
        let file = write_temp(doc);
        let set = FeatureSet::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(set.len(), 1);
        let brazil = &set.features[0];
        assert_eq!(brazil.iso.as_deref(), Some("BR"));
        assert_eq!(brazil.pct, synthetic_pct("Brazil"));
        assert!((10.0..=89.0).contains(&brazil.pct));
        assert!(set.by_iso("BR").is_some());
        assert!(set.by_iso("US").is_none());
    }

    #[test]
    fn load_keeps_percentages_present_in_the_data() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"ADMIN": "Testland", "iso": "TL", "forest_pct": 63},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]
                ]]}
            }]
        }"#;
        let file = write_temp(doc);
        let set = FeatureSet::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(set.features[0].pct, 63.0);
        assert_eq!(set.features[0].display_name(), "Testland");
    }

    #[test]
    fn load_rejects_malformed_documents() {
        let file = write_temp("{ not geojson at all");
        assert!(matches!(
            FeatureSet::load(file.path().to_str().unwrap()),
            Err(DataError::Parse(_))
        ));

        let file = write_temp(r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#);
        assert!(matches!(
            FeatureSet::load(file.path().to_str().unwrap()),
            Err(DataError::NotACollection)
        ));

        assert!(matches!(
            FeatureSet::load("data/definitely-missing.json"),
            Err(DataError::Read { .. })
        ));
    }

    #[test]
    fn small_fragments_are_dropped() {
        use geo::polygon;
        let big = polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)
        ];
        let tiny = polygon![
            (x: 20.0, y: 20.0), (x: 20.1, y: 20.0), (x: 20.1, y: 20.1), (x: 20.0, y: 20.1)
        ];
        let filtered = drop_small_fragments(MultiPolygon(vec![big, tiny]));
        assert_eq!(filtered.0.len(), 1);
    }
}
