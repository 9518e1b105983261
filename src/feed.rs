use anyhow::{bail, Context, Result};
use geojson::{GeoJson, Value};
use reqwest::Client;
use std::path::PathBuf;
use tracing::{debug, info};

/// USGS summary feed: all earthquakes from the past week
pub const USGS_ALL_WEEK_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson";

/// One earthquake event as delivered by the feed
#[derive(Clone, Debug, PartialEq)]
pub struct EarthquakeFeature {
    /// `properties.mag`; the feed sends `null` for unrated events
    pub magnitude: Option<f64>,
    /// `properties.place`
    pub place: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
}

impl EarthquakeFeature {
    /// Magnitude for styling; a missing value behaves like NaN
    pub fn magnitude_or_nan(&self) -> f64 {
        self.magnitude.unwrap_or(f64::NAN)
    }
}

/// Where the feed comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedSource {
    Url(String),
    File(PathBuf),
}

impl Default for FeedSource {
    fn default() -> Self {
        FeedSource::Url(USGS_ALL_WEEK_URL.to_string())
    }
}

/// Load features from either source
pub async fn load_feed(client: &Client, source: &FeedSource) -> Result<Vec<EarthquakeFeature>> {
    match source {
        FeedSource::Url(url) => fetch_feed(client, url).await,
        FeedSource::File(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            parse_feed(bytes)
        }
    }
}

/// Issue one GET against the feed and decode the response
pub async fn fetch_feed(client: &Client, url: &str) -> Result<Vec<EarthquakeFeature>> {
    info!(url, "fetching earthquake feed");
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()
        .with_context(|| format!("feed {url} returned an error status"))?;
    let bytes = response.bytes().await.context("reading feed body")?;
    debug!(bytes = bytes.len(), "feed body received");
    parse_feed(bytes.to_vec())
}

/// Decode a GeoJSON FeatureCollection into earthquake features.
/// Features without a usable Point geometry are skipped.
pub fn parse_feed(mut bytes: Vec<u8>) -> Result<Vec<EarthquakeFeature>> {
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes).context("decoding feed GeoJSON")?;

    let GeoJson::FeatureCollection(fc) = geojson else {
        bail!("feed is not a GeoJSON FeatureCollection");
    };

    let total = fc.features.len();
    let features: Vec<EarthquakeFeature> = fc
        .features
        .into_iter()
        .filter_map(|feature| {
            let coords = match feature.geometry.as_ref().map(|g| &g.value) {
                Some(Value::Point(coords)) if coords.len() >= 2 => (coords[0], coords[1]),
                _ => {
                    debug!(id = ?feature.id, "skipping feature without point geometry");
                    return None;
                }
            };

            let props = feature.properties.as_ref();
            let magnitude = props.and_then(|p| p.get("mag")).and_then(|v| v.as_f64());
            let place = props
                .and_then(|p| p.get("place"))
                .and_then(|v| v.as_str())
                .map(str::to_string);

            Some(EarthquakeFeature {
                magnitude,
                place,
                longitude: coords.0,
                latitude: coords.1,
            })
        })
        .collect();

    info!(total, kept = features.len(), "decoded earthquake feed");
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "metadata": {"title": "USGS All Earthquakes, Past Week"},
        "features": [
            {
                "type": "Feature",
                "properties": {"mag": 4.2, "place": "10km N of Somewhere, CA"},
                "geometry": {"type": "Point", "coordinates": [-121.5, 36.8, 7.3]},
                "id": "nc1"
            },
            {
                "type": "Feature",
                "properties": {"mag": null, "place": null},
                "geometry": {"type": "Point", "coordinates": [150.0, -5.0]},
                "id": "us2"
            },
            {
                "type": "Feature",
                "properties": {"mag": 2.0, "place": "nowhere"},
                "geometry": null,
                "id": "ak3"
            }
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let features = parse_feed(SAMPLE.as_bytes().to_vec()).unwrap();
        assert_eq!(features.len(), 2);

        let first = &features[0];
        assert_eq!(first.magnitude, Some(4.2));
        assert_eq!(first.place.as_deref(), Some("10km N of Somewhere, CA"));
        // GeoJSON coordinates are [lon, lat, depth]
        assert_eq!(first.longitude, -121.5);
        assert_eq!(first.latitude, 36.8);

        let second = &features[1];
        assert_eq!(second.magnitude, None);
        assert_eq!(second.place, None);
        assert!(second.magnitude_or_nan().is_nan());
    }

    #[test]
    fn test_rejects_non_collection() {
        let point = r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#;
        assert!(parse_feed(point.as_bytes().to_vec()).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_feed(b"not json".to_vec()).is_err());
    }

    #[test]
    fn test_default_source_is_usgs_week() {
        assert_eq!(FeedSource::default(), FeedSource::Url(USGS_ALL_WEEK_URL.to_string()));
    }
}
