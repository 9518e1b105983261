use crate::feed::FeedSource;
use crate::style::Palette;
use anyhow::{ensure, Result};
use std::path::PathBuf;

/// Tile URL template shared by every base layer
pub const DEFAULT_TILE_URL: &str =
    "https://api.tiles.mapbox.com/v4/{id}/{z}/{x}/{y}.png?access_token={accessToken}";

/// Highest zoom level the tile provider serves
pub const MAX_ZOOM: u8 = 16;

/// Initial map view
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

impl Default for MapView {
    /// San Francisco at regional zoom
    fn default() -> Self {
        Self {
            center_lat: 37.7577627,
            center_lon: -122.4727052,
            zoom: 6,
        }
    }
}

/// Tile provider settings injected into the base layers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileSource {
    pub url_template: String,
    /// Provider credential; never generated or checked here
    pub access_token: Option<String>,
}

impl Default for TileSource {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_TILE_URL.to_string(),
            access_token: None,
        }
    }
}

/// Everything the fetch and composition steps need
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub feed: FeedSource,
    pub tiles: TileSource,
    pub view: MapView,
    pub palette: Palette,
    pub show_legend: bool,
    /// Directory holding Natural Earth GeoJSON for the terminal basemap
    pub data_dir: PathBuf,
}

impl Config {
    /// Check values that clap cannot range-check on its own
    pub fn validate(&self) -> Result<()> {
        let view = &self.view;
        ensure!(
            (-90.0..=90.0).contains(&view.center_lat),
            "center latitude {} is outside -90..=90",
            view.center_lat
        );
        ensure!(
            (-180.0..=180.0).contains(&view.center_lon),
            "center longitude {} is outside -180..=180",
            view.center_lon
        );
        ensure!(view.zoom <= MAX_ZOOM, "zoom {} is above the maximum of {MAX_ZOOM}", view.zoom);
        ensure!(!self.tiles.url_template.is_empty(), "tile URL template is empty");
        Ok(())
    }
}
