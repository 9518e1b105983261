pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod feed;
pub mod html;
pub mod map;
pub mod style;
pub mod ui;

use anyhow::Result;
use config::Config;
use feed::EarthquakeFeature;
use map::{build_base_layers, build_legend, build_overlay, compose_map, MapHandle};
use style::FeatureStyler;

/// Style the features and compose the full map for a configuration
pub fn build_map(config: &Config, features: &[EarthquakeFeature]) -> Result<MapHandle> {
    let styler = FeatureStyler::new(config.palette.clone());
    let overlay = build_overlay(features, &styler);
    let mut map = compose_map(build_base_layers(&config.tiles), overlay, config.view)?;
    if config.show_legend {
        map.add_legend(build_legend(&styler));
    }
    Ok(map)
}
