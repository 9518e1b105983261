use crate::config::{MapView, TileSource, MAX_ZOOM};
use crate::feed::EarthquakeFeature;
use crate::style::{FeatureStyler, LegendEntry, Popup, Style};
use anyhow::{ensure, Result};
use rayon::prelude::*;
use serde::Serialize;

const ATTRIBUTION: &str = "Map data &copy; <a href=\"https://www.openstreetmap.org/\">OpenStreetMap</a> contributors, \
<a href=\"https://creativecommons.org/licenses/by-sa/2.0/\">CC-BY-SA</a>, Imagery \u{a9} <a href=\"https://www.mapbox.com/\">Mapbox</a>";

/// Name of the earthquake overlay in the layer control
pub const OVERLAY_NAME: &str = "Earthquakes";

/// Which basemap look a base layer stands for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseStyle {
    Satellite,
    Dark,
}

/// Options of one raster tile layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayer {
    #[serde(skip)]
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
    /// Provider style identifier substituted for `{id}`
    pub id: String,
    pub access_token: Option<String>,
}

/// A named, selectable background layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseLayer {
    pub name: String,
    pub style: BaseStyle,
    pub tiles: TileLayer,
}

/// A circle marker for one earthquake
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: f64,
    pub style: Style,
    pub popup: Popup,
}

/// The togglable earthquake layer
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLayer {
    pub name: String,
    pub markers: Vec<Marker>,
}

/// Corner a control is pinned to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    TopRight,
    BottomRight,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::TopRight => "topright",
            Position::BottomRight => "bottomright",
        }
    }
}

/// Layer switcher listing base layers and overlays
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerControl {
    pub base_layers: Vec<String>,
    pub overlays: Vec<String>,
    pub collapsed: bool,
    pub position: Position,
}

/// Color key for the magnitude buckets
#[derive(Clone, Debug, PartialEq)]
pub struct LegendControl {
    pub title: String,
    pub position: Position,
    pub entries: Vec<LegendEntry>,
}

impl LegendControl {
    /// Static markup placed inside the `info legend` div
    pub fn markup(&self) -> String {
        let mut html = format!("<p>{}</p><hr>", self.title);
        for entry in &self.entries {
            html.push_str(&entry.markup());
        }
        html
    }
}

/// A composed map: view, layers and controls
#[derive(Clone, Debug, PartialEq)]
pub struct MapHandle {
    pub view: MapView,
    pub base_layers: Vec<BaseLayer>,
    pub overlay: OverlayLayer,
    pub control: LayerControl,
    pub legend: Option<LegendControl>,
    active_base: usize,
    overlay_visible: bool,
}

impl MapHandle {
    pub fn active_base_layer(&self) -> &BaseLayer {
        &self.base_layers[self.active_base]
    }

    pub fn active_base_index(&self) -> usize {
        self.active_base
    }

    /// Switch base layers; out-of-range indexes are ignored
    pub fn select_base_layer(&mut self, index: usize) {
        if index < self.base_layers.len() {
            self.active_base = index;
        }
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn toggle_overlay(&mut self) {
        self.overlay_visible = !self.overlay_visible;
    }

    pub fn add_legend(&mut self, legend: LegendControl) {
        self.legend = Some(legend);
    }
}

/// One styled marker per feature
pub fn build_overlay(features: &[EarthquakeFeature], styler: &FeatureStyler) -> OverlayLayer {
    let markers = features
        .par_iter()
        .map(|feature| Marker {
            latitude: feature.latitude,
            longitude: feature.longitude,
            magnitude: feature.magnitude_or_nan(),
            style: styler.style_for_feature(feature),
            popup: styler.popup(feature),
        })
        .collect();

    OverlayLayer {
        name: OVERLAY_NAME.to_string(),
        markers,
    }
}

/// Satellite and dark base layers on the same tile template
pub fn build_base_layers(tiles: &TileSource) -> Vec<BaseLayer> {
    let layer = |name: &str, style: BaseStyle, id: &str| BaseLayer {
        name: name.to_string(),
        style,
        tiles: TileLayer {
            url_template: tiles.url_template.clone(),
            attribution: ATTRIBUTION.to_string(),
            max_zoom: MAX_ZOOM,
            id: id.to_string(),
            access_token: tiles.access_token.clone(),
        },
    };

    vec![
        layer("Satellite", BaseStyle::Satellite, "mapbox.streets-satellite"),
        layer("Dark", BaseStyle::Dark, "mapbox.dark"),
    ]
}

/// Map with the first base layer and the overlay shown, plus an expanded
/// layer control. At least one base layer is required.
pub fn compose_map(base_layers: Vec<BaseLayer>, overlay: OverlayLayer, view: MapView) -> Result<MapHandle> {
    ensure!(!base_layers.is_empty(), "a map needs at least one base layer");

    let control = LayerControl {
        base_layers: base_layers.iter().map(|l| l.name.clone()).collect(),
        overlays: vec![overlay.name.clone()],
        collapsed: false,
        position: Position::TopRight,
    };

    Ok(MapHandle {
        view,
        base_layers,
        overlay,
        control,
        legend: None,
        active_base: 0,
        overlay_visible: true,
    })
}

pub fn build_legend(styler: &FeatureStyler) -> LegendControl {
    LegendControl {
        title: "Magnitude".to_string(),
        position: Position::BottomRight,
        entries: styler.legend_entries(),
    }
}
