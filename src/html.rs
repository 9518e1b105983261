use crate::map::{MapHandle, TileLayer};
use crate::style::Style;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::json;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

const LEGEND_CSS: &str = "html, body, #map { height: 100%; margin: 0; }
.info { padding: 6px 8px; background: rgba(255, 255, 255, 0.85); border-radius: 5px; box-shadow: 0 0 15px rgba(0, 0, 0, 0.2); }
.legend { line-height: 18px; color: #555; }
.legend i { width: 18px; height: 18px; float: left; margin-right: 8px; opacity: 0.9; }
.legend p { margin: 0; font-weight: bold; }";

const SCRIPT: &str = r#"
var page = JSON.parse(document.getElementById("map-data").textContent);

var baseMaps = {};
page.baseLayers.forEach(function (layer) {
  baseMaps[layer.name] = L.tileLayer(page.tileUrl, layer.options);
});

var overlay = L.layerGroup(page.overlay.markers.map(function (marker) {
  return L.circleMarker([marker.lat, marker.lon], marker.style).bindPopup(marker.popup);
}));
var overlayMaps = {};
overlayMaps[page.overlay.name] = overlay;

var defaults = [baseMaps[page.activeBase]];
if (page.overlay.visible) {
  defaults.push(overlay);
}

var myMap = L.map("map", { center: page.center, zoom: page.zoom, layers: defaults });

L.control.layers(baseMaps, overlayMaps, { collapsed: page.control.collapsed, position: page.control.position }).addTo(myMap);

if (page.legend) {
  var legend = L.control({ position: page.legend.position });
  legend.onAdd = function () {
    var div = L.DomUtil.create("div", "info legend");
    div.innerHTML = page.legend.markup;
    return div;
  };
  legend.addTo(myMap);
}
"#;

#[derive(Serialize)]
struct NamedTiles<'a> {
    name: &'a str,
    options: &'a TileLayer,
}

#[derive(Serialize)]
struct MarkerData<'a> {
    lat: f64,
    lon: f64,
    style: &'a Style,
    popup: String,
}

/// Page data consumed by the embedded script
fn page_data(map: &MapHandle) -> Result<serde_json::Value> {
    let tile_url = match map.base_layers.first() {
        Some(layer) => &layer.tiles.url_template,
        None => bail!("map has no base layers"),
    };
    if let Some(layer) = map.base_layers.iter().find(|l| l.tiles.access_token.is_none()) {
        bail!(
            "base layer {:?} has no access token; set MAPBOX_ACCESS_TOKEN or pass --access-token",
            layer.name
        );
    }

    let base_layers: Vec<_> = map
        .base_layers
        .iter()
        .map(|l| NamedTiles {
            name: &l.name,
            options: &l.tiles,
        })
        .collect();

    let markers: Vec<_> = map
        .overlay
        .markers
        .iter()
        .map(|m| MarkerData {
            lat: m.latitude,
            lon: m.longitude,
            style: &m.style,
            popup: m.popup.to_html(),
        })
        .collect();

    Ok(json!({
        "tileUrl": tile_url,
        "baseLayers": base_layers,
        "activeBase": map.active_base_layer().name,
        "overlay": {
            "name": map.overlay.name,
            "visible": map.overlay_visible(),
            "markers": markers,
        },
        "center": [map.view.center_lat, map.view.center_lon],
        "zoom": map.view.zoom,
        "control": {
            "collapsed": map.control.collapsed,
            "position": map.control.position.as_str(),
        },
        "legend": map.legend.as_ref().map(|legend| json!({
            "position": legend.position.as_str(),
            "markup": legend.markup(),
        })),
    }))
}

/// Render the whole page. Fails when a base layer lacks its access token.
pub fn render_html(map: &MapHandle) -> Result<String> {
    let data = page_data(map)?;
    let json = serde_json::to_string(&data).context("serializing map data")?;
    // Popups carry raw markup; keep it from closing the data block early
    let json = json.replace("</", "<\\/");

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Earthquakes</title>
<link rel="stylesheet" href="{LEAFLET_CSS}">
<style>
{LEGEND_CSS}
</style>
</head>
<body>
<div id="map"></div>
<script id="map-data" type="application/json">{json}</script>
<script src="{LEAFLET_JS}"></script>
<script>{SCRIPT}</script>
</body>
</html>
"#
    ))
}
