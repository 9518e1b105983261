use crate::map::{Lod, MapRenderer};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const COASTLINE_FILES: [(&str, Lod); 4] = [
    ("ne_110m_coastline.json", Lod::Low),
    ("natural-earth.json", Lod::Medium),
    ("ne_50m_coastline.json", Lod::Medium),
    ("ne_10m_coastline.json", Lod::High),
];

const BORDER_FILES: [(&str, Lod); 2] = [("ne_50m_borders.json", Lod::Medium), ("ne_10m_borders.json", Lod::High)];

/// Load whatever basemap files exist in `data_dir`, then fall back to the
/// built-in outline if no coastline made it in.
pub fn load_basemap(renderer: &mut MapRenderer, data_dir: &Path) {
    if data_dir.exists() {
        for (filename, lod) in COASTLINE_FILES {
            load_if_present(data_dir, filename, |line| renderer.add_coastline(line, lod));
        }
        for (filename, lod) in BORDER_FILES {
            load_if_present(data_dir, filename, |line| renderer.add_border(line, lod));
        }
    } else {
        debug!(dir = %data_dir.display(), "no basemap directory");
    }

    if !renderer.has_data() {
        generate_simple_world(renderer);
    }
}

fn load_if_present<F>(data_dir: &Path, filename: &str, add_line: F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    let path = data_dir.join(filename);
    if !path.exists() {
        return;
    }
    match read_lines(&path, add_line) {
        Ok(count) => debug!(file = filename, lines = count, "loaded basemap layer"),
        Err(e) => warn!(file = filename, error = %e, "failed to load basemap layer"),
    }
}

/// Parse a GeoJSON file and feed every line/ring to `add_line`
fn read_lines<F>(path: &Path, mut add_line: F) -> Result<usize>
where
    F: FnMut(Vec<(f64, f64)>),
{
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content.parse()?;
    let mut count = 0;
    let mut counted = |line: Vec<(f64, f64)>| {
        count += 1;
        add_line(line);
    };
    process_geojson_lines(&geojson, &mut counted);
    Ok(count)
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                process_geometry_lines(geometry, add_line);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, add_line),
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    // Positions with fewer than two numbers are dropped
    let to_line = |coords: &Vec<Vec<f64>>| {
        coords
            .iter()
            .filter_map(|c| match c.as_slice() {
                [lon, lat, ..] => Some((*lon, *lat)),
                _ => None,
            })
            .collect::<Vec<_>>()
    };

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|l| add_line(to_line(l))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(to_line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Coarse continent outlines (lon, lat) used when no Natural Earth data loads
const SIMPLE_WORLD: [&[(f64, f64)]; 7] = [
    // North America
    &[
        (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-130.0, 55.0), (-125.0, 48.0),
        (-124.2, 42.0), (-124.4, 40.4), (-123.8, 39.0), (-122.5, 37.8), (-121.9, 36.6),
        (-120.6, 34.6), (-117.1, 32.5), (-110.0, 25.0), (-97.0, 25.0), (-97.0, 28.0),
        (-82.0, 24.0), (-80.0, 25.0), (-81.0, 31.0), (-75.0, 35.0), (-70.0, 41.0),
        (-67.0, 45.0), (-55.0, 47.0), (-58.0, 55.0), (-64.0, 60.0), (-80.0, 63.0),
        (-95.0, 62.0), (-110.0, 68.0), (-145.0, 70.0), (-168.0, 65.0),
    ],
    // South America
    &[
        (-80.0, 10.0), (-70.0, 5.0), (-50.0, 0.0), (-35.0, -5.0), (-38.0, -15.0),
        (-48.0, -25.0), (-58.0, -38.0), (-68.0, -50.0), (-75.0, -52.0), (-72.0, -40.0),
        (-70.0, -20.0), (-80.0, -5.0), (-80.0, 10.0),
    ],
    // Europe
    &[
        (-10.0, 36.0), (0.0, 38.0), (10.0, 44.0), (20.0, 40.0), (30.0, 40.0),
        (40.0, 43.0), (40.0, 55.0), (25.0, 65.0), (10.0, 71.0), (5.0, 58.0),
        (-10.0, 52.0), (-5.0, 43.0), (-10.0, 36.0),
    ],
    // Africa
    &[
        (-17.0, 15.0), (-15.0, 28.0), (-5.0, 35.0), (10.0, 37.0), (35.0, 30.0),
        (42.0, 12.0), (50.0, 12.0), (40.0, -5.0), (35.0, -25.0), (20.0, -35.0),
        (10.0, -15.0), (10.0, 0.0), (-10.0, 5.0), (-17.0, 15.0),
    ],
    // Asia
    &[
        (40.0, 43.0), (55.0, 37.0), (60.0, 25.0), (75.0, 15.0), (80.0, 8.0),
        (88.0, 22.0), (100.0, 14.0), (105.0, 10.0), (110.0, 20.0), (122.0, 25.0),
        (130.0, 35.0), (140.0, 40.0), (145.0, 50.0), (135.0, 55.0), (120.0, 40.0),
        (90.0, 50.0), (60.0, 55.0), (40.0, 43.0),
    ],
    // Japan
    &[(130.0, 31.0), (135.0, 34.0), (140.0, 35.0), (142.0, 40.0), (141.0, 45.0), (140.0, 41.0), (130.0, 31.0)],
    // Australia
    &[
        (115.0, -20.0), (130.0, -12.0), (140.0, -12.0), (150.0, -25.0), (153.0, -30.0),
        (145.0, -38.0), (135.0, -35.0), (115.0, -35.0), (115.0, -20.0),
    ],
];

/// Add the built-in outline at the lowest level of detail
pub fn generate_simple_world(renderer: &mut MapRenderer) {
    for outline in SIMPLE_WORLD {
        renderer.add_coastline(outline.to_vec(), Lod::Low);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dir_uses_fallback() {
        let mut renderer = MapRenderer::new();
        load_basemap(&mut renderer, Path::new("/nonexistent/quake-map-data"));
        assert!(renderer.has_data());
        assert_eq!(renderer.coastlines_low.len(), SIMPLE_WORLD.len());
    }

    #[test]
    fn test_geometry_lines() {
        let geojson: GeoJson = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"MultiLineString",
             "coordinates":[[[0,0],[1,1]],[[2,2],[3,3],[4,4]]]}},
            {"type":"Feature","properties":{},"geometry":{"type":"Polygon",
             "coordinates":[[[0,0],[1,0],[1,1],[0,0]],[[0.2,0.2],[0.4,0.2],[0.2,0.2]]]}},
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[5,5]}}
        ]}"#
        .parse()
        .unwrap();

        let mut lines = Vec::new();
        process_geojson_lines(&geojson, &mut |line| lines.push(line));
        // Two linestrings plus the polygon's exterior ring; points are ignored
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].len(), 3);
        assert_eq!(lines[2].len(), 4);
    }

    #[test]
    fn test_short_positions_are_skipped() {
        let geometry = Geometry::new(Value::LineString(vec![vec![0.0, 0.0], vec![1.0], vec![2.0, 2.0, 10.0]]));

        let mut lines = Vec::new();
        process_geometry_lines(&geometry, &mut |line| lines.push(line));
        assert_eq!(lines, vec![vec![(0.0, 0.0), (2.0, 2.0)]]);
    }
}
