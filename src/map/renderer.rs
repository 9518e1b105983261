use crate::braille::BrailleCanvas;
use crate::map::composer::{MapHandle, Marker};
use crate::map::geometry::{draw_disc, draw_dot, draw_line};
use crate::map::projection::{Viewport, PIXELS_PER_DOT};
use crate::style::{Palette, Rgb};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for basemap data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD from a web zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 3.0 {
            Lod::Low
        } else if zoom < 6.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Markers sharing one fill color
pub struct MarkerLayer {
    pub color: Rgb,
    /// Highest magnitude bucket drawn here; layers are ordered by it
    pub bucket: usize,
    pub canvas: BrailleCanvas,
}

/// Rendered canvases, back to front
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub markers: Vec<MarkerLayer>,
}

/// Braille radius for a marker radius in screen pixels.
/// `None` for zero, negative or NaN radii; `Some(0)` means a single dot.
pub fn marker_dots(radius: f64) -> Option<i32> {
    if radius > 0.0 {
        Some((radius / PIXELS_PER_DOT).round() as i32)
    } else {
        None
    }
}

/// Basemap vector data plus the marker drawing pass
#[derive(Default)]
pub struct MapRenderer {
    pub coastlines_low: Vec<LineString>,
    pub coastlines_medium: Vec<LineString>,
    pub coastlines_high: Vec<LineString>,
    pub borders_medium: Vec<LineString>,
    pub borders_high: Vec<LineString>,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coastlines for the LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let tiers = [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low];
        let skip = match lod {
            Lod::High => 0,
            Lod::Medium => 1,
            Lod::Low => 2,
        };
        tiers
            .into_iter()
            .skip(skip)
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.borders_high.is_empty() => &self.borders_high,
            _ => &self.borders_medium,
        }
    }

    /// Render basemap and, if visible, the overlay markers
    pub fn render(&self, map: &MapHandle, cols: usize, rows: usize, viewport: &Viewport) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);

        let mut coastlines = BrailleCanvas::new(cols, rows);
        for line in self.coastlines(lod) {
            draw_linestring(&mut coastlines, line, viewport);
        }

        let mut borders = BrailleCanvas::new(cols, rows);
        for line in self.borders(lod) {
            draw_linestring(&mut borders, line, viewport);
        }

        let markers = if map.overlay_visible() {
            render_markers(&map.overlay.markers, cols, rows, viewport)
        } else {
            Vec::new()
        };

        MapLayers {
            coastlines,
            borders,
            markers,
        }
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty() || !self.coastlines_medium.is_empty() || !self.coastlines_high.is_empty()
    }
}

/// One canvas per fill color, weakest first so strong quakes end up on top
fn render_markers(markers: &[Marker], cols: usize, rows: usize, viewport: &Viewport) -> Vec<MarkerLayer> {
    let mut layers: Vec<MarkerLayer> = Vec::new();

    for marker in markers {
        let Some(radius) = marker_dots(marker.style.radius) else {
            continue;
        };
        let (px, py) = viewport.project(marker.longitude, marker.latitude);
        if !viewport.is_visible(px, py) {
            continue;
        }

        let bucket = Palette::bucket(marker.magnitude);
        let layer = match layers.iter().position(|l| l.color == marker.style.fill_color) {
            Some(i) => &mut layers[i],
            None => {
                layers.push(MarkerLayer {
                    color: marker.style.fill_color,
                    bucket,
                    canvas: BrailleCanvas::new(cols, rows),
                });
                let last = layers.len() - 1;
                &mut layers[last]
            }
        };
        layer.bucket = layer.bucket.max(bucket);

        if radius == 0 {
            draw_dot(&mut layer.canvas, px, py);
        } else {
            draw_disc(&mut layer.canvas, px, py, radius);
        }
    }

    layers.sort_by_key(|l| l.bucket);
    layers
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            // Skip segments that wrap across the antimeridian
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as f64;
            if dist < viewport.world_size() / 2.0 && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapView, TileSource};
    use crate::feed::EarthquakeFeature;
    use crate::map::composer::{build_base_layers, build_overlay, compose_map};
    use crate::style::FeatureStyler;

    fn map_with(quakes: &[(f64, f64, f64)]) -> MapHandle {
        let features: Vec<_> = quakes
            .iter()
            .map(|&(magnitude, longitude, latitude)| EarthquakeFeature {
                magnitude: Some(magnitude),
                place: Some("somewhere".to_string()),
                longitude,
                latitude,
            })
            .collect();
        let overlay = build_overlay(&features, &FeatureStyler::default());
        compose_map(build_base_layers(&TileSource::default()), overlay, MapView::default()).unwrap()
    }

    #[test]
    fn test_marker_dots() {
        assert_eq!(marker_dots(14.7), Some(4));
        assert_eq!(marker_dots(1.0), Some(0));
        assert_eq!(marker_dots(0.0), None);
        assert_eq!(marker_dots(-3.5), None);
        assert_eq!(marker_dots(f64::NAN), None);
    }

    #[test]
    fn test_markers_grouped_and_ordered() {
        let view = MapView::default();
        let map = map_with(&[
            (5.5, view.center_lon, view.center_lat),
            (0.5, view.center_lon + 1.0, view.center_lat),
            (0.8, view.center_lon - 1.0, view.center_lat),
        ]);
        let viewport = Viewport::from_view(&map.view, 160, 96);
        let layers = MapRenderer::new().render(&map, 80, 24, &viewport);

        assert_eq!(layers.markers.len(), 2);
        assert_eq!(layers.markers[0].color.to_string(), "#98ee00");
        assert_eq!(layers.markers[1].color.to_string(), "#d11919");
        assert!(layers.markers.iter().all(|l| l.canvas.lit_cells().count() > 0));
    }

    #[test]
    fn test_huge_magnitude_fills_canvas() {
        let view = MapView::default();
        let map = map_with(&[(1e5, view.center_lon, view.center_lat)]);
        let viewport = Viewport::from_view(&map.view, 160, 96);
        let layers = MapRenderer::new().render(&map, 80, 24, &viewport);

        assert_eq!(layers.markers.len(), 1);
        let canvas = &layers.markers[0].canvas;
        assert_eq!(canvas.lit_cells().count(), 80 * 24);
        assert!(canvas.lit_cells().all(|(_, _, ch)| ch == '⣿'));
    }

    #[test]
    fn test_hidden_overlay_draws_no_markers() {
        let view = MapView::default();
        let mut map = map_with(&[(4.0, view.center_lon, view.center_lat)]);
        map.toggle_overlay();
        let viewport = Viewport::from_view(&map.view, 160, 96);
        let layers = MapRenderer::new().render(&map, 80, 24, &viewport);
        assert!(layers.markers.is_empty());
    }

    #[test]
    fn test_negative_magnitude_is_not_drawn() {
        let view = MapView::default();
        let map = map_with(&[(-0.8, view.center_lon, view.center_lat)]);
        let viewport = Viewport::from_view(&map.view, 160, 96);
        let layers = MapRenderer::new().render(&map, 80, 24, &viewport);
        assert!(layers.markers.is_empty());
    }

    #[test]
    fn test_coastline_lod_fallback() {
        let mut renderer = MapRenderer::new();
        assert!(!renderer.has_data());
        renderer.add_coastline(vec![(0.0, 0.0), (1.0, 1.0)], Lod::Low);
        assert!(renderer.has_data());
        assert_eq!(renderer.coastlines(Lod::High).len(), 1);
    }
}
