use crate::config::{MapView, MAX_ZOOM};
use std::f64::consts::PI;

/// Web map tile edge in screen pixels
pub const TILE_SIZE: f64 = 256.0;

/// Screen pixels covered by one braille dot (a cell is roughly 8x16 px)
pub const PIXELS_PER_DOT: f64 = 4.0;

/// Latitude limit of Web Mercator
const MAX_LAT: f64 = 85.051_128_78;

/// Normalized Web Mercator coordinates in [0, 1]
#[inline(always)]
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}

#[inline(always)]
fn inverse_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    (lon, lat)
}

/// Visible map area, using web-style zoom levels
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level, 0 shows the whole world in one tile
    pub zoom: f64,
    /// Canvas width in braille dots
    pub width: usize,
    /// Canvas height in braille dots
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Viewport for a configured map view
    pub fn from_view(view: &MapView, width: usize, height: usize) -> Self {
        Self::new(view.center_lon, view.center_lat, view.zoom as f64, width, height)
    }

    /// Width of the whole world in dots at the current zoom
    #[inline(always)]
    pub fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom) / PIXELS_PER_DOT
    }

    /// Pan the viewport by a dot delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let world = self.world_size();
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let (lon, lat) = inverse_mercator(cx + dx as f64 / world, cy + dy as f64 / world);

        self.center_lon = if lon > 180.0 {
            lon - 360.0
        } else if lon < -180.0 {
            lon + 360.0
        } else {
            lon
        };
        self.center_lat = lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1.0).min(MAX_ZOOM as f64);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - 1.0).max(0.0);
    }

    /// Zoom in keeping the point under (px, py) fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0);
    }

    /// Zoom out keeping the point under (px, py) fixed
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -1.0);
    }

    fn zoom_at(&mut self, px: i32, py: i32, step: f64) {
        let (lon, lat) = self.unproject(px, py);

        self.zoom = (self.zoom + step).clamp(0.0, MAX_ZOOM as f64);

        // Pan so the same coordinate lands back under the cursor
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Project a geographic coordinate (lon, lat) to dot coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = mercator(lon, lat);
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let world = self.world_size();

        let px = ((x - cx) * world + self.width as f64 / 2.0).floor();
        let py = ((y - cy) * world + self.height as f64 / 2.0).floor();
        (px as i32, py as i32)
    }

    /// Dot coordinates back to (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let world = self.world_size();

        let x = (px as f64 - self.width as f64 / 2.0) / world + cx;
        let y = (py as f64 - self.height as f64 / 2.0) / world + cy;
        inverse_mercator(x, y)
    }

    /// Degrees of longitude spanned by `dots` at the current zoom
    pub fn dots_to_degrees(&self, dots: f64) -> f64 {
        dots * 360.0 / self.world_size()
    }

    /// Check if a projected point is visible, with a small margin
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Rough bounding-box test for a line segment
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_configured_view_is_centered() {
        let vp = Viewport::from_view(&MapView::default(), 200, 120);
        assert_eq!(vp.zoom, 6.0);
        assert_eq!(vp.project(-122.4727052, 37.7577627), (100, 60));
    }

    #[test]
    fn test_unproject_roundtrip() {
        let vp = Viewport::new(-122.0, 37.0, 6.0, 200, 120);
        let (lon, lat) = vp.unproject(150, 30);
        let (px, py) = vp.project(lon, lat);
        assert!((px - 150).abs() <= 1);
        assert!((py - 30).abs() <= 1);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        vp.pan(0, -10);
        assert!(vp.center_lat > 0.0);
    }

    #[test]
    fn test_zoom_limits() {
        let mut vp = Viewport::new(0.0, 0.0, 16.0, 100, 100);
        vp.zoom_in();
        assert_eq!(vp.zoom, 16.0);

        vp.zoom = 0.0;
        vp.zoom_out();
        assert_eq!(vp.zoom, 0.0);
    }

    #[test]
    fn test_zoom_at_keeps_point_under_cursor() {
        let mut vp = Viewport::new(-122.0, 37.0, 5.0, 200, 120);
        let before = vp.unproject(40, 20);
        vp.zoom_in_at(40, 20);
        let (px, py) = vp.project(before.0, before.1);
        assert!((px - 40).abs() <= 2);
        assert!((py - 20).abs() <= 2);
    }
}
