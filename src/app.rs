use crate::map::{marker_dots, Lod, MapHandle, MapRenderer, Marker, PointGrid, Viewport};
use glam::DVec2;

/// Grid cell size for marker hit-testing, in degrees
const HIT_GRID_CELL: f64 = 1.0;

/// Extra dots of slack around a marker when clicking
const HIT_SLACK: f64 = 1.0;

/// Viewer state
pub struct App {
    pub viewport: Viewport,
    pub map: MapHandle,
    pub map_renderer: MapRenderer,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for the cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Index of the marker whose popup is open
    pub open_popup: Option<usize>,
    /// Whether the mouse moved since the button went down
    dragged: bool,
    marker_grid: PointGrid,
}

/// Braille dot grid for a terminal size, minus border and status bar
fn canvas_dots(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3);
    (inner_width * 2, inner_height * 4)
}

/// Terminal cell to braille dot, accounting for the 1-cell border
fn cell_to_dot(col: u16, row: u16) -> (i32, i32) {
    let px = (col.saturating_sub(1) as i32) * 2;
    let py = (row.saturating_sub(1) as i32) * 4;
    (px, py)
}

impl App {
    pub fn new(map: MapHandle, map_renderer: MapRenderer, width: usize, height: usize) -> Self {
        let (dots_w, dots_h) = canvas_dots(width, height);
        let marker_grid = PointGrid::build(
            map.overlay.markers.iter().map(|m| (m.longitude, m.latitude)),
            HIT_GRID_CELL,
        );

        Self {
            viewport: Viewport::from_view(&map.view, dots_w, dots_h),
            map,
            map_renderer,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            open_popup: None,
            dragged: false,
            marker_grid,
        }
    }

    /// Update viewport size when the terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (dots_w, dots_h) = canvas_dots(width, height);
        self.viewport.width = dots_w;
        self.viewport.height = dots_h;
    }

    /// Back to the composed center and zoom
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::from_view(&self.map.view, self.viewport.width, self.viewport.height);
        self.open_popup = None;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a terminal column/row
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_dot(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_dot(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    pub fn select_base_layer(&mut self, index: usize) {
        self.map.select_base_layer(index);
    }

    pub fn toggle_overlay(&mut self) {
        self.map.toggle_overlay();
        if !self.map.overlay_visible() {
            self.open_popup = None;
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("z{:.0}", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.2}°{}, {:.2}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn lod_level(&self) -> &'static str {
        Lod::from_zoom(self.viewport.zoom).label()
    }

    pub fn popup_marker(&self) -> Option<&Marker> {
        self.open_popup.and_then(|i| self.map.overlay.markers.get(i))
    }

    pub fn mouse_down(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Pan by the mouse delta since the last drag event
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (last_x as i32 - col as i32) * 2;
            let dy = (last_y as i32 - row as i32) * 4;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx, dy);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Button released: a click without a drag opens or closes a popup
    pub fn mouse_up(&mut self, col: u16, row: u16) {
        if !self.dragged {
            self.click(col, row);
        }
        self.last_mouse = None;
        self.dragged = false;
    }

    /// Open the popup of the marker under the cell, or close the open one
    pub fn click(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_dot(col, row);
        self.open_popup = self.marker_at(px, py);
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Mouse position in braille dots (for the cursor marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.map(|(col, row)| cell_to_dot(col, row))
    }

    /// Nearest visible marker whose disc covers the dot
    pub fn marker_at(&self, px: i32, py: i32) -> Option<usize> {
        if !self.map.overlay_visible() {
            return None;
        }

        // A terminal cell spans 2x4 dots; test against its center
        let target = DVec2::new(px as f64 + 1.0, py as f64 + 2.0);
        let (lon, lat) = self.viewport.unproject(px, py);

        let largest = self
            .map
            .overlay
            .markers
            .iter()
            .filter_map(|m| marker_dots(m.style.radius))
            .max()
            .unwrap_or(0) as f64;
        let reach = self.viewport.dots_to_degrees(largest + HIT_SLACK + 4.0);

        self.marker_grid
            .query_radius(lon, lat, reach)
            .into_iter()
            .filter_map(|idx| {
                let marker = &self.map.overlay.markers[idx];
                let radius = marker_dots(marker.style.radius)? as f64;
                let (mx, my) = self.viewport.project(marker.longitude, marker.latitude);
                let distance = DVec2::new(mx as f64, my as f64).distance(target);
                (distance <= radius + HIT_SLACK + 2.0).then_some((idx, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx)
    }
}
