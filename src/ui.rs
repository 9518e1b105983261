use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::map::{BaseStyle, LegendControl, MapHandle, MapLayers, Viewport};
use crate::style::Rgb;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

/// Basemap colors for a base layer
struct Theme {
    coastlines: Color,
    borders: Color,
}

impl Theme {
    fn for_style(style: BaseStyle) -> Self {
        match style {
            BaseStyle::Satellite => Theme {
                coastlines: Color::Green,
                borders: Color::Cyan,
            },
            BaseStyle::Dark => Theme {
                coastlines: Color::DarkGray,
                borders: Color::Gray,
            },
        }
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" Earthquakes ({}) ", app.map.overlay.markers.len()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app
        .map_renderer
        .render(&app.map, inner.width as usize, inner.height as usize, &viewport);

    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        let cx = (px / 2) as u16;
        let cy = (py / 4) as u16;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    frame.render_widget(
        MapWidget {
            layers,
            theme: Theme::for_style(app.map.active_base_layer().style),
            cursor_pos,
        },
        inner,
    );

    render_layer_control(frame, &app.map, inner);
    if let Some(legend) = &app.map.legend {
        render_legend(frame, legend, inner);
    }
    render_popup(frame, app, inner, &viewport);
}

/// Braille basemap and markers
struct MapWidget {
    layers: MapLayers,
    theme: Theme,
    cursor_pos: Option<(u16, u16)>,
}

fn render_canvas(canvas: &BrailleCanvas, fg: Color, area: Rect, buf: &mut Buffer) {
    for (col, row, ch) in canvas.lit_cells() {
        if col >= area.width as usize || row >= area.height as usize {
            continue;
        }
        let x = area.x + col as u16;
        let y = area.y + row as u16;
        buf[(x, y)].set_char(ch).set_fg(fg);
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_canvas(&self.layers.coastlines, self.theme.coastlines, area, buf);
        render_canvas(&self.layers.borders, self.theme.borders, area, buf);

        // Weakest bucket first so strong quakes win shared cells
        for layer in &self.layers.markers {
            render_canvas(&layer.canvas, color(layer.color), area, buf);
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

/// Rect of `width` x `height` pinned to a corner of `area`
fn corner(area: Rect, width: u16, height: u16, bottom: bool) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + area.width - width;
    let y = if bottom { area.y + area.height - height } else { area.y };
    Rect::new(x, y, width, height)
}

/// Expanded layer switcher in the top-right corner
fn render_layer_control(frame: &mut Frame, map: &MapHandle, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines = Vec::new();

    for (i, name) in map.control.base_layers.iter().enumerate() {
        let active = i == map.active_base_index();
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", i + 1), dim),
            Span::raw(if active { "(•) " } else { "( ) " }),
            Span::styled(
                name.clone(),
                if active { Style::default().add_modifier(Modifier::BOLD) } else { Style::default() },
            ),
        ]));
    }
    lines.push(Line::styled("────────────", dim));
    for name in &map.control.overlays {
        lines.push(Line::from(vec![
            Span::styled("e ", dim),
            Span::raw(if map.overlay_visible() { "[x] " } else { "[ ] " }),
            Span::raw(name.clone()),
        ]));
    }

    let rect = corner(area, 20, lines.len() as u16 + 2, false);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).border_style(dim)),
        rect,
    );
}

/// Color key in the bottom-right corner, low to high
fn render_legend(frame: &mut Frame, legend: &LegendControl, area: Rect) {
    let lines: Vec<Line> = legend
        .entries
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled("██", Style::default().fg(color(entry.color))),
                Span::raw(format!(" {}", entry.label())),
            ])
        })
        .collect();

    let rect = corner(area, 14, lines.len() as u16 + 2, true);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Span::styled(
                    format!(" {} ", legend.title),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        ),
        rect,
    );
}

/// Popup box anchored above the selected marker
fn render_popup(frame: &mut Frame, app: &App, area: Rect, viewport: &Viewport) {
    let Some(marker) = app.popup_marker() else {
        return;
    };
    let (px, py) = viewport.project(marker.longitude, marker.latitude);
    if !viewport.is_visible(px, py) {
        return;
    }

    let body_width = marker.popup.body.chars().count().max(marker.popup.heading.len());
    let width = (body_width.min(36) as u16 + 4).min(area.width);
    let height = 5u16.min(area.height);

    let col = (px.max(0) / 2) as u16;
    let row = (py.max(0) / 4) as u16;
    let x = area.x + col.saturating_sub(width / 2).min(area.width - width);
    let y = area.y + row.saturating_sub(height + 1);
    let rect = Rect::new(x, y, width, height);

    let text = vec![
        Line::styled(
            marker.popup.heading.clone(),
            Style::default().fg(color(marker.style.fill_color)).add_modifier(Modifier::BOLD),
        ),
        Line::raw(marker.popup.body.clone()),
    ];

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::White))),
        rect,
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let status = Line::from(vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", dim),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", dim),
        Span::styled(app.map.active_base_layer().name.clone(), Style::default().fg(Color::Green)),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | hjkl:pan +/-:zoom 1/2:base e:quakes click:popup r:reset q:quit",
            dim,
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}
