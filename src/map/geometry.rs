use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draw a filled disc clipped to the canvas. A non-positive radius draws nothing.
pub fn draw_disc(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    if radius <= 0 {
        return;
    }
    let (cx, cy, radius) = (cx as i64, cy as i64, radius as i64);
    let max_x = canvas.width() as i64 * 2 - 1;
    let max_y = canvas.height() as i64 * 4 - 1;
    let r2 = radius * radius;

    for y in (cy - radius).max(0)..=(cy + radius).min(max_y) {
        let dy = y - cy;
        for x in (cx - radius).max(0)..=(cx + radius).min(max_x) {
            let dx = x - cx;
            if dx * dx + dy * dy <= r2 {
                canvas.set_pixel(x as usize, y as usize);
            }
        }
    }
}

/// Single dot, for markers smaller than one braille dot
pub fn draw_dot(canvas: &mut BrailleCanvas, x: i32, y: i32) {
    canvas.set_pixel_signed(x, y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_disc_radius() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_disc(&mut canvas, 3, 3, 0);
        draw_disc(&mut canvas, 3, 3, -2);
        assert_eq!(canvas.lit_cells().count(), 0);

        draw_disc(&mut canvas, 3, 3, 1);
        // (3,2) (2,3) (3,3) land in cell (1,0); (4,3) in (2,0); (3,4) in (1,1)
        assert_eq!(canvas.lit_cells().count(), 3);
    }

    #[test]
    fn test_disc_clipped_to_canvas() {
        let mut canvas = BrailleCanvas::new(3, 2);
        draw_disc(&mut canvas, 2, 3, i32::MAX);
        assert_eq!(canvas.to_string(), "⣿⣿⣿\n⣿⣿⣿");

        // Entirely off-canvas
        let mut canvas = BrailleCanvas::new(3, 2);
        draw_disc(&mut canvas, -50, -50, 10);
        assert_eq!(canvas.lit_cells().count(), 0);
    }
}
