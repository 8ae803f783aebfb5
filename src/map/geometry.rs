use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a filled circle
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Draw a circle outline (midpoint algorithm)
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    if radius <= 0 {
        canvas.set_pixel_signed(cx, cy);
        return;
    }
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        for (px, py) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
            canvas.set_pixel_signed(cx + px, cy + py);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Fill the rectangle with top-left (x, y)
pub fn fill_rect(canvas: &mut BrailleCanvas, x: i32, y: i32, width: i32, height: i32) {
    for py in y..y + height {
        for px in x..x + width {
            canvas.set_pixel_signed(px, py);
        }
    }
}

/// Rectangle outline with top-left (x, y)
pub fn draw_rect(canvas: &mut BrailleCanvas, x: i32, y: i32, width: i32, height: i32) {
    if width <= 0 || height <= 0 {
        return;
    }
    let (x1, y1) = (x + width - 1, y + height - 1);
    draw_line(canvas, x, y, x1, y);
    draw_line(canvas, x, y1, x1, y1);
    draw_line(canvas, x, y, x, y1);
    draw_line(canvas, x1, y, x1, y1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.count(), 10);
        assert!((0..10).all(|x| canvas.is_set(x, 0)));
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.count(), 8);
    }

    #[test]
    fn test_ring_is_hollow() {
        let mut filled = BrailleCanvas::new(10, 5);
        let mut ring = BrailleCanvas::new(10, 5);
        draw_circle(&mut filled, 10, 10, 6);
        draw_ring(&mut ring, 10, 10, 6);

        assert!(filled.is_set(10, 10));
        assert!(!ring.is_set(10, 10));
        assert!(ring.is_set(16, 10) && ring.is_set(10, 4));
        assert!(ring.count() < filled.count());
    }

    #[test]
    fn test_rects() {
        let mut filled = BrailleCanvas::new(4, 4);
        fill_rect(&mut filled, 1, 2, 3, 5);
        assert_eq!(filled.count(), 15);

        let mut outline = BrailleCanvas::new(4, 4);
        draw_rect(&mut outline, 1, 2, 3, 5);
        assert_eq!(outline.count(), 12);
        assert!(!outline.is_set(2, 4));
    }

    #[test]
    fn test_clipped_at_edges() {
        let mut canvas = BrailleCanvas::new(2, 2);
        draw_circle(&mut canvas, 0, 0, 3);
        assert!(canvas.is_set(0, 0));
        assert!(canvas.count() > 0);
    }
}
