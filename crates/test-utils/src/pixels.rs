//! Pixel inspection for rendered surfaces.

use map_common::Color;
use tiny_skia::Pixmap;

/// Straight-alpha color at (x, y), `None` outside the pixmap.
pub fn pixel_color(pixmap: &Pixmap, x: u32, y: u32) -> Option<Color> {
    let c = pixmap.pixel(x, y)?.demultiply();
    Some(Color::rgba(c.red(), c.green(), c.blue(), c.alpha()))
}

/// Number of pixels exactly equal to `color`.
pub fn count_pixels(pixmap: &Pixmap, color: Color) -> usize {
    (0..pixmap.height())
        .flat_map(|y| (0..pixmap.width()).map(move |x| (x, y)))
        .filter(|&(x, y)| pixel_color(pixmap, x, y) == Some(color))
        .count()
}

/// Colors of row `y`, left to right.
pub fn row_colors(pixmap: &Pixmap, y: u32) -> Vec<Color> {
    (0..pixmap.width())
        .filter_map(|x| pixel_color(pixmap, x, y))
        .collect()
}

/// Longest run of consecutive `color` pixels in row `y`.
pub fn longest_run(pixmap: &Pixmap, y: u32, color: Color) -> usize {
    let mut best = 0;
    let mut current = 0;
    for c in row_colors(pixmap, y) {
        if c == color {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Straight-alpha RGBA of a decoded PNG.
pub fn decode_png(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes)
        .expect("valid image bytes")
        .to_rgba8()
}
