//! Fixture geometries, viewports and styles.
//!
//! The standard viewport is 200x200 pixels centered on (100, 100) at
//! resolution 1, so world x maps to device x and world y to `200 - y`.

use map_common::{
    Brush, Color, Feature, FillStyle, LinearRing, Pen, PenStyle, Point, Polygon, Style,
    VectorStyle, Viewport, Visibility,
};

/// Device edge of [`standard_viewport`].
pub const VIEWPORT_SIZE: f64 = 200.0;

/// Background used by frame tests.
pub const BACKGROUND: Color = Color::WHITE;

/// 200x200 viewport over world 0..200 x 0..200.
pub fn standard_viewport() -> Viewport {
    Viewport::new(Point::new(100.0, 100.0), VIEWPORT_SIZE, VIEWPORT_SIZE, 1.0)
}

/// Viewport over the same world area at `resolution` world units per pixel.
pub fn viewport_at(center: (f64, f64), resolution: f64) -> Viewport {
    let size = VIEWPORT_SIZE / resolution;
    Viewport::new(Point::new(center.0, center.1), size, size, resolution)
}

/// Closed axis-aligned square ring, counter-clockwise.
pub fn square_ring(min: f64, max: f64) -> LinearRing {
    LinearRing::from_coords(&[(min, min), (max, min), (max, max), (min, max), (min, min)])
}

/// Same square wound clockwise.
pub fn square_ring_cw(min: f64, max: f64) -> LinearRing {
    LinearRing::from_coords(&[(min, min), (min, max), (max, max), (max, min), (min, min)])
}

pub fn square_polygon(min: f64, max: f64) -> Polygon {
    Polygon::new(square_ring(min, max), Vec::new())
}

/// Square 20..180 with a square hole 60..140. Covers 160² - 80² = 19200
/// square units.
pub fn polygon_with_hole() -> Polygon {
    Polygon::new(square_ring(20.0, 180.0), vec![square_ring(60.0, 140.0)])
}

/// [`polygon_with_hole`] with both rings wound the "wrong" way.
pub fn polygon_with_hole_misoriented() -> Polygon {
    Polygon::new(square_ring_cw(20.0, 180.0), vec![square_ring_cw(60.0, 140.0)])
}

pub fn square_feature(min: f64, max: f64) -> Feature {
    Feature::new(square_polygon(min, max))
}

/// Vector style with a solid fill and an outline.
pub fn solid_style(fill: Color, outline: Color, width: f64) -> Style {
    Style::Vector(VectorStyle {
        outline: Some(Pen::new(outline, width)),
        line: Some(Pen::new(outline, width)),
        fill: Some(Brush::solid(fill)),
        ..VectorStyle::default()
    })
}

/// Fill only, no outline.
pub fn fill_only_style(fill: Color) -> Style {
    Style::Vector(VectorStyle {
        outline: None,
        line: None,
        fill: Some(Brush::solid(fill)),
        ..VectorStyle::default()
    })
}

/// Outline only, no fill.
pub fn outline_only_style(color: Color, width: f64) -> Style {
    Style::Vector(VectorStyle {
        outline: Some(Pen::new(color, width)),
        line: Some(Pen::new(color, width)),
        fill: None,
        ..VectorStyle::default()
    })
}

pub fn pattern_style(color: Color, fill_style: FillStyle) -> Style {
    Style::Vector(VectorStyle {
        outline: None,
        line: None,
        fill: Some(Brush::pattern(color, fill_style)),
        ..VectorStyle::default()
    })
}

pub fn dashed_line_style(color: Color, width: f64, pen_style: PenStyle) -> Style {
    Style::Vector(VectorStyle {
        outline: None,
        line: Some(Pen {
            color,
            width,
            pen_style,
        }),
        fill: None,
        ..VectorStyle::default()
    })
}

/// `style` restricted to resolutions within `min..=max`.
pub fn with_visibility(style: Style, min: f64, max: f64) -> Style {
    let visibility = Visibility {
        enabled: true,
        min_visible: min,
        max_visible: max,
    };
    match style {
        Style::Vector(mut s) => {
            s.visibility = visibility;
            Style::Vector(s)
        }
        Style::Label(mut s) => {
            s.visibility = visibility;
            Style::Label(s)
        }
        Style::Raster(mut s) => {
            s.visibility = visibility;
            Style::Raster(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_rings_have_opposite_winding() {
        assert!(square_ring(0.0, 1.0).is_counter_clockwise());
        assert!(!square_ring_cw(0.0, 1.0).is_counter_clockwise());
    }

    #[test]
    fn test_polygon_with_hole_area() {
        assert_eq!(polygon_with_hole().area(), 19200.0);
    }

    #[test]
    fn test_viewport_at_covers_same_world() {
        let a = standard_viewport().extent();
        let b = viewport_at((100.0, 100.0), 2.0).extent();
        assert_eq!(a, b);
    }
}
