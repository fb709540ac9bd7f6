//! Tests for the map data model: bounding boxes, viewports, styles, layers.

use map_common::{
    BoundingBox, Color, Feature, FillStyle, Layer, LayerStyle, LinearRing, MapError, MemoryLayer,
    PenStyle, Point, Polygon, Style, StyleCatalog, Viewport,
};

// ============================================================================
// BoundingBox tests
// ============================================================================

#[test]
fn test_bbox_dimensions() {
    let bbox = BoundingBox::new(-100.0, 5.0, -50.0, 25.0);
    assert_eq!(bbox.width(), 50.0);
    assert_eq!(bbox.height(), 20.0);
    assert_eq!(bbox.centroid(), Point::new(-75.0, 15.0));
}

#[test]
fn test_bbox_inflate_and_union() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let inflated = a.inflate(3.0, 1.0);
    assert_eq!(inflated, BoundingBox::new(-3.0, -1.0, 13.0, 11.0));

    let b = BoundingBox::new(20.0, -5.0, 30.0, 5.0);
    assert_eq!(a.union(&b), BoundingBox::new(0.0, -5.0, 30.0, 10.0));
}

#[test]
fn test_bbox_disjoint_has_no_intersection() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(10.5, 0.0, 20.0, 10.0);
    assert!(!a.intersects(&b));
    assert!(a.intersection(&b).is_none());
}

#[test]
fn test_bbox_contains_point_on_edge() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(bbox.contains_point(0.0, 10.0));
    assert!(!bbox.contains_point(-0.1, 5.0));
}

// ============================================================================
// Viewport tests
// ============================================================================

#[test]
fn test_viewport_extent_matches_size() {
    let vp = Viewport::new(Point::new(100.0, 100.0), 200.0, 100.0, 2.0);
    assert_eq!(vp.extent(), BoundingBox::new(-100.0, 0.0, 300.0, 200.0));
}

#[test]
fn test_viewport_corners_map_to_device_corners() {
    let vp = Viewport::new(Point::new(100.0, 100.0), 200.0, 100.0, 2.0);
    let extent = vp.extent();
    let top_left = vp.world_to_screen(Point::new(extent.min_x, extent.max_y));
    let bottom_right = vp.world_to_screen(Point::new(extent.max_x, extent.min_y));
    assert!((top_left.x).abs() < 1e-9 && (top_left.y).abs() < 1e-9);
    assert!((bottom_right.x - 200.0).abs() < 1e-9 && (bottom_right.y - 100.0).abs() < 1e-9);
}

#[test]
fn test_viewport_zero_size() {
    let vp = Viewport::new(Point::new(0.0, 0.0), 0.0, 100.0, 1.0);
    assert!(!vp.has_size());
}

// ============================================================================
// Style catalog tests
// ============================================================================

#[test]
fn test_style_catalog_from_json() {
    let json = r##"{
        "version": "1.0",
        "styles": {
            "parcels": {
                "type": "vector",
                "outline": {"color": "#000000", "width": 2.0, "pen_style": "dash"},
                "fill": {"color": "gray", "fill_style": "diagonal_cross"}
            },
            "imagery": {
                "type": "raster",
                "opacity": 0.5,
                "max_visible": 100.0
            },
            "names": {
                "type": "label",
                "text": "Name",
                "fore_color": [255, 255, 255]
            }
        }
    }"##;

    let catalog = StyleCatalog::from_json(json).unwrap();
    assert_eq!(catalog.styles.len(), 3);

    let parcels = catalog.require("parcels").unwrap().as_vector().unwrap();
    let outline = parcels.outline.as_ref().unwrap();
    assert_eq!(outline.width, 2.0);
    assert_eq!(outline.pen_style, PenStyle::Dash);
    let fill = parcels.fill.as_ref().unwrap();
    assert_eq!(fill.color, Some(Color::GRAY));
    assert_eq!(fill.fill_style, FillStyle::DiagonalCross);
    assert!(parcels.visibility.enabled);
    assert_eq!(parcels.opacity, 1.0);

    let imagery = catalog.get("imagery").unwrap();
    assert_eq!(imagery.opacity(), 0.5);
    assert!(imagery.is_visible_at(100.0));
    assert!(!imagery.is_visible_at(100.5));

    assert!(matches!(catalog.get("names"), Some(Style::Label(_))));
}

#[test]
fn test_style_catalog_missing_style() {
    let catalog = StyleCatalog::from_json(r#"{"styles": {}}"#).unwrap();
    assert_eq!(catalog.version, "1.0");
    assert!(matches!(catalog.require("roads"), Err(MapError::StyleNotFound(_))));
}

#[test]
fn test_style_catalog_invalid_color() {
    let json = r##"{"styles": {"bad": {"type": "vector", "fill": {"color": "#12"}}}}"##;
    assert!(matches!(StyleCatalog::from_json(json), Err(MapError::StyleParse(_))));
}

#[test]
fn test_style_round_trips_through_json() {
    let style: Style = map_common::VectorStyle::default().into();
    let json = serde_json::to_string(&style).unwrap();
    let back: Style = serde_json::from_str(&json).unwrap();
    assert_eq!(style, back);
}

// ============================================================================
// Layer tests
// ============================================================================

#[test]
fn test_memory_layer_reports_style() {
    let square = Polygon::new(
        LinearRing::from_coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
        vec![],
    );
    let layer = MemoryLayer::new("parcels")
        .with_style(Style::Vector(Default::default()))
        .with_features([Feature::new(square)]);

    assert_eq!(layer.name(), "parcels");
    assert!(matches!(layer.style(), Some(LayerStyle::Fixed(Style::Vector(_)))));
    assert!(layer.visibility().admits(1.0));
}
