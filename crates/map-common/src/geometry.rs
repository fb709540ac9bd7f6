//! Geometry types carried by features.
//!
//! Coordinates are world units in a y-up coordinate system. A ring whose
//! signed area is positive is counter-clockwise.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};
use crate::BoundingBox;

/// Global counter for tile key identities.
static TILE_KEY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A closed sequence of vertices. The closing vertex may be repeated or omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearRing {
    pub vertices: Vec<Point>,
}

impl LinearRing {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Build a ring from `(x, y)` pairs.
    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    /// Vertices without a repeated closing vertex.
    pub fn open_vertices(&self) -> &[Point] {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) if self.vertices.len() > 1 && first == last => {
                &self.vertices[..self.vertices.len() - 1]
            }
            _ => &self.vertices,
        }
    }

    /// A ring needs at least three distinct vertices to enclose an area.
    pub fn is_valid(&self) -> bool {
        self.open_vertices().len() >= 3
    }

    /// Shoelace signed area; positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        let v = self.open_vertices();
        if v.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..v.len() {
            let a = v[i];
            let b = v[(i + 1) % v.len()];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter())
    }
}

/// An open polyline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineString {
    pub vertices: Vec<Point>,
}

impl LineString {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }
}

/// A polygon with one exterior ring and any number of holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: LinearRing,
    #[serde(default)]
    pub interiors: Vec<LinearRing>,
}

impl Polygon {
    pub fn new(exterior: LinearRing, interiors: Vec<LinearRing>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    /// Area of the exterior minus the holes.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.interiors.iter().map(|r| r.signed_area().abs()).sum();
        self.exterior.signed_area().abs() - holes
    }
}

/// Identity handle for a cached bitmap.
///
/// Every call to [`TileKey::new`] yields a key that compares unequal to all
/// previously allocated keys, even when both describe the same logical tile.
/// Copies of a key refer to the same tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey(u64);

impl TileKey {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(TILE_KEY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// An encoded image placed over a world rectangle.
#[derive(Debug, Clone)]
pub struct Raster {
    key: TileKey,
    data: Arc<[u8]>,
    bbox: BoundingBox,
}

impl Raster {
    /// Create a raster from encoded image bytes (PNG, JPEG, ...).
    pub fn new(data: impl Into<Arc<[u8]>>, bbox: BoundingBox) -> MapResult<Self> {
        let data = data.into();
        if data.is_empty() {
            return Err(MapError::InvalidGeometry("raster has no image data".to_string()));
        }
        if !(bbox.width() > 0.0 && bbox.height() > 0.0) {
            return Err(MapError::InvalidGeometry(format!(
                "raster extent must have positive size, got {}x{}",
                bbox.width(),
                bbox.height()
            )));
        }
        Ok(Self {
            key: TileKey::new(),
            data,
            bbox,
        })
    }

    /// Cache identity of this raster. Clones share it.
    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}

/// Tag naming a geometry variant; used to pick a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    Raster,
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GeometryKind::Point => "point",
            GeometryKind::LineString => "line_string",
            GeometryKind::Polygon => "polygon",
            GeometryKind::Raster => "raster",
        };
        f.write_str(name)
    }
}

/// Geometry of a feature.
#[derive(Debug, Clone)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    Raster(Raster),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::Raster(_) => GeometryKind::Raster,
        }
    }

    /// World extent of the geometry; `None` when it has no vertices.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Geometry::Point(p) => Some(BoundingBox::new(p.x, p.y, p.x, p.y)),
            Geometry::LineString(line) => BoundingBox::from_points(line.vertices.iter()),
            Geometry::Polygon(polygon) => polygon.exterior.bounding_box(),
            Geometry::Raster(raster) => Some(raster.bounding_box()),
        }
    }
}

impl From<Point> for Geometry {
    fn from(p: Point) -> Self {
        Geometry::Point(p)
    }
}

impl From<LineString> for Geometry {
    fn from(line: LineString) -> Self {
        Geometry::LineString(line)
    }
}

impl From<Polygon> for Geometry {
    fn from(polygon: Polygon) -> Self {
        Geometry::Polygon(polygon)
    }
}

impl From<Raster> for Geometry {
    fn from(raster: Raster) -> Self {
        Geometry::Raster(raster)
    }
}
