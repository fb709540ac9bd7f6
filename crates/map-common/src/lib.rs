//! Map data model shared by the frame renderer and its hosts.

pub mod bbox;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod layer;
pub mod style;
pub mod viewport;

pub use bbox::BoundingBox;
pub use error::{MapError, MapResult};
pub use feature::{Feature, FeatureId};
pub use geometry::{Geometry, GeometryKind, LineString, LinearRing, Point, Polygon, Raster, TileKey};
pub use layer::{Layer, LayerStyle, MemoryLayer, ThemeStyle};
pub use style::{
    Brush, Color, FillStyle, LabelStyle, Pen, PenStyle, RasterStyle, Style, StyleCatalog,
    SymbolId, VectorStyle, Visibility,
};
pub use viewport::{Affine, Viewport};
