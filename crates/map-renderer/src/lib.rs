//! Frame renderer for map features.
//!
//! Draws vector and raster features for a viewport onto a tiny-skia
//! surface, one frame per call:
//! - Viewport culling and style iteration (`iterator`)
//! - Style resolution and dash patterns (`style`)
//! - Polygon and line paths with a cross-frame path cache (`polygon`,
//!   `line`, `path_cache`)
//! - Hatch, dot and bitmap fills (`pattern`, `symbol_cache`)
//! - Raster tiles through a size-adaptive bitmap cache (`raster`,
//!   `bitmap_cache`)
//! - PNG output (`png`)

pub mod bitmap_cache;
pub mod canvas;
pub mod config;
pub mod error;
pub mod iterator;
pub mod line;
pub mod map_renderer;
pub mod path_cache;
pub mod pattern;
pub mod png;
pub mod polygon;
pub mod raster;
pub mod renderer;
pub mod style;
pub mod symbol_cache;

pub use bitmap_cache::{BitmapCache, BitmapCacheStats, EvictionPolicy};
pub use canvas::Canvas;
pub use config::RendererConfig;
pub use error::{RenderError, RenderResult};
pub use map_renderer::{FrameStats, MapRenderer};
pub use path_cache::{PathCache, PathCacheStats};
pub use renderer::{DrawOutcome, FeatureRenderer, RenderContext, RendererRegistry};
pub use symbol_cache::SymbolCache;
