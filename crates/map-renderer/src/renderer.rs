//! Per-geometry renderers and the registry the frame loop dispatches through.

use std::collections::HashMap;
use std::fmt;

use map_common::{Feature, GeometryKind, Style, TileKey, Viewport};
use tiny_skia::Pixmap;

use crate::bitmap_cache::BitmapCache;
use crate::canvas::Canvas;
use crate::config::RendererConfig;
use crate::error::RenderResult;
use crate::line::LineStringRenderer;
use crate::path_cache::PathCache;
use crate::pattern::MotifCache;
use crate::polygon::PolygonRenderer;
use crate::raster::RasterRenderer;
use crate::symbol_cache::SymbolCache;

/// Whether a renderer put anything on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn,
    Skipped,
}

/// Everything a renderer may touch while drawing one feature.
///
/// Lives for a single frame. The caches are owned by `MapRenderer` and
/// lent out here so renderers never hold on to them.
pub struct RenderContext<'a> {
    pub canvas: Canvas<'a>,
    pub config: &'a RendererConfig,
    /// Iteration of the frame being drawn
    pub iteration: u64,
    pub paths: &'a mut PathCache,
    pub tiles: &'a mut BitmapCache<TileKey, Pixmap>,
    /// Tiles whose bytes did not decode, so they are not retried every frame
    pub failed_tiles: &'a mut BitmapCache<TileKey, ()>,
    pub symbols: &'a mut SymbolCache,
    pub motifs: &'a mut MotifCache,
}

/// Draws features of one geometry kind.
pub trait FeatureRenderer: Send + Sync {
    fn kind(&self) -> GeometryKind;

    /// Draw `feature` with `style`. Returning `Skipped` is not an error;
    /// errors abort the frame.
    fn draw(
        &self,
        ctx: &mut RenderContext<'_>,
        viewport: &Viewport,
        style: &Style,
        feature: &Feature,
    ) -> RenderResult<DrawOutcome>;
}

/// Renderers keyed by the geometry kind they handle.
#[derive(Default)]
pub struct RendererRegistry {
    renderers: HashMap<GeometryKind, Box<dyn FeatureRenderer>>,
}

impl RendererRegistry {
    /// An empty registry. Every feature is skipped until renderers are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Polygon, line string and raster renderers. Points have no renderer.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PolygonRenderer);
        registry.register(LineStringRenderer);
        registry.register(RasterRenderer);
        registry
    }

    /// Add a renderer for its kind, returning the one it replaces.
    pub fn register<R>(&mut self, renderer: R) -> Option<Box<dyn FeatureRenderer>>
    where
        R: FeatureRenderer + 'static,
    {
        self.renderers.insert(renderer.kind(), Box::new(renderer))
    }

    pub fn unregister(&mut self, kind: GeometryKind) -> Option<Box<dyn FeatureRenderer>> {
        self.renderers.remove(&kind)
    }

    pub fn get(&self, kind: GeometryKind) -> Option<&dyn FeatureRenderer> {
        self.renderers.get(&kind).map(|r| r.as_ref())
    }

    pub fn contains(&self, kind: GeometryKind) -> bool {
        self.renderers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.renderers.keys().map(|k| k.to_string()).collect();
        kinds.sort();
        f.debug_struct("RendererRegistry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_everything_but_points() {
        let registry = RendererRegistry::with_defaults();
        assert!(registry.contains(GeometryKind::Polygon));
        assert!(registry.contains(GeometryKind::LineString));
        assert!(registry.contains(GeometryKind::Raster));
        assert!(!registry.contains(GeometryKind::Point));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut registry = RendererRegistry::new();
        assert!(registry.register(PolygonRenderer).is_none());
        assert!(registry.register(PolygonRenderer).is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(GeometryKind::Polygon).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_debug_lists_kinds() {
        let text = format!("{:?}", RendererRegistry::with_defaults());
        assert!(text.contains("line_string") && text.contains("polygon") && text.contains("raster"));
    }
}
