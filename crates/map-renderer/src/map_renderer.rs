//! Frame orchestration.

use map_common::{Color, Feature, Layer, Style, TileKey, Viewport};
use tiny_skia::Pixmap;
use tracing::{debug, error, trace};

use crate::bitmap_cache::{BitmapCache, EvictionPolicy};
use crate::canvas::Canvas;
use crate::config::RendererConfig;
use crate::error::{RenderError, RenderResult};
use crate::iterator::{iterate_features, iterate_layers};
use crate::path_cache::PathCache;
use crate::pattern::MotifCache;
use crate::png::encode_pixmap;
use crate::renderer::{DrawOutcome, RenderContext, RendererRegistry};
use crate::symbol_cache::SymbolCache;

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Iteration the frame was drawn in
    pub iteration: u64,
    /// (style, feature) pairs handed to a renderer
    pub features_visited: usize,
    pub features_drawn: usize,
    /// Pairs with no renderer for their geometry kind, or that the
    /// renderer declined
    pub features_skipped: usize,
    pub tiles_evicted: usize,
    pub symbols_evicted: usize,
    pub motifs_evicted: usize,
}

enum FrameSource<'s> {
    Layers(&'s [Box<dyn Layer>]),
    Features(&'s [Feature], &'s Style),
}

/// Draws frames and owns the caches that persist between them.
///
/// Every render call is one frame. After the features are drawn the tile,
/// symbol and motif caches are trimmed, stale paths are pruned and the
/// frame iteration advances. This happens even when drawing fails part way.
pub struct MapRenderer {
    config: RendererConfig,
    registry: RendererRegistry,
    tiles: BitmapCache<TileKey, Pixmap>,
    failed_tiles: BitmapCache<TileKey, ()>,
    symbols: SymbolCache,
    paths: PathCache,
    motifs: MotifCache,
    iteration: u64,
}

impl MapRenderer {
    /// Create a renderer. Fails when `config` does not pass
    /// [`RendererConfig::validate`].
    pub fn new(config: RendererConfig, registry: RendererRegistry) -> RenderResult<Self> {
        config.validate()?;
        let policy = EvictionPolicy::from(&config);
        Ok(Self {
            config,
            registry,
            tiles: BitmapCache::new(policy),
            failed_tiles: BitmapCache::new(policy),
            symbols: SymbolCache::new(policy),
            paths: PathCache::new(),
            motifs: MotifCache::new(policy),
            iteration: 0,
        })
    }

    /// Renderer with the polygon, line string and raster renderers.
    pub fn with_default_renderers(config: RendererConfig) -> RenderResult<Self> {
        Self::new(config, RendererRegistry::with_defaults())
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Number of frames completed so far.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    pub fn tile_cache(&self) -> &BitmapCache<TileKey, Pixmap> {
        &self.tiles
    }

    /// Mutable tile cache, for hosts that decode tiles ahead of time.
    pub fn tile_cache_mut(&mut self) -> &mut BitmapCache<TileKey, Pixmap> {
        &mut self.tiles
    }

    /// Raster tiles that failed to decode. Entries age out like tiles.
    pub fn failed_tiles(&self) -> &BitmapCache<TileKey, ()> {
        &self.failed_tiles
    }

    pub fn symbols(&self) -> &SymbolCache {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolCache {
        &mut self.symbols
    }

    pub fn path_cache(&self) -> &PathCache {
        &self.paths
    }

    pub fn motifs(&self) -> &MotifCache {
        &self.motifs
    }

    /// Draw `layers` onto `pixmap`.
    pub fn render(
        &mut self,
        pixmap: &mut Pixmap,
        viewport: &Viewport,
        layers: &[Box<dyn Layer>],
        background: Option<Color>,
    ) -> RenderResult<FrameStats> {
        self.frame(pixmap, viewport, FrameSource::Layers(layers), background)
    }

    /// Draw a flat feature list with a shared style onto `pixmap`.
    pub fn render_features(
        &mut self,
        pixmap: &mut Pixmap,
        viewport: &Viewport,
        features: &[Feature],
        style: &Style,
        background: Option<Color>,
    ) -> RenderResult<FrameStats> {
        self.frame(pixmap, viewport, FrameSource::Features(features, style), background)
    }

    /// Render `layers` into a new viewport-sized surface and encode it as
    /// PNG. Failures are logged and yield `None`.
    pub fn render_to_bitmap_stream(
        &mut self,
        viewport: &Viewport,
        layers: &[Box<dyn Layer>],
        background: Option<Color>,
    ) -> Option<Vec<u8>> {
        self.encoded_frame(viewport, FrameSource::Layers(layers), background)
    }

    /// Flat-list counterpart of [`MapRenderer::render_to_bitmap_stream`].
    pub fn render_features_to_bitmap_stream(
        &mut self,
        viewport: &Viewport,
        features: &[Feature],
        style: &Style,
        background: Option<Color>,
    ) -> Option<Vec<u8>> {
        self.encoded_frame(viewport, FrameSource::Features(features, style), background)
    }

    fn encoded_frame(
        &mut self,
        viewport: &Viewport,
        source: FrameSource<'_>,
        background: Option<Color>,
    ) -> Option<Vec<u8>> {
        let result = surface_for(viewport).and_then(|mut pixmap| {
            self.frame(&mut pixmap, viewport, source, background)?;
            encode_pixmap(&pixmap)
        });

        match result {
            Ok(png) => Some(png),
            Err(e) => {
                error!(
                    error = %e,
                    width = viewport.width,
                    height = viewport.height,
                    "Failed to render frame to image"
                );
                None
            }
        }
    }

    fn frame(
        &mut self,
        pixmap: &mut Pixmap,
        viewport: &Viewport,
        source: FrameSource<'_>,
        background: Option<Color>,
    ) -> RenderResult<FrameStats> {
        let mut stats = FrameStats {
            iteration: self.iteration,
            ..FrameStats::default()
        };

        let drawn = self.draw_frame(pixmap, viewport, source, background, &mut stats);

        stats.tiles_evicted = self.tiles.evict(self.iteration);
        stats.symbols_evicted = self.symbols.evict(self.iteration);
        stats.motifs_evicted = self.motifs.evict(self.iteration);
        self.failed_tiles.evict(self.iteration);
        let paths_pruned = self.paths.prune(self.iteration, self.config.path_cache_max_age);
        self.iteration += 1;

        drawn?;
        debug!(
            iteration = stats.iteration,
            visited = stats.features_visited,
            drawn = stats.features_drawn,
            skipped = stats.features_skipped,
            tiles_evicted = stats.tiles_evicted,
            symbols_evicted = stats.symbols_evicted,
            motifs_evicted = stats.motifs_evicted,
            paths_pruned,
            "Frame rendered"
        );
        Ok(stats)
    }

    fn draw_frame(
        &mut self,
        pixmap: &mut Pixmap,
        viewport: &Viewport,
        source: FrameSource<'_>,
        background: Option<Color>,
        stats: &mut FrameStats,
    ) -> RenderResult<()> {
        let mut canvas = Canvas::new(pixmap, self.config.anti_alias);
        if let Some(color) = background {
            canvas.clear(color);
        }
        if !viewport.has_size() {
            trace!(?viewport, "Viewport has no area, nothing to draw");
            return Ok(());
        }

        let mut ctx = RenderContext {
            canvas,
            config: &self.config,
            iteration: self.iteration,
            paths: &mut self.paths,
            tiles: &mut self.tiles,
            failed_tiles: &mut self.failed_tiles,
            symbols: &mut self.symbols,
            motifs: &mut self.motifs,
        };
        let registry = &self.registry;

        let mut visit = |viewport: &Viewport, style: &Style, feature: &Feature| -> RenderResult<()> {
            let kind = feature.geometry().kind();
            let Some(renderer) = registry.get(kind) else {
                trace!(%kind, feature = %feature.id(), "No renderer for geometry kind");
                stats.features_skipped += 1;
                return Ok(());
            };
            match renderer.draw(&mut ctx, viewport, style, feature)? {
                DrawOutcome::Drawn => stats.features_drawn += 1,
                DrawOutcome::Skipped => stats.features_skipped += 1,
            }
            Ok(())
        };

        let visited = match source {
            FrameSource::Layers(layers) => iterate_layers(viewport, layers, &mut visit)?,
            FrameSource::Features(features, style) => {
                iterate_features(viewport, features, style, &mut visit)?
            }
        };
        stats.features_visited = visited;
        Ok(())
    }
}

/// Surface matching the viewport's device size.
fn surface_for(viewport: &Viewport) -> RenderResult<Pixmap> {
    let width = viewport.width.max(0.0) as u32;
    let height = viewport.height.max(0.0) as u32;
    Pixmap::new(width, height).ok_or(RenderError::SurfaceCreation { width, height })
}
