//! Procedural hatch and dot fills.
//!
//! A patterned fill is drawn by rendering one motif into a small square
//! tile, wrapping the tile in a repeating shader, clipping the canvas to the
//! feature path, and filling an inflated bounding rectangle through that
//! clip. The tile edge is `pattern_scale` world units, so hatching keeps a
//! constant spacing on the ground as the map zooms.

use map_common::{BoundingBox, Color, FillStyle};
use tiny_skia::{
    FillRule, FilterQuality, Paint, Path, PathBuilder, Pattern, Pixmap, Rect, SpreadMode, Stroke,
    Transform,
};

use crate::bitmap_cache::{BitmapCache, BitmapCacheStats, EvictionPolicy};
use crate::canvas::{to_skia_color, Canvas};
use crate::error::{RenderError, RenderResult};

/// Motif geometry inside a `scale`-sized tile. `None` for fills that are
/// not procedural.
pub fn motif_path(fill_style: FillStyle, scale: f32) -> Option<Path> {
    let s = scale;
    let mut pb = PathBuilder::new();
    match fill_style {
        FillStyle::Cross => {
            pb.move_to(0.8 * s, 0.8 * s);
            pb.line_to(0.0, 0.0);
            pb.move_to(0.0, 0.8 * s);
            pb.line_to(0.8 * s, 0.0);
        }
        FillStyle::DiagonalCross => {
            pb.move_to(s, s);
            pb.line_to(0.0, 0.0);
            pb.move_to(0.0, s);
            pb.line_to(s, 0.0);
        }
        FillStyle::BackwardDiagonal => {
            pb.move_to(0.0, s);
            pb.line_to(s, 0.0);
        }
        FillStyle::ForwardDiagonal => {
            pb.move_to(s, s);
            pb.line_to(0.0, 0.0);
        }
        FillStyle::Dotted => return PathBuilder::from_circle(0.5 * s, 0.5 * s, 0.35 * s),
        FillStyle::Horizontal => {
            pb.move_to(0.0, 0.5 * s);
            pb.line_to(s, 0.5 * s);
        }
        FillStyle::Vertical => {
            pb.move_to(0.5 * s, 0.0);
            pb.line_to(0.5 * s, s);
        }
        FillStyle::Solid | FillStyle::Bitmap => return None,
    }
    pb.finish()
}

/// Render a motif into a square tile with a one-unit stroke. Dots are
/// stroked and filled.
pub fn motif_tile(
    fill_style: FillStyle,
    color: Color,
    scale: f32,
    anti_alias: bool,
) -> RenderResult<Option<Pixmap>> {
    let Some(path) = motif_path(fill_style, scale) else {
        return Ok(None);
    };

    let size = scale.ceil().max(1.0) as u32;
    let mut tile = Pixmap::new(size, size).ok_or(RenderError::SurfaceCreation {
        width: size,
        height: size,
    })?;

    let mut paint = Paint::default();
    paint.set_color(to_skia_color(color));
    paint.anti_alias = anti_alias;

    if fill_style == FillStyle::Dotted {
        tile.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    tile.stroke_path(&path, &paint, &stroke, Transform::identity(), None);

    Ok(Some(tile))
}

/// Rectangle covered by a pattern fill: the bounds grown on every side by
/// `floor(0.3 * width / scale) * scale`, a whole number of tiles.
pub fn pattern_extent(bbox: &BoundingBox, scale: f32) -> BoundingBox {
    let scale = scale as f64;
    let inflate = (0.3 * bbox.width() / scale).floor() * scale;
    bbox.inflate(inflate, inflate)
}

/// Fill `clip` with a repeating `tile`. The tile is laid out in the
/// canvas's current space, one tile pixel per unit.
pub fn fill_with_tile(
    canvas: &mut Canvas,
    clip: &Path,
    bbox: &BoundingBox,
    tile: &Pixmap,
    scale: f32,
    opacity: f32,
) -> RenderResult<()> {
    let extent = pattern_extent(bbox, scale);
    let Some(rect) = Rect::from_ltrb(
        extent.min_x as f32,
        extent.min_y as f32,
        extent.max_x as f32,
        extent.max_y as f32,
    ) else {
        return Ok(());
    };

    let mut saved = canvas.save();
    saved.clip_path(clip, FillRule::Winding)?;

    let shader = Pattern::new(
        tile.as_ref(),
        SpreadMode::Repeat,
        FilterQuality::Bilinear,
        opacity.clamp(0.0, 1.0),
        Transform::identity(),
    );
    let paint = saved.shader_paint(shader);
    saved.fill_rect(rect, &paint);
    Ok(())
}

/// Rendered motif tiles keyed by fill style and color.
///
/// Tiles are stamped with the frame iteration that used them and trimmed
/// once per frame with the same policy as raster tiles, so a themed layer
/// with many distinct colors does not grow the cache without bound.
#[derive(Debug, Default)]
pub struct MotifCache {
    tiles: BitmapCache<(FillStyle, Color), Pixmap>,
}

impl MotifCache {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            tiles: BitmapCache::new(policy),
        }
    }

    /// Tile for `fill_style` in `color`, rendered on first use and marked
    /// as used in `iteration`. `None` for styles without a motif.
    pub fn get_or_create(
        &mut self,
        fill_style: FillStyle,
        color: Color,
        scale: f32,
        anti_alias: bool,
        iteration: u64,
    ) -> RenderResult<Option<&Pixmap>> {
        let key = (fill_style, color);
        if !self.tiles.touch(&key, iteration) {
            match motif_tile(fill_style, color, scale, anti_alias)? {
                Some(tile) => self.tiles.put(key, tile, iteration),
                None => return Ok(None),
            }
        }
        Ok(self.tiles.get(&key))
    }

    /// Trim tiles after a frame. Returns the number released.
    pub fn evict(&mut self, current_iteration: u64) -> usize {
        self.tiles.evict(current_iteration)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn stats(&self) -> BitmapCacheStats {
        self.tiles.stats()
    }
}
