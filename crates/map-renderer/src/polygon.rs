//! Polygon paths and the polygon renderer.
//!
//! Paths are built in world coordinates and drawn under the viewport
//! transform, so a cached path stays valid across pans and zooms. Ring
//! orientation is normalized while building: the exterior runs
//! counter-clockwise and holes clockwise (in world space, y up). With the
//! non-zero winding rule this makes holes render as holes no matter how the
//! source data was wound.

use map_common::{
    BoundingBox, Feature, Geometry, GeometryKind, LinearRing, Polygon, Style, Viewport,
};
use tiny_skia::{FillRule, Path, PathBuilder};
use tracing::{trace, warn};

use crate::canvas::{viewport_transform, Canvas};
use crate::error::RenderResult;
use crate::pattern::{fill_with_tile, MotifCache};
use crate::renderer::{DrawOutcome, FeatureRenderer, RenderContext};
use crate::style::{build_stroke, resolve, FillKind, FillParams, StrokeParams};
use crate::symbol_cache::SymbolCache;

fn append_ring(pb: &mut PathBuilder, ring: &LinearRing, counter_clockwise: bool) {
    let vertices = ring.open_vertices();
    let reverse = ring.is_counter_clockwise() != counter_clockwise;

    let mut emit = |i: usize, x: f64, y: f64| {
        if i == 0 {
            pb.move_to(x as f32, y as f32);
        } else {
            pb.line_to(x as f32, y as f32);
        }
    };
    if reverse {
        for (i, p) in vertices.iter().rev().enumerate() {
            emit(i, p.x, p.y);
        }
    } else {
        for (i, p) in vertices.iter().enumerate() {
            emit(i, p.x, p.y);
        }
    }
    pb.close();
}

/// World-space path of a polygon with enforced ring orientation. `None`
/// when the exterior has fewer than three distinct vertices. Degenerate
/// holes are dropped.
pub fn polygon_to_path(polygon: &Polygon) -> Option<Path> {
    if !polygon.exterior.is_valid() {
        return None;
    }

    let mut pb = PathBuilder::new();
    append_ring(&mut pb, &polygon.exterior, true);
    for ring in polygon.interiors.iter().filter(|r| r.is_valid()) {
        append_ring(&mut pb, ring, false);
    }
    pb.finish()
}

/// Tile sources for patterned and bitmap fills.
struct FillSources<'r> {
    motifs: &'r mut MotifCache,
    symbols: &'r mut SymbolCache,
    iteration: u64,
    scale: f32,
}

/// Paint the inside of `path`.
fn fill_polygon(
    canvas: &mut Canvas,
    sources: FillSources<'_>,
    path: &Path,
    bbox: &BoundingBox,
    fill: &FillParams,
    feature: &Feature,
) -> RenderResult<()> {
    let scale = sources.scale;
    match fill.kind {
        FillKind::Solid => fill_solid(canvas, path, fill),
        FillKind::Pattern(fill_style) => {
            let anti_alias = canvas.anti_alias();
            match sources
                .motifs
                .get_or_create(fill_style, fill.color, scale, anti_alias, sources.iteration)?
            {
                Some(tile) => fill_with_tile(canvas, path, bbox, tile, scale, 1.0)?,
                None => fill_solid(canvas, path, fill),
            }
        }
        FillKind::Bitmap(id) => match sources.symbols.get(id, sources.iteration) {
            Ok(bitmap) => {
                let opacity = fill.color.a as f32 / 255.0;
                fill_with_tile(canvas, path, bbox, bitmap, scale, opacity)?;
            }
            Err(e) => {
                warn!(feature = %feature.id(), symbol = id.0, error = %e, "Bitmap fill unavailable, filling solid");
                fill_solid(canvas, path, fill);
            }
        },
    }
    Ok(())
}

fn fill_solid(canvas: &mut Canvas, path: &Path, fill: &FillParams) {
    let paint = canvas.solid_paint(fill.color);
    canvas.fill_path(path, &paint, FillRule::Winding);
}

/// Stroke `path` `params.width` device pixels wide under a world transform
/// whose scale is `1 / resolution`.
pub(crate) fn stroke_world_path(
    canvas: &mut Canvas,
    path: &Path,
    params: &StrokeParams,
    resolution: f64,
) {
    let width = (params.width * resolution) as f32;
    if width.is_nan() || width <= 0.0 {
        return;
    }
    let stroke = build_stroke(params, width);
    let paint = canvas.solid_paint(params.color);
    canvas.stroke_path(path, &paint, &stroke);
}

/// Draws [`Polygon`] features: fill pass, then outline pass.
#[derive(Debug, Default)]
pub struct PolygonRenderer;

impl FeatureRenderer for PolygonRenderer {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Polygon
    }

    fn draw(
        &self,
        ctx: &mut RenderContext<'_>,
        viewport: &Viewport,
        style: &Style,
        feature: &Feature,
    ) -> RenderResult<DrawOutcome> {
        let Geometry::Polygon(polygon) = feature.geometry() else {
            return Ok(DrawOutcome::Skipped);
        };
        // Labels are placed by the host.
        if matches!(style, Style::Label(_)) {
            return Ok(DrawOutcome::Skipped);
        }

        let path = ctx.paths.get_or_build(feature, ctx.iteration, |geometry| match geometry {
            Geometry::Polygon(p) => polygon_to_path(p),
            _ => None,
        });
        let (Some(path), Some(bbox)) = (path, polygon.exterior.bounding_box()) else {
            trace!(feature = %feature.id(), "Polygon has no drawable exterior");
            return Ok(DrawOutcome::Skipped);
        };

        let params = resolve(Some(style), ctx.config);

        let mut canvas = ctx.canvas.save();
        canvas.set_transform(viewport_transform(viewport));

        if let Some(fill) = &params.fill {
            let sources = FillSources {
                motifs: &mut *ctx.motifs,
                symbols: &mut *ctx.symbols,
                iteration: ctx.iteration,
                scale: ctx.config.pattern_scale,
            };
            fill_polygon(&mut canvas, sources, &path, &bbox, fill, feature)?;
        }
        if let Some(outline) = &params.outline {
            stroke_world_path(&mut canvas, &path, outline, viewport.resolution);
        }

        Ok(DrawOutcome::Drawn)
    }
}
