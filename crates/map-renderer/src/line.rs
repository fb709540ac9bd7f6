//! Line string paths and the line renderer.

use map_common::{Feature, Geometry, GeometryKind, LineString, Style, Viewport};
use tiny_skia::{Path, PathBuilder};
use tracing::trace;

use crate::canvas::viewport_transform;
use crate::error::RenderResult;
use crate::polygon::stroke_world_path;
use crate::renderer::{DrawOutcome, FeatureRenderer, RenderContext};
use crate::style::resolve_line;

/// World-space open path through the vertices. `None` for fewer than two.
pub fn line_to_path(line: &LineString) -> Option<Path> {
    let (first, rest) = line.vertices.split_first()?;
    if rest.is_empty() {
        return None;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.finish()
}

/// Draws [`LineString`] features. Stroke only.
#[derive(Debug, Default)]
pub struct LineStringRenderer;

impl FeatureRenderer for LineStringRenderer {
    fn kind(&self) -> GeometryKind {
        GeometryKind::LineString
    }

    fn draw(
        &self,
        ctx: &mut RenderContext<'_>,
        viewport: &Viewport,
        style: &Style,
        feature: &Feature,
    ) -> RenderResult<DrawOutcome> {
        if matches!(style, Style::Label(_)) {
            return Ok(DrawOutcome::Skipped);
        }
        let Some(stroke) = resolve_line(Some(style), ctx.config) else {
            return Ok(DrawOutcome::Skipped);
        };

        let path = ctx.paths.get_or_build(feature, ctx.iteration, |geometry| match geometry {
            Geometry::LineString(line) => line_to_path(line),
            _ => None,
        });
        let Some(path) = path else {
            trace!(feature = %feature.id(), "Line string has fewer than two vertices");
            return Ok(DrawOutcome::Skipped);
        };

        let mut canvas = ctx.canvas.save();
        canvas.set_transform(viewport_transform(viewport));
        stroke_world_path(&mut canvas, &path, &stroke, viewport.resolution);
        Ok(DrawOutcome::Drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_path_is_open() {
        let line = LineString::from_coords(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]);
        let path = line_to_path(&line).unwrap();
        assert_eq!(path.points().len(), 3);
        assert!(!path
            .segments()
            .any(|s| matches!(s, tiny_skia::PathSegment::Close)));
    }

    #[test]
    fn test_short_lines_have_no_path() {
        assert!(line_to_path(&LineString::default()).is_none());
        assert!(line_to_path(&LineString::from_coords(&[(1.0, 1.0)])).is_none());
    }
}
