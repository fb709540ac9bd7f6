//! Raster tile decoding and drawing.

use image::RgbaImage;
use map_common::{Feature, Geometry, GeometryKind, Raster, Style, Viewport};
use tiny_skia::{ColorU8, FilterQuality, Pattern, Pixmap, Rect, SpreadMode, Transform};
use tracing::{trace, warn};

use crate::canvas::viewport_transform;
use crate::error::{RenderError, RenderResult};
use crate::renderer::{DrawOutcome, FeatureRenderer, RenderContext};

/// Copy a straight-alpha RGBA image into a premultiplied pixmap.
pub fn pixmap_from_rgba(image: &RgbaImage) -> Option<Pixmap> {
    let (width, height) = image.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Decode encoded raster bytes (any format the `image` crate reads).
pub fn decode_raster(raster: &Raster) -> RenderResult<Pixmap> {
    let key = raster.key().id();
    let image = image::load_from_memory(raster.data())
        .map_err(|e| RenderError::RasterDecode {
            key,
            message: e.to_string(),
        })?
        .to_rgba8();

    let (width, height) = image.dimensions();
    pixmap_from_rgba(&image).ok_or(RenderError::SurfaceCreation { width, height })
}

/// Shader transform placing a `width`x`height` image over a world
/// rectangle, with image row 0 at the top edge (`max_y`).
fn image_to_world(raster: &Raster, width: u32, height: u32) -> Transform {
    let bbox = raster.bounding_box();
    Transform::from_row(
        (bbox.width() / width as f64) as f32,
        0.0,
        0.0,
        (-bbox.height() / height as f64) as f32,
        bbox.min_x as f32,
        bbox.max_y as f32,
    )
}

/// Draws [`Raster`] features through the tile cache.
///
/// A tile is decoded the first time its key is seen and re-stamped with
/// the frame iteration on every later use; eviction happens once per frame
/// in the orchestrator.
#[derive(Debug, Default)]
pub struct RasterRenderer;

impl FeatureRenderer for RasterRenderer {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Raster
    }

    fn draw(
        &self,
        ctx: &mut RenderContext<'_>,
        viewport: &Viewport,
        style: &Style,
        feature: &Feature,
    ) -> RenderResult<DrawOutcome> {
        let Geometry::Raster(raster) = feature.geometry() else {
            return Ok(DrawOutcome::Skipped);
        };
        if matches!(style, Style::Label(_)) {
            return Ok(DrawOutcome::Skipped);
        }

        let key = raster.key();
        if !ctx.tiles.touch(&key, ctx.iteration) {
            if ctx.failed_tiles.touch(&key, ctx.iteration) {
                trace!(feature = %feature.id(), tile = key.id(), "Raster previously failed to decode");
                return Ok(DrawOutcome::Skipped);
            }
            match decode_raster(raster) {
                Ok(pixmap) => ctx.tiles.put(key, pixmap, ctx.iteration),
                Err(e) => {
                    warn!(feature = %feature.id(), tile = key.id(), error = %e, "Skipping undecodable raster");
                    ctx.failed_tiles.put(key, (), ctx.iteration);
                    return Ok(DrawOutcome::Skipped);
                }
            }
        }
        let Some(tile) = ctx.tiles.get(&key) else {
            return Ok(DrawOutcome::Skipped);
        };

        let bbox = raster.bounding_box();
        let Some(rect) = Rect::from_ltrb(
            bbox.min_x as f32,
            bbox.min_y as f32,
            bbox.max_x as f32,
            bbox.max_y as f32,
        ) else {
            return Ok(DrawOutcome::Skipped);
        };

        let shader = Pattern::new(
            tile.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            style.opacity().clamp(0.0, 1.0),
            image_to_world(raster, tile.width(), tile.height()),
        );

        let mut canvas = ctx.canvas.save();
        canvas.set_transform(viewport_transform(viewport));
        let paint = canvas.shader_paint(shader);
        canvas.fill_rect(rect, &paint);
        Ok(DrawOutcome::Drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::BoundingBox;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut out = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_premultiplies() {
        let raster = Raster::new(png_bytes(2, 2, [255, 0, 0, 128]), BoundingBox::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        let pixmap = decode_raster(&raster).unwrap();
        let px = pixmap.pixel(0, 0).unwrap();
        assert_eq!(px.alpha(), 128);
        assert_eq!(px.red(), 128);
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let raster = Raster::new(vec![1u8, 2, 3, 4], BoundingBox::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(matches!(
            decode_raster(&raster),
            Err(RenderError::RasterDecode { .. })
        ));
    }

    #[test]
    fn test_image_to_world_flips_rows() {
        let raster = Raster::new(vec![0u8], BoundingBox::new(10.0, 20.0, 30.0, 60.0)).unwrap();
        let t = image_to_world(&raster, 4, 8);
        let mut pts = [tiny_skia::Point::from_xy(0.0, 0.0), tiny_skia::Point::from_xy(4.0, 8.0)];
        t.map_points(&mut pts);
        assert_eq!((pts[0].x, pts[0].y), (10.0, 60.0));
        assert_eq!((pts[1].x, pts[1].y), (30.0, 20.0));
    }
}
