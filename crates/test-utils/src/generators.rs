//! Generators for encoded images and random features.

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use map_common::{BoundingBox, Feature, LinearRing, Polygon, Raster};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// PNG bytes of a `width`x`height` image filled with one RGBA color.
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(rgba));
    encode_png(image)
}

fn encode_png(image: RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("PNG encoding of an in-memory image");
    bytes
}

/// Raster feature showing a solid PNG over `bbox`.
pub fn solid_raster(rgba: [u8; 4], bbox: BoundingBox) -> Raster {
    Raster::new(solid_png(4, 4, rgba), bbox).expect("valid raster")
}

/// Random axis-aligned square polygons inside `0..extent`, with edges of
/// 1 to `max_size` units. Deterministic for a given seed.
pub fn random_squares(count: usize, extent: f64, max_size: f64, seed: u64) -> Vec<Feature> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let size = rng.gen_range(1.0..max_size);
            let x = rng.gen_range(0.0..(extent - size));
            let y = rng.gen_range(0.0..(extent - size));
            let ring = LinearRing::from_coords(&[
                (x, y),
                (x + size, y),
                (x + size, y + size),
                (x, y + size),
                (x, y),
            ]);
            Feature::new(Polygon::new(ring, Vec::new()))
        })
        .collect()
}

/// Random star-shaped polygon around `center` with `vertices` corners.
pub fn random_star(center: (f64, f64), radius: f64, vertices: usize, seed: u64) -> Polygon {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut coords: Vec<(f64, f64)> = (0..vertices)
        .map(|i| {
            let angle = i as f64 / vertices as f64 * std::f64::consts::TAU;
            let r = radius * rng.gen_range(0.4..1.0);
            (center.0 + r * angle.cos(), center.1 + r * angle.sin())
        })
        .collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    Polygon::new(LinearRing::from_coords(&coords), Vec::new())
}
