//! PNG encoding of rendered frames.
//!
//! Frames usually contain only a handful of distinct colors (background,
//! fills, outlines), so the encoder first tries to build a palette and
//! writes an indexed PNG (color type 3). Antialiased or raster-heavy frames
//! exceed 256 colors and fall back to straight RGBA (color type 6).

use std::collections::{HashMap, HashSet};
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use rayon::prelude::*;
use tiny_skia::Pixmap;

use crate::error::{RenderError, RenderResult};

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const MAX_PALETTE_SIZE: usize = 256;

/// Frames with at least this many pixels scan for colors in parallel.
const PARALLEL_THRESHOLD: usize = 64 * 64;

/// Color type written by [`encode_rgba_auto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngColorType {
    Indexed,
    Rgba,
}

/// Palette plus one index per pixel.
#[derive(Debug, Clone)]
pub struct IndexedImage {
    pub palette: Vec<[u8; 4]>,
    pub indices: Vec<u8>,
}

/// Encode a rendered pixmap.
///
/// tiny-skia stores premultiplied color; pixels are demultiplied before
/// encoding so partially transparent edges keep their hue.
pub fn encode_pixmap(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    encode_rgba_auto(&rgba, pixmap.width(), pixmap.height()).map(|(png, _)| png)
}

/// Encode straight RGBA bytes, choosing indexed output when the image fits
/// in a palette. Returns the bytes and the color type used.
pub fn encode_rgba_auto(
    rgba: &[u8],
    width: u32,
    height: u32,
) -> RenderResult<(Vec<u8>, PngColorType)> {
    check_len(rgba.len(), width, height, 4)?;

    let pixel_count = rgba.len() / 4;
    let indexed = if pixel_count >= PARALLEL_THRESHOLD {
        index_colors_parallel(rgba)
    } else {
        index_colors(rgba)
    };

    match indexed {
        Some(image) => Ok((encode_indexed(&image, width, height)?, PngColorType::Indexed)),
        None => Ok((encode_rgba(rgba, width, height)?, PngColorType::Rgba)),
    }
}

#[inline(always)]
fn pack(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

/// Build a palette in first-seen order. `None` when there are more than
/// 256 colors.
pub fn index_colors(rgba: &[u8]) -> Option<IndexedImage> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(rgba.len() / 4);

    for px in rgba.chunks_exact(4) {
        let key = pack(px);
        let index = match lookup.get(&key) {
            Some(&i) => i,
            None => {
                if palette.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push([px[0], px[1], px[2], px[3]]);
                lookup.insert(key, i);
                i
            }
        };
        indices.push(index);
    }

    Some(IndexedImage { palette, indices })
}

/// Same result set as [`index_colors`] for large frames. The palette is
/// sorted by packed value rather than first-seen order.
fn index_colors_parallel(rgba: &[u8]) -> Option<IndexedImage> {
    let chunk_px = (rgba.len() / 4 / rayon::current_num_threads()).max(256);

    let colors = rgba
        .par_chunks(chunk_px * 4)
        .try_fold(HashSet::new, |mut seen: HashSet<u32>, chunk| {
            for px in chunk.chunks_exact(4) {
                seen.insert(pack(px));
                if seen.len() > MAX_PALETTE_SIZE {
                    return None;
                }
            }
            Some(seen)
        })
        .try_reduce(HashSet::new, |mut a, b| {
            a.extend(b);
            (a.len() <= MAX_PALETTE_SIZE).then_some(a)
        })?;

    let mut sorted: Vec<u32> = colors.into_iter().collect();
    sorted.sort_unstable();
    let lookup: HashMap<u32, u8> = sorted
        .iter()
        .enumerate()
        .map(|(i, &c)| (c, i as u8))
        .collect();

    let indices: Vec<u8> = rgba
        .par_chunks_exact(4)
        .map(|px| lookup.get(&pack(px)).copied().unwrap_or(0))
        .collect();
    let palette = sorted.into_iter().map(u32::to_le_bytes).collect();

    Some(IndexedImage { palette, indices })
}

/// Write a color type 3 PNG. A `tRNS` chunk is added only when some
/// palette entry is not opaque.
pub fn encode_indexed(image: &IndexedImage, width: u32, height: u32) -> RenderResult<Vec<u8>> {
    check_len(image.indices.len(), width, height, 1)?;
    if image.palette.is_empty() || image.palette.len() > MAX_PALETTE_SIZE {
        return Err(RenderError::Encoding(format!(
            "palette must hold 1..={} colors, got {}",
            MAX_PALETTE_SIZE,
            image.palette.len()
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &header(width, height, 3));

    let plte: Vec<u8> = image.palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if image.palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = image.palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(&image.indices, width as usize, height as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Write a color type 6 PNG from straight RGBA bytes.
pub fn encode_rgba(rgba: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    check_len(rgba.len(), width, height, 4)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &header(width, height, 6));
    let idat = deflate_scanlines(rgba, width as usize * 4, height as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn check_len(len: usize, width: u32, height: u32, bytes_per_pixel: usize) -> RenderResult<()> {
    let expected = width as usize * height as usize * bytes_per_pixel;
    if width == 0 || height == 0 {
        return Err(RenderError::Encoding(format!(
            "cannot encode a {}x{} image",
            width, height
        )));
    }
    if len != expected {
        return Err(RenderError::Encoding(format!(
            "expected {} bytes for {}x{}, got {}",
            expected, width, height, len
        )));
    }
    Ok(())
}

fn header(width: u32, height: u32, color_type: u8) -> [u8; 13] {
    let mut ihdr = [0u8; 13];
    ihdr[0..4].copy_from_slice(&width.to_be_bytes());
    ihdr[4..8].copy_from_slice(&height.to_be_bytes());
    ihdr[8] = 8; // bit depth
    ihdr[9] = color_type;
    // compression, filter and interlace methods stay 0
    ihdr
}

/// Prefix each row with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize, rows: usize) -> RenderResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(rows * (row_bytes + 1));
    for row in data.chunks_exact(row_bytes).take(rows) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(kind);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_color_frame(width: u32, height: u32) -> Vec<u8> {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                if (x + y) % 2 == 0 {
                    rgba.extend_from_slice(&[128, 128, 128, 255]);
                } else {
                    rgba.extend_from_slice(&[0, 0, 0, 255]);
                }
            }
        }
        rgba
    }

    #[test]
    fn test_index_colors_first_seen_order() {
        let rgba = [
            255, 0, 0, 255, //
            0, 255, 0, 255, //
            255, 0, 0, 255, //
            0, 0, 0, 0,
        ];
        let image = index_colors(&rgba).unwrap();
        assert_eq!(image.palette.len(), 3);
        assert_eq!(image.indices, vec![0, 1, 0, 2]);
    }

    #[test]
    fn test_parallel_matches_color_count() {
        let rgba = two_color_frame(128, 128);
        let image = index_colors_parallel(&rgba).unwrap();
        assert_eq!(image.palette.len(), 2);
        assert_eq!(image.indices.len(), 128 * 128);
        assert_ne!(image.indices[0], image.indices[1]);
    }

    #[test]
    fn test_too_many_colors_is_none() {
        let rgba: Vec<u8> = (0..300u32).flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 0, 255]).collect();
        assert!(index_colors(&rgba).is_none());
    }

    #[test]
    fn test_auto_picks_color_type() {
        let (png, kind) = encode_rgba_auto(&two_color_frame(8, 8), 8, 8).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        assert_eq!(kind, PngColorType::Indexed);

        let rgba: Vec<u8> = (0..300u32).flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 7, 255]).collect();
        let (_, kind) = encode_rgba_auto(&rgba, 300, 1).unwrap();
        assert_eq!(kind, PngColorType::Rgba);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        assert!(matches!(
            encode_rgba(&[0; 12], 2, 2),
            Err(RenderError::Encoding(_))
        ));
        assert!(encode_rgba(&[], 0, 0).is_err());
    }
}
