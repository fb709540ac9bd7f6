//! Registered symbol images for bitmap fills.
//!
//! Hosts register encoded images (PNG, JPEG or SVG) and refer to them from
//! brushes by [`SymbolId`]. Images are decoded on first use; decoded
//! bitmaps live in a [`BitmapCache`] and are evicted with the same
//! size-adaptive rule as raster tiles. Evicted symbols are decoded again
//! from the registered bytes when next needed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use map_common::SymbolId;
use tiny_skia::Pixmap;
use tracing::debug;

use crate::bitmap_cache::{BitmapCache, BitmapCacheStats, EvictionPolicy};
use crate::error::{RenderError, RenderResult};
use crate::raster::pixmap_from_rgba;

/// Decode SVG or raster bytes into a premultiplied pixmap.
///
/// SVG documents are rendered at their intrinsic size.
pub fn decode_symbol(id: SymbolId, bytes: &[u8]) -> RenderResult<Pixmap> {
    let fail = |message: String| RenderError::SymbolDecode { id: id.0, message };

    if looks_like_svg(bytes) {
        let text = std::str::from_utf8(bytes).map_err(|e| fail(e.to_string()))?;
        let opt = usvg::Options::default();
        let tree = usvg::Tree::from_str(text, &opt).map_err(|e| fail(e.to_string()))?;

        let size = tree.size();
        let width = size.width().ceil().max(1.0) as u32;
        let height = size.height().ceil().max(1.0) as u32;
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::SurfaceCreation { width, height })?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        return Ok(pixmap);
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| fail(e.to_string()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    pixmap_from_rgba(&image).ok_or(RenderError::SurfaceCreation { width, height })
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let head = &bytes[start..bytes.len().min(start + 256)];
    head.starts_with(b"<svg") || head.starts_with(b"<?xml") || head.starts_with(b"<!--")
}

pub struct SymbolCache {
    sources: HashMap<SymbolId, Arc<[u8]>>,
    bitmaps: BitmapCache<SymbolId, Pixmap>,
    failed: HashSet<SymbolId>,
    next_id: u64,
}

impl SymbolCache {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            sources: HashMap::new(),
            bitmaps: BitmapCache::new(policy),
            failed: HashSet::new(),
            next_id: 1,
        }
    }

    /// Register encoded image bytes. Ids are never reused.
    pub fn register(&mut self, bytes: impl Into<Arc<[u8]>>) -> SymbolId {
        let id = SymbolId(self.next_id);
        self.next_id += 1;
        self.sources.insert(id, bytes.into());
        id
    }

    /// Forget a symbol and release its decoded bitmap.
    pub fn unregister(&mut self, id: SymbolId) -> bool {
        self.failed.remove(&id);
        self.bitmaps.remove(&id);
        self.sources.remove(&id).is_some()
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.sources.contains_key(&id)
    }

    /// Number of registered symbols.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Number of symbols currently decoded.
    pub fn decoded_len(&self) -> usize {
        self.bitmaps.len()
    }

    /// Decoded bitmap for `id`, marked as used in `iteration`.
    ///
    /// Unknown ids and undecodable images are errors. A decode failure is
    /// remembered so the bytes are not parsed again every frame.
    pub fn get(&mut self, id: SymbolId, iteration: u64) -> RenderResult<&Pixmap> {
        if !self.bitmaps.touch(&id, iteration) {
            let Some(bytes) = self.sources.get(&id) else {
                return Err(RenderError::SymbolDecode {
                    id: id.0,
                    message: "symbol is not registered".to_string(),
                });
            };
            if self.failed.contains(&id) {
                return Err(RenderError::SymbolDecode {
                    id: id.0,
                    message: "image previously failed to decode".to_string(),
                });
            }

            match decode_symbol(id, bytes) {
                Ok(pixmap) => {
                    debug!(symbol = id.0, width = pixmap.width(), height = pixmap.height(), "Decoded symbol");
                    self.bitmaps.put(id, pixmap, iteration);
                }
                Err(e) => {
                    self.failed.insert(id);
                    return Err(e);
                }
            }
        }

        self.bitmaps.get(&id).ok_or(RenderError::SymbolDecode {
            id: id.0,
            message: "symbol bitmap missing after decode".to_string(),
        })
    }

    /// Trim decoded bitmaps after a frame. Returns the number released.
    pub fn evict(&mut self, current_iteration: u64) -> usize {
        self.bitmaps.evict(current_iteration)
    }

    pub fn stats(&self) -> BitmapCacheStats {
        self.bitmaps.stats()
    }
}

impl Default for SymbolCache {
    fn default() -> Self {
        Self::new(EvictionPolicy::default())
    }
}
