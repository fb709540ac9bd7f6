//! Tests for the bitmap, symbol and path caches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use map_common::{Feature, Geometry, SymbolId};
use map_renderer::polygon::polygon_to_path;
use map_renderer::{BitmapCache, EvictionPolicy, PathCache, SymbolCache};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_utils::{polygon_with_hole, solid_png, square_polygon};
use tiny_skia::Path;

// ============================================================================
// Helper functions
// ============================================================================

/// Counts how many values have been dropped.
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn build_polygon(geometry: &Geometry) -> Option<Path> {
    match geometry {
        Geometry::Polygon(p) => polygon_to_path(p),
        _ => None,
    }
}

// ============================================================================
// Bitmap cache eviction
// ============================================================================

#[test]
fn test_eviction_keeps_three_times_working_set() {
    let mut cache: BitmapCache<u32, ()> = BitmapCache::default();
    for key in 0..90 {
        cache.put(key, (), 0);
    }
    for key in 90..100 {
        cache.put(key, (), 5);
    }

    let removed = cache.evict(5);

    // 10 used, max(32, 30) = 32 kept.
    assert_eq!(removed, 68);
    assert_eq!(cache.len(), 32);
    for key in 90..100 {
        assert!(cache.contains(&key), "recently used key {} was evicted", key);
    }
}

#[test]
fn test_eviction_below_floor_keeps_everything() {
    let mut cache: BitmapCache<u32, ()> = BitmapCache::default();
    for key in 0..20 {
        cache.put(key, (), 0);
    }
    assert_eq!(cache.evict(100), 0);
    assert_eq!(cache.len(), 20);
}

#[test]
fn test_large_working_set_raises_bound() {
    let policy = EvictionPolicy {
        min_tiles_to_keep: 4,
        tiles_to_keep_multiplier: 2,
    };
    let mut cache: BitmapCache<u32, ()> = BitmapCache::new(policy);
    for key in 0..50 {
        cache.put(key, (), if key < 20 { 1 } else { 0 });
    }
    // 20 used this frame, 40 kept.
    assert_eq!(cache.evict(1), 10);
    assert_eq!(cache.len(), 40);
}

#[test]
fn test_eviction_releases_bitmaps() {
    let drops = Arc::new(AtomicUsize::new(0));
    let mut cache = BitmapCache::default();
    for key in 0u32..50 {
        cache.put(key, DropCounter(Arc::clone(&drops)), 0);
    }

    let removed = cache.evict(1);

    assert_eq!(removed, 18);
    assert_eq!(drops.load(Ordering::SeqCst), 18);
    drop(cache);
    assert_eq!(drops.load(Ordering::SeqCst), 50);
}

#[test]
fn test_replacing_entry_drops_old_bitmap() {
    let drops = Arc::new(AtomicUsize::new(0));
    let mut cache = BitmapCache::default();
    cache.put(1u32, DropCounter(Arc::clone(&drops)), 0);
    cache.put(1u32, DropCounter(Arc::clone(&drops)), 1);

    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.iteration_used(&1), Some(1));
}

#[test]
fn test_random_eviction_removes_oldest() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..25 {
        let policy = EvictionPolicy {
            min_tiles_to_keep: rng.gen_range(1..20),
            tiles_to_keep_multiplier: rng.gen_range(1..4),
        };
        let mut cache: BitmapCache<u32, ()> = BitmapCache::new(policy);
        let current = 10;
        let mut stamps = HashMap::new();
        let total = rng.gen_range(0..200u32);
        for key in 0..total {
            let iteration = rng.gen_range(0..=current);
            stamps.insert(key, iteration);
            cache.put(key, (), iteration);
        }
        let used = stamps.values().filter(|&&it| it == current).count();

        let removed = cache.evict(current);

        let expected_len = (total as usize).min(policy.tiles_to_keep(used));
        assert_eq!(cache.len(), expected_len);
        assert_eq!(removed, total as usize - expected_len);

        let newest_removed = stamps
            .iter()
            .filter(|(k, _)| !cache.contains(k))
            .map(|(_, &it)| it)
            .max();
        let oldest_kept = stamps
            .iter()
            .filter(|(k, _)| cache.contains(k))
            .map(|(_, &it)| it)
            .min();
        if let (Some(removed), Some(kept)) = (newest_removed, oldest_kept) {
            assert!(removed <= kept, "evicted iteration {} newer than kept {}", removed, kept);
        }
    }
}

#[test]
fn test_stats_track_hits_and_evictions() {
    let mut cache: BitmapCache<u32, ()> = BitmapCache::new(EvictionPolicy {
        min_tiles_to_keep: 1,
        tiles_to_keep_multiplier: 1,
    });
    cache.put(1, (), 0);
    cache.put(2, (), 0);

    assert!(cache.touch(&1, 1));
    assert!(!cache.touch(&3, 1));
    cache.evict(1);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.entries, 1);
    assert!(cache.contains(&1));
}

// ============================================================================
// Symbol cache
// ============================================================================

#[test]
fn test_symbols_decode_once() {
    let mut symbols = SymbolCache::default();
    let id = symbols.register(solid_png(6, 3, [0, 255, 0, 255]));

    let size = {
        let bitmap = symbols.get(id, 0).unwrap();
        (bitmap.width(), bitmap.height())
    };
    assert_eq!(size, (6, 3));
    symbols.get(id, 1).unwrap();

    let stats = symbols.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(symbols.decoded_len(), 1);
}

#[test]
fn test_svg_symbol_renders_at_intrinsic_size() {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="12" height="6">
        <rect width="12" height="6" fill="#0000ff"/>
    </svg>"##;
    let mut symbols = SymbolCache::default();
    let id = symbols.register(svg.as_bytes());

    let bitmap = symbols.get(id, 0).unwrap();
    assert_eq!((bitmap.width(), bitmap.height()), (12, 6));
    let px = bitmap.pixel(6, 3).unwrap().demultiply();
    assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (0, 0, 255, 255));
}

#[test]
fn test_unknown_and_broken_symbols_error() {
    let mut symbols = SymbolCache::default();
    assert!(symbols.get(SymbolId(12345), 0).is_err());

    let id = symbols.register(vec![0u8, 1, 2, 3]);
    assert!(symbols.get(id, 0).is_err());
    // The failure is remembered.
    assert!(symbols.get(id, 1).is_err());
    assert_eq!(symbols.decoded_len(), 0);
}

#[test]
fn test_unregister_forgets_symbol() {
    let mut symbols = SymbolCache::default();
    let id = symbols.register(solid_png(2, 2, [1, 2, 3, 255]));
    symbols.get(id, 0).unwrap();

    assert!(symbols.unregister(id));
    assert!(!symbols.contains(id));
    assert!(symbols.get(id, 1).is_err());
    assert!(!symbols.unregister(id));
}

// ============================================================================
// Path cache
// ============================================================================

#[test]
fn test_path_cache_tracks_geometry_version() {
    let mut cache = PathCache::new();
    let mut feature = Feature::new(polygon_with_hole());

    let first = cache
        .get_or_build(&feature, 0, build_polygon)
        .unwrap();
    assert_eq!(cache.cached_version(feature.id()), Some(feature.geometry_version()));

    feature.set_geometry(square_polygon(0.0, 10.0));
    let second = cache
        .get_or_build(&feature, 1, build_polygon)
        .unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.points().len(), 4);
    assert_eq!(cache.stats().builds, 2);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_path_cache_prunes_unused_entries() {
    let mut cache = PathCache::new();
    let old = Feature::new(square_polygon(0.0, 10.0));
    let fresh = Feature::new(square_polygon(20.0, 30.0));

    cache.get_or_build(&old, 0, build_polygon);
    cache.get_or_build(&fresh, 20, build_polygon);

    assert_eq!(cache.prune(20, 16), 1);
    assert_eq!(cache.cached_version(old.id()), None);
    assert!(cache.cached_version(fresh.id()).is_some());
}
