//! Generation-stamped bitmap cache with size-adaptive eviction.
//!
//! Every entry remembers the last frame iteration it was used in. Once per
//! frame the cache is trimmed to a multiple of the number of bitmaps used
//! in that frame (with a floor), removing the least recently used first.
//! This keeps roughly three times the visible working set around, so tiles
//! that just scrolled off screen survive a quick pan back while idle tiles
//! eventually fall out.
//!
//! The cache owns its bitmaps. Eviction drops them, which is the only place
//! a cached bitmap is released.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::config::RendererConfig;

/// Retention bound used by [`BitmapCache::evict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    pub min_tiles_to_keep: usize,
    pub tiles_to_keep_multiplier: usize,
}

impl EvictionPolicy {
    pub const DEFAULT_MIN_TILES_TO_KEEP: usize = 32;
    pub const DEFAULT_TILES_TO_KEEP_MULTIPLIER: usize = 3;

    /// Number of entries retained when `used` entries were touched this frame.
    pub fn tiles_to_keep(&self, used: usize) -> usize {
        used.saturating_mul(self.tiles_to_keep_multiplier)
            .max(self.min_tiles_to_keep)
    }
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            min_tiles_to_keep: Self::DEFAULT_MIN_TILES_TO_KEEP,
            tiles_to_keep_multiplier: Self::DEFAULT_TILES_TO_KEEP_MULTIPLIER,
        }
    }
}

impl From<&RendererConfig> for EvictionPolicy {
    fn from(config: &RendererConfig) -> Self {
        Self {
            min_tiles_to_keep: config.min_tiles_to_keep,
            tiles_to_keep_multiplier: config.tiles_to_keep_multiplier,
        }
    }
}

#[derive(Debug)]
struct CacheEntry<B> {
    bitmap: B,
    iteration_used: u64,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitmapCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Keyed bitmap store.
///
/// `K` is an identity handle such as [`map_common::TileKey`]; two keys are
/// the same entry only if they compare equal. Ties in age are broken by key
/// order so eviction is deterministic.
#[derive(Debug)]
pub struct BitmapCache<K, B> {
    entries: HashMap<K, CacheEntry<B>>,
    policy: EvictionPolicy,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K, B> BitmapCache<K, B>
where
    K: Copy + Eq + Hash + Ord,
{
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Look up a bitmap without changing its age. Not counted in stats.
    pub fn get(&self, key: &K) -> Option<&B> {
        self.entries.get(key).map(|e| &e.bitmap)
    }

    /// Mark an entry as used in `iteration`. Returns false when absent.
    pub fn touch(&mut self, key: &K, iteration: u64) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                self.hits += 1;
                entry.iteration_used = iteration;
                true
            }
            None => {
                self.misses += 1;
                false
            }
        }
    }

    /// Look up a bitmap and mark it as used in `iteration`.
    pub fn get_for_iteration(&mut self, key: &K, iteration: u64) -> Option<&B> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                self.hits += 1;
                entry.iteration_used = iteration;
                Some(&entry.bitmap)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert a bitmap used in `iteration`. A bitmap already stored under
    /// `key` is released.
    pub fn put(&mut self, key: K, bitmap: B, iteration: u64) {
        self.entries.insert(
            key,
            CacheEntry {
                bitmap,
                iteration_used: iteration,
            },
        );
    }

    /// Take an entry out of the cache, handing its bitmap to the caller.
    pub fn remove(&mut self, key: &K) -> Option<B> {
        self.entries.remove(key).map(|e| e.bitmap)
    }

    pub fn iteration_used(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|e| e.iteration_used)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Trim the cache after frame `current_iteration` has been drawn.
    ///
    /// Keeps `max(min_tiles_to_keep, multiplier * used)` entries, where
    /// `used` counts entries stamped with `current_iteration`, and releases
    /// the oldest of the rest. Returns the number of entries removed.
    pub fn evict(&mut self, current_iteration: u64) -> usize {
        let used = self
            .entries
            .values()
            .filter(|e| e.iteration_used == current_iteration)
            .count();
        let keep = self.policy.tiles_to_keep(used);
        let total = self.entries.len();

        if total <= keep {
            return 0;
        }
        let to_remove = total - keep;

        let mut by_age: Vec<(u64, K)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.iteration_used, *key))
            .collect();
        by_age.sort_unstable();

        for (_, key) in by_age.into_iter().take(to_remove) {
            // Dropping the entry releases the bitmap.
            self.entries.remove(&key);
        }
        self.evictions += to_remove as u64;

        debug!(
            iteration = current_iteration,
            used,
            keep,
            removed = to_remove,
            "Evicted stale bitmaps"
        );
        to_remove
    }

    pub fn stats(&self) -> BitmapCacheStats {
        BitmapCacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            entries: self.entries.len(),
        }
    }
}

impl<K, B> Default for BitmapCache<K, B>
where
    K: Copy + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self::new(EvictionPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_to_keep_has_floor() {
        let policy = EvictionPolicy::default();
        assert_eq!(policy.tiles_to_keep(0), 32);
        assert_eq!(policy.tiles_to_keep(10), 32);
        assert_eq!(policy.tiles_to_keep(11), 33);
        assert_eq!(policy.tiles_to_keep(100), 300);
    }

    #[test]
    fn test_under_floor_keeps_everything() {
        let mut cache: BitmapCache<u32, Vec<u8>> = BitmapCache::default();
        for i in 0..32 {
            cache.put(i, vec![0; 4], 0);
        }
        assert_eq!(cache.evict(100), 0);
        assert_eq!(cache.len(), 32);
    }

    #[test]
    fn test_get_for_iteration_updates_stamp() {
        let mut cache: BitmapCache<u32, &str> = BitmapCache::default();
        cache.put(7, "tile", 1);
        assert_eq!(cache.get_for_iteration(&7, 5), Some(&"tile"));
        assert_eq!(cache.iteration_used(&7), Some(5));
        assert!(cache.get_for_iteration(&8, 5).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_ties_broken_by_key() {
        let policy = EvictionPolicy {
            min_tiles_to_keep: 2,
            tiles_to_keep_multiplier: 1,
        };
        let mut cache: BitmapCache<u32, ()> = BitmapCache::new(policy);
        for key in [4, 1, 3, 2] {
            cache.put(key, (), 0);
        }
        assert_eq!(cache.evict(9), 2);
        assert!(cache.contains(&3) && cache.contains(&4));
    }
}
