//! Device path cache keyed by feature identity.
//!
//! Building a path from a large polygon is the dominant per-feature cost,
//! and map geometry rarely changes between frames. Entries are keyed by
//! [`FeatureId`] and remember the geometry version they were built from; a
//! version mismatch rebuilds the path in place.

use std::collections::HashMap;
use std::sync::Arc;

use map_common::{Feature, FeatureId, Geometry};
use tiny_skia::Path;
use tracing::trace;

struct PathEntry {
    version: u64,
    path: Arc<Path>,
    last_used: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathCacheStats {
    pub hits: u64,
    pub builds: u64,
    pub pruned: u64,
    pub entries: usize,
}

#[derive(Default)]
pub struct PathCache {
    entries: HashMap<FeatureId, PathEntry>,
    hits: u64,
    builds: u64,
    pruned: u64,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached path for `feature`, building it with `build` when absent or
    /// stale. Geometry that yields no path leaves no entry behind.
    pub fn get_or_build<F>(&mut self, feature: &Feature, iteration: u64, build: F) -> Option<Arc<Path>>
    where
        F: FnOnce(&Geometry) -> Option<Path>,
    {
        let id = feature.id();
        let version = feature.geometry_version();

        if let Some(entry) = self.entries.get_mut(&id) {
            if entry.version == version {
                entry.last_used = iteration;
                self.hits += 1;
                return Some(Arc::clone(&entry.path));
            }
            trace!(feature = %id, cached = entry.version, current = version, "Stale path");
        }

        let Some(path) = build(feature.geometry()) else {
            self.entries.remove(&id);
            return None;
        };
        self.builds += 1;

        let path = Arc::new(path);
        self.entries.insert(
            id,
            PathEntry {
                version,
                path: Arc::clone(&path),
                last_used: iteration,
            },
        );
        Some(path)
    }

    /// Drop entries not used within the last `max_age` iterations.
    pub fn prune(&mut self, current_iteration: u64, max_age: u64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| current_iteration.saturating_sub(e.last_used) <= max_age);
        let removed = before - self.entries.len();
        self.pruned += removed as u64;
        removed
    }

    pub fn invalidate(&mut self, id: FeatureId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Geometry version the cached path for `id` was built from.
    pub fn cached_version(&self, id: FeatureId) -> Option<u64> {
        self.entries.get(&id).map(|e| e.version)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> PathCacheStats {
        PathCacheStats {
            hits: self.hits,
            builds: self.builds,
            pruned: self.pruned,
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::Point;
    use tiny_skia::PathBuilder;

    fn unit_path(_: &Geometry) -> Option<Path> {
        let mut pb = PathBuilder::new();
        pb.move_to(0.0, 0.0);
        pb.line_to(1.0, 1.0);
        pb.finish()
    }

    #[test]
    fn test_builds_once_per_version() {
        let mut cache = PathCache::new();
        let mut feature = Feature::new(Point::new(0.0, 0.0));

        assert!(cache.get_or_build(&feature, 0, unit_path).is_some());
        assert!(cache.get_or_build(&feature, 1, unit_path).is_some());
        assert_eq!(cache.stats().builds, 1);
        assert_eq!(cache.stats().hits, 1);

        feature.set_geometry(Point::new(2.0, 2.0));
        cache.get_or_build(&feature, 2, unit_path);
        assert_eq!(cache.stats().builds, 2);
        assert_eq!(cache.cached_version(feature.id()), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_build_removes_entry() {
        let mut cache = PathCache::new();
        let mut feature = Feature::new(Point::new(0.0, 0.0));
        cache.get_or_build(&feature, 0, unit_path);

        feature.set_geometry(Point::new(1.0, 1.0));
        assert!(cache.get_or_build(&feature, 1, |_| None).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_prune_by_age() {
        let mut cache = PathCache::new();
        let old = Feature::new(Point::new(0.0, 0.0));
        let fresh = Feature::new(Point::new(1.0, 1.0));
        cache.get_or_build(&old, 0, unit_path);
        cache.get_or_build(&fresh, 20, unit_path);

        assert_eq!(cache.prune(20, 16), 1);
        assert_eq!(cache.cached_version(fresh.id()), Some(0));
        assert!(cache.cached_version(old.id()).is_none());
        assert_eq!(cache.stats().pruned, 1);
    }
}
