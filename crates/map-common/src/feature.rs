//! Features: a geometry paired with the styles used to draw it.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::Geometry;
use crate::style::Style;
use crate::BoundingBox;

static FEATURE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a feature for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(u64);

impl FeatureId {
    fn next() -> Self {
        Self(FEATURE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A renderable entity.
///
/// The geometry is only reachable mutably through [`Feature::set_geometry`]
/// and [`Feature::geometry_mut`], both of which bump the geometry version so
/// renderers caching derived paths can tell when to rebuild them.
#[derive(Debug)]
pub struct Feature {
    id: FeatureId,
    geometry: Geometry,
    geometry_version: u64,
    pub styles: Vec<Style>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry>) -> Self {
        Self {
            id: FeatureId::next(),
            geometry: geometry.into(),
            geometry_version: 0,
            styles: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.styles.push(style);
        self
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn geometry_version(&self) -> u64 {
        self.geometry_version
    }

    pub fn set_geometry(&mut self, geometry: impl Into<Geometry>) {
        self.geometry = geometry.into();
        self.geometry_version += 1;
    }

    /// Mutable access to the geometry. Counts as a modification even if the
    /// caller ends up not changing anything.
    pub fn geometry_mut(&mut self) -> &mut Geometry {
        self.geometry_version += 1;
        &mut self.geometry
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.geometry.bounding_box()
    }
}

/// Separately constructed features never share an id.
impl Clone for Feature {
    fn clone(&self) -> Self {
        Self {
            id: FeatureId::next(),
            geometry: self.geometry.clone(),
            geometry_version: 0,
            styles: self.styles.clone(),
        }
    }
}
