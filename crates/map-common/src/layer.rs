//! Layers: ordered collections of features drawn with a shared style.

use std::fmt;
use std::sync::Arc;

use crate::feature::Feature;
use crate::style::{Style, Visibility};
use crate::BoundingBox;

/// Picks a style for each feature of a layer, e.g. by attribute or size.
pub trait ThemeStyle: Send + Sync {
    /// Style to apply to `feature`, or `None` to fall back to the feature's
    /// own styles only.
    fn style_for(&self, feature: &Feature) -> Option<Style>;
}

impl<F> ThemeStyle for F
where
    F: Fn(&Feature) -> Option<Style> + Send + Sync,
{
    fn style_for(&self, feature: &Feature) -> Option<Style> {
        self(feature)
    }
}

/// Style applied by a layer in addition to the features' own styles.
#[derive(Clone)]
pub enum LayerStyle {
    Fixed(Style),
    Themed(Arc<dyn ThemeStyle>),
}

impl fmt::Debug for LayerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerStyle::Fixed(style) => f.debug_tuple("Fixed").field(style).finish(),
            LayerStyle::Themed(_) => f.write_str("Themed(..)"),
        }
    }
}

impl From<Style> for LayerStyle {
    fn from(style: Style) -> Self {
        LayerStyle::Fixed(style)
    }
}

/// Source of features for the frame renderer.
pub trait Layer {
    fn name(&self) -> &str;

    /// Layer on/off switch and resolution range.
    fn visibility(&self) -> Visibility {
        Visibility::default()
    }

    fn style(&self) -> Option<&LayerStyle>;

    /// Features that may be visible in `extent`. Implementations may return
    /// more than strictly visible; the renderer culls again.
    fn features_in_view(&self, extent: &BoundingBox, resolution: f64) -> Vec<&Feature>;
}

/// A layer holding its features in memory.
#[derive(Debug)]
pub struct MemoryLayer {
    pub name: String,
    pub visibility: Visibility,
    pub style: Option<LayerStyle>,
    pub features: Vec<Feature>,
}

impl MemoryLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::default(),
            style: None,
            features: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: impl Into<LayerStyle>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features.extend(features);
        self
    }
}

impl Layer for MemoryLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn style(&self) -> Option<&LayerStyle> {
        self.style.as_ref()
    }

    fn features_in_view(&self, extent: &BoundingBox, _resolution: f64) -> Vec<&Feature> {
        self.features
            .iter()
            .filter(|f| f.bounding_box().is_some_and(|b| b.intersects(extent)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::style::VectorStyle;

    #[test]
    fn test_memory_layer_filters_by_extent() {
        let layer = MemoryLayer::new("points").with_features([
            Feature::new(Point::new(5.0, 5.0)),
            Feature::new(Point::new(50.0, 50.0)),
        ]);
        let extent = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(layer.features_in_view(&extent, 1.0).len(), 1);
    }

    #[test]
    fn test_closure_theme() {
        let theme: Arc<dyn ThemeStyle> = Arc::new(|f: &Feature| {
            (f.id().get() % 2 == 0).then(|| Style::Vector(VectorStyle::default()))
        });
        let feature = Feature::new(Point::new(0.0, 0.0));
        let expected = feature.id().get() % 2 == 0;
        assert_eq!(theme.style_for(&feature).is_some(), expected);
    }
}
