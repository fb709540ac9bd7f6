//! Viewport culling and style iteration.
//!
//! Walks layers (or a flat feature list), drops what is disabled, outside
//! its resolution range, or outside the viewport extent, and calls the
//! visitor once per (viewport, style, feature) triple that survives.

use map_common::{BoundingBox, Feature, Layer, LayerStyle, Style, Viewport};
use tracing::trace;

use crate::error::RenderResult;

fn in_extent(feature: &Feature, extent: &BoundingBox) -> bool {
    feature
        .bounding_box()
        .is_some_and(|bbox| bbox.intersects(extent))
}

fn visit_style<F>(viewport: &Viewport, style: &Style, feature: &Feature, visit: &mut F) -> RenderResult<usize>
where
    F: FnMut(&Viewport, &Style, &Feature) -> RenderResult<()>,
{
    if !style.is_visible_at(viewport.resolution) {
        return Ok(0);
    }
    visit(viewport, style, feature)?;
    Ok(1)
}

fn visit_own_styles<F>(viewport: &Viewport, feature: &Feature, visit: &mut F) -> RenderResult<usize>
where
    F: FnMut(&Viewport, &Style, &Feature) -> RenderResult<()>,
{
    let mut visits = 0;
    for style in &feature.styles {
        visits += visit_style(viewport, style, feature, visit)?;
    }
    Ok(visits)
}

/// Visit every visible feature of every visible layer.
///
/// For each feature the layer style comes first (the fixed style, or
/// whatever the theme picks for the feature), then the feature's own
/// styles in order. Returns the number of visits; the first visitor error
/// stops the walk.
pub fn iterate_layers<F>(viewport: &Viewport, layers: &[Box<dyn Layer>], mut visit: F) -> RenderResult<usize>
where
    F: FnMut(&Viewport, &Style, &Feature) -> RenderResult<()>,
{
    let extent = viewport.extent();
    let resolution = viewport.resolution;
    let mut visits = 0;

    for layer in layers {
        if !layer.visibility().admits(resolution) {
            trace!(layer = layer.name(), resolution, "Layer hidden");
            continue;
        }

        for feature in layer.features_in_view(&extent, resolution) {
            if !in_extent(feature, &extent) {
                continue;
            }

            match layer.style() {
                Some(LayerStyle::Fixed(style)) => {
                    visits += visit_style(viewport, style, feature, &mut visit)?;
                }
                Some(LayerStyle::Themed(theme)) => {
                    if let Some(style) = theme.style_for(feature) {
                        visits += visit_style(viewport, &style, feature, &mut visit)?;
                    }
                }
                None => {}
            }
            visits += visit_own_styles(viewport, feature, &mut visit)?;
        }
    }

    Ok(visits)
}

/// Visit features from a flat list with a shared style, then each
/// feature's own styles.
pub fn iterate_features<F>(
    viewport: &Viewport,
    features: &[Feature],
    style: &Style,
    mut visit: F,
) -> RenderResult<usize>
where
    F: FnMut(&Viewport, &Style, &Feature) -> RenderResult<()>,
{
    let extent = viewport.extent();
    let mut visits = 0;

    for feature in features.iter().filter(|f| in_extent(f, &extent)) {
        visits += visit_style(viewport, style, feature, &mut visit)?;
        visits += visit_own_styles(viewport, feature, &mut visit)?;
    }

    Ok(visits)
}
