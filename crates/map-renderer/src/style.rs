//! Style resolution: model styles to concrete paint parameters.
//!
//! Resolution is total. A missing or non-vector style falls back to a
//! black one-pixel outline over a gray solid fill.

use map_common::{Brush, Color, FillStyle, Pen, PenStyle, Style, SymbolId};
use tiny_skia::{LineCap, LineJoin, Stroke, StrokeDash};

use crate::config::RendererConfig;

/// Stroke pass parameters. `width` is in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeParams {
    pub color: Color,
    pub width: f64,
    pub pen_style: PenStyle,
    pub miter_limit: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillKind {
    Solid,
    Pattern(FillStyle),
    Bitmap(SymbolId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillParams {
    pub color: Color,
    pub kind: FillKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaintParams {
    pub outline: Option<StrokeParams>,
    pub fill: Option<FillParams>,
}

fn stroke_params(pen: &Pen, opacity: f32, config: &RendererConfig) -> StrokeParams {
    StrokeParams {
        color: pen.color.with_opacity(opacity),
        width: pen.width,
        pen_style: pen.pen_style,
        miter_limit: config.miter_limit,
    }
}

fn fill_params(brush: &Brush, opacity: f32) -> Option<FillParams> {
    let kind = match (brush.fill_style, brush.bitmap_id) {
        (FillStyle::Bitmap, Some(id)) => FillKind::Bitmap(id),
        // A bitmap fill without an image paints like a solid brush.
        (FillStyle::Bitmap, None) => FillKind::Solid,
        (FillStyle::Solid, _) => FillKind::Solid,
        (pattern, _) => FillKind::Pattern(pattern),
    };

    let color = match (brush.color, kind) {
        (Some(color), _) => color,
        (None, FillKind::Bitmap(_)) => Color::GRAY,
        (None, _) => return None,
    };

    Some(FillParams {
        color: color.with_opacity(opacity),
        kind,
    })
}

fn default_params(config: &RendererConfig) -> PaintParams {
    PaintParams {
        outline: Some(stroke_params(&Pen::default(), 1.0, config)),
        fill: Some(FillParams {
            color: Color::GRAY,
            kind: FillKind::Solid,
        }),
    }
}

/// Paint parameters for an area feature.
pub fn resolve(style: Option<&Style>, config: &RendererConfig) -> PaintParams {
    let Some(Style::Vector(vector)) = style else {
        return default_params(config);
    };

    let pen = vector.outline.as_ref().or(vector.line.as_ref());
    PaintParams {
        outline: pen.map(|p| stroke_params(p, vector.opacity, config)),
        fill: vector
            .fill
            .as_ref()
            .and_then(|b| fill_params(b, vector.opacity)),
    }
}

/// Stroke parameters for a line feature. Prefers the line pen over the
/// outline pen.
pub fn resolve_line(style: Option<&Style>, config: &RendererConfig) -> Option<StrokeParams> {
    match style {
        Some(Style::Vector(vector)) => vector
            .line
            .as_ref()
            .or(vector.outline.as_ref())
            .map(|p| stroke_params(p, vector.opacity, config)),
        _ => Some(stroke_params(&Pen::default(), 1.0, config)),
    }
}

/// On/off intervals for a pen style, in multiples of the line width.
pub fn dash_pattern(pen_style: PenStyle) -> Option<&'static [f32]> {
    match pen_style {
        PenStyle::Solid => None,
        PenStyle::Dash => Some(&[3.0, 1.0]),
        PenStyle::Dot => Some(&[1.0, 1.0]),
        PenStyle::DashDot => Some(&[3.0, 1.0, 1.0, 1.0]),
        PenStyle::DashDotDot => Some(&[3.0, 1.0, 1.0, 1.0, 1.0, 1.0]),
    }
}

/// Build a tiny-skia stroke `width` units wide in the current drawing space.
pub fn build_stroke(params: &StrokeParams, width: f32) -> Stroke {
    let dash = dash_pattern(params.pen_style).and_then(|intervals| {
        StrokeDash::new(intervals.iter().map(|i| i * width).collect(), 0.0)
    });

    Stroke {
        width,
        miter_limit: params.miter_limit,
        line_cap: LineCap::Butt,
        line_join: LineJoin::Miter,
        dash,
    }
}
