//! Drawing surface with a scoped transform and clip stack.
//!
//! `Canvas` wraps a tiny-skia [`Pixmap`] and carries the state the
//! feature renderers change while drawing: the current transform and an
//! optional clip mask. [`Canvas::save`] returns a guard; dropping the guard
//! restores the state that was current when it was created, on every exit
//! path including `?` returns.

use std::ops::{Deref, DerefMut};

use map_common::{Color, Viewport};
use tiny_skia::{FillRule, Mask, Paint, Path, Pixmap, Rect, Shader, Stroke, Transform};

use crate::error::{RenderError, RenderResult};

/// Convert a model color to a tiny-skia color.
pub fn to_skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// World-to-device transform of a viewport as a tiny-skia transform.
pub fn viewport_transform(viewport: &Viewport) -> Transform {
    let m = viewport.world_to_device();
    Transform::from_row(
        m.sx as f32,
        m.ky as f32,
        m.kx as f32,
        m.sy as f32,
        m.tx as f32,
        m.ty as f32,
    )
}

#[derive(Clone)]
struct CanvasState {
    transform: Transform,
    clip: Option<Mask>,
}

pub struct Canvas<'a> {
    pixmap: &'a mut Pixmap,
    state: CanvasState,
    stack: Vec<CanvasState>,
    anti_alias: bool,
}

impl<'a> Canvas<'a> {
    pub fn new(pixmap: &'a mut Pixmap, anti_alias: bool) -> Self {
        Self {
            pixmap,
            state: CanvasState {
                transform: Transform::identity(),
                clip: None,
            },
            stack: Vec::new(),
            anti_alias,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn anti_alias(&self) -> bool {
        self.anti_alias
    }

    /// Depth of the saved-state stack.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    /// Push the current transform and clip. They are restored when the
    /// returned guard is dropped.
    pub fn save(&mut self) -> CanvasGuard<'_, 'a> {
        self.stack.push(self.state.clone());
        CanvasGuard { canvas: self }
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    pub fn transform(&self) -> Transform {
        self.state.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.state.transform = transform;
    }

    pub fn has_clip(&self) -> bool {
        self.state.clip.is_some()
    }

    /// Fill the whole surface, ignoring transform and clip.
    pub fn clear(&mut self, color: Color) {
        self.pixmap.fill(to_skia_color(color));
    }

    /// Intersect the clip with `path` under the current transform.
    pub fn clip_path(&mut self, path: &Path, fill_rule: FillRule) -> RenderResult<()> {
        let transform = self.state.transform;
        if let Some(mask) = self.state.clip.as_mut() {
            mask.intersect_path(path, fill_rule, self.anti_alias, transform);
            return Ok(());
        }

        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let mut mask = Mask::new(width, height).ok_or(RenderError::SurfaceCreation { width, height })?;
        mask.fill_path(path, fill_rule, self.anti_alias, transform);
        self.state.clip = Some(mask);
        Ok(())
    }

    /// Paint with a solid color and the canvas anti-alias setting.
    pub fn solid_paint(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(to_skia_color(color));
        paint.anti_alias = self.anti_alias;
        paint
    }

    /// Paint with a shader and the canvas anti-alias setting.
    pub fn shader_paint<'s>(&self, shader: Shader<'s>) -> Paint<'s> {
        Paint {
            shader,
            anti_alias: self.anti_alias,
            ..Paint::default()
        }
    }

    pub fn fill_path(&mut self, path: &Path, paint: &Paint, fill_rule: FillRule) {
        self.pixmap.fill_path(
            path,
            paint,
            fill_rule,
            self.state.transform,
            self.state.clip.as_ref(),
        );
    }

    pub fn stroke_path(&mut self, path: &Path, paint: &Paint, stroke: &Stroke) {
        self.pixmap.stroke_path(
            path,
            paint,
            stroke,
            self.state.transform,
            self.state.clip.as_ref(),
        );
    }

    pub fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.pixmap
            .fill_rect(rect, paint, self.state.transform, self.state.clip.as_ref());
    }
}

/// Restores the canvas state on drop.
pub struct CanvasGuard<'c, 'a> {
    canvas: &'c mut Canvas<'a>,
}

impl<'a> Deref for CanvasGuard<'_, 'a> {
    type Target = Canvas<'a>;

    fn deref(&self) -> &Self::Target {
        self.canvas
    }
}

impl<'a> DerefMut for CanvasGuard<'_, 'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.canvas
    }
}

impl Drop for CanvasGuard<'_, '_> {
    fn drop(&mut self) {
        self.canvas.restore();
    }
}
