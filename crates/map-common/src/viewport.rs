//! Viewport: the camera state for one frame.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::BoundingBox;

/// Affine transform in row form `[sx, ky, kx, sy, tx, ty]`:
///
/// ```text
/// x' = sx * x + kx * y + tx
/// y' = ky * x + sy * y + ty
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub sx: f64,
    pub ky: f64,
    pub kx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Affine {
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.sx * p.x + self.kx * p.y + self.tx,
            self.ky * p.x + self.sy * p.y + self.ty,
        )
    }
}

/// What part of the world is shown and at which scale.
///
/// Device y grows downward while world y grows upward; the center of the
/// viewport maps to the center of the device surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Point,
    /// Device width in pixels
    pub width: f64,
    /// Device height in pixels
    pub height: f64,
    /// World units per device pixel
    pub resolution: f64,
    /// Clockwise screen rotation in degrees
    #[serde(default)]
    pub rotation: f64,
}

impl Viewport {
    pub fn new(center: Point, width: f64, height: f64, resolution: f64) -> Self {
        Self {
            center,
            width,
            height,
            resolution,
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// World-to-device transform.
    pub fn world_to_device(&self) -> Affine {
        let r = self.resolution;
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        // Unrotated: x' = (x - cx)/r + hw, y' = (cy - y)/r + hh.
        // Rotation is applied about the device center.
        let sx = cos / r;
        let kx = sin / r;
        let ky = sin / r;
        let sy = -cos / r;
        let tx = hw - (cos * self.center.x + sin * self.center.y) / r;
        let ty = hh - (sin * self.center.x - cos * self.center.y) / r;
        Affine {
            sx,
            ky,
            kx,
            sy,
            tx,
            ty,
        }
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        self.world_to_device().apply(p)
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        let r = self.resolution;
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let dx = p.x - self.width / 2.0;
        let dy = p.y - self.height / 2.0;
        // Undo the rotation, then the scale and flip.
        let ux = cos * dx + sin * dy;
        let uy = -sin * dx + cos * dy;
        Point::new(self.center.x + ux * r, self.center.y - uy * r)
    }

    /// Axis-aligned world rectangle covering the (possibly rotated) screen.
    pub fn extent(&self) -> BoundingBox {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let half_w = (self.width * cos.abs() + self.height * sin.abs()) * self.resolution / 2.0;
        let half_h = (self.width * sin.abs() + self.height * cos.abs()) * self.resolution / 2.0;
        BoundingBox::new(
            self.center.x - half_w,
            self.center.y - half_h,
            self.center.x + half_w,
            self.center.y + half_h,
        )
    }

    /// True when the viewport maps to at least one pixel.
    pub fn has_size(&self) -> bool {
        self.width >= 1.0 && self.height >= 1.0 && self.resolution > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_center_maps_to_screen_center() {
        let vp = Viewport::new(Point::new(1000.0, -500.0), 256.0, 128.0, 10.0);
        assert_point_eq(vp.world_to_screen(vp.center), Point::new(128.0, 64.0));
    }

    #[test]
    fn test_y_axis_flips() {
        let vp = Viewport::new(Point::new(100.0, 100.0), 200.0, 200.0, 1.0);
        assert_point_eq(vp.world_to_screen(Point::new(50.0, 150.0)), Point::new(50.0, 50.0));
        assert_point_eq(vp.world_to_screen(Point::new(150.0, 50.0)), Point::new(150.0, 150.0));
    }

    #[test]
    fn test_rotation_round_trip() {
        let vp = Viewport::new(Point::new(10.0, 20.0), 300.0, 200.0, 2.5).with_rotation(30.0);
        let world = Point::new(47.0, -13.0);
        assert_point_eq(vp.screen_to_world(vp.world_to_screen(world)), world);
    }

    #[test]
    fn test_rotated_extent_grows() {
        let vp = Viewport::new(Point::new(0.0, 0.0), 100.0, 100.0, 1.0);
        let rotated = vp.with_rotation(45.0);
        assert!((vp.extent().width() - 100.0).abs() < 1e-9);
        assert!((rotated.extent().width() - 100.0 * 2f64.sqrt()).abs() < 1e-9);
    }
}
