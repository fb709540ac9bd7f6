//! Shared test utilities for the map renderer workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Geometry and viewport fixtures
//! - Encoded image and feature generators
//! - Pixel inspection helpers for rendered surfaces
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, count_pixels};
//! ```

pub mod fixtures;
pub mod generators;
pub mod pixels;

pub use fixtures::*;
pub use generators::*;
pub use pixels::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of coordinate pairs.
///
/// ```ignore
/// assert_coords_approx_eq!((1.0001, 2.0001), (1.0, 2.0), 0.001);
/// ```
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

/// Assert the straight-alpha color of one pixel of a rendered pixmap.
///
/// ```ignore
/// assert_pixel_eq!(pixmap, 10, 20, Color::BLACK);
/// ```
#[macro_export]
macro_rules! assert_pixel_eq {
    ($pixmap:expr, $x:expr, $y:expr, $color:expr) => {{
        let actual = $crate::pixel_color(&$pixmap, $x, $y);
        let expected = $color;
        if actual != Some(expected) {
            panic!(
                "pixel ({}, {}) mismatch\n  actual: `{:?}`,\n expected: `{:?}`",
                $x, $y, actual, expected
            );
        }
    }};
}
