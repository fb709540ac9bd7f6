//! Style model for map features.
//!
//! Styles describe *what* a feature should look like; turning them into
//! concrete paint is the renderer's job. Styles can be built in code or
//! loaded from a JSON catalog:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "styles": {
//!     "parcels": {
//!       "type": "vector",
//!       "outline": { "color": "#000000", "width": 1.0 },
//!       "fill": { "color": "gray", "fill_style": "cross" }
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{MapError, MapResult};

/// An RGBA color with 8 bits per channel (not premultiplied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "ColorSpec", into = "ColorSpec")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `"#RRGGBB"` or `"#RRGGBBAA"` (the `#` is optional).
    pub fn from_hex(hex: &str) -> MapResult<Self> {
        let s = hex.trim_start_matches('#');
        let channel = |i: usize| {
            s.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .ok_or_else(|| MapError::InvalidColor(hex.to_string()))
        };

        match s.len() {
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(MapError::InvalidColor(hex.to_string())),
        }
    }

    /// Look up a CSS-style color name.
    pub fn from_name(name: &str) -> Option<Self> {
        let color = match name.to_lowercase().as_str() {
            "transparent" => Color::TRANSPARENT,
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::RED,
            "green" => Color::GREEN,
            "blue" => Color::BLUE,
            "yellow" => Color::rgb(255, 255, 0),
            "cyan" => Color::rgb(0, 255, 255),
            "magenta" => Color::rgb(255, 0, 255),
            "orange" => Color::rgb(255, 165, 0),
            "purple" => Color::rgb(128, 0, 128),
            "gray" | "grey" => Color::GRAY,
            _ => return None,
        };
        Some(color)
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Scale the alpha channel by `opacity` (clamped to 0..=1).
    pub fn with_opacity(&self, opacity: f32) -> Color {
        let opacity = opacity.clamp(0.0, 1.0);
        Color {
            a: (self.a as f32 * opacity).round() as u8,
            ..*self
        }
    }
}

impl std::str::FromStr for Color {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('#') {
            Color::from_hex(s)
        } else {
            Color::from_name(s)
                .map(Ok)
                .unwrap_or_else(|| Color::from_hex(s))
        }
    }
}

/// Accepted serialized forms of a color.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ColorSpec {
    /// Hex string or color name
    Text(String),

    /// RGB array: [r, g, b] or [r, g, b, a]
    Array(Vec<u8>),

    /// Explicit RGBA
    Rgba {
        r: u8,
        g: u8,
        b: u8,
        #[serde(default = "opaque")]
        a: u8,
    },
}

fn opaque() -> u8 {
    255
}

impl TryFrom<ColorSpec> for Color {
    type Error = MapError;

    fn try_from(spec: ColorSpec) -> Result<Self, Self::Error> {
        match spec {
            ColorSpec::Text(s) => s.parse(),
            ColorSpec::Array(arr) if arr.len() == 3 || arr.len() == 4 => Ok(Color::rgba(
                arr[0],
                arr[1],
                arr[2],
                arr.get(3).copied().unwrap_or(255),
            )),
            ColorSpec::Array(arr) => Err(MapError::InvalidColor(format!(
                "expected 3 or 4 channels, got {}",
                arr.len()
            ))),
            ColorSpec::Rgba { r, g, b, a } => Ok(Color::rgba(r, g, b, a)),
        }
    }
}

impl From<Color> for ColorSpec {
    fn from(color: Color) -> Self {
        ColorSpec::Text(color.to_hex())
    }
}

/// Dash pattern of an outline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
}

/// Outline or line paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pen {
    #[serde(default = "default_pen_color")]
    pub color: Color,
    /// Width in device pixels at resolution 1.
    #[serde(default = "default_pen_width")]
    pub width: f64,
    #[serde(default)]
    pub pen_style: PenStyle,
}

fn default_pen_color() -> Color {
    Color::BLACK
}

fn default_pen_width() -> f64 {
    1.0
}

impl Pen {
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            pen_style: PenStyle::Solid,
        }
    }
}

impl Default for Pen {
    fn default() -> Self {
        Pen::new(Color::BLACK, 1.0)
    }
}

/// How the inside of a polygon is painted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStyle {
    #[default]
    Solid,
    Cross,
    DiagonalCross,
    BackwardDiagonal,
    ForwardDiagonal,
    Dotted,
    Horizontal,
    Vertical,
    /// Tile the image referenced by [`Brush::bitmap_id`].
    Bitmap,
}

/// Identifier of an image registered with a symbol cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u64);

/// Area paint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub fill_style: FillStyle,
    #[serde(default)]
    pub bitmap_id: Option<SymbolId>,
}

impl Brush {
    pub fn solid(color: Color) -> Self {
        Self {
            color: Some(color),
            fill_style: FillStyle::Solid,
            bitmap_id: None,
        }
    }

    pub fn pattern(color: Color, fill_style: FillStyle) -> Self {
        Self {
            color: Some(color),
            fill_style,
            bitmap_id: None,
        }
    }

    pub fn bitmap(bitmap_id: SymbolId) -> Self {
        Self {
            color: None,
            fill_style: FillStyle::Bitmap,
            bitmap_id: Some(bitmap_id),
        }
    }
}

/// Resolution range and on/off switch shared by every style variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub min_visible: f64,
    #[serde(default = "default_max_visible")]
    pub max_visible: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_max_visible() -> f64 {
    f64::MAX
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            enabled: true,
            min_visible: 0.0,
            max_visible: f64::MAX,
        }
    }
}

impl Visibility {
    /// Both bounds are inclusive.
    pub fn admits(&self, resolution: f64) -> bool {
        self.enabled && self.min_visible <= resolution && resolution <= self.max_visible
    }
}

fn default_opacity() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStyle {
    #[serde(default, flatten)]
    pub visibility: Visibility,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Polygon outline.
    #[serde(default)]
    pub outline: Option<Pen>,
    /// Pen for line geometries.
    #[serde(default)]
    pub line: Option<Pen>,
    #[serde(default)]
    pub fill: Option<Brush>,
}

impl Default for VectorStyle {
    fn default() -> Self {
        Self {
            visibility: Visibility::default(),
            opacity: 1.0,
            outline: Some(Pen::default()),
            line: Some(Pen::default()),
            fill: Some(Brush::solid(Color::GRAY)),
        }
    }
}

/// Text label settings. Labels are laid out and drawn outside the frame
/// pipeline; the renderer only carries them through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    #[serde(default, flatten)]
    pub visibility: Visibility,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    pub text: String,
    #[serde(default = "default_pen_color")]
    pub fore_color: Color,
    #[serde(default)]
    pub back_color: Option<Brush>,
    #[serde(default)]
    pub halo: Option<Pen>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterStyle {
    #[serde(default, flatten)]
    pub visibility: Visibility,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

impl Default for RasterStyle {
    fn default() -> Self {
        Self {
            visibility: Visibility::default(),
            opacity: 1.0,
        }
    }
}

/// A style attached to a feature or layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Style {
    Vector(VectorStyle),
    Label(LabelStyle),
    Raster(RasterStyle),
}

impl Style {
    pub fn visibility(&self) -> &Visibility {
        match self {
            Style::Vector(s) => &s.visibility,
            Style::Label(s) => &s.visibility,
            Style::Raster(s) => &s.visibility,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            Style::Vector(s) => s.opacity,
            Style::Label(s) => s.opacity,
            Style::Raster(s) => s.opacity,
        }
    }

    pub fn is_visible_at(&self, resolution: f64) -> bool {
        self.visibility().admits(resolution)
    }

    pub fn as_vector(&self) -> Option<&VectorStyle> {
        match self {
            Style::Vector(v) => Some(v),
            _ => None,
        }
    }
}

impl From<VectorStyle> for Style {
    fn from(style: VectorStyle) -> Self {
        Style::Vector(style)
    }
}

impl From<LabelStyle> for Style {
    fn from(style: LabelStyle) -> Self {
        Style::Label(style)
    }
}

impl From<RasterStyle> for Style {
    fn from(style: RasterStyle) -> Self {
        Style::Raster(style)
    }
}

/// Named styles loaded from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleCatalog {
    /// Version of the style schema
    #[serde(default = "default_version")]
    pub version: String,

    /// Named style definitions
    pub styles: HashMap<String, Style>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl StyleCatalog {
    /// Load a style catalog from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> MapResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a style catalog from a JSON string.
    pub fn from_json(json: &str) -> MapResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Get a style by name.
    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    /// Get a style by name, failing when it is missing.
    pub fn require(&self, name: &str) -> MapResult<&Style> {
        self.get(name)
            .ok_or_else(|| MapError::StyleNotFound(name.to_string()))
    }
}
