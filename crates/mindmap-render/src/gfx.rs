//! Backend-neutral drawing surface.
//!
//! The drawing pass talks only to [`Gfx`], so the same draw-call sequence can
//! be replayed into any backend. Coordinates are pre-scaled canvas
//! coordinates; backends apply the accumulated translation at emission time.

use serde::{Deserialize, Serialize};

use crate::config::{Color, FontDescriptor};
use crate::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrokeKind {
    Solid,
    Dashed,
    Dotted,
}

/// Dash pattern (on, off) derived from the stroke width, `None` for solid.
/// Dashed strokes use round caps, dotted ones butt caps.
pub fn dash_pattern(width: f64, kind: StrokeKind) -> Option<(f64, f64)> {
    match kind {
        StrokeKind::Solid => None,
        StrokeKind::Dashed => Some((width * 5.0, width * 2.0)),
        StrokeKind::Dotted => Some((width, width * 2.0)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
    QuadTo(Point, Point),
    Close,
}

/// Closed set of vector shapes the drawing pass can produce. Keeping the set
/// closed means every backend handles every shape; there is no partially
/// supported geometry to degrade over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VectorShape {
    Rect(Rect),
    RoundedRect {
        rect: Rect,
        arc_width: f64,
        arc_height: f64,
    },
    Path(Vec<PathSegment>),
}

/// Decoded raster image plus its PNG bytes for backends that embed rather
/// than rasterize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

/// Drawing surface contract. `None` colors mean "skip that part": a `None`
/// border draws fill only and vice versa.
pub trait Gfx {
    fn font_max_ascent(&self) -> f64;

    /// Bounds of `text` rendered in the current font, at the origin.
    fn string_bounds(&self, text: &str) -> Rect;

    /// Restricts subsequent drawing to `bounds`.
    fn set_clip(&mut self, bounds: Rect);

    /// Accumulates onto the current translation.
    fn translate(&mut self, dx: f64, dy: f64);

    fn set_stroke(&mut self, width: f64, kind: StrokeKind);

    fn set_font(&mut self, font: &FontDescriptor);

    /// Opens a nested drawing scope that inherits the current translation,
    /// stroke and font.
    fn push_state(&mut self);

    /// Closes the innermost scope; the outer state is untouched by anything
    /// the scope changed.
    fn pop_state(&mut self);

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Option<Color>);

    /// Draws `text` with its baseline at `y`.
    fn draw_string(&mut self, text: &str, x: f64, y: f64, color: Option<Color>);

    fn draw_rect(&mut self, rect: Rect, border: Option<Color>, fill: Option<Color>);

    fn draw(&mut self, shape: &VectorShape, border: Option<Color>, fill: Option<Color>);

    /// Horizontal-then-flat cubic connector between two points.
    fn draw_curve(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Option<Color>);

    fn draw_oval(&mut self, rect: Rect, border: Option<Color>, fill: Option<Color>);

    fn draw_image(&mut self, image: &RasterImage, x: f64, y: f64);
}
