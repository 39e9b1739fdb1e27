//! The seam between shape renderers and hand-drawn stroke synthesis.
//!
//! Renderers describe *what* to draw with a [`SketchShape`] and
//! [`SketchOptions`]; a [`SketchGenerator`] answers with abstract drawing
//! passes. The crate ships [`RoughGenerator`], but any deterministic
//! generator can be plugged into the renderer.

mod rough;

pub use rough::RoughGenerator;

use crate::geometry::Point;
use crate::ir::{Element, FillStyle};

#[derive(Debug, Clone, PartialEq)]
pub enum SketchShape {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Ellipse {
        center: Point,
        width: f64,
        height: f64,
    },
    /// Closed polygon through the given vertices.
    Polygon(Vec<Point>),
    Line(Point, Point),
    /// Open polyline with straight strokes between points.
    LinearPath(Vec<Point>),
    /// Open smooth curve through the points.
    Curve(Vec<Point>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SketchOptions {
    pub seed: u32,
    pub roughness: f64,
    pub bowing: f64,
    pub stroke_width: f64,
    pub stroke: String,
    pub fill: Option<String>,
    pub fill_style: FillStyle,
    pub stroke_line_dash: Option<[f64; 2]>,
    /// Draws each stroke once instead of twice.
    pub disable_multi_stroke: bool,
}

impl SketchOptions {
    pub fn for_element(element: &Element) -> Self {
        let style = &element.style;
        Self {
            seed: style.seed,
            roughness: style.roughness,
            bowing: if style.roughness > 0.0 { 1.0 } else { 0.0 },
            stroke_width: style.stroke_width,
            stroke: style.stroke_color.clone(),
            fill: style.fill.clone(),
            fill_style: style.fill_style,
            stroke_line_dash: style.stroke_style.dash_array(),
            disable_multi_stroke: style.stroke_style.dash_array().is_some(),
        }
    }

    /// Stroke-only options with a different random stream, used for
    /// decorations drawn on top of an element.
    pub fn derived(&self, seed_offset: u32) -> Self {
        Self {
            seed: self.seed.wrapping_add(seed_offset),
            fill: None,
            stroke_line_dash: None,
            disable_multi_stroke: false,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Outline, stroked with the stroke color.
    Stroke,
    /// Solid area, filled with the fill color.
    Fill,
    /// Hachure lines, stroked with the fill color.
    FillSketch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    Move(Point),
    LineTo(Point),
    BezierTo(Point, Point, Point),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SketchPass {
    pub kind: PassKind,
    pub ops: Vec<PathOp>,
}

pub trait SketchGenerator {
    /// Produces the passes for one shape, fill passes first. The output must
    /// depend only on the arguments.
    fn generate(&self, shape: &SketchShape, options: &SketchOptions) -> Vec<SketchPass>;
}
