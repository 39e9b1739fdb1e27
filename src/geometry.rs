use serde::Serialize;

use crate::ir::Element;

/// Margin around the content, in canvas units.
pub const PADDING: f64 = 40.0;

/// Side of the canvas produced for a document with no visible elements.
pub const EMPTY_CANVAS_SIZE: u32 = 100;

const ARROWHEAD_MIN_LENGTH: f64 = 15.0;
const ARROWHEAD_STROKE_FACTOR: f64 = 6.0;
const ARROWHEAD_SPREAD: f64 = std::f64::consts::PI / 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotates `self` about `center` by `angle` radians.
    pub fn rotate_about(self, center: Point, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point::new(
            center.x + dx * cos - dy * sin,
            center.y + dx * sin + dy * cos,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: x.min(x + width),
            min_y: y.min(y + height),
            max_x: x.max(x + width),
            max_y: y.max(y + height),
        }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for point in rest {
            bounds.include(*point);
        }
        Some(bounds)
    }

    pub fn include(&mut self, point: Point) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

/// Rotation pivot of an element. Always derived from the declared box, also
/// for point-based elements.
pub fn element_center(element: &Element) -> Point {
    Point::new(
        element.x + element.width / 2.0,
        element.y + element.height / 2.0,
    )
}

/// Unrotated footprint: the tight bound of the absolute points for
/// point-based elements, the declared box for everything else.
pub fn local_bounds(element: &Element) -> Bounds {
    if element.points().is_some_and(|points| !points.is_empty()) {
        if let Some(bounds) = Bounds::from_points(&element.absolute_points()) {
            return bounds;
        }
    }
    Bounds::from_rect(element.x, element.y, element.width, element.height)
}

pub fn element_corners(element: &Element) -> [Point; 4] {
    let corners = local_bounds(element).corners();
    if element.angle == 0.0 {
        return corners;
    }
    let center = element_center(element);
    corners.map(|corner| corner.rotate_about(center, element.angle))
}

/// Axis-aligned bound of the rotated corners.
pub fn element_bounds(element: &Element) -> Bounds {
    let corners = element_corners(element);
    let mut bounds = Bounds::from_rect(corners[0].x, corners[0].y, 0.0, 0.0);
    for corner in &corners[1..] {
        bounds.include(*corner);
    }
    bounds
}

pub fn scene_bounds(elements: &[Element]) -> Option<Bounds> {
    elements
        .iter()
        .map(element_bounds)
        .reduce(Bounds::union)
}

/// Output canvas size and the translation applied to every element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub offset: Point,
}

impl Canvas {
    pub const EMPTY: Canvas = Canvas {
        width: EMPTY_CANVAS_SIZE,
        height: EMPTY_CANVAS_SIZE,
        offset: Point::new(0.0, 0.0),
    };

    pub fn fit(bounds: Bounds) -> Self {
        // Content narrower than one unit still gets one unit so the canvas is
        // always wider than its margins.
        let content_width = bounds.width().ceil().max(1.0);
        let content_height = bounds.height().ceil().max(1.0);
        Self {
            width: (content_width + PADDING * 2.0) as u32,
            height: (content_height + PADDING * 2.0) as u32,
            offset: Point::new(PADDING - bounds.min_x, PADDING - bounds.min_y),
        }
    }

    pub fn for_elements(elements: &[Element]) -> Self {
        scene_bounds(elements).map_or(Self::EMPTY, Self::fit)
    }
}

/// The group transform wrapped around one element's output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementTransform {
    pub translate: Point,
    /// Degrees and pivot, in untranslated document coordinates.
    pub rotation: Option<(f64, Point)>,
    /// Fractional opacity, only when below 1.
    pub opacity: Option<f64>,
}

impl ElementTransform {
    pub fn for_element(element: &Element, canvas: &Canvas) -> Self {
        let rotation = (element.angle != 0.0)
            .then(|| (element.angle.to_degrees(), element_center(element)));
        let opacity = (element.opacity < 100.0).then(|| element.opacity.max(0.0) / 100.0);
        Self {
            translate: canvas.offset,
            rotation,
            opacity,
        }
    }
}

/// Tip and wing points of an arrowhead drawn at `to`, pointing away from
/// `from`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArrowheadWings {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
}

pub fn arrowhead_length(stroke_width: f64) -> f64 {
    ARROWHEAD_MIN_LENGTH.max(stroke_width * ARROWHEAD_STROKE_FACTOR)
}

pub fn arrowhead_wings(from: Point, to: Point, stroke_width: f64) -> ArrowheadWings {
    let angle = (to.y - from.y).atan2(to.x - from.x);
    let length = arrowhead_length(stroke_width);
    let wing = |offset: f64| {
        Point::new(
            to.x - length * (angle + offset).cos(),
            to.y - length * (angle + offset).sin(),
        )
    };
    ArrowheadWings {
        tip: to,
        left: wing(-ARROWHEAD_SPREAD),
        right: wing(ARROWHEAD_SPREAD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::RawElement;
    use crate::theme::Theme;
    use proptest::prelude::*;

    fn rect(x: f64, y: f64, width: f64, height: f64, angle: f64) -> Element {
        let raw = RawElement {
            kind: "rectangle".to_string(),
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            angle: Some(angle),
            ..Default::default()
        };
        Element::from_raw(&raw, &Theme::excalidraw())
    }

    fn line(x: f64, y: f64, points: &[[f64; 2]]) -> Element {
        let raw = RawElement {
            kind: "line".to_string(),
            x: Some(x),
            y: Some(y),
            points: Some(points.iter().map(|p| p.to_vec()).collect()),
            ..Default::default()
        };
        Element::from_raw(&raw, &Theme::excalidraw())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_element_bounds() {
        let bounds = scene_bounds(&[rect(100.0, 200.0, 50.0, 30.0, 0.0)]).unwrap();
        assert_eq!(bounds, Bounds::from_rect(100.0, 200.0, 50.0, 30.0));
        assert_eq!(bounds.width(), 50.0);
        assert_eq!(bounds.height(), 30.0);
    }

    #[test]
    fn multiple_element_bounds() {
        let bounds = scene_bounds(&[
            rect(0.0, 0.0, 100.0, 50.0, 0.0),
            rect(200.0, 100.0, 80.0, 40.0, 0.0),
        ])
        .unwrap();
        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.min_y, 0.0);
        assert_eq!(bounds.max_x, 280.0);
        assert_eq!(bounds.max_y, 140.0);
    }

    #[test]
    fn point_based_bounds_use_points() {
        let el = line(50.0, 50.0, &[[0.0, 0.0], [100.0, 80.0]]);
        let bounds = element_bounds(&el);
        assert_eq!(bounds.min_x, 50.0);
        assert_eq!(bounds.min_y, 50.0);
        assert_eq!(bounds.max_x, 150.0);
        assert_eq!(bounds.max_y, 130.0);
    }

    #[test]
    fn negative_points_extend_left_of_origin() {
        let el = line(10.0, 10.0, &[[0.0, 0.0], [-30.0, 5.0]]);
        let bounds = element_bounds(&el);
        assert_eq!(bounds.min_x, -20.0);
        assert_eq!(bounds.max_x, 10.0);
    }

    #[test]
    fn rotated_element_expands() {
        let bounds = element_bounds(&rect(
            100.0,
            100.0,
            200.0,
            80.0,
            std::f64::consts::FRAC_PI_4,
        ));
        assert!(bounds.height() > 150.0);
        assert!(!close(bounds.width(), 200.0));
        assert!(!close(bounds.height(), 80.0));
    }

    #[test]
    fn rotation_pivots_about_center() {
        let el = rect(0.0, 0.0, 100.0, 20.0, std::f64::consts::FRAC_PI_2);
        let bounds = element_bounds(&el);
        assert!(close(bounds.min_x, 40.0));
        assert!(close(bounds.max_x, 60.0));
        assert!(close(bounds.min_y, -40.0));
        assert!(close(bounds.max_y, 60.0));
    }

    #[test]
    fn canvas_fits_bounds_with_padding() {
        let canvas = Canvas::fit(Bounds::from_rect(-10.0, 5.0, 100.5, 50.0));
        assert_eq!(canvas.width, 181);
        assert_eq!(canvas.height, 130);
        assert_eq!(canvas.offset, Point::new(50.0, 35.0));
    }

    #[test]
    fn zero_area_content_still_exceeds_padding() {
        let canvas = Canvas::for_elements(&[rect(5.0, 5.0, 0.0, 0.0, 0.0)]);
        assert!(canvas.width as f64 > PADDING * 2.0);
        assert!(canvas.height as f64 > PADDING * 2.0);
    }

    #[test]
    fn empty_scene_uses_fixed_canvas() {
        assert_eq!(Canvas::for_elements(&[]), Canvas::EMPTY);
        assert_eq!(Canvas::EMPTY.width, 100);
    }

    #[test]
    fn transform_opacity_and_rotation() {
        let mut el = rect(0.0, 0.0, 10.0, 10.0, std::f64::consts::PI);
        el.opacity = 50.0;
        let canvas = Canvas::for_elements(std::slice::from_ref(&el));
        let transform = ElementTransform::for_element(&el, &canvas);
        assert_eq!(transform.opacity, Some(0.5));
        let (degrees, pivot) = transform.rotation.unwrap();
        assert!(close(degrees, 180.0));
        assert_eq!(pivot, Point::new(5.0, 5.0));

        el.opacity = 100.0;
        el.angle = 0.0;
        let transform = ElementTransform::for_element(&el, &canvas);
        assert_eq!(transform.opacity, None);
        assert_eq!(transform.rotation, None);
    }

    #[test]
    fn arrowhead_wings_point_backwards() {
        let wings = arrowhead_wings(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 2.0);
        assert_eq!(wings.tip, Point::new(100.0, 0.0));
        assert!(wings.left.x < 100.0 && wings.right.x < 100.0);
        assert!(close(wings.left.y, -wings.right.y));
        let dx = 100.0 - wings.left.x;
        let dy = wings.left.y;
        assert!(close((dx * dx + dy * dy).sqrt(), 15.0));
    }

    #[test]
    fn arrowhead_length_scales_with_stroke() {
        assert_eq!(arrowhead_length(1.0), 15.0);
        assert_eq!(arrowhead_length(4.0), 24.0);
    }

    proptest! {
        #[test]
        fn zero_rotation_is_identity(
            x in -1000.0f64..1000.0,
            y in -1000.0f64..1000.0,
            w in 0.0f64..500.0,
            h in 0.0f64..500.0,
        ) {
            let el = rect(x, y, w, h, 0.0);
            prop_assert_eq!(element_corners(&el), local_bounds(&el).corners());
            prop_assert_eq!(element_bounds(&el), Bounds::from_rect(x, y, w, h));
        }

        #[test]
        fn off_axis_rotation_expands_non_square(
            w in 10.0f64..500.0,
            extra in 5.0f64..200.0,
            quarter in 0u32..4,
            frac in 0.05f64..0.95,
        ) {
            let h = w + extra;
            let angle = (quarter as f64 + frac) * std::f64::consts::FRAC_PI_2;
            let bounds = element_bounds(&rect(0.0, 0.0, w, h, angle));
            prop_assert!(bounds.width() > w + 1e-9 || bounds.height() > h + 1e-9);
        }
    }
}
