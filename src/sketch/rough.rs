use crate::geometry::{Bounds, Point};
use crate::ir::FillStyle;

use super::{PassKind, PathOp, SketchGenerator, SketchOptions, SketchPass, SketchShape};

const TAU: f64 = std::f64::consts::PI * 2.0;

/// Hand-drawn stroke model: every segment becomes one or two slightly bowed
/// cubic curves whose control points are perturbed by a seeded random stream.
#[derive(Debug, Clone, PartialEq)]
pub struct RoughGenerator {
    pub max_randomness_offset: f64,
    pub curve_step_count: f64,
    pub curve_fitting: f64,
    /// Degrees.
    pub hachure_angle: f64,
}

impl Default for RoughGenerator {
    fn default() -> Self {
        Self {
            max_randomness_offset: 2.0,
            curve_step_count: 9.0,
            curve_fitting: 0.95,
            hachure_angle: -41.0,
        }
    }
}

impl SketchGenerator for RoughGenerator {
    fn generate(&self, shape: &SketchShape, options: &SketchOptions) -> Vec<SketchPass> {
        let mut pen = Pen::new(self, options);
        let passes = match shape {
            SketchShape::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                let corners = Bounds::from_rect(*x, *y, *width, *height).corners();
                pen.closed_shape(&corners)
            }
            SketchShape::Polygon(points) => pen.closed_shape(points),
            SketchShape::Ellipse {
                center,
                width,
                height,
            } => pen.ellipse(*center, *width, *height),
            SketchShape::Line(from, to) => vec![stroke(pen.double_line(*from, *to, false))],
            SketchShape::LinearPath(points) => vec![stroke(pen.linear_path(points, false))],
            SketchShape::Curve(points) => vec![stroke(pen.curve(points))],
        };
        passes.into_iter().filter(|pass| !pass.ops.is_empty()).collect()
    }
}

fn stroke(ops: Vec<PathOp>) -> SketchPass {
    SketchPass {
        kind: PassKind::Stroke,
        ops,
    }
}

/// Park–Miller minimal standard generator.
struct Random {
    state: u32,
}

impl Random {
    fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(48271);
        f64::from(self.state & 0x7fff_ffff) / 2_147_483_648.0
    }
}

struct Pen<'a> {
    config: &'a RoughGenerator,
    options: &'a SketchOptions,
    random: Random,
}

impl<'a> Pen<'a> {
    fn new(config: &'a RoughGenerator, options: &'a SketchOptions) -> Self {
        Self {
            config,
            options,
            random: Random::new(options.seed),
        }
    }

    fn offset(&mut self, min: f64, max: f64, gain: f64) -> f64 {
        self.options.roughness * gain * (self.random.next() * (max - min) + min)
    }

    fn offset_opt(&mut self, x: f64, gain: f64) -> f64 {
        self.offset(-x, x, gain)
    }

    fn jitter(&mut self, point: Point, amount: f64) -> Point {
        let x = point.x + self.offset_opt(amount, 1.0);
        let y = point.y + self.offset_opt(amount, 1.0);
        Point::new(x, y)
    }

    fn line(&mut self, from: Point, to: Point, overlay: bool) -> Vec<PathOp> {
        let length_sq = (from.x - to.x).powi(2) + (from.y - to.y).powi(2);
        let length = length_sq.sqrt();
        let gain = if length < 200.0 {
            1.0
        } else if length > 500.0 {
            0.4
        } else {
            -0.0016668 * length + 1.233334
        };

        let max_offset = self.config.max_randomness_offset;
        let mut offset = max_offset;
        if offset * offset * 100.0 > length_sq {
            offset = length / 10.0;
        }
        let spread = if overlay { offset / 2.0 } else { offset };

        let diverge = 0.2 + self.random.next() * 0.2;
        let bow_x = self.options.bowing * max_offset * (to.y - from.y) / 200.0;
        let bow_y = self.options.bowing * max_offset * (from.x - to.x) / 200.0;
        let bow_x = self.offset_opt(bow_x, gain);
        let bow_y = self.offset_opt(bow_y, gain);

        let start = Point::new(
            from.x + self.offset_opt(spread, gain),
            from.y + self.offset_opt(spread, gain),
        );
        let c1 = Point::new(
            bow_x + from.x + (to.x - from.x) * diverge + self.offset_opt(spread, gain),
            bow_y + from.y + (to.y - from.y) * diverge + self.offset_opt(spread, gain),
        );
        let c2 = Point::new(
            bow_x + from.x + 2.0 * (to.x - from.x) * diverge + self.offset_opt(spread, gain),
            bow_y + from.y + 2.0 * (to.y - from.y) * diverge + self.offset_opt(spread, gain),
        );
        let end = Point::new(
            to.x + self.offset_opt(spread, gain),
            to.y + self.offset_opt(spread, gain),
        );
        vec![PathOp::Move(start), PathOp::BezierTo(c1, c2, end)]
    }

    fn double_line(&mut self, from: Point, to: Point, filling: bool) -> Vec<PathOp> {
        let mut ops = self.line(from, to, false);
        if filling || !self.options.disable_multi_stroke {
            ops.extend(self.line(from, to, true));
        }
        ops
    }

    fn linear_path(&mut self, points: &[Point], close: bool) -> Vec<PathOp> {
        match points {
            [] | [_] => Vec::new(),
            [from, to] => self.double_line(*from, *to, false),
            _ => {
                let mut ops = Vec::new();
                for pair in points.windows(2) {
                    ops.extend(self.double_line(pair[0], pair[1], false));
                }
                if close {
                    let (first, last) = (points[0], points[points.len() - 1]);
                    ops.extend(self.double_line(last, first, false));
                }
                ops
            }
        }
    }

    /// Catmull–Rom spline through `points`, the first and last entries act as
    /// control points only.
    fn spline(&mut self, points: &[Point]) -> Vec<PathOp> {
        let len = points.len();
        if len > 3 {
            let mut ops = vec![PathOp::Move(points[1])];
            for i in 1..len - 2 {
                let (prev, cur, next, after) = (points[i - 1], points[i], points[i + 1], points[i + 2]);
                let c1 = Point::new(cur.x + (next.x - prev.x) / 6.0, cur.y + (next.y - prev.y) / 6.0);
                let c2 = Point::new(next.x + (cur.x - after.x) / 6.0, next.y + (cur.y - after.y) / 6.0);
                ops.push(PathOp::BezierTo(c1, c2, next));
            }
            ops
        } else if len == 3 {
            vec![
                PathOp::Move(points[1]),
                PathOp::BezierTo(points[1], points[2], points[2]),
            ]
        } else if len == 2 {
            self.line(points[0], points[1], true)
        } else {
            Vec::new()
        }
    }

    fn curve_with_offset(&mut self, points: &[Point], amount: f64) -> Vec<PathOp> {
        let Some((first, rest)) = points.split_first() else {
            return Vec::new();
        };
        let mut perturbed = vec![self.jitter(*first, amount), self.jitter(*first, amount)];
        for (i, point) in rest.iter().enumerate() {
            perturbed.push(self.jitter(*point, amount));
            if i == rest.len() - 1 {
                perturbed.push(self.jitter(*point, amount));
            }
        }
        self.spline(&perturbed)
    }

    fn curve(&mut self, points: &[Point]) -> Vec<PathOp> {
        if points.len() < 2 {
            return Vec::new();
        }
        let roughness = self.options.roughness;
        let mut ops = self.curve_with_offset(points, 1.0 + roughness * 0.2);
        if !self.options.disable_multi_stroke {
            ops.extend(self.curve_with_offset(points, 1.5 * (1.0 + roughness * 0.22)));
        }
        ops
    }

    fn closed_shape(&mut self, points: &[Point]) -> Vec<SketchPass> {
        let outline = self.linear_path(points, true);
        let mut passes = Vec::new();
        if self.options.fill.is_some() {
            passes.push(self.fill_polygon(points));
        }
        passes.push(stroke(outline));
        passes
    }

    fn fill_polygon(&mut self, points: &[Point]) -> SketchPass {
        match self.options.fill_style {
            FillStyle::Solid => {
                let amount = self.config.max_randomness_offset;
                let mut ops = Vec::with_capacity(points.len());
                if points.len() > 2 {
                    for (i, point) in points.iter().enumerate() {
                        let point = self.jitter(*point, amount);
                        ops.push(if i == 0 {
                            PathOp::Move(point)
                        } else {
                            PathOp::LineTo(point)
                        });
                    }
                }
                SketchPass {
                    kind: PassKind::Fill,
                    ops,
                }
            }
            FillStyle::Hachure | FillStyle::CrossHatch => self.hachure_fill(points),
        }
    }

    fn hachure_fill(&mut self, polygon: &[Point]) -> SketchPass {
        let gap = (self.options.stroke_width * 4.0).max(0.1).round().max(1.0);
        let angle = self.config.hachure_angle + 90.0;
        let mut segments = hachure_lines(polygon, gap, angle);
        if self.options.fill_style == FillStyle::CrossHatch {
            segments.extend(hachure_lines(polygon, gap, angle + 90.0));
        }
        let mut ops = Vec::new();
        for (from, to) in segments {
            ops.extend(self.double_line(from, to, true));
        }
        SketchPass {
            kind: PassKind::FillSketch,
            ops,
        }
    }

    fn ellipse(&mut self, center: Point, width: f64, height: f64) -> Vec<SketchPass> {
        let mut rx = (width / 2.0).abs();
        let mut ry = (height / 2.0).abs();
        let perimeter = (TAU * ((rx * rx + ry * ry) / 2.0).sqrt()).sqrt();
        let steps = self
            .config
            .curve_step_count
            .max(self.config.curve_step_count / 200f64.sqrt() * perimeter)
            .ceil();
        let increment = TAU / steps;
        let fit_randomness = 1.0 - self.config.curve_fitting;
        rx += self.offset_opt(rx * fit_randomness, 1.0);
        ry += self.offset_opt(ry * fit_randomness, 1.0);

        let inner = self.offset(0.4, 1.0, 1.0);
        let overlap = increment * self.offset(0.1, inner, 1.0);
        let (outline_points, core_points) =
            self.ellipse_points(increment, center, rx, ry, 1.0, overlap);
        let mut outline = self.spline(&outline_points);
        if !self.options.disable_multi_stroke && self.options.roughness != 0.0 {
            let (overlay_points, _) = self.ellipse_points(increment, center, rx, ry, 1.5, 0.0);
            outline.extend(self.spline(&overlay_points));
        }

        let mut passes = Vec::new();
        if self.options.fill.is_some() {
            passes.push(match self.options.fill_style {
                FillStyle::Solid => SketchPass {
                    kind: PassKind::Fill,
                    ops: self.spline(&outline_points),
                },
                FillStyle::Hachure | FillStyle::CrossHatch => self.hachure_fill(&core_points),
            });
        }
        passes.push(stroke(outline));
        passes
    }

    /// Returns the spline input (with lead-in and overlap points) and the
    /// points lying on the ellipse.
    fn ellipse_points(
        &mut self,
        increment: f64,
        center: Point,
        rx: f64,
        ry: f64,
        amount: f64,
        overlap: f64,
    ) -> (Vec<Point>, Vec<Point>) {
        let at = |angle: f64, scale: f64| {
            Point::new(
                center.x + scale * rx * angle.cos(),
                center.y + scale * ry * angle.sin(),
            )
        };
        let mut all = Vec::new();
        let mut core = Vec::new();

        if self.options.roughness == 0.0 {
            let increment = increment / 4.0;
            all.push(at(-increment, 1.0));
            let mut angle = 0.0;
            while angle <= TAU {
                let point = at(angle, 1.0);
                core.push(point);
                all.push(point);
                angle += increment;
            }
            all.push(at(0.0, 1.0));
            all.push(at(increment, 1.0));
            return (all, core);
        }

        let rad_offset = self.offset_opt(0.5, 1.0) - std::f64::consts::FRAC_PI_2;
        let lead_in = at(rad_offset - increment, 0.9);
        all.push(self.jitter(lead_in, amount));
        let end_angle = TAU + rad_offset - 0.01;
        let mut angle = rad_offset;
        while angle < end_angle {
            let point = self.jitter(at(angle, 1.0), amount);
            core.push(point);
            all.push(point);
            angle += increment;
        }
        let closing = [
            at(rad_offset + TAU + overlap * 0.5, 1.0),
            at(rad_offset + overlap, 0.98),
            at(rad_offset + overlap * 0.5, 0.9),
        ];
        for point in closing {
            all.push(self.jitter(point, amount));
        }
        (all, core)
    }
}

/// Parallel fill lines clipped to `polygon`, at `angle_deg` from the x axis.
fn hachure_lines(polygon: &[Point], gap: f64, angle_deg: f64) -> Vec<(Point, Point)> {
    if polygon.len() < 3 || gap <= 0.0 {
        return Vec::new();
    }
    let origin = Point::new(0.0, 0.0);
    let angle = angle_deg.to_radians();
    let rotated: Vec<Point> = polygon
        .iter()
        .map(|point| point.rotate_about(origin, angle))
        .collect();
    let Some(bounds) = Bounds::from_points(&rotated) else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    let mut y = bounds.min_y + gap;
    while y < bounds.max_y {
        let mut crossings: Vec<f64> = rotated
            .iter()
            .zip(rotated.iter().cycle().skip(1))
            .filter(|(a, b)| (a.y <= y && b.y > y) || (b.y <= y && a.y > y))
            .map(|(a, b)| a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x))
            .collect();
        crossings.sort_by(f64::total_cmp);
        for pair in crossings.chunks_exact(2) {
            lines.push((
                Point::new(pair[0], y).rotate_about(origin, -angle),
                Point::new(pair[1], y).rotate_about(origin, -angle),
            ));
        }
        y += gap;
    }
    lines
}
