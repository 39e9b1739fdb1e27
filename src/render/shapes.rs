use log::debug;

use crate::fonts::font_stack;
use crate::geometry::{Bounds, Point, arrowhead_length, arrowhead_wings, element_center};
use crate::ir::{Arrowhead, Element, FillStyle, Polyline, Shape};
use crate::sketch::{SketchOptions, SketchShape};

use super::RenderContext;
use super::path::{dash_attr, escape_xml, passes_to_svg, points_to_path};
use super::text::{self, TextLayout};

const END_HEAD_SEED_OFFSET: u32 = 100;
const START_HEAD_SEED_OFFSET: u32 = 200;
const FRAME_LABEL_GAP: f64 = 6.0;
const FRAME_FONT_FAMILY: u32 = 2;

/// SVG fragment for one element in document coordinates, `None` when the
/// element draws nothing.
pub fn render_element(element: &Element, ctx: &RenderContext<'_>) -> Option<String> {
    let svg = match &element.shape {
        Shape::Rectangle { rounded } => render_rectangle(element, *rounded, ctx),
        Shape::Ellipse => render_ellipse(element, ctx),
        Shape::Diamond => render_diamond(element, ctx),
        Shape::Line(line) => render_line(element, line, None, None, ctx),
        Shape::Arrow { line, start, end } => render_line(element, line, *start, *end, ctx),
        Shape::Text(content) => text::render_text(element, content),
        Shape::Freedraw { points } => render_freedraw(element, points),
        Shape::Image { file_id } => render_image(element, file_id.as_deref(), ctx),
        Shape::Frame { name } => render_frame(element, name.as_deref(), ctx),
        Shape::Unknown(kind) => {
            debug!(kind = kind.as_str(); "Skipping unsupported element type");
            String::new()
        }
    };
    (!svg.is_empty()).then_some(svg)
}

fn sketch(ctx: &RenderContext<'_>, shape: SketchShape, options: &SketchOptions) -> String {
    passes_to_svg(&ctx.sketch.generate(&shape, options), options)
}

fn render_rectangle(element: &Element, rounded: bool, ctx: &RenderContext<'_>) -> String {
    let style = &element.style;
    if rounded && style.roughness == 0.0 {
        let (x, y, w, h) = (element.x, element.y, element.width, element.height);
        let r = w.min(h) * 0.25;
        let mut parts = Vec::with_capacity(2);
        if let Some(fill) = &style.fill {
            parts.push(format!(
                "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" rx=\"{r}\" fill=\"{}\" stroke=\"none\"/>",
                escape_xml(fill)
            ));
        }
        parts.push(format!(
            "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" rx=\"{r}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{}/>",
            escape_xml(&style.stroke_color),
            style.stroke_width,
            dash_attr(style.stroke_style.dash_array())
        ));
        return parts.join("\n");
    }

    let shape = SketchShape::Rectangle {
        x: element.x,
        y: element.y,
        width: element.width,
        height: element.height,
    };
    sketch(ctx, shape, &SketchOptions::for_element(element))
}

fn render_ellipse(element: &Element, ctx: &RenderContext<'_>) -> String {
    let shape = SketchShape::Ellipse {
        center: element_center(element),
        width: element.width,
        height: element.height,
    };
    sketch(ctx, shape, &SketchOptions::for_element(element))
}

fn render_diamond(element: &Element, ctx: &RenderContext<'_>) -> String {
    let center = element_center(element);
    let points = vec![
        Point::new(center.x, element.y),
        Point::new(element.x + element.width, center.y),
        Point::new(center.x, element.y + element.height),
        Point::new(element.x, center.y),
    ];
    sketch(
        ctx,
        SketchShape::Polygon(points),
        &SketchOptions::for_element(element),
    )
}

fn render_line(
    element: &Element,
    line: &Polyline,
    start: Option<Arrowhead>,
    end: Option<Arrowhead>,
    ctx: &RenderContext<'_>,
) -> String {
    if line.points.len() < 2 {
        return String::new();
    }
    let abs = element.absolute_points();
    let options = SketchOptions::for_element(element);
    let shape = match abs.as_slice() {
        [from, to] => SketchShape::Line(*from, *to),
        _ if line.rounded => SketchShape::Curve(abs.clone()),
        _ => SketchShape::LinearPath(abs.clone()),
    };

    let mut parts = vec![sketch(ctx, shape, &options)];
    let count = abs.len();
    if let Some(kind) = end {
        let head = arrowhead(kind, abs[count - 2], abs[count - 1], element, &options, END_HEAD_SEED_OFFSET, ctx);
        parts.push(format!("<g data-arrowhead=\"end\">\n{head}\n</g>"));
    }
    if let Some(kind) = start {
        let head = arrowhead(kind, abs[1], abs[0], element, &options, START_HEAD_SEED_OFFSET, ctx);
        parts.push(format!("<g data-arrowhead=\"start\">\n{head}\n</g>"));
    }
    parts.join("\n")
}

/// Head drawn at `to`, oriented along `from -> to`.
fn arrowhead(
    kind: Arrowhead,
    from: Point,
    to: Point,
    element: &Element,
    options: &SketchOptions,
    seed_offset: u32,
    ctx: &RenderContext<'_>,
) -> String {
    let style = &element.style;
    let clean = style.roughness == 0.0;
    let derived = options.derived(seed_offset);
    let stroke = escape_xml(&style.stroke_color);
    let stroke_width = style.stroke_width;
    let wings = arrowhead_wings(from, to, stroke_width);

    match kind {
        Arrowhead::Arrow if clean => format!(
            "<path d=\"{}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" fill=\"none\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
            points_to_path(&[wings.left, wings.tip, wings.right])
        ),
        Arrowhead::Arrow => [
            sketch(ctx, SketchShape::Line(wings.tip, wings.left), &derived),
            sketch(ctx, SketchShape::Line(wings.tip, wings.right), &derived),
        ]
        .join("\n"),
        Arrowhead::Triangle if clean => format!(
            "<path d=\"{} Z\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" fill=\"{stroke}\" stroke-linejoin=\"round\"/>",
            points_to_path(&[wings.tip, wings.left, wings.right])
        ),
        Arrowhead::Triangle => {
            let filled = SketchOptions {
                fill: Some(style.stroke_color.clone()),
                fill_style: FillStyle::Solid,
                ..derived
            };
            sketch(
                ctx,
                SketchShape::Polygon(vec![wings.tip, wings.left, wings.right]),
                &filled,
            )
        }
        Arrowhead::Bar => {
            let half = arrowhead_length(stroke_width) / 2.0;
            let (dx, dy) = (to.x - from.x, to.y - from.y);
            let len = dx.hypot(dy);
            let (nx, ny) = if len > 0.0 {
                (-dy / len, dx / len)
            } else {
                (0.0, 1.0)
            };
            let a = Point::new(to.x + nx * half, to.y + ny * half);
            let b = Point::new(to.x - nx * half, to.y - ny * half);
            if clean {
                format!(
                    "<path d=\"{}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" fill=\"none\" stroke-linecap=\"round\"/>",
                    points_to_path(&[a, b])
                )
            } else {
                sketch(ctx, SketchShape::Line(a, b), &derived)
            }
        }
        Arrowhead::Dot => {
            let radius = (arrowhead_length(stroke_width) / 4.0).max(stroke_width);
            if clean {
                format!(
                    "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{radius:.2}\" fill=\"{stroke}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
                    to.x, to.y
                )
            } else {
                let filled = SketchOptions {
                    fill: Some(style.stroke_color.clone()),
                    fill_style: FillStyle::Solid,
                    ..derived
                };
                let shape = SketchShape::Ellipse {
                    center: to,
                    width: radius * 2.0,
                    height: radius * 2.0,
                };
                sketch(ctx, shape, &filled)
            }
        }
    }
}

fn render_freedraw(element: &Element, points: &[Point]) -> String {
    if points.len() < 2 {
        return String::new();
    }
    format!(
        "<path d=\"{}\" stroke=\"{}\" stroke-width=\"{}\" fill=\"none\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
        points_to_path(&element.absolute_points()),
        escape_xml(&element.style.stroke_color),
        element.style.stroke_width
    )
}

fn render_image(element: &Element, file_id: Option<&str>, ctx: &RenderContext<'_>) -> String {
    let Some(href) = file_id
        .and_then(|id| ctx.files.get(id))
        .and_then(|entry| entry.data_uri())
    else {
        return String::new();
    };
    format!(
        "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" href=\"{}\" preserveAspectRatio=\"none\"/>",
        element.x,
        element.y,
        element.width,
        element.height,
        escape_xml(&href)
    )
}

fn render_frame(element: &Element, name: Option<&str>, ctx: &RenderContext<'_>) -> String {
    let theme = ctx.theme;
    let bounds = Bounds::from_rect(element.x, element.y, element.width, element.height);
    let mut parts = vec![format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-dasharray=\"6 4\"/>",
        bounds.min_x,
        bounds.min_y,
        bounds.width(),
        bounds.height(),
        escape_xml(&theme.frame_stroke),
        theme.frame_stroke_width
    )];
    if let Some(name) = name {
        let font_size = theme.frame_label_font_size;
        let label = TextLayout {
            lines: vec![text::split_lines(name).join(" ")],
            x: bounds.min_x,
            y: bounds.min_y - FRAME_LABEL_GAP,
            line_height: font_size * text::LINE_HEIGHT,
            anchor: "start",
        };
        parts.push(text::text_svg(
            &label,
            font_stack(FRAME_FONT_FAMILY),
            font_size,
            &theme.frame_label_color,
        ));
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FileEntry, RawElement};
    use crate::sketch::{RoughGenerator, SketchGenerator, SketchPass};
    use crate::theme::Theme;
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct CountingGenerator {
        calls: Cell<usize>,
    }

    impl SketchGenerator for CountingGenerator {
        fn generate(&self, shape: &SketchShape, options: &SketchOptions) -> Vec<SketchPass> {
            self.calls.set(self.calls.get() + 1);
            RoughGenerator::default().generate(shape, options)
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        seen: RefCell<Vec<SketchOptions>>,
    }

    impl SketchGenerator for RecordingGenerator {
        fn generate(&self, shape: &SketchShape, options: &SketchOptions) -> Vec<SketchPass> {
            self.seen.borrow_mut().push(options.clone());
            RoughGenerator::default().generate(shape, options)
        }
    }

    fn element(json: &str) -> Element {
        let raw: RawElement = serde_json::from_str(json).unwrap();
        Element::from_raw(&raw, &Theme::excalidraw())
    }

    fn render_with(json: &str, generator: &dyn SketchGenerator) -> Option<String> {
        let theme = Theme::excalidraw();
        let mut files = BTreeMap::new();
        files.insert(
            "img1".to_string(),
            FileEntry {
                mime_type: Some("image/png".to_string()),
                data_url: Some("AAAA".to_string()),
                ..Default::default()
            },
        );
        let ctx = RenderContext {
            theme: &theme,
            files: &files,
            sketch: generator,
        };
        render_element(&element(json), &ctx)
    }

    fn render(json: &str) -> Option<String> {
        render_with(json, &RoughGenerator::default())
    }

    #[test]
    fn clean_rounded_rectangle_is_native() {
        let generator = CountingGenerator::default();
        let svg = render_with(
            r##"{"type":"rectangle","x":0,"y":0,"width":100,"height":40,"roughness":0,"roundness":{"type":3},"backgroundColor":"#ffec99","strokeStyle":"dashed"}"##,
            &generator,
        )
        .unwrap();
        assert_eq!(generator.calls.get(), 0);
        let lines: Vec<&str> = svg.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("rx=\"10\" fill=\"#ffec99\" stroke=\"none\""));
        assert!(lines[1].contains("fill=\"none\""));
        assert!(lines[1].contains("stroke-dasharray=\"12 8\""));
    }

    #[test]
    fn rough_rectangle_is_sketched_deterministically() {
        let json = r#"{"type":"rectangle","x":0,"y":0,"width":100,"height":40,"seed":12345}"#;
        let generator = CountingGenerator::default();
        let first = render_with(json, &generator).unwrap();
        assert_eq!(generator.calls.get(), 1);
        assert!(first.contains(" C"));
        assert_eq!(render(json).unwrap(), first);
    }

    #[test]
    fn two_point_line_has_no_arrowheads() {
        let svg = render(r#"{"type":"line","x":0,"y":0,"points":[[0,0],[100,0]]}"#).unwrap();
        assert!(svg.contains("<path"));
        assert!(!svg.contains("data-arrowhead"));
    }

    #[test]
    fn arrow_end_head_group() {
        let svg = render(
            r#"{"type":"arrow","x":0,"y":0,"points":[[0,0],[100,0]],"endArrowhead":"arrow"}"#,
        )
        .unwrap();
        assert_eq!(svg.matches("data-arrowhead=\"end\"").count(), 1);
        assert!(!svg.contains("data-arrowhead=\"start\""));

        let svg = render(
            r#"{"type":"arrow","x":0,"y":0,"points":[[0,0],[50,50],[100,0]],"startArrowhead":"dot","endArrowhead":"triangle","roughness":0}"#,
        )
        .unwrap();
        assert!(svg.contains("data-arrowhead=\"start\""));
        assert!(svg.contains("<circle cx=\"0.00\" cy=\"0.00\""));
        assert!(svg.contains(" Z\""));
    }

    #[test]
    fn clean_arrowhead_is_three_point_polyline() {
        let svg = render(
            r#"{"type":"arrow","x":0,"y":0,"points":[[0,0],[100,0]],"endArrowhead":"arrow","roughness":0}"#,
        )
        .unwrap();
        assert!(svg.contains("L100.00 0.00 L"));
    }

    #[test]
    fn short_point_lists_render_nothing() {
        assert_eq!(render(r#"{"type":"line","points":[[0,0]]}"#), None);
        assert_eq!(render(r#"{"type":"arrow","points":[]}"#), None);
        assert_eq!(render(r#"{"type":"freedraw","points":[[1,1]]}"#), None);
    }

    #[test]
    fn freedraw_is_plain_polyline() {
        let svg = render(r#"{"type":"freedraw","x":10,"y":10,"points":[[0,0],[5,5],[10,0]]}"#)
            .unwrap();
        assert!(svg.starts_with("<path d=\"M10.00 10.00 L15.00 15.00 L20.00 10.00\""));
        assert!(svg.contains("fill=\"none\""));
    }

    #[test]
    fn image_uses_resource_table() {
        let svg = render(r#"{"type":"image","x":1,"y":2,"width":30,"height":40,"fileId":"img1"}"#)
            .unwrap();
        assert!(svg.contains("href=\"data:image/png;base64,AAAA\""));
        assert!(svg.contains("preserveAspectRatio=\"none\""));
        assert_eq!(render(r#"{"type":"image","fileId":"missing"}"#), None);
        assert_eq!(render(r#"{"type":"image"}"#), None);
    }

    #[test]
    fn frame_with_label() {
        let svg = render(r#"{"type":"frame","x":0,"y":50,"width":200,"height":100,"name":"Ideas & <notes>"}"#)
            .unwrap();
        assert!(svg.contains("stroke-dasharray=\"6 4\""));
        assert!(svg.contains("y=\"44.00\""));
        assert!(svg.contains("Ideas &amp; &lt;notes&gt;"));
        let svg = render(r#"{"type":"frame","width":10,"height":10}"#).unwrap();
        assert!(!svg.contains("<text"));
    }

    #[test]
    fn unknown_elements_render_nothing() {
        assert_eq!(render(r#"{"type":"embeddable","width":10,"height":10}"#), None);
    }

    #[test]
    fn rough_arrowheads_use_own_seed_without_fill_or_dash() {
        let generator = RecordingGenerator::default();
        let svg = render_with(
            r##"{"type":"arrow","x":0,"y":0,"seed":7,"roughness":1,"strokeStyle":"dashed","backgroundColor":"#ffc9c9","points":[[0,0],[120,0]],"startArrowhead":"arrow","endArrowhead":"arrow"}"##,
            &generator,
        )
        .unwrap();
        let seen = generator.seen.borrow();
        let seeds: Vec<u32> = seen.iter().map(|options| options.seed).collect();
        assert_eq!(seeds, vec![7, 107, 107, 207, 207]);

        let shaft = &seen[0];
        assert!(shaft.stroke_line_dash.is_some());
        assert_eq!(shaft.fill.as_deref(), Some("#ffc9c9"));
        for head in &seen[1..] {
            assert_eq!(head.stroke_line_dash, None);
            assert_eq!(head.fill, None);
            assert!(!head.disable_multi_stroke);
        }

        let end = svg.split("data-arrowhead=\"end\"").nth(1).unwrap();
        let (end, start) = end.split_once("data-arrowhead=\"start\"").unwrap();
        assert!(!end.contains("stroke-dasharray"));
        assert!(!start.contains("stroke-dasharray"));
    }
}
