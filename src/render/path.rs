use crate::geometry::Point;
use crate::sketch::{PassKind, PathOp, SketchOptions, SketchPass};

pub fn ops_to_path(ops: &[PathOp]) -> String {
    let mut d = String::new();
    for op in ops {
        match op {
            PathOp::Move(p) => d.push_str(&format!("M{:.2} {:.2} ", p.x, p.y)),
            PathOp::LineTo(p) => d.push_str(&format!("L{:.2} {:.2} ", p.x, p.y)),
            PathOp::BezierTo(c1, c2, p) => d.push_str(&format!(
                "C{:.2} {:.2},{:.2} {:.2},{:.2} {:.2} ",
                c1.x, c1.y, c2.x, c2.y, p.x, p.y
            )),
        }
    }
    d.trim_end().to_string()
}

/// One `<path>` per pass, newline separated.
pub fn passes_to_svg(passes: &[SketchPass], options: &SketchOptions) -> String {
    passes
        .iter()
        .map(|pass| pass_to_svg(pass, options))
        .collect::<Vec<_>>()
        .join("\n")
}

fn pass_to_svg(pass: &SketchPass, options: &SketchOptions) -> String {
    let d = ops_to_path(&pass.ops);
    match pass.kind {
        PassKind::Stroke => format!(
            "<path d=\"{d}\" stroke=\"{}\" stroke-width=\"{}\" fill=\"none\" stroke-linecap=\"round\" stroke-linejoin=\"round\"{}/>",
            escape_xml(&options.stroke),
            options.stroke_width,
            dash_attr(options.stroke_line_dash)
        ),
        PassKind::Fill => format!(
            "<path d=\"{d}\" stroke=\"none\" fill=\"{}\"/>",
            escape_xml(options.fill.as_deref().unwrap_or("none"))
        ),
        PassKind::FillSketch => format!(
            "<path d=\"{d}\" stroke=\"{}\" stroke-width=\"{}\" fill=\"none\" stroke-linecap=\"round\"/>",
            escape_xml(options.fill.as_deref().unwrap_or(&options.stroke)),
            options.stroke_width / 2.0
        ),
    }
}

pub fn dash_attr(dash: Option<[f64; 2]>) -> String {
    match dash {
        Some([on, off]) => format!(" stroke-dasharray=\"{on} {off}\""),
        None => String::new(),
    }
}

/// Straight `M x y L x y …` polyline.
pub fn points_to_path(points: &[Point]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let cmd = if idx == 0 { "M" } else { "L" };
            format!("{cmd}{:.2} {:.2}", p.x, p.y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
