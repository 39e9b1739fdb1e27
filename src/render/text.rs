use crate::fonts::font_stack;
use crate::ir::{Element, TextAlign, TextContent, VerticalAlign};

use super::path::escape_xml;

pub const LINE_HEIGHT: f64 = 1.25;

/// Positioned text block: anchor point of the first baseline plus the lines
/// below it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub x: f64,
    pub y: f64,
    pub line_height: f64,
    pub anchor: &'static str,
}

pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

pub fn layout_text(element: &Element, content: &TextContent) -> TextLayout {
    let lines = split_lines(&content.text);
    let font_size = content.font_size;
    let line_height = font_size * LINE_HEIGHT;

    let (anchor, dx) = match content.align {
        TextAlign::Left => ("start", 0.0),
        TextAlign::Center => ("middle", element.width / 2.0),
        TextAlign::Right => ("end", element.width),
    };

    let block = lines.len() as f64 * line_height;
    let y = match content.vertical_align {
        VerticalAlign::Middle if element.height > 0.0 => {
            element.y + (element.height - block) / 2.0 + font_size
        }
        VerticalAlign::Bottom if element.height > 0.0 => {
            element.y + element.height - block + font_size
        }
        _ => element.y + font_size,
    };

    TextLayout {
        lines,
        x: element.x + dx,
        y,
        line_height,
        anchor,
    }
}

pub fn render_text(element: &Element, content: &TextContent) -> String {
    let layout = layout_text(element, content);
    text_svg(
        &layout,
        font_stack(content.font_family),
        content.font_size,
        &element.style.stroke_color,
    )
}

pub fn text_svg(layout: &TextLayout, font_family: &str, font_size: f64, fill: &str) -> String {
    let x = layout.x;
    let mut text = format!(
        "<text x=\"{x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{font_size}\" fill=\"{}\" text-anchor=\"{}\">",
        layout.y,
        escape_xml(font_family),
        escape_xml(fill),
        layout.anchor
    );
    for (idx, line) in layout.lines.iter().enumerate() {
        if idx == 0 {
            text.push_str(&format!("<tspan x=\"{x:.2}\" dy=\"0\">"));
        } else {
            text.push_str(&format!("<tspan x=\"{x:.2}\" dy=\"{}\">", layout.line_height));
        }
        text.push_str(&escape_xml(line));
        text.push_str("</tspan>");
    }
    text.push_str("</text>");
    text
}
