use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Deserializer};

use crate::error::Result;
use crate::geometry::Point;
use crate::theme::Theme;

/// A parsed `.excalidraw` document.
///
/// Only the fields the renderer reads are modelled; everything else in the
/// file is ignored. A missing or non-array `elements` field yields an empty
/// document rather than an error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, deserialize_with = "lenient_elements")]
    pub elements: Vec<RawElement>,
    #[serde(default)]
    pub app_state: Option<AppState>,
    #[serde(default)]
    pub files: Option<BTreeMap<String, FileEntry>>,
}

impl Document {
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn view_background(&self) -> Option<&str> {
        self.app_state
            .as_ref()
            .and_then(|state| state.view_background_color.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppState {
    pub view_background_color: Option<String>,
}

/// One entry of the `files` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileEntry {
    pub id: Option<String>,
    pub mime_type: Option<String>,
    #[serde(rename = "dataURL")]
    pub data_url: Option<String>,
}

impl FileEntry {
    /// The payload as a `data:` URI, building one from the mime type when the
    /// stored value is a bare base64 payload.
    pub fn data_uri(&self) -> Option<String> {
        let payload = self.data_url.as_deref()?.trim();
        if payload.is_empty() {
            return None;
        }
        if payload.starts_with("data:") {
            return Some(payload.to_string());
        }
        let mime = self
            .mime_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        Some(format!("data:{mime};base64,{payload}"))
    }
}

/// An element as it appears in the file. Every attribute is optional so that
/// documents written by older or newer editors still decode.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub angle: Option<f64>,
    pub opacity: Option<f64>,
    pub is_deleted: Option<bool>,
    pub stroke_color: Option<String>,
    pub background_color: Option<String>,
    pub fill_style: Option<String>,
    pub stroke_width: Option<f64>,
    pub stroke_style: Option<String>,
    pub roughness: Option<f64>,
    pub seed: Option<f64>,
    pub roundness: Option<serde_json::Value>,
    pub points: Option<Vec<Vec<f64>>>,
    pub start_arrowhead: Option<String>,
    pub end_arrowhead: Option<String>,
    pub text: Option<String>,
    pub original_text: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<f64>,
    pub text_align: Option<String>,
    pub vertical_align: Option<String>,
    pub file_id: Option<String>,
    pub name: Option<String>,
}

impl RawElement {
    pub fn is_deleted(&self) -> bool {
        self.is_deleted.unwrap_or(false)
    }
}

fn lenient_elements<'de, D>(deserializer: D) -> std::result::Result<Vec<RawElement>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    let mut elements = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RawElement>(item) {
            Ok(element) => elements.push(element),
            Err(err) => warn!(index, error:% = err; "Skipping malformed element"),
        }
    }
    Ok(elements)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStyle {
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("dashed") => Self::Dashed,
            Some("dotted") => Self::Dotted,
            _ => Self::Solid,
        }
    }

    pub fn dash_array(self) -> Option<[f64; 2]> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some([12.0, 8.0]),
            Self::Dotted => Some([3.0, 6.0]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStyle {
    Solid,
    Hachure,
    CrossHatch,
}

impl FillStyle {
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            None | Some("solid") => Self::Solid,
            Some("cross-hatch") => Self::CrossHatch,
            // zigzag, dots, dashed and friends are drawn as plain hachure
            Some(_) => Self::Hachure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrowhead {
    Arrow,
    Bar,
    Dot,
    Triangle,
}

impl Arrowhead {
    pub fn from_token(token: Option<&str>) -> Option<Self> {
        match token? {
            "bar" => Some(Self::Bar),
            "dot" | "circle" | "circle_outline" => Some(Self::Dot),
            "triangle" | "triangle_outline" => Some(Self::Triangle),
            _ => Some(Self::Arrow),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("center") => Self::Center,
            Some("right") => Self::Right,
            _ => Self::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

impl VerticalAlign {
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("middle") => Self::Middle,
            Some("bottom") => Self::Bottom,
            _ => Self::Top,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub stroke_color: String,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    /// `None` when the element has no background or a transparent one.
    pub fill: Option<String>,
    pub fill_style: FillStyle,
    pub roughness: f64,
    pub seed: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub rounded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextContent {
    pub text: String,
    pub font_size: f64,
    pub font_family: u32,
    pub align: TextAlign,
    pub vertical_align: VerticalAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle {
        rounded: bool,
    },
    Ellipse,
    Diamond,
    Line(Polyline),
    Arrow {
        line: Polyline,
        start: Option<Arrowhead>,
        end: Option<Arrowhead>,
    },
    Text(TextContent),
    Freedraw {
        points: Vec<Point>,
    },
    Image {
        file_id: Option<String>,
    },
    Frame {
        name: Option<String>,
    },
    /// An element type this renderer does not draw.
    Unknown(String),
}

/// A typed element with all style defaults resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Radians, clockwise, about the element center.
    pub angle: f64,
    /// 0..=100
    pub opacity: f64,
    pub style: Style,
    pub shape: Shape,
}

impl Element {
    pub fn from_raw(raw: &RawElement, theme: &Theme) -> Self {
        let style = Style {
            stroke_color: non_empty(raw.stroke_color.as_deref())
                .unwrap_or(theme.stroke_color.as_str())
                .to_string(),
            stroke_width: raw
                .stroke_width
                .filter(|w| w.is_finite() && *w > 0.0)
                .unwrap_or(theme.stroke_width),
            stroke_style: StrokeStyle::from_token(raw.stroke_style.as_deref()),
            fill: non_empty(raw.background_color.as_deref())
                .filter(|color| *color != "transparent")
                .map(str::to_string),
            fill_style: FillStyle::from_token(raw.fill_style.as_deref()),
            roughness: raw
                .roughness
                .filter(|r| r.is_finite())
                .unwrap_or(theme.roughness)
                .max(0.0),
            seed: resolve_seed(raw.seed),
        };

        let rounded = raw.roundness.is_some();
        let shape = match raw.kind.as_str() {
            "rectangle" => Shape::Rectangle { rounded },
            "ellipse" => Shape::Ellipse,
            "diamond" => Shape::Diamond,
            "line" => Shape::Line(Polyline {
                points: decode_points(raw.points.as_deref()),
                rounded,
            }),
            "arrow" => Shape::Arrow {
                line: Polyline {
                    points: decode_points(raw.points.as_deref()),
                    rounded,
                },
                start: Arrowhead::from_token(raw.start_arrowhead.as_deref()),
                end: Arrowhead::from_token(raw.end_arrowhead.as_deref()),
            },
            "text" => Shape::Text(TextContent {
                text: raw
                    .text
                    .as_deref()
                    .filter(|text| !text.is_empty())
                    .or(raw.original_text.as_deref())
                    .unwrap_or_default()
                    .to_string(),
                font_size: raw
                    .font_size
                    .filter(|size| size.is_finite() && *size > 0.0)
                    .unwrap_or(theme.font_size),
                font_family: raw
                    .font_family
                    .filter(|id| id.is_finite() && *id >= 0.0)
                    .map(|id| id as u32)
                    .unwrap_or(theme.font_family),
                align: TextAlign::from_token(raw.text_align.as_deref()),
                vertical_align: VerticalAlign::from_token(raw.vertical_align.as_deref()),
            }),
            "freedraw" => Shape::Freedraw {
                points: decode_points(raw.points.as_deref()),
            },
            "image" => Shape::Image {
                file_id: raw.file_id.clone(),
            },
            "frame" | "magicframe" => Shape::Frame {
                name: non_empty(raw.name.as_deref()).map(str::to_string),
            },
            other => Shape::Unknown(other.to_string()),
        };

        Self {
            id: raw.id.clone(),
            x: finite_or_zero(raw.x),
            y: finite_or_zero(raw.y),
            width: finite_or_zero(raw.width),
            height: finite_or_zero(raw.height),
            angle: finite_or_zero(raw.angle),
            opacity: raw
                .opacity
                .filter(|o| o.is_finite())
                .unwrap_or(100.0)
                .clamp(0.0, 100.0),
            style,
            shape,
        }
    }

    pub fn kind(&self) -> &str {
        match &self.shape {
            Shape::Rectangle { .. } => "rectangle",
            Shape::Ellipse => "ellipse",
            Shape::Diamond => "diamond",
            Shape::Line(_) => "line",
            Shape::Arrow { .. } => "arrow",
            Shape::Text(_) => "text",
            Shape::Freedraw { .. } => "freedraw",
            Shape::Image { .. } => "image",
            Shape::Frame { .. } => "frame",
            Shape::Unknown(kind) => kind,
        }
    }

    /// Relative points of point-based variants.
    pub fn points(&self) -> Option<&[Point]> {
        match &self.shape {
            Shape::Line(line) | Shape::Arrow { line, .. } => Some(&line.points),
            Shape::Freedraw { points } => Some(points),
            _ => None,
        }
    }

    /// Points translated by the element position.
    pub fn absolute_points(&self) -> Vec<Point> {
        self.points()
            .unwrap_or_default()
            .iter()
            .map(|p| Point::new(self.x + p.x, self.y + p.y))
            .collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn resolve_seed(seed: Option<f64>) -> u32 {
    match seed {
        Some(seed) if seed.is_finite() => match (seed as i64) as u32 {
            0 => 1,
            seed => seed,
        },
        _ => 1,
    }
}

fn decode_points(points: Option<&[Vec<f64>]>) -> Vec<Point> {
    points
        .unwrap_or_default()
        .iter()
        .filter_map(|pair| match pair.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Some(Point::new(*x, *y)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(json: &str) -> Element {
        let raw: RawElement = serde_json::from_str(json).unwrap();
        Element::from_raw(&raw, &Theme::excalidraw())
    }

    #[test]
    fn missing_elements_is_empty_document() {
        let doc = Document::from_json(r#"{"type":"excalidraw"}"#).unwrap();
        assert!(doc.elements.is_empty());
        let doc = Document::from_json(r#"{"elements":null}"#).unwrap();
        assert!(doc.elements.is_empty());
    }

    #[test]
    fn non_object_document_is_input_error() {
        assert!(Document::from_json("[1, 2, 3]").is_err());
        assert!(Document::from_json("not json").is_err());
    }

    #[test]
    fn malformed_element_is_skipped() {
        let doc = Document::from_json(
            r#"{"elements":[{"type":"rectangle","x":"oops"},{"type":"ellipse","x":1}]}"#,
        )
        .unwrap();
        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.elements[0].kind, "ellipse");
    }

    #[test]
    fn style_defaults_apply() {
        let el = element(r#"{"type":"rectangle","strokeWidth":0,"backgroundColor":"transparent"}"#);
        assert_eq!(el.style.stroke_color, "#1e1e1e");
        assert_eq!(el.style.stroke_width, 2.0);
        assert_eq!(el.style.roughness, 1.0);
        assert_eq!(el.style.seed, 1);
        assert_eq!(el.style.fill, None);
        assert_eq!(el.opacity, 100.0);
    }

    #[test]
    fn explicit_zero_roughness_is_kept() {
        let el = element(r#"{"type":"rectangle","roughness":0,"roundness":{"type":3}}"#);
        assert_eq!(el.style.roughness, 0.0);
        assert_eq!(el.shape, Shape::Rectangle { rounded: true });
        let el = element(r#"{"type":"rectangle","roundness":null}"#);
        assert_eq!(el.shape, Shape::Rectangle { rounded: false });
    }

    #[test]
    fn arrow_heads_decode() {
        let el = element(r#"{"type":"arrow","points":[[0,0],[10,0]],"startArrowhead":null,"endArrowhead":"arrow"}"#);
        match el.shape {
            Shape::Arrow { start, end, line } => {
                assert_eq!(start, None);
                assert_eq!(end, Some(Arrowhead::Arrow));
                assert_eq!(line.points.len(), 2);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_kept_as_unknown() {
        let el = element(r#"{"type":"embeddable","x":5,"width":10}"#);
        assert_eq!(el.shape, Shape::Unknown("embeddable".to_string()));
        assert_eq!(el.kind(), "embeddable");
    }

    #[test]
    fn text_falls_back_to_original_text() {
        let el = element(r#"{"type":"text","text":"","originalText":"Hi","fontFamily":3}"#);
        match el.shape {
            Shape::Text(text) => {
                assert_eq!(text.text, "Hi");
                assert_eq!(text.font_family, 3);
                assert_eq!(text.font_size, 20.0);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn whitespace_text_is_kept() {
        let el = element(r#"{"type":"text","text":"  ","originalText":"X"}"#);
        match el.shape {
            Shape::Text(text) => assert_eq!(text.text, "  "),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn file_entry_builds_data_uri() {
        let entry = FileEntry {
            mime_type: Some("image/png".to_string()),
            data_url: Some("abc123".to_string()),
            ..Default::default()
        };
        assert_eq!(entry.data_uri().as_deref(), Some("data:image/png;base64,abc123"));
        let entry = FileEntry {
            data_url: Some("data:image/jpeg;base64,xyz".to_string()),
            ..Default::default()
        };
        assert_eq!(entry.data_uri().as_deref(), Some("data:image/jpeg;base64,xyz"));
    }
}
