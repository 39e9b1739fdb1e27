use excalidraw_export::{RenderOptions, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportRenderOptions {
    background: Option<String>,
    transparent: Option<bool>,
    stroke_color: Option<String>,
    font_family: Option<u32>,
}

fn build_render_options(options: ExportRenderOptions) -> RenderOptions {
    let mut render_options = RenderOptions {
        background: options.background,
        ..Default::default()
    };
    if options.transparent == Some(true) {
        render_options.background = Some("transparent".to_string());
    }
    if let Some(stroke_color) = options.stroke_color {
        render_options.theme.stroke_color = stroke_color;
    }
    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    render_options
}

#[wasm_bindgen]
pub fn render_excalidraw_svg(document: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<ExportRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        ExportRenderOptions::default()
    };

    let render_options = build_render_options(options);
    render_with_options(document, &render_options)
        .map_err(|error| JsValue::from_str(&error.to_string()))
}
