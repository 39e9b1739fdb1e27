#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fonts;
pub mod geometry;
pub mod ir;
pub mod normalize;
pub mod raster;
pub mod render;
pub mod scene_dump;
pub mod sketch;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::{Args, run};
pub use error::{ExportError, Result};
pub use export::{ExportOptions, ExportSummary, OutputFormat, export_diagram};
pub use ir::Document;
pub use render::{RenderOptions, Renderer};

use fonts::EmbeddedFonts;
use sketch::RoughGenerator;

/// Renders `.excalidraw` JSON with default options.
pub fn render_to_svg(input: &str) -> Result<String> {
    render_with_options(input, &RenderOptions::default())
}

pub fn render_with_options(input: &str, options: &RenderOptions) -> Result<String> {
    let document = Document::from_json(input)?;
    Ok(render_document(&document, options))
}

/// Renders with the built-in sketch generator and the shared embedded fonts.
pub fn render_document(document: &Document, options: &RenderOptions) -> String {
    Renderer::new(&RoughGenerator::default(), EmbeddedFonts::shared()).render(document, options)
}
