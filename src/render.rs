pub mod path;
pub mod shapes;
pub mod text;

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::fonts::FontProvider;
use crate::geometry::ElementTransform;
use crate::ir::{Document, FileEntry};
use crate::normalize::{Background, Scene, normalize};
use crate::raster::{Raster, RasterOptions, rasterize};
use crate::sketch::SketchGenerator;
use crate::theme::Theme;

pub use path::escape_xml;

/// Output of a document without visible elements.
pub const EMPTY_SVG: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\" height=\"100\"></svg>";

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Overrides the document background. `"transparent"` disables it.
    pub background: Option<String>,
    pub theme: Theme,
}

/// Everything a shape renderer may read.
pub struct RenderContext<'a> {
    pub theme: &'a Theme,
    pub files: &'a BTreeMap<String, FileEntry>,
    pub sketch: &'a dyn SketchGenerator,
}

/// Composes per-element fragments into one SVG document.
#[derive(Clone, Copy)]
pub struct Renderer<'a> {
    sketch: &'a (dyn SketchGenerator + Sync),
    fonts: &'a (dyn FontProvider + Sync),
}

impl<'a> Renderer<'a> {
    pub fn new(
        sketch: &'a (dyn SketchGenerator + Sync),
        fonts: &'a (dyn FontProvider + Sync),
    ) -> Self {
        Self { sketch, fonts }
    }

    pub fn render(&self, document: &Document, options: &RenderOptions) -> String {
        let scene = normalize(document, options);
        self.render_scene(&scene, &options.theme)
    }

    pub fn render_scene(&self, scene: &Scene, theme: &Theme) -> String {
        if scene.elements.is_empty() {
            return EMPTY_SVG.to_string();
        }
        let canvas = scene.canvas();
        let ctx = RenderContext {
            theme,
            files: &scene.files,
            sketch: self.sketch,
        };

        let (width, height) = (canvas.width, canvas.height);
        let mut parts = vec![format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
        )];
        let fonts = self.fonts.font_block();
        if !fonts.is_empty() {
            parts.push(fonts.to_string());
        }
        if let Background::Color(color) = &scene.background {
            parts.push(format!(
                "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
                escape_xml(color)
            ));
        }

        let mut drawn = 0usize;
        for element in &scene.elements {
            let Some(svg) = shapes::render_element(element, &ctx) else {
                continue;
            };
            let transform = ElementTransform::for_element(element, &canvas);
            parts.push(format!("{}\n{svg}\n</g>", group_open(&transform)));
            drawn += 1;
        }
        parts.push("</svg>".to_string());

        debug!(width, height, elements = scene.elements.len(), drawn; "Rendered scene");
        parts.join("\n")
    }
}

fn group_open(transform: &ElementTransform) -> String {
    let mut group = format!(
        "<g transform=\"translate({:.2},{:.2})",
        transform.translate.x, transform.translate.y
    );
    if let Some((degrees, pivot)) = transform.rotation {
        group.push_str(&format!(" rotate({degrees:.2},{:.2},{:.2})", pivot.x, pivot.y));
    }
    group.push('"');
    if let Some(opacity) = transform.opacity {
        group.push_str(&format!(" opacity=\"{opacity:.2}\""));
    }
    group.push('>');
    group
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

pub fn write_output_png(svg: &str, output: &Path, options: &RasterOptions) -> Result<Raster> {
    let raster = rasterize(svg, options)?;
    std::fs::write(output, &raster.png)?;
    Ok(raster)
}
