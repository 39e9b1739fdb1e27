//! File-to-file conversion.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::error::{ExportError, Result};
use crate::fonts::{EmbeddedFonts, FontProvider};
use crate::geometry::Canvas;
use crate::ir::Document;
use crate::normalize::normalize;
use crate::raster::RasterOptions;
use crate::render::{RenderOptions, Renderer, write_output_png, write_output_svg};
use crate::sketch::RoughGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    /// An explicit format wins, then a `.svg` output extension, then PNG.
    pub fn detect(explicit: Option<Self>, output: Option<&Path>) -> Self {
        if let Some(format) = explicit {
            return format;
        }
        let is_svg = output
            .and_then(|path| path.extension())
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        if is_svg { Self::Svg } else { Self::Png }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub format: Option<OutputFormat>,
    pub render: RenderOptions,
    pub raster: RasterOptions,
    /// Directory of the faces embedded into SVG output. Uses
    /// [`EmbeddedFonts::shared`] when unset.
    pub fonts_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub format: OutputFormat,
    pub path: PathBuf,
    /// Bytes written.
    pub size: u64,
    /// Pixels for PNG, canvas units for SVG.
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            OutputFormat::Png => write!(
                f,
                "✓ {} ({}×{}, {})",
                self.path.display(),
                self.width,
                self.height,
                format_bytes(self.size)
            ),
            OutputFormat::Svg => {
                write!(f, "✓ {} ({})", self.path.display(), format_bytes(self.size))
            }
        }
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let value = bytes as f64;
    if value < KB {
        format!("{bytes} B")
    } else if value < KB * KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{:.1} MB", value / (KB * KB))
    }
}

pub fn export_diagram(input: &Path, output: &Path, options: &ExportOptions) -> Result<ExportSummary> {
    if !input.is_file() {
        return Err(ExportError::NotFound(input.to_path_buf()));
    }
    let contents = fs::read_to_string(input)?;
    let document = Document::from_json(&contents)?;
    export_document(&document, output, options)
}

pub fn export_document(
    document: &Document,
    output: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let format = OutputFormat::detect(options.format, Some(output));
    let (svg, canvas) = render_svg(document, options);

    let (size, width, height) = match format {
        OutputFormat::Svg => {
            write_output_svg(&svg, Some(output))?;
            (svg.len() as u64, canvas.width, canvas.height)
        }
        OutputFormat::Png => {
            let raster = write_output_png(&svg, output, &raster_options(options))?;
            (raster.png.len() as u64, raster.width, raster.height)
        }
    };

    info!(format:% = format, path:? = output, size, width, height; "Exported diagram");
    Ok(ExportSummary {
        format,
        path: output.to_path_buf(),
        size,
        width,
        height,
    })
}

/// The SVG text and the canvas it was laid out on.
pub fn render_svg(document: &Document, options: &ExportOptions) -> (String, Canvas) {
    let local;
    let fonts: &(dyn FontProvider + Sync) = match &options.fonts_dir {
        Some(dir) => {
            local = EmbeddedFonts::for_dir(dir);
            &*local
        }
        None => EmbeddedFonts::shared(),
    };
    let generator = RoughGenerator::default();
    let scene = normalize(document, &options.render);
    let svg = Renderer::new(&generator, fonts).render_scene(&scene, &options.render.theme);
    (svg, scene.canvas())
}

/// Rasterizer options with the embedded-font directory added to the
/// lookup path.
fn raster_options(options: &ExportOptions) -> RasterOptions {
    let mut raster = options.raster.clone();
    let dir = options
        .fonts_dir
        .clone()
        .unwrap_or_else(|| EmbeddedFonts::shared().dir().to_path_buf());
    if dir.is_dir() && !raster.font_dirs.contains(&dir) {
        raster.font_dirs.push(dir);
    }
    raster
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection_priority() {
        let svg = Path::new("out.SVG");
        let png = Path::new("out.png");
        assert_eq!(OutputFormat::detect(None, Some(svg)), OutputFormat::Svg);
        assert_eq!(OutputFormat::detect(None, Some(png)), OutputFormat::Png);
        assert_eq!(OutputFormat::detect(None, None), OutputFormat::Png);
        assert_eq!(
            OutputFormat::detect(Some(OutputFormat::Png), Some(svg)),
            OutputFormat::Png
        );
    }

    #[test]
    fn formats_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn summary_lines() {
        let png = ExportSummary {
            format: OutputFormat::Png,
            path: PathBuf::from("a.png"),
            size: 2048,
            width: 360,
            height: 260,
        };
        assert_eq!(png.to_string(), "✓ a.png (360×260, 2.0 KB)");
        let svg = ExportSummary {
            format: OutputFormat::Svg,
            size: 900,
            path: PathBuf::from("a.svg"),
            ..png
        };
        assert_eq!(svg.to_string(), "✓ a.svg (900 B)");
    }

    #[test]
    fn missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_diagram(
            &dir.path().join("nope.excalidraw"),
            &dir.path().join("out.svg"),
            &ExportOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::NotFound(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn exports_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.excalidraw");
        fs::write(
            &input,
            r#"{"elements":[{"type":"rectangle","x":0,"y":0,"width":100,"height":50}]}"#,
        )
        .unwrap();
        let output = dir.path().join("out.svg");
        let options = ExportOptions {
            fonts_dir: Some(dir.path().join("no-fonts")),
            ..Default::default()
        };
        let summary = export_diagram(&input, &output, &options).unwrap();
        assert_eq!(summary.format, OutputFormat::Svg);
        assert_eq!((summary.width, summary.height), (180, 130));
        assert_eq!(summary.size, fs::metadata(&output).unwrap().len());
    }

    #[test]
    fn fonts_dir_is_read_once_across_exports() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = dir.path().join("fonts");
        fs::create_dir(&fonts).unwrap();
        fs::write(fonts.join("Virgil-Regular.woff2"), b"abc").unwrap();
        let document = Document::from_json(
            r#"{"elements":[{"type":"text","x":0,"y":0,"text":"hi"}]}"#,
        )
        .unwrap();
        let options = ExportOptions {
            fonts_dir: Some(fonts.clone()),
            ..Default::default()
        };
        let (first, _) = render_svg(&document, &options);
        assert!(first.contains("font-family: 'Virgil';"));

        fs::remove_file(fonts.join("Virgil-Regular.woff2")).unwrap();
        let (second, _) = render_svg(&document, &options);
        assert_eq!(first, second);
    }
}
