use std::path::PathBuf;

use crate::error::{ExportError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// Scale factor applied to the SVG canvas size.
    pub zoom: f32,
    pub load_system_fonts: bool,
    /// Extra directories scanned for font files.
    pub font_dirs: Vec<PathBuf>,
    /// Used for text without a resolvable family.
    pub default_font_family: String,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            load_system_fonts: true,
            font_dirs: Vec::new(),
            default_font_family: "Virgil".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

fn check_zoom(zoom: f32) -> Result<()> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(())
    } else {
        Err(ExportError::InvalidScale(zoom))
    }
}

#[cfg(feature = "png")]
pub fn rasterize(svg: &str, options: &RasterOptions) -> Result<Raster> {
    use std::sync::Arc;

    use log::{debug, warn};
    use resvg::tiny_skia::{Pixmap, Transform};

    let zoom = options.zoom;
    check_zoom(zoom)?;

    let mut db = usvg::fontdb::Database::new();
    if options.load_system_fonts {
        db.load_system_fonts();
    }
    for dir in &options.font_dirs {
        if dir.is_dir() {
            db.load_fonts_dir(dir);
        } else {
            warn!(dir:? = dir; "Font directory not found");
        }
    }
    debug!(faces = db.len(); "Loaded font database");

    let mut opt = usvg::Options::default();
    opt.font_family = options.default_font_family.clone();
    opt.fontdb = Arc::new(db);

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size();
    let width = (size.width() * zoom).ceil();
    let height = (size.height() * zoom).ceil();
    if !(width.is_finite() && height.is_finite()) || width < 1.0 || height < 1.0 {
        return Err(ExportError::Rasterize(format!(
            "invalid output size {width}x{height} at zoom {zoom}"
        )));
    }
    let (width, height) = (width as u32, height as u32);

    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        ExportError::Rasterize(format!("failed to allocate a {width}x{height} pixmap"))
    })?;
    resvg::render(&tree, Transform::from_scale(zoom, zoom), &mut pixmap.as_mut());
    let png = pixmap
        .encode_png()
        .map_err(|err| ExportError::Rasterize(err.to_string()))?;

    debug!(width, height, zoom, bytes = png.len(); "Rasterized SVG");
    Ok(Raster { png, width, height })
}

#[cfg(not(feature = "png"))]
pub fn rasterize(_svg: &str, options: &RasterOptions) -> Result<Raster> {
    check_zoom(options.zoom)?;
    Err(ExportError::PngUnsupported)
}
