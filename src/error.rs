//! Error types for document export.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type of the crate.
///
/// Missing image resources, unknown element types and elements without
/// enough geometry are not errors: the renderer skips them and logs why.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to parse document: {0}")]
    Input(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("scale must be a finite number greater than zero, got {0}")]
    InvalidScale(f32),

    #[cfg(feature = "png")]
    #[error(transparent)]
    Svg(#[from] usvg::Error),

    #[error("rasterization failed: {0}")]
    Rasterize(String),

    #[error("PNG output requires the `png` feature")]
    PngUnsupported,
}

pub type Result<T> = std::result::Result<T, ExportError>;
