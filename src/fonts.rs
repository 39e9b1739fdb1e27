use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use log::{debug, warn};
use once_cell::sync::{Lazy, OnceCell};

/// Environment variable that overrides the bundled font directory.
pub const FONTS_DIR_ENV: &str = "EXCALIDRAW_EXPORT_FONTS_DIR";

static SHARED: Lazy<EmbeddedFonts> = Lazy::new(|| EmbeddedFonts::new(EmbeddedFonts::default_dir()));
static BY_DIR: Lazy<Mutex<HashMap<PathBuf, Arc<EmbeddedFonts>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Hand-drawn, normal and code faces embedded into the output, by family
/// name and file stem.
const FACES: [(&str, &str); 3] = [
    ("Virgil", "Virgil-Regular"),
    ("Excalifont", "Excalifont-Regular"),
    ("Cascadia", "Cascadia-Regular"),
];

/// Extension, mime type and CSS format, in lookup order.
const FORMATS: [(&str, &str, &str); 4] = [
    ("woff2", "font/woff2", "woff2"),
    ("woff", "font/woff", "woff"),
    ("ttf", "font/ttf", "truetype"),
    ("otf", "font/otf", "opentype"),
];

/// CSS font stack for an Excalidraw `fontFamily` id. Unknown ids use the
/// hand-drawn stack.
pub fn font_stack(id: u32) -> &'static str {
    match id {
        2 => "Helvetica, Arial, sans-serif",
        3 => "Cascadia, Fira Code, monospace",
        5 => "Excalifont, Virgil, Segoe UI Emoji, cursive",
        6 => "Nunito, Helvetica, Arial, sans-serif",
        8 => "Comic Shanns, Cascadia, Fira Code, monospace",
        _ => "Virgil, Segoe UI Emoji, cursive",
    }
}

/// Source of the `<defs><style>` block placed after the SVG header.
pub trait FontProvider {
    /// Empty when there is nothing to embed.
    fn font_block(&self) -> &str;
}

/// Embeds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFonts;

impl FontProvider for NoFonts {
    fn font_block(&self) -> &str {
        ""
    }
}

/// Font faces read from a directory and inlined as base64 data URIs. The
/// directory is read the first time the block is requested.
#[derive(Debug)]
pub struct EmbeddedFonts {
    dir: PathBuf,
    block: OnceCell<String>,
}

impl EmbeddedFonts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            block: OnceCell::new(),
        }
    }

    /// Process-wide instance over [`EmbeddedFonts::default_dir`].
    pub fn shared() -> &'static EmbeddedFonts {
        &SHARED
    }

    /// Process-wide instance over `dir`, created on first use so repeated
    /// exports read each directory once.
    pub fn for_dir(dir: &Path) -> Arc<EmbeddedFonts> {
        let mut cache = BY_DIR.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(dir.to_path_buf())
            .or_insert_with(|| Arc::new(EmbeddedFonts::new(dir)))
            .clone()
    }

    pub fn default_dir() -> PathBuf {
        std::env::var_os(FONTS_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fonts")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn build_block(&self) -> String {
        let faces: Vec<String> = FACES
            .iter()
            .filter_map(|(family, stem)| self.face_rule(family, stem))
            .collect();
        if faces.is_empty() {
            debug!(dir:? = self.dir; "No font faces to embed");
            return String::new();
        }
        format!("<defs><style>\n{}</style></defs>", faces.join(""))
    }

    fn face_rule(&self, family: &str, stem: &str) -> Option<String> {
        for (ext, mime, format) in FORMATS {
            let path = self.dir.join(format!("{stem}.{ext}"));
            if !path.is_file() {
                continue;
            }
            match fs::read(&path) {
                Ok(bytes) => {
                    debug!(family, path:? = path, bytes = bytes.len(); "Embedding font face");
                    let encoded = BASE64_STANDARD.encode(bytes);
                    return Some(font_face_rule(family, mime, format, &encoded));
                }
                Err(err) => {
                    warn!(family, path:? = path, error:% = err; "Failed to read font file");
                }
            }
        }
        None
    }
}

impl FontProvider for EmbeddedFonts {
    fn font_block(&self) -> &str {
        self.block.get_or_init(|| self.build_block())
    }
}

fn font_face_rule(family: &str, mime: &str, format: &str, encoded: &str) -> String {
    format!(
        "@font-face {{\n  font-family: '{family}';\n  src: url('data:{mime};base64,{encoded}') format('{format}');\n  font-weight: normal;\n  font-style: normal;\n}}\n"
    )
}
