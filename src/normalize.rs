//! Turns a parsed document into the list of elements the renderer paints.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::geometry::Canvas;
use crate::ir::{Document, Element, FileEntry, Shape};
use crate::render::RenderOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    Transparent,
    Color(String),
}

impl Background {
    /// `"transparent"` and blank values mean no background.
    pub fn resolve(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("transparent") {
            Self::Transparent
        } else {
            Self::Color(value.to_string())
        }
    }
}

/// Visible elements in paint order, back to front.
#[derive(Debug, Clone)]
pub struct Scene {
    pub elements: Vec<Element>,
    pub background: Background,
    pub files: BTreeMap<String, FileEntry>,
}

impl Scene {
    pub fn canvas(&self) -> Canvas {
        Canvas::for_elements(&self.elements)
    }
}

pub fn normalize(document: &Document, options: &RenderOptions) -> Scene {
    let theme = &options.theme;
    let files = document.files.clone().unwrap_or_default();

    let mut deleted = 0usize;
    let mut elements = Vec::with_capacity(document.elements.len());
    for raw in &document.elements {
        if raw.is_deleted() {
            deleted += 1;
            continue;
        }
        let element = Element::from_raw(raw, theme);
        if let Shape::Image { file_id } = &element.shape {
            let found = file_id.as_deref().is_some_and(|id| files.contains_key(id));
            if !found {
                warn!(
                    element_id:? = element.id,
                    file_id:? = file_id;
                    "Image resource missing, element skipped"
                );
            }
        }
        elements.push(element);
    }

    let background = options
        .background
        .as_deref()
        .or(document.view_background())
        .map(Background::resolve)
        .unwrap_or_else(|| Background::resolve(&theme.background));

    debug!(
        visible = elements.len(),
        deleted,
        resources = files.len();
        "Normalized document"
    );

    Scene {
        elements,
        background,
        files,
    }
}
