use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::geometry::{Bounds, Canvas, Point, element_bounds, element_corners, scene_bounds};
use crate::normalize::{Background, Scene};

/// Computed geometry of a scene, for debugging layout issues.
#[derive(Debug, Serialize)]
pub struct SceneDump {
    pub canvas: Canvas,
    pub content_bounds: Option<Bounds>,
    pub background: Option<String>,
    pub elements: Vec<ElementDump>,
}

#[derive(Debug, Serialize)]
pub struct ElementDump {
    pub index: usize,
    pub id: Option<String>,
    pub kind: String,
    pub angle: f64,
    pub opacity: f64,
    pub corners: [Point; 4],
    pub bounds: Bounds,
}

impl SceneDump {
    pub fn from_scene(scene: &Scene) -> Self {
        let elements = scene
            .elements
            .iter()
            .enumerate()
            .map(|(index, element)| ElementDump {
                index,
                id: element.id.clone(),
                kind: element.kind().to_string(),
                angle: element.angle,
                opacity: element.opacity,
                corners: element_corners(element),
                bounds: element_bounds(element),
            })
            .collect();

        let background = match &scene.background {
            Background::Transparent => None,
            Background::Color(color) => Some(color.clone()),
        };

        SceneDump {
            canvas: scene.canvas(),
            content_bounds: scene_bounds(&scene.elements),
            background,
            elements,
        }
    }
}

pub fn write_scene_dump(path: &Path, scene: &Scene) -> Result<()> {
    let file = File::create(path)?;
    dump_to_writer(BufWriter::new(file), scene)
}

fn dump_to_writer<W: Write>(mut writer: W, scene: &Scene) -> Result<()> {
    let dump = SceneDump::from_scene(scene);
    serde_json::to_writer_pretty(&mut writer, &dump).map_err(io::Error::from)?;
    writer.flush()?;
    Ok(())
}
