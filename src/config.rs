use crate::export::ExportOptions;
use crate::raster::RasterOptions;
use crate::render::RenderOptions;
use crate::theme::Theme;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCALE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub theme: Theme,
    /// Overrides the document background when set.
    pub background: Option<String>,
    pub scale: f32,
    pub fonts_dir: Option<PathBuf>,
    pub load_system_fonts: bool,
    pub default_font_family: String,
}

impl Default for Config {
    fn default() -> Self {
        let raster = RasterOptions::default();
        Self {
            theme: Theme::excalidraw(),
            background: None,
            scale: DEFAULT_SCALE,
            fonts_dir: None,
            load_system_fonts: raster.load_system_fonts,
            default_font_family: raster.default_font_family,
        }
    }
}

impl Config {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            background: self.background.clone(),
            theme: self.theme.clone(),
        }
    }

    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            zoom: self.scale,
            load_system_fonts: self.load_system_fonts,
            font_dirs: self.fonts_dir.iter().cloned().collect(),
            default_font_family: self.default_font_family.clone(),
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            format: None,
            render: self.render_options(),
            raster: self.raster_options(),
            fonts_dir: self.fonts_dir.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    background: Option<String>,
    scale: Option<f32>,
    fonts_dir: Option<PathBuf>,
    load_system_fonts: Option<bool>,
    default_font_family: Option<String>,
    theme: Option<Theme>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(theme) = parsed.theme {
        config.theme = theme;
    }
    if let Some(background) = parsed.background {
        config.background = Some(background);
    }
    if let Some(scale) = parsed.scale {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(anyhow::anyhow!(
                "scale must be a finite number greater than zero, got {scale}"
            ));
        }
        config.scale = scale;
    }
    if let Some(dir) = parsed.fonts_dir {
        // relative to the config file
        config.fonts_dir = Some(match path.parent() {
            Some(base) if dir.is_relative() => base.join(dir),
            _ => dir,
        });
    }
    if let Some(v) = parsed.load_system_fonts {
        config.load_system_fonts = v;
    }
    if let Some(v) = parsed.default_font_family {
        config.default_font_family = v;
    }

    Ok(config)
}
