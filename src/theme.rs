use serde::{Deserialize, Serialize};

/// Style defaults applied to elements that leave an attribute unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub stroke_color: String,
    pub stroke_width: f64,
    pub roughness: f64,
    pub background: String,
    pub font_size: f64,
    pub font_family: u32,
    pub frame_stroke: String,
    pub frame_stroke_width: f64,
    pub frame_label_color: String,
    pub frame_label_font_size: f64,
}

impl Theme {
    pub fn excalidraw() -> Self {
        Self {
            stroke_color: "#1e1e1e".to_string(),
            stroke_width: 2.0,
            roughness: 1.0,
            background: "#ffffff".to_string(),
            font_size: 20.0,
            font_family: 1,
            frame_stroke: "#bbb".to_string(),
            frame_stroke_width: 1.0,
            frame_label_color: "#1e1e1e".to_string(),
            frame_label_font_size: 14.0,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::excalidraw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_theme_keeps_defaults() {
        let theme: Theme = serde_json::from_str(r##"{"strokeColor":"#000000"}"##).unwrap();
        assert_eq!(theme.stroke_color, "#000000");
        assert_eq!(theme.stroke_width, 2.0);
        assert_eq!(theme.background, "#ffffff");
    }
}
