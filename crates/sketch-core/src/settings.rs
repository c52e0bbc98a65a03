use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::layer::Color;

/// Editor-wide defaults. Every field has a default so partial JSON works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub canvas: CanvasSettings,
    /// Debounce window for redraw requests, in milliseconds.
    pub redraw_delay_ms: u64,
    pub background: BackgroundSettings,
    /// Width products are scaled to when their descriptor names none.
    pub product_width: f64,
    pub text: TextSettings,
    pub measurement: MeasurementSettings,
    /// TrueType/OpenType font used to rasterize text.
    pub font: Option<PathBuf>,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            canvas: CanvasSettings::default(),
            redraw_delay_ms: 50,
            background: BackgroundSettings::default(),
            product_width: 100.0,
            text: TextSettings::default(),
            measurement: MeasurementSettings::default(),
            font: None,
        }
    }
}

impl SceneSettings {
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(SceneError::InvalidSettings(format!(
                "canvas must not be empty ({}x{})",
                self.canvas.width, self.canvas.height
            )));
        }
        if !(self.product_width > 0.0) {
            return Err(SceneError::InvalidSettings(
                "product_width must be positive".to_string(),
            ));
        }
        if !(self.text.font_size > 0.0) {
            return Err(SceneError::InvalidSettings(
                "text.font_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub width: u32,
    pub height: u32,
    /// Fill behind all layers; `None` leaves the canvas transparent.
    pub fill: Option<Color>,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            fill: None,
        }
    }
}

/// Fixed placement of the background image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundSettings {
    pub left: f64,
    pub top: f64,
    pub scale: f64,
    pub opacity: f64,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            left: 30.0,
            top: 30.0,
            scale: 0.5,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSettings {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub font_size: f64,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            left: 50.0,
            top: 50.0,
            width: 150.0,
            font_size: 20.0,
        }
    }
}

/// Geometry of the measurement tape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementSettings {
    pub left: f64,
    pub top: f64,
    /// Unscaled handle length.
    pub handle_length: f64,
    /// Horizontal distance between the two handles' left edges.
    pub handle_spacing: f64,
    pub handle_scale: f64,
    pub stroke_width: f64,
    pub color: Color,
    pub label_font_size: f64,
    pub label_width: f64,
    /// Vertical offset of the label below the handles.
    pub label_offset: f64,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            left: 50.0,
            top: 50.0,
            handle_length: 50.0,
            handle_spacing: 200.0,
            handle_scale: 3.0,
            stroke_width: 1.0,
            color: Color::GREEN,
            label_font_size: 16.0,
            label_width: 100.0,
            label_offset: 10.0,
        }
    }
}
