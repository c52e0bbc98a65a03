use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use sketch_core::geometry::{Placement, Point};
use sketch_core::layer::{Color, LayerContent, TextAlign, TextBox};
use sketch_core::settings::CanvasSettings;
use sketch_core::Scene;

/// A draw command ready to be rasterized or handed to a host canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderItem {
    Image {
        source: String,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        opacity: f64,
        #[serde(skip)]
        pixels: Option<Arc<RgbaImage>>,
    },
    /// A filled axis-aligned bar (measurement handles).
    Rule {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        color: Color,
        opacity: f64,
    },
    Text {
        left: f64,
        top: f64,
        width: f64,
        font_size: f64,
        align: TextAlign,
        color: Color,
        opacity: f64,
        content: String,
    },
}

/// Complete frame data for one pass over the scene, in render order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderFrame {
    pub width: u32,
    pub height: u32,
    pub fill: Option<Color>,
    pub items: Vec<RenderItem>,
    /// Bounds of the active selection: [min_x, min_y, max_x, max_y].
    pub selection_bbox: Option<[f64; 4]>,
}

impl RenderFrame {
    pub fn empty(canvas: &CanvasSettings) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            fill: canvas.fill,
            items: Vec::new(),
            selection_bbox: None,
        }
    }

    /// Flatten the scene's layers into draw commands.
    pub fn build(scene: &Scene, canvas: &CanvasSettings) -> Self {
        let mut frame = Self::empty(canvas);
        for layer in scene.layers() {
            let p = &layer.placement;
            match &layer.content {
                LayerContent::Background(image) | LayerContent::Product { image, .. } => {
                    let bb = layer.bbox();
                    frame.items.push(RenderItem::Image {
                        source: image.source().to_string(),
                        left: bb.min.x,
                        top: bb.min.y,
                        width: bb.width(),
                        height: bb.height(),
                        opacity: p.opacity,
                        pixels: Some(image.shared_pixels()),
                    });
                }
                LayerContent::Text(text) => frame.items.push(text_item(text, p)),
                LayerContent::Measurement(group) => {
                    for handle in &group.handles {
                        let origin = p.apply(&handle.offset);
                        frame.items.push(RenderItem::Rule {
                            left: origin.x,
                            top: origin.y,
                            width: handle.scaled_length() * p.scale_x,
                            height: handle.thickness() * p.scale_y,
                            color: handle.color,
                            opacity: p.opacity,
                        });
                    }
                    frame.items.push(label_item(&group.label, p));
                }
            }
        }

        frame.selection_bbox = scene.active_layer().map(|layer| {
            let bb = layer.bbox();
            [bb.min.x, bb.min.y, bb.max.x, bb.max.y]
        });
        frame
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn text_item(text: &TextBox, p: &Placement) -> RenderItem {
    let origin = p.apply(&text.offset);
    RenderItem::Text {
        left: origin.x,
        top: origin.y,
        width: text.width * p.scale_x,
        font_size: text.font_size * p.scale_y,
        align: text.align,
        color: text.color,
        opacity: p.opacity,
        content: text.content.clone(),
    }
}

/// Measurement labels keep their size under group scaling; only their
/// centre follows the scaled span.
fn label_item(label: &TextBox, p: &Placement) -> RenderItem {
    let half = label.width / 2.0;
    let centre = p.apply(&Point::new(label.offset.x + half, label.offset.y));
    RenderItem::Text {
        left: centre.x - half,
        top: centre.y,
        width: label.width,
        font_size: label.font_size,
        align: label.align,
        color: label.color,
        opacity: p.opacity,
        content: label.content.clone(),
    }
}
