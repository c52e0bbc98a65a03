use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bitmap::ImageHandle;
use crate::descriptor::ProductDescriptor;
use crate::geometry::{BBox, Placement, Point};
use crate::registry::Registration;

/// Unique layer identifier, generated when the layer is built.
pub type LayerId = Uuid;

/// Line height multiplier used to estimate text box height.
pub const LINE_HEIGHT: f64 = 1.16;

/// Average glyph advance as a fraction of the font size, used to estimate
/// word wrapping without a font.
pub const AVERAGE_ADVANCE: f64 = 0.6;

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Horizontal text alignment inside a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// A wrapped block of text, positioned by its parent's placement.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub content: String,
    pub font_size: f64,
    /// Wrapping width in local units.
    pub width: f64,
    pub align: TextAlign,
    pub color: Color,
    /// Offset of the box inside its parent (zero for standalone text).
    pub offset: Point,
}

impl TextBox {
    pub fn new(content: &str, font_size: f64, width: f64) -> Self {
        Self {
            content: content.to_string(),
            font_size,
            width,
            align: TextAlign::Left,
            color: Color::BLACK,
            offset: Point::new(0.0, 0.0),
        }
    }

    /// Lines after word wrapping at `width`, estimated with
    /// [`AVERAGE_ADVANCE`] per character.
    pub fn line_count(&self) -> usize {
        let advance = self.font_size * AVERAGE_ADVANCE;
        let per_line = if advance > 0.0 {
            ((self.width / advance).floor() as usize).max(1)
        } else {
            usize::MAX
        };
        self.content
            .lines()
            .map(|paragraph| wrapped_lines(paragraph, per_line))
            .sum::<usize>()
            .max(1)
    }

    /// Estimated height; the exact value depends on the font.
    pub fn height(&self) -> f64 {
        self.line_count() as f64 * self.font_size * LINE_HEIGHT
    }
}

/// Greedy word wrap of one paragraph, counting characters.
fn wrapped_lines(paragraph: &str, per_line: usize) -> usize {
    let mut lines = 1;
    let mut used = 0;
    for word in paragraph.split_whitespace() {
        let len = word.chars().count();
        if used == 0 {
            used = len;
        } else if used + 1 + len > per_line {
            lines += 1;
            used = len;
        } else {
            used += 1 + len;
        }
    }
    lines
}

/// A horizontal reference stroke inside a measurement group.
#[derive(Debug, Clone, PartialEq)]
pub struct Handle {
    /// Top-left of the stroke inside the group.
    pub offset: Point,
    /// Unscaled length.
    pub length: f64,
    pub color: Color,
    pub stroke_width: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Handle {
    pub fn scaled_length(&self) -> f64 {
        self.length * self.scale_x
    }

    /// Rendered stroke thickness.
    pub fn thickness(&self) -> f64 {
        self.stroke_width * self.scale_y
    }

    pub fn local_bbox(&self) -> BBox {
        BBox::from_origin(self.offset, self.scaled_length(), self.thickness())
    }
}

/// Two parallel handles with a centred label, moved and selected as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementGroup {
    pub handles: [Handle; 2],
    pub label: TextBox,
}

impl MeasurementGroup {
    pub fn local_bbox(&self) -> BBox {
        let label = BBox::from_origin(self.label.offset, self.label.width, self.label.height());
        self.handles
            .iter()
            .map(Handle::local_bbox)
            .fold(label, |acc, bb| acc.union(&bb))
    }
}

/// What a layer draws.
#[derive(Debug, Clone)]
pub enum LayerContent {
    Background(ImageHandle),
    Product {
        image: ImageHandle,
        descriptor: ProductDescriptor,
        registration: Registration,
        /// Render position requested at insertion time.
        z_index: usize,
    },
    Text(TextBox),
    Measurement(MeasurementGroup),
}

impl LayerContent {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerContent::Background(_) => LayerKind::Background,
            LayerContent::Product { .. } => LayerKind::Product,
            LayerContent::Text(_) => LayerKind::Text,
            LayerContent::Measurement(_) => LayerKind::Measurement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    Background,
    Product,
    Text,
    Measurement,
}

/// Callback run once when a layer leaves the scene.
pub type RemovalHook = Box<dyn FnOnce(&Layer) + Send>;

/// A single renderable unit on the scene.
pub struct Layer {
    pub id: LayerId,
    pub content: LayerContent,
    pub placement: Placement,
    pub selectable: bool,
    pub lock_scale_x: bool,
    pub lock_scale_y: bool,
    on_removed: Option<RemovalHook>,
}

impl Layer {
    pub fn new(content: LayerContent, placement: Placement) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            placement,
            selectable: true,
            lock_scale_x: false,
            lock_scale_y: false,
            on_removed: None,
        }
    }

    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn with_scale_locks(mut self, x: bool, y: bool) -> Self {
        self.lock_scale_x = x;
        self.lock_scale_y = y;
        self
    }

    /// Attach the hook fired when this layer is removed from the scene.
    pub fn on_removed(&mut self, hook: RemovalHook) {
        self.on_removed = Some(hook);
    }

    /// Run the removal hook, if any. Subsequent calls do nothing.
    pub fn fire_removed(&mut self) {
        if let Some(hook) = self.on_removed.take() {
            hook(self);
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.content.kind()
    }

    pub fn descriptor(&self) -> Option<&ProductDescriptor> {
        match &self.content {
            LayerContent::Product { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }

    pub fn z_index(&self) -> Option<usize> {
        match &self.content {
            LayerContent::Product { z_index, .. } => Some(*z_index),
            _ => None,
        }
    }

    /// Unscaled size of the content in local units.
    fn local_size(&self) -> (f64, f64) {
        match &self.content {
            LayerContent::Background(image) | LayerContent::Product { image, .. } => {
                (image.width() as f64, image.height() as f64)
            }
            LayerContent::Text(text) => (text.width, text.height()),
            LayerContent::Measurement(group) => {
                let bb = group.local_bbox();
                (bb.max.x, bb.max.y)
            }
        }
    }

    /// Bounds in scene coordinates.
    pub fn bbox(&self) -> BBox {
        let (w, h) = self.local_size();
        self.placement.bounds(w, h)
    }

    /// Scale uniformly so the layer is `width` units wide.
    pub fn scale_to_width(&mut self, width: f64) {
        let (w, _) = self.local_size();
        if w > 0.0 {
            let scale = width / w;
            self.placement.scale_x = scale;
            self.placement.scale_y = scale;
        }
    }

    /// Resize, honouring the per-axis scale locks.
    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) {
        if !self.lock_scale_x {
            self.placement.scale_x = scale_x;
        }
        if !self.lock_scale_y {
            self.placement.scale_y = scale_y;
        }
    }

    pub fn move_to(&mut self, left: f64, top: f64) {
        self.placement.left = left;
        self.placement.top = top;
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("content", &self.content)
            .field("placement", &self.placement)
            .field("selectable", &self.selectable)
            .field("has_removal_hook", &self.on_removed.is_some())
            .finish()
    }
}
