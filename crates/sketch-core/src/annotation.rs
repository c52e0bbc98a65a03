//! Builders for free-text and measurement-tape layers.

use crate::geometry::{Placement, Point};
use crate::layer::{Handle, Layer, LayerContent, MeasurementGroup, TextAlign, TextBox};
use crate::settings::{MeasurementSettings, TextSettings};

/// Builds annotation layers from the editor defaults.
#[derive(Debug, Clone, Default)]
pub struct AnnotationBuilder {
    text: TextSettings,
    measurement: MeasurementSettings,
}

impl AnnotationBuilder {
    pub fn new(text: TextSettings, measurement: MeasurementSettings) -> Self {
        Self { text, measurement }
    }

    /// A movable, resizable text box at the default position.
    pub fn text(&self, content: &str, size: Option<f64>) -> Layer {
        let font_size = size.unwrap_or(self.text.font_size);
        let text = TextBox::new(content, font_size, self.text.width);
        Layer::new(
            LayerContent::Text(text),
            Placement::at(self.text.left, self.text.top),
        )
    }

    /// Two parallel handles with a centred label, grouped into one layer.
    ///
    /// Only the group is selectable; the label never scales and the group
    /// cannot be stretched vertically.
    pub fn measurement(&self, label: &str) -> Layer {
        let m = &self.measurement;
        let handle = |x: f64| Handle {
            offset: Point::new(x, 0.0),
            length: m.handle_length,
            color: m.color,
            stroke_width: m.stroke_width,
            scale_x: m.handle_scale,
            scale_y: m.handle_scale,
        };
        let handles = [handle(0.0), handle(m.handle_spacing)];

        let span = m.handle_spacing + handles[1].scaled_length();
        let mut text = TextBox::new(label, m.label_font_size, m.label_width);
        text.align = TextAlign::Center;
        text.color = m.color;
        text.offset = Point::new(span / 2.0 - m.label_width / 2.0, m.label_offset);

        let group = MeasurementGroup {
            handles,
            label: text,
        };
        Layer::new(LayerContent::Measurement(group), Placement::at(m.left, m.top))
            .with_scale_locks(false, true)
    }
}
