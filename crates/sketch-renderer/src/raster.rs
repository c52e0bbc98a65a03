use std::borrow::Cow;
use std::fmt;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use sketch_core::layer::{Color, TextAlign};

use crate::font::GlyphFont;
use crate::frame::{RenderFrame, RenderItem};

/// CPU compositor turning a [`RenderFrame`] into pixels.
///
/// Text is drawn only when a font is configured; without one text items are
/// skipped.
#[derive(Default)]
pub struct Rasterizer {
    font: Option<GlyphFont>,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(font: GlyphFont) -> Self {
        Self { font: Some(font) }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn render(&self, frame: &RenderFrame) -> RgbaImage {
        let fill = frame.fill.map(|c| Rgba(c.to_array())).unwrap_or(Rgba([0, 0, 0, 0]));
        let mut canvas = RgbaImage::from_pixel(frame.width, frame.height, fill);

        for item in &frame.items {
            match item {
                RenderItem::Image {
                    left,
                    top,
                    width,
                    height,
                    opacity,
                    pixels: Some(pixels),
                    ..
                } => {
                    let w = width.round() as u32;
                    let h = height.round() as u32;
                    if w == 0 || h == 0 {
                        continue;
                    }
                    let scaled = if (w, h) == pixels.dimensions() {
                        Cow::Borrowed(&**pixels)
                    } else {
                        Cow::Owned(imageops::resize(&**pixels, w, h, FilterType::Triangle))
                    };
                    draw_image(&mut canvas, &scaled, *left, *top, *opacity);
                }
                RenderItem::Image { source, .. } => {
                    log::debug!("Skipping image {} without pixel data", source);
                }
                RenderItem::Rule {
                    left,
                    top,
                    width,
                    height,
                    color,
                    opacity,
                } => fill_rect(&mut canvas, *left, *top, *width, height.max(1.0), *color, *opacity),
                RenderItem::Text {
                    left,
                    top,
                    width,
                    font_size,
                    align,
                    color,
                    opacity,
                    content,
                } => {
                    if let Some(font) = &self.font {
                        let text = TextRun {
                            left: *left as f32,
                            top: *top as f32,
                            width: *width as f32,
                            size: *font_size as f32,
                            align: *align,
                            color: *color,
                            opacity: *opacity,
                        };
                        draw_text(&mut canvas, font, &text, content);
                    }
                }
            }
        }
        canvas
    }
}

impl fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rasterizer")
            .field("has_font", &self.has_font())
            .finish()
    }
}

struct TextRun {
    left: f32,
    top: f32,
    width: f32,
    size: f32,
    align: TextAlign,
    color: Color,
    opacity: f64,
}

/// Source-over blend of `src` scaled by `coverage` onto `dst`.
fn blend(dst: &mut Rgba<u8>, src: [u8; 4], coverage: f64) {
    let sa = src[3] as f64 / 255.0 * coverage;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let v = (src[c] as f64 * sa + dst[c] as f64 * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn put(canvas: &mut RgbaImage, x: i64, y: i64, src: [u8; 4], coverage: f64) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    blend(canvas.get_pixel_mut(x as u32, y as u32), src, coverage);
}

fn draw_image(canvas: &mut RgbaImage, image: &RgbaImage, left: f64, top: f64, opacity: f64) {
    let ox = left.round() as i64;
    let oy = top.round() as i64;
    for (x, y, px) in image.enumerate_pixels() {
        put(canvas, ox + x as i64, oy + y as i64, px.0, opacity);
    }
}

fn fill_rect(
    canvas: &mut RgbaImage,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    color: Color,
    opacity: f64,
) {
    let x0 = left.round() as i64;
    let y0 = top.round() as i64;
    let x1 = (left + width).round() as i64;
    let y1 = (top + height).round() as i64;
    for y in y0..y1.max(y0 + 1) {
        for x in x0..x1 {
            put(canvas, x, y, color.to_array(), opacity);
        }
    }
}

fn draw_text(canvas: &mut RgbaImage, font: &GlyphFont, run: &TextRun, content: &str) {
    let ascent = font.ascent(run.size);
    let line_height = font.line_height(run.size);

    for (i, line) in font.wrap(content, run.size, run.width).iter().enumerate() {
        let mut pen_x = match run.align {
            TextAlign::Left => run.left,
            TextAlign::Center => run.left + (run.width - line.width) / 2.0,
            TextAlign::Right => run.left + run.width - line.width,
        };
        let baseline = run.top + i as f32 * line_height + ascent;

        for c in line.text.chars() {
            let (metrics, coverage) = font.rasterize(c, run.size);
            let gx = (pen_x + metrics.xmin as f32).round() as i64;
            let gy = (baseline - metrics.ymin as f32 - metrics.height as f32).round() as i64;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let alpha = coverage[row * metrics.width + col];
                    if alpha > 0 {
                        let amount = alpha as f64 / 255.0 * run.opacity;
                        put(canvas, gx + col as i64, gy + row as i64, run.color.to_array(), amount);
                    }
                }
            }
            pen_x += metrics.advance_width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketch_core::settings::CanvasSettings;
    use std::sync::Arc;

    const MONO: &[u8] = include_bytes!("../tests/fixtures/DejaVuSansMono.ttf");

    fn with_mono() -> Rasterizer {
        Rasterizer::with_font(GlyphFont::from_bytes(MONO).unwrap())
    }

    fn text(left: f64, top: f64, width: f64, align: TextAlign, content: &str) -> RenderItem {
        RenderItem::Text {
            left,
            top,
            width,
            font_size: 20.0,
            align,
            color: Color::BLACK,
            opacity: 1.0,
            content: content.to_string(),
        }
    }

    /// [min_x, min_y, max_x, max_y] of every painted pixel.
    fn ink_bounds(image: &RgbaImage) -> Option<[u32; 4]> {
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] > 0)
            .fold(None, |acc, (x, y, _)| {
                Some(match acc {
                    None => [x, y, x, y],
                    Some([x0, y0, x1, y1]) => [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
                })
            })
    }

    fn canvas(width: u32, height: u32, fill: Option<Color>) -> RenderFrame {
        RenderFrame::empty(&CanvasSettings {
            width,
            height,
            fill,
        })
    }

    #[test]
    fn test_blend_opaque_replaces() {
        let mut dst = Rgba([10, 20, 30, 255]);
        blend(&mut dst, [200, 100, 50, 255], 1.0);
        assert_eq!(dst, Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_blend_half_over_transparent() {
        let mut dst = Rgba([0, 0, 0, 0]);
        blend(&mut dst, [255, 0, 0, 255], 0.5);
        assert_eq!(dst, Rgba([255, 0, 0, 128]));
    }

    #[test]
    fn test_fill_applies_to_every_pixel() {
        let frame = canvas(4, 3, Some(Color::rgb(255, 255, 255)));
        let image = Rasterizer::new().render(&frame);
        assert_eq!(image.dimensions(), (4, 3));
        assert!(image.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_image_is_scaled_and_clipped() {
        let mut frame = canvas(10, 10, None);
        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        frame.items.push(RenderItem::Image {
            source: "red.png".to_string(),
            left: 6.0,
            top: 6.0,
            width: 8.0,
            height: 8.0,
            opacity: 1.0,
            pixels: Some(Arc::new(red)),
        });
        let image = Rasterizer::new().render(&frame);
        assert_eq!(*image.get_pixel(9, 9), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(5, 5), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_rule_has_minimum_thickness() {
        let mut frame = canvas(10, 10, None);
        frame.items.push(RenderItem::Rule {
            left: 1.0,
            top: 2.0,
            width: 5.0,
            height: 0.2,
            color: Color::GREEN,
            opacity: 1.0,
        });
        let image = Rasterizer::new().render(&frame);
        assert_eq!(*image.get_pixel(3, 2), Rgba([0, 128, 0, 255]));
        assert_eq!(*image.get_pixel(3, 3), Rgba([0, 0, 0, 0]));
        assert_eq!(*image.get_pixel(6, 2), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_text_skipped_without_font() {
        let mut frame = canvas(20, 20, None);
        frame.items.push(RenderItem::Text {
            left: 0.0,
            top: 0.0,
            width: 20.0,
            font_size: 12.0,
            align: TextAlign::Left,
            color: Color::BLACK,
            opacity: 1.0,
            content: "hi".to_string(),
        });
        let image = Rasterizer::new().render(&frame);
        assert!(image.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_text_drawn_inside_box() {
        let mut frame = canvas(120, 60, None);
        frame.items.push(text(10.0, 10.0, 100.0, TextAlign::Left, "Hi"));
        let rasterizer = with_mono();
        assert!(rasterizer.has_font());

        let [x0, y0, x1, y1] = ink_bounds(&rasterizer.render(&frame)).unwrap();
        assert!(x0 >= 10 && x1 < 110, "ink spans x {}..{}", x0, x1);
        assert!(y0 >= 10 && (y1 as f64) < 10.0 + 20.0 * 1.16, "ink spans y {}..{}", y0, y1);
    }

    #[test]
    fn test_wrapped_text_uses_second_line() {
        let font = GlyphFont::from_bytes(MONO).unwrap();
        let width = font.measure("Hi", 20.0) as f64 + 1.0;
        let mut frame = canvas(60, 80, None);
        frame.items.push(text(0.0, 0.0, width, TextAlign::Left, "Hi Hi"));

        let [_, _, _, y1] = ink_bounds(&with_mono().render(&frame)).unwrap();
        assert!(y1 as f64 > 20.0 * 1.16, "second line missing, ink ends at {}", y1);
    }

    #[test]
    fn test_text_alignment() {
        let centre_of_ink = |align| {
            let mut frame = canvas(100, 30, None);
            frame.items.push(text(0.0, 0.0, 100.0, align, "i"));
            let [x0, _, x1, _] = ink_bounds(&with_mono().render(&frame)).unwrap();
            (x0 + x1) / 2
        };
        assert!(centre_of_ink(TextAlign::Left) < 20);
        let centre = centre_of_ink(TextAlign::Center);
        assert!((40..=60).contains(&centre), "centred ink at {}", centre);
        assert!(centre_of_ink(TextAlign::Right) > 80);
    }
}
