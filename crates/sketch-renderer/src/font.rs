//! Glyph metrics, line wrapping and glyph rasterization.

use std::path::Path;

use fontdue::{Font, FontSettings, Metrics};

use sketch_core::layer::LINE_HEIGHT;

use crate::error::RenderError;

/// A laid-out line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub width: f32,
}

/// A loaded font used to draw text layers.
pub struct GlyphFont {
    font: Font,
}

impl GlyphFont {
    pub fn from_bytes(data: &[u8]) -> Result<Self, RenderError> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| RenderError::Font(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path)?;
        let font = Self::from_bytes(&data)?;
        log::info!("Loaded font {}", path.display());
        Ok(font)
    }

    pub fn advance(&self, c: char, size: f32) -> f32 {
        self.font.metrics(c, size).advance_width
    }

    pub fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.advance(c, size)).sum()
    }

    /// Distance from a line's top to its baseline.
    pub fn ascent(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|m| m.ascent)
            .unwrap_or(size * 0.8)
    }

    pub fn line_height(&self, size: f32) -> f32 {
        size * LINE_HEIGHT as f32
    }

    pub fn rasterize(&self, c: char, size: f32) -> (Metrics, Vec<u8>) {
        self.font.rasterize(c, size)
    }

    /// Greedy word wrap into lines no wider than `max_width`. Explicit
    /// newlines always break; a single word wider than the box keeps its own
    /// line.
    pub fn wrap(&self, text: &str, size: f32, max_width: f32) -> Vec<TextLine> {
        let space = self.advance(' ', size);
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let mut current = String::new();
            let mut width = 0.0;
            for word in paragraph.split_whitespace() {
                let word_width = self.measure(word, size);
                if !current.is_empty() && width + space + word_width > max_width {
                    lines.push(TextLine {
                        text: std::mem::take(&mut current),
                        width,
                    });
                    width = 0.0;
                }
                if !current.is_empty() {
                    current.push(' ');
                    width += space;
                }
                current.push_str(word);
                width += word_width;
            }
            lines.push(TextLine {
                text: current,
                width,
            });
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONO: &[u8] = include_bytes!("../tests/fixtures/DejaVuSansMono.ttf");

    fn font() -> GlyphFont {
        GlyphFont::from_bytes(MONO).unwrap()
    }

    fn texts(lines: &[TextLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_rejects_garbage_bytes() {
        assert!(GlyphFont::from_bytes(b"not a font").is_err());
    }

    #[test]
    fn test_monospace_metrics() {
        let font = font();
        let advance = font.advance('i', 20.0);
        assert!(advance > 0.0);
        assert!((font.advance('W', 20.0) - advance).abs() < 1e-3);
        assert!((font.measure("iiii", 20.0) - 4.0 * advance).abs() < 1e-3);

        let ascent = font.ascent(20.0);
        assert!(ascent > 0.0 && ascent < 20.0);
        assert!((font.line_height(20.0) - 23.2).abs() < 1e-3);
    }

    #[test]
    fn test_wrap_breaks_at_width() {
        let font = font();
        let fits = font.measure("hello world", 20.0) + 1.0;
        assert_eq!(texts(&font.wrap("hello world", 20.0, fits)), vec!["hello world"]);

        let narrow = font.measure("hello", 20.0) + 1.0;
        let lines = font.wrap("hello world", 20.0, narrow);
        assert_eq!(texts(&lines), vec!["hello", "world"]);
        assert!(lines.iter().all(|l| l.width <= narrow));
    }

    #[test]
    fn test_wrap_keeps_long_word_on_own_line() {
        let font = font();
        let width = font.measure("tiny", 20.0) + 1.0;
        let lines = font.wrap("tiny enormousword tiny", 20.0, width);
        assert_eq!(texts(&lines), vec!["tiny", "enormousword", "tiny"]);
        assert!(lines[1].width > width);
    }

    #[test]
    fn test_wrap_honours_newlines() {
        let font = font();
        let lines = font.wrap("a\n\nb", 20.0, 1000.0);
        assert_eq!(texts(&lines), vec!["a", "", "b"]);
        assert_eq!(lines[1].width, 0.0);
        assert_eq!(texts(&font.wrap("", 20.0, 1000.0)), vec![""]);
    }

    #[test]
    fn test_rasterize_produces_coverage() {
        let (metrics, coverage) = font().rasterize('H', 20.0);
        assert!(metrics.width > 0 && metrics.height > 0);
        assert_eq!(coverage.len(), metrics.width * metrics.height);
        assert!(coverage.iter().any(|&a| a > 0));

        let (space, _) = font().rasterize(' ', 20.0);
        assert!(space.advance_width > 0.0);
    }
}
