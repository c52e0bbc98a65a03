use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

/// A decoded, dimensioned image ready to be placed on the scene.
///
/// Cheap to clone; pixels are shared.
#[derive(Clone)]
pub struct ImageHandle {
    source: String,
    pixels: Arc<RgbaImage>,
}

impl ImageHandle {
    pub fn new(source: &str, pixels: RgbaImage) -> Self {
        Self {
            source: source.to_string(),
            pixels: Arc::new(pixels),
        }
    }

    /// The locator the image was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn shared_pixels(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.pixels)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("source", &self.source)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
