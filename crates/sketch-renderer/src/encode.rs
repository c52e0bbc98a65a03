use std::io::Cursor;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::RenderError;

/// Raster encodings supported by scene export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Bmp,
}

impl RasterFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Bmp => "image/bmp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Bmp => "bmp",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            RasterFormat::Png => ImageFormat::Png,
            RasterFormat::Jpeg => ImageFormat::Jpeg,
            RasterFormat::Bmp => ImageFormat::Bmp,
        }
    }

    /// Encode `image`. JPEG has no alpha channel, so it is dropped.
    pub fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
        let dynamic = match self {
            RasterFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image.clone()).to_rgb8()),
            _ => DynamicImage::ImageRgba8(image.clone()),
        };
        let mut buf = Cursor::new(Vec::new());
        dynamic.write_to(&mut buf, self.image_format())?;
        Ok(buf.into_inner())
    }

    /// Encode `image` as a self-contained `data:` URL.
    pub fn to_data_url(&self, image: &RgbaImage) -> Result<String, RenderError> {
        let bytes = self.encode(image)?;
        Ok(format!(
            "data:{};base64,{}",
            self.mime_type(),
            STANDARD.encode(bytes)
        ))
    }
}

impl FromStr for RasterFormat {
    type Err = RenderError;

    /// Accepts short names (`png`) and MIME types (`image/png`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let name = name.strip_prefix("image/").unwrap_or(&name);
        match name {
            "png" => Ok(RasterFormat::Png),
            "jpeg" | "jpg" => Ok(RasterFormat::Jpeg),
            "bmp" => Ok(RasterFormat::Bmp),
            _ => Err(RenderError::UnsupportedFormat(s.to_string())),
        }
    }
}
