use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unsupported raster format: {0}")]
    UnsupportedFormat(String),

    #[error("Encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Invalid font: {0}")]
    Font(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
