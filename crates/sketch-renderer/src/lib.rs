//! # Sketch Renderer
//!
//! Turns a scene into pixels. A [`RenderFrame`] flattens the layer stack into
//! JSON-serializable draw commands (consumable by a host canvas as-is); the
//! [`Rasterizer`] composites those commands on the CPU, and [`RasterFormat`]
//! encodes the result for export.

pub mod frame;
pub mod font;
pub mod raster;
pub mod encode;
pub mod error;

pub use encode::RasterFormat;
pub use error::RenderError;
pub use font::GlyphFont;
pub use frame::{RenderFrame, RenderItem};
pub use raster::Rasterizer;
