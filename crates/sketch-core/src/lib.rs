//! # Sketch Core
//!
//! Scene model for the Sketch editor: an ordered layer stack with a background
//! slot, a z-order counter and an id-keyed product registry, plus builders for
//! text and measurement annotations, hit-testing for selection, and the
//! lifecycle events reported to the host.
//!
//! Nothing in this crate performs I/O; images arrive already decoded.

pub mod geometry;
pub mod bitmap;
pub mod descriptor;
pub mod layer;
pub mod registry;
pub mod scene;
pub mod annotation;
pub mod spatial;
pub mod events;
pub mod settings;
pub mod error;

pub use annotation::AnnotationBuilder;
pub use bitmap::ImageHandle;
pub use descriptor::ProductDescriptor;
pub use error::SceneError;
pub use events::{Notifier, NullNotifier, SceneEvent};
pub use geometry::{BBox, Placement, Point};
pub use layer::{Color, Layer, LayerContent, LayerId, LayerKind};
pub use registry::{LayerRegistry, ProductState, Registration};
pub use scene::{PlacedProduct, ProductPlacement, Scene};
pub use settings::SceneSettings;
