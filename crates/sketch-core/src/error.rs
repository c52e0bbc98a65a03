use thiserror::Error;

use crate::layer::LayerId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Product '{id}' has no image reference; image property is required")]
    InvalidDescriptor { id: String },

    #[error("Layer {0} is not on the scene")]
    UnknownLayer(LayerId),

    #[error("Layer {0} is not selectable")]
    NotSelectable(LayerId),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}
