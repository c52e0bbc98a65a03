use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SceneError;

/// Caller-supplied metadata for a product placed on the scene.
///
/// The host usually builds this from JSON, so `image` is optional at the type
/// level; [`ProductDescriptor::validate`] rejects descriptors without one before
/// any registration or loading happens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    /// Caller-chosen product id. Overwritten by the id passed to the manager.
    #[serde(default)]
    pub id: String,
    /// Resource locator of the product image.
    #[serde(default)]
    pub image: Option<String>,
    /// Opaque host data carried along with the product.
    #[serde(default)]
    pub attachments: Map<String, Value>,
    /// Target width in canvas units the image is scaled to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
    /// Explicit render position. `Some(0)` is an explicit request, not "unset".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl ProductDescriptor {
    pub fn new(image: &str) -> Self {
        Self {
            image: Some(image.to_string()),
            ..Default::default()
        }
    }

    pub fn with_attachment(mut self, key: &str, value: Value) -> Self {
        self.attachments.insert(key.to_string(), value);
        self
    }

    pub fn with_scale(mut self, width: f64) -> Self {
        self.scale = Some(width);
        self
    }

    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = Some(selectable);
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// The image locator, or `InvalidDescriptor` when absent or blank.
    pub fn validate(&self) -> Result<&str, SceneError> {
        match self.image.as_deref() {
            Some(image) if !image.trim().is_empty() => Ok(image),
            _ => Err(SceneError::InvalidDescriptor {
                id: self.id.clone(),
            }),
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable.unwrap_or(true)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
