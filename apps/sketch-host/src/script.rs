//! JSON scene scripts driven by the `sketch` binary.
//!
//! ```json
//! {
//!   "settings": { "canvas": { "width": 640, "height": 480 } },
//!   "background": "room.png",
//!   "products": [ { "id": "shirt", "image": "shirt.png", "attachments": { "sku": 12 } } ],
//!   "texts": [ { "content": "Hello", "size": 24 } ],
//!   "measurements": [ "3 m" ]
//! }
//! ```

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use sketch_core::{LayerId, ProductDescriptor, SceneSettings};

use crate::error::SketchError;
use crate::manager::{LoadTask, SceneManager};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextEntry {
    pub content: String,
    pub size: Option<f64>,
}

/// A scene described as data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneScript {
    pub settings: Option<SceneSettings>,
    pub background: Option<String>,
    /// Products keyed by their `id` field.
    pub products: Vec<ProductDescriptor>,
    pub texts: Vec<TextEntry>,
    pub measurements: Vec<String>,
}

/// Outcome of one asynchronous placement in a script.
#[derive(Debug)]
pub struct LoadOutcome {
    /// Product id, or `"background"`.
    pub target: String,
    pub result: Result<LayerId, SketchError>,
}

impl SceneScript {
    pub fn from_json(json: &str) -> Result<Self, SketchError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Issue every placement against `manager` and wait for all loads.
    ///
    /// Invalid descriptors abort the script before any load starts; load
    /// failures are collected in the returned outcomes.
    pub async fn apply(&self, manager: &SceneManager) -> Result<Vec<LoadOutcome>, SketchError> {
        let mut pending: Vec<(String, LoadTask)> = Vec::new();

        if let Some(uri) = &self.background {
            pending.push(("background".to_string(), manager.set_background(uri)));
        }
        for product in &self.products {
            let task = manager.add_product(&product.id, product.clone())?;
            pending.push((product.id.clone(), task));
        }
        for text in &self.texts {
            manager.add_text(&text.content, text.size)?;
        }
        for label in &self.measurements {
            manager.add_measurement(label)?;
        }

        let (targets, tasks): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
        let results = join_all(tasks).await;
        Ok(targets
            .into_iter()
            .zip(results)
            .map(|(target, result)| LoadOutcome { target, result })
            .collect())
    }
}
