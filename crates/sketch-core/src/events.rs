use serde::{Deserialize, Serialize};

use crate::descriptor::ProductDescriptor;

/// Lifecycle signal delivered to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "detail")]
pub enum SceneEvent {
    ProductAdded(ProductDescriptor),
    ProductRemoved(ProductDescriptor),
}

impl SceneEvent {
    pub const PRODUCT_ADDED: &'static str = "sketch.product.added";
    pub const PRODUCT_REMOVED: &'static str = "sketch.product.removed";

    /// Host-facing event name.
    pub fn name(&self) -> &'static str {
        match self {
            SceneEvent::ProductAdded(_) => Self::PRODUCT_ADDED,
            SceneEvent::ProductRemoved(_) => Self::PRODUCT_REMOVED,
        }
    }

    pub fn descriptor(&self) -> &ProductDescriptor {
        match self {
            SceneEvent::ProductAdded(d) | SceneEvent::ProductRemoved(d) => d,
        }
    }
}

/// Sink for scene lifecycle events.
///
/// Dispatch is synchronous and best-effort: an implementation must not block
/// and must not call back into the scene manager.
pub trait Notifier: Send + Sync {
    fn emit(&self, event: &SceneEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn emit(&self, _event: &SceneEvent) {}
}
