use std::collections::HashMap;

use crate::descriptor::ProductDescriptor;
use crate::error::SceneError;
use crate::layer::{Layer, LayerContent, LayerId};

/// Ties a placed layer (or a pending load) to the registry entry it created.
///
/// Registering the same product id twice yields two registrations with
/// different tokens; only the newest one owns the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Registration {
    pub id: String,
    token: u64,
}

/// Lifecycle of a registered product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductState {
    /// Registered, image still loading.
    Loading,
    /// Image loaded and placed as the given layer.
    Placed(LayerId),
}

#[derive(Debug)]
struct ProductEntry {
    descriptor: ProductDescriptor,
    token: u64,
    state: ProductState,
}

/// Render list, z-order counter, background slot and product descriptors.
#[derive(Debug)]
pub struct LayerRegistry {
    /// Layers in render order (index 0 drawn first).
    layers: Vec<Layer>,
    background: Option<LayerId>,
    /// Next z-index handed out; 0 is reserved for the background.
    next_z: usize,
    /// Entries per product id, newest last. Older entries are shadowed until
    /// the newer ones are unregistered.
    products: HashMap<String, Vec<ProductEntry>>,
    next_token: u64,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            background: None,
            next_z: 1,
            products: HashMap::new(),
            next_token: 0,
        }
    }

    // ── Z-order ──────────────────────────────────────────────────────

    /// Return the current counter value, then advance it.
    pub fn allocate_z(&mut self) -> usize {
        let z = self.next_z;
        self.next_z += 1;
        z
    }

    pub fn next_z(&self) -> usize {
        self.next_z
    }

    // ── Product descriptors ──────────────────────────────────────────

    /// Store `descriptor` under `id`. A previous entry for the same id is
    /// shadowed, not dropped: it becomes current again if this registration
    /// is unregistered.
    pub fn register(
        &mut self,
        id: &str,
        mut descriptor: ProductDescriptor,
    ) -> Result<Registration, SceneError> {
        descriptor.id = id.to_string();
        descriptor.validate()?;

        self.next_token += 1;
        let token = self.next_token;
        let entries = self.products.entry(id.to_string()).or_default();
        if !entries.is_empty() {
            log::debug!("Product '{}' re-registered, previous entry shadowed", id);
        }
        entries.push(ProductEntry {
            descriptor,
            token,
            state: ProductState::Loading,
        });
        Ok(Registration {
            id: id.to_string(),
            token,
        })
    }

    /// Drop the entry created by `registration`. If it was the current
    /// entry, the one it shadowed becomes current again; a stale
    /// registration only removes itself.
    pub fn unregister(&mut self, registration: &Registration) -> Option<ProductDescriptor> {
        let entries = self.products.get_mut(&registration.id)?;
        let index = entries
            .iter()
            .position(|entry| entry.token == registration.token)?;
        let removed = entries.remove(index);
        if entries.is_empty() {
            self.products.remove(&registration.id);
        }
        Some(removed.descriptor)
    }

    /// Record that the load behind `registration` produced `layer_id`.
    /// Returns `false` if the registration is gone.
    pub fn mark_placed(&mut self, registration: &Registration, layer_id: LayerId) -> bool {
        let entry = self
            .products
            .get_mut(&registration.id)
            .and_then(|entries| entries.iter_mut().find(|e| e.token == registration.token));
        match entry {
            Some(entry) => {
                entry.state = ProductState::Placed(layer_id);
                true
            }
            None => false,
        }
    }

    fn current(&self, id: &str) -> Option<&ProductEntry> {
        self.products.get(id).and_then(|entries| entries.last())
    }

    pub fn is_current(&self, registration: &Registration) -> bool {
        self.current(&registration.id)
            .is_some_and(|entry| entry.token == registration.token)
    }

    pub fn descriptor(&self, id: &str) -> Option<&ProductDescriptor> {
        self.current(id).map(|entry| &entry.descriptor)
    }

    pub fn state(&self, id: &str) -> Option<ProductState> {
        self.current(id).map(|entry| entry.state)
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    // ── Render list ──────────────────────────────────────────────────

    /// Insert `layer` at render position `index` and return the position used.
    ///
    /// Positions past the end append. While a background is present nothing
    /// may be inserted beneath it.
    pub fn insert_at(&mut self, layer: Layer, index: usize) -> usize {
        let floor = usize::from(self.background.is_some());
        let position = index.max(floor).min(self.layers.len());
        self.layers.insert(position, layer);
        position
    }

    /// Append `layer` on top of everything else.
    pub fn push(&mut self, layer: Layer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    /// Put `layer` in the background slot at render position 0 and return
    /// the background it replaces.
    pub fn set_background(&mut self, layer: Layer) -> Option<Layer> {
        let previous = self.background.take().and_then(|id| self.take(id));
        self.background = Some(layer.id);
        self.layers.insert(0, layer);
        previous
    }

    pub fn background(&self) -> Option<&Layer> {
        self.background.and_then(|id| self.get(id))
    }

    /// Remove a layer from the render list. Removing a product layer also
    /// drops the registry entry it owns.
    pub fn remove(&mut self, id: LayerId) -> Option<Layer> {
        let layer = self.take(id)?;
        if self.background == Some(id) {
            self.background = None;
        }
        if let LayerContent::Product { registration, .. } = &layer.content {
            if self.unregister(registration).is_some() {
                log::debug!("Product '{}' unregistered on removal", registration.id);
            }
        }
        Some(layer)
    }

    fn take(&mut self, id: LayerId) -> Option<Layer> {
        let position = self.position(id)?;
        Some(self.layers.remove(position))
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::ImageHandle;
    use crate::geometry::Placement;
    use crate::layer::TextBox;
    use image::RgbaImage;

    fn text(content: &str) -> Layer {
        Layer::new(
            LayerContent::Text(TextBox::new(content, 20.0, 150.0)),
            Placement::at(50.0, 50.0),
        )
    }

    fn background() -> Layer {
        let handle = ImageHandle::new("bg.png", RgbaImage::new(4, 4));
        Layer::new(LayerContent::Background(handle), Placement::default())
    }

    fn product(registration: Registration) -> Layer {
        let handle = ImageHandle::new("p.png", RgbaImage::new(4, 4));
        Layer::new(
            LayerContent::Product {
                image: handle,
                descriptor: ProductDescriptor::new("p.png"),
                registration,
                z_index: 1,
            },
            Placement::default(),
        )
    }

    #[test]
    fn test_allocate_z_starts_at_one() {
        let mut reg = LayerRegistry::new();
        assert_eq!(reg.allocate_z(), 1);
        assert_eq!(reg.allocate_z(), 2);
        assert_eq!(reg.next_z(), 3);
    }

    #[test]
    fn test_register_rejects_missing_image() {
        let mut reg = LayerRegistry::new();
        let result = reg.register("shirt", ProductDescriptor::default());
        assert!(matches!(result, Err(SceneError::InvalidDescriptor { .. })));
        assert_eq!(reg.product_count(), 0);
    }

    #[test]
    fn test_register_overwrites_same_id() {
        let mut reg = LayerRegistry::new();
        let first = reg.register("shirt", ProductDescriptor::new("a.png")).unwrap();
        let second = reg.register("shirt", ProductDescriptor::new("b.png")).unwrap();
        assert_eq!(reg.product_count(), 1);
        assert_eq!(reg.descriptor("shirt").unwrap().image.as_deref(), Some("b.png"));
        assert_eq!(reg.descriptor("shirt").unwrap().id, "shirt");
        assert!(reg.is_current(&second));
        assert!(!reg.is_current(&first));

        // Dropping the superseded registration leaves the newer entry alone.
        assert!(reg.unregister(&first).is_some());
        assert_eq!(reg.product_count(), 1);
        assert!(reg.is_current(&second));
        assert!(reg.unregister(&second).is_some());
        assert_eq!(reg.product_count(), 0);
        assert!(reg.unregister(&second).is_none());
    }

    #[test]
    fn test_unregister_current_restores_shadowed_entry() {
        let mut reg = LayerRegistry::new();
        let placed = reg.register("shirt", ProductDescriptor::new("a.png")).unwrap();
        let layer = product(placed.clone());
        let layer_id = layer.id;
        reg.mark_placed(&placed, layer_id);
        reg.insert_at(layer, 1);

        let retry = reg.register("shirt", ProductDescriptor::new("b.png")).unwrap();
        assert_eq!(reg.state("shirt"), Some(ProductState::Loading));

        let dropped = reg.unregister(&retry).unwrap();
        assert_eq!(dropped.image.as_deref(), Some("b.png"));
        assert_eq!(reg.state("shirt"), Some(ProductState::Placed(layer_id)));
        assert_eq!(reg.descriptor("shirt").unwrap().image.as_deref(), Some("a.png"));
        assert!(reg.is_current(&placed));
    }

    #[test]
    fn test_stale_registration_can_still_be_placed() {
        let mut reg = LayerRegistry::new();
        let old = reg.register("shirt", ProductDescriptor::new("a.png")).unwrap();
        let new = reg.register("shirt", ProductDescriptor::new("b.png")).unwrap();
        let layer_id = product(old.clone()).id;

        assert!(reg.mark_placed(&old, layer_id));
        assert_eq!(reg.state("shirt"), Some(ProductState::Loading));
        reg.unregister(&new);
        assert_eq!(reg.state("shirt"), Some(ProductState::Placed(layer_id)));
    }

    #[test]
    fn test_state_transitions() {
        let mut reg = LayerRegistry::new();
        let registration = reg.register("hat", ProductDescriptor::new("hat.png")).unwrap();
        assert_eq!(reg.state("hat"), Some(ProductState::Loading));
        let layer = product(registration.clone());
        let id = layer.id;
        assert!(reg.mark_placed(&registration, id));
        reg.insert_at(layer, 1);
        assert_eq!(reg.state("hat"), Some(ProductState::Placed(id)));

        reg.remove(id);
        assert_eq!(reg.state("hat"), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_insert_at_clamps_to_len() {
        let mut reg = LayerRegistry::new();
        let a = text("a");
        let a_id = a.id;
        assert_eq!(reg.insert_at(a, 7), 0);
        let b = text("b");
        let b_id = b.id;
        assert_eq!(reg.insert_at(b, 0), 0);
        assert_eq!(reg.position(b_id), Some(0));
        assert_eq!(reg.position(a_id), Some(1));
    }

    #[test]
    fn test_background_stays_at_position_zero() {
        let mut reg = LayerRegistry::new();
        reg.push(text("a"));
        let bg = background();
        let bg_id = bg.id;
        assert!(reg.set_background(bg).is_none());
        assert_eq!(reg.position(bg_id), Some(0));

        assert_eq!(reg.insert_at(text("below?"), 0), 1);
        assert_eq!(reg.position(bg_id), Some(0));

        let replacement = background();
        let replacement_id = replacement.id;
        let old = reg.set_background(replacement).unwrap();
        assert_eq!(old.id, bg_id);
        assert_eq!(reg.position(replacement_id), Some(0));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_remove_background_clears_slot() {
        let mut reg = LayerRegistry::new();
        let bg = background();
        let bg_id = bg.id;
        reg.set_background(bg);
        assert!(reg.remove(bg_id).is_some());
        assert!(reg.background().is_none());
        assert_eq!(reg.insert_at(text("a"), 0), 0);
    }
}
