use crate::bitmap::ImageHandle;
use crate::descriptor::ProductDescriptor;
use crate::error::SceneError;
use crate::geometry::{Placement, Point};
use crate::layer::{Layer, LayerContent, LayerId, RemovalHook};
use crate::registry::{LayerRegistry, Registration};
use crate::spatial::{SpatialEntry, SpatialIndex};

/// A loaded product waiting to be put on the scene.
pub struct ProductPlacement {
    pub image: ImageHandle,
    pub descriptor: ProductDescriptor,
    pub registration: Registration,
    /// Width the image is scaled to.
    pub width: f64,
    pub on_removed: Option<RemovalHook>,
}

/// Where a product ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedProduct {
    pub layer_id: LayerId,
    /// Counter value allocated for this insertion.
    pub z_index: usize,
    /// Render position actually used.
    pub position: usize,
}

/// The root composition: the layer registry plus the active selection.
#[derive(Debug, Default)]
pub struct Scene {
    registry: LayerRegistry,
    active: Option<LayerId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut LayerRegistry {
        &mut self.registry
    }

    pub fn layers(&self) -> &[Layer] {
        self.registry.layers()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.registry.get(id)
    }

    pub fn layer_count(&self) -> usize {
        self.registry.len()
    }

    // ── Placement ────────────────────────────────────────────────────

    /// Replace the background and return the discarded one.
    pub fn set_background(&mut self, image: ImageHandle, placement: Placement) -> (LayerId, Option<Layer>) {
        let layer = Layer::new(LayerContent::Background(image), placement);
        let id = layer.id;
        let previous = self.registry.set_background(layer);
        if let Some(old) = &previous {
            if self.active == Some(old.id) {
                self.active = None;
            }
        }
        (id, previous)
    }

    /// Insert a loaded product.
    ///
    /// The counter is consumed on every insertion; an explicit descriptor
    /// index only overrides the render position.
    pub fn place_product(&mut self, product: ProductPlacement) -> PlacedProduct {
        let ProductPlacement {
            image,
            descriptor,
            registration,
            width,
            on_removed,
        } = product;

        let z_index = self.registry.allocate_z();
        let requested = descriptor.index.unwrap_or(z_index);
        let selectable = descriptor.is_selectable();

        let mut layer = Layer::new(
            LayerContent::Product {
                image,
                descriptor,
                registration: registration.clone(),
                z_index: requested,
            },
            Placement::default(),
        )
        .with_selectable(selectable);
        layer.scale_to_width(width);
        if let Some(hook) = on_removed {
            layer.on_removed(hook);
        }

        let layer_id = layer.id;
        self.registry.mark_placed(&registration, layer_id);
        let position = self.registry.insert_at(layer, requested);
        log::debug!(
            "Placed product '{}' as {} (z {}, position {})",
            registration.id,
            layer_id,
            z_index,
            position
        );

        PlacedProduct {
            layer_id,
            z_index,
            position,
        }
    }

    /// Append an annotation on top of the stack, optionally selecting it.
    pub fn add_annotation(&mut self, layer: Layer, select: bool) -> LayerId {
        let id = layer.id;
        self.registry.push(layer);
        if select {
            self.active = Some(id);
        }
        id
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn active(&self) -> Option<LayerId> {
        self.active
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.active.and_then(|id| self.registry.get(id))
    }

    pub fn select(&mut self, id: LayerId) -> Result<(), SceneError> {
        let layer = self.registry.get(id).ok_or(SceneError::UnknownLayer(id))?;
        if !layer.selectable {
            return Err(SceneError::NotSelectable(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Select the top-most selectable layer under `point`; a miss clears the
    /// selection.
    pub fn select_at(&mut self, point: &Point) -> Option<LayerId> {
        let entries = self
            .layers()
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.selectable)
            .map(|(position, layer)| SpatialEntry {
                layer_id: layer.id,
                position,
                bbox: layer.bbox(),
            })
            .collect();
        let index = SpatialIndex::build(entries);
        self.active = index.topmost_at(point).map(|entry| entry.layer_id);
        self.active
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    // ── Transform ────────────────────────────────────────────────────

    /// Resize the active layer. Locked axes keep their scale.
    pub fn scale_active(&mut self, scale_x: f64, scale_y: f64) -> Option<LayerId> {
        let layer = self.active_layer_mut()?;
        layer.set_scale(scale_x, scale_y);
        Some(layer.id)
    }

    /// Move the active layer's origin to (`left`, `top`).
    pub fn move_active(&mut self, left: f64, top: f64) -> Option<LayerId> {
        let layer = self.active_layer_mut()?;
        layer.move_to(left, top);
        Some(layer.id)
    }

    fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        let id = self.active?;
        self.registry.get_mut(id)
    }

    // ── Removal ──────────────────────────────────────────────────────

    /// Take the active layer off the scene. No selection is a no-op.
    ///
    /// The removal hook is left for the caller to fire once it no longer
    /// holds the scene.
    pub fn remove_active(&mut self) -> Option<Layer> {
        let id = self.active.take()?;
        self.registry.remove(id)
    }
}
