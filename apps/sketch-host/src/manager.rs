//! The scene manager: the host-facing entry point of the editor.
//!
//! Placement requests register synchronously and load asynchronously on the
//! tokio runtime. Loads re-enter the scene only after they resolve, holding
//! just a weak reference to it. Every mutation goes through a single lock and
//! lifecycle events are emitted after that lock is released.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use sketch_core::geometry::{Placement, Point};
use sketch_core::layer::RemovalHook;
use sketch_core::{
    AnnotationBuilder, ImageHandle, LayerId, Notifier, NullNotifier, ProductDescriptor,
    ProductPlacement, ProductState, Scene, SceneEvent, SceneSettings,
};
use sketch_io::{Diagnostics, ImageFetcher, ImageLoader, LoadError, LogDiagnostics, ReportingLoader};
use sketch_renderer::{GlyphFont, RasterFormat, RenderFrame, Rasterizer};

use crate::error::SketchError;
use crate::redraw::RedrawScheduler;

/// Pending result of an asynchronous placement.
///
/// The load keeps running if the task is dropped; awaiting it only observes
/// the outcome.
pub struct LoadTask {
    inner: TaskInner,
}

enum TaskInner {
    Spawned(JoinHandle<Result<LayerId, SketchError>>),
    Ready(Option<Result<LayerId, SketchError>>),
}

impl LoadTask {
    fn spawned(handle: JoinHandle<Result<LayerId, SketchError>>) -> Self {
        Self {
            inner: TaskInner::Spawned(handle),
        }
    }

    fn ready(result: Result<LayerId, SketchError>) -> Self {
        Self {
            inner: TaskInner::Ready(Some(result)),
        }
    }

    pub fn is_finished(&self) -> bool {
        match &self.inner {
            TaskInner::Spawned(handle) => handle.is_finished(),
            TaskInner::Ready(_) => true,
        }
    }
}

impl Future for LoadTask {
    type Output = Result<LayerId, SketchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.inner {
            TaskInner::Spawned(handle) => Pin::new(handle).poll(cx).map(|joined| {
                joined.unwrap_or_else(|e| Err(SketchError::TaskFailed(e.to_string())))
            }),
            TaskInner::Ready(result) => Poll::Ready(
                result
                    .take()
                    .unwrap_or_else(|| Err(SketchError::TaskFailed("polled after completion".to_string()))),
            ),
        }
    }
}

struct Shared {
    scene: Mutex<Scene>,
    settings: SceneSettings,
    annotations: AnnotationBuilder,
    loader: Arc<dyn ImageLoader>,
    notifier: Arc<dyn Notifier>,
    rasterizer: Rasterizer,
    redraw: RedrawScheduler,
    frame: Mutex<Option<RenderFrame>>,
}

impl Shared {
    fn lock_scene(&self) -> Result<MutexGuard<'_, Scene>, SketchError> {
        self.scene.lock().map_err(|_| SketchError::StatePoisoned)
    }

    fn build_frame(&self) -> Result<RenderFrame, SketchError> {
        let scene = self.lock_scene()?;
        Ok(RenderFrame::build(&scene, &self.settings.canvas))
    }

    /// One full redraw pass: rebuild the display list from the scene.
    fn draw(&self) {
        match self.build_frame() {
            Ok(frame) => {
                log::trace!("Redraw: {} items", frame.items.len());
                if let Ok(mut slot) = self.frame.lock() {
                    *slot = Some(frame);
                }
            }
            Err(e) => log::warn!("Redraw skipped: {}", e),
        }
    }

    fn schedule_redraw(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.redraw.request(move || {
            if let Some(shared) = weak.upgrade() {
                shared.draw();
            }
        });
    }

    // ── Load completion ──────────────────────────────────────────────

    fn finish_background(self: &Arc<Self>, image: ImageHandle) -> Result<LayerId, SketchError> {
        let bg = &self.settings.background;
        let placement = Placement::at(bg.left, bg.top)
            .with_scale(bg.scale)
            .with_opacity(bg.opacity);
        let source = image.source().to_string();

        let (id, previous) = self.lock_scene()?.set_background(image, placement);
        if previous.is_some() {
            log::debug!("Background replaced");
        }
        log::info!("Background set from {}", source);
        self.schedule_redraw();
        Ok(id)
    }

    fn finish_product(
        self: &Arc<Self>,
        descriptor: ProductDescriptor,
        registration: sketch_core::Registration,
        loaded: Result<ImageHandle, LoadError>,
    ) -> Result<LayerId, SketchError> {
        let image = match loaded {
            Ok(image) => image,
            Err(e) => {
                let mut scene = self.lock_scene()?;
                if scene.registry_mut().unregister(&registration).is_some() {
                    log::debug!("Registration of '{}' rolled back", registration.id);
                }
                return Err(e.into());
            }
        };

        let width = descriptor
            .scale
            .filter(|w| *w > 0.0)
            .unwrap_or(self.settings.product_width);
        let notifier = Arc::clone(&self.notifier);
        let removed = descriptor.clone();
        let hook: RemovalHook = Box::new(move |_layer| {
            notifier.emit(&SceneEvent::ProductRemoved(removed));
        });

        let placed = self.lock_scene()?.place_product(ProductPlacement {
            image,
            descriptor: descriptor.clone(),
            registration,
            width,
            on_removed: Some(hook),
        });
        log::info!(
            "Product '{}' placed at position {} (z {})",
            descriptor.id,
            placed.position,
            placed.z_index
        );

        self.schedule_redraw();
        self.notifier.emit(&SceneEvent::ProductAdded(descriptor));
        Ok(placed.layer_id)
    }
}

/// Configures and creates a [`SceneManager`].
pub struct SceneManagerBuilder {
    settings: SceneSettings,
    loader: Option<Arc<dyn ImageLoader>>,
    diagnostics: Arc<dyn Diagnostics>,
    notifier: Arc<dyn Notifier>,
    font: Option<GlyphFont>,
}

impl SceneManagerBuilder {
    pub fn new() -> Self {
        Self {
            settings: SceneSettings::default(),
            loader: None,
            diagnostics: Arc::new(LogDiagnostics),
            notifier: Arc::new(NullNotifier),
            font: None,
        }
    }

    pub fn with_settings(mut self, settings: SceneSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Font used to rasterize text. Overrides `settings.font`.
    pub fn with_font(mut self, font: GlyphFont) -> Self {
        self.font = Some(font);
        self
    }

    pub fn build(self) -> Result<SceneManager, SketchError> {
        self.settings.validate()?;

        let font = match (self.font, &self.settings.font) {
            (Some(font), _) => Some(font),
            (None, Some(path)) => Some(GlyphFont::from_file(path)?),
            (None, None) => None,
        };
        let rasterizer = match font {
            Some(font) => Rasterizer::with_font(font),
            None => Rasterizer::new(),
        };

        let inner = self
            .loader
            .unwrap_or_else(|| Arc::new(ImageFetcher::new()) as Arc<dyn ImageLoader>);
        let loader: Arc<dyn ImageLoader> = Arc::new(ReportingLoader::new(inner, self.diagnostics));

        let annotations = AnnotationBuilder::new(
            self.settings.text.clone(),
            self.settings.measurement.clone(),
        );
        let redraw = RedrawScheduler::new(Duration::from_millis(self.settings.redraw_delay_ms));

        Ok(SceneManager {
            shared: Arc::new(Shared {
                scene: Mutex::new(Scene::new()),
                settings: self.settings,
                annotations,
                loader,
                notifier: self.notifier,
                rasterizer,
                redraw,
                frame: Mutex::new(None),
            }),
        })
    }
}

impl Default for SceneManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns one edit session's scene. Clones share the same scene.
#[derive(Clone)]
pub struct SceneManager {
    shared: Arc<Shared>,
}

impl SceneManager {
    pub fn builder() -> SceneManagerBuilder {
        SceneManagerBuilder::new()
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.shared.settings
    }

    fn weak(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    // ── Placement ────────────────────────────────────────────────────

    /// Load `uri` and make it the background, replacing any previous one.
    /// A failed load leaves the scene untouched.
    pub fn set_background(&self, uri: &str) -> LoadTask {
        let Ok(runtime) = Handle::try_current() else {
            return LoadTask::ready(Err(SketchError::NoRuntime));
        };
        let uri = uri.to_string();
        let loader = Arc::clone(&self.shared.loader);
        let weak = self.weak();

        LoadTask::spawned(runtime.spawn(async move {
            let loaded = loader.load(&uri).await;
            let shared = weak.upgrade().ok_or(SketchError::SceneClosed)?;
            shared.finish_background(loaded?)
        }))
    }

    /// Register `descriptor` under `id` and start loading its image.
    ///
    /// A descriptor without an image fails here, before anything is
    /// registered. Load failures are reported through the diagnostics sink
    /// and resolve the task with an error; the registration is rolled back.
    pub fn add_product(&self, id: &str, descriptor: ProductDescriptor) -> Result<LoadTask, SketchError> {
        let mut descriptor = descriptor;
        descriptor.id = id.to_string();
        let uri = descriptor.validate()?.to_string();
        let runtime = Handle::try_current().map_err(|_| SketchError::NoRuntime)?;

        let registration = self
            .shared
            .lock_scene()?
            .registry_mut()
            .register(id, descriptor.clone())?;
        log::debug!("Product '{}' registered, loading {}", id, uri);

        let loader = Arc::clone(&self.shared.loader);
        let weak = self.weak();
        Ok(LoadTask::spawned(runtime.spawn(async move {
            let loaded = loader.load(&uri).await;
            let shared = weak.upgrade().ok_or(SketchError::SceneClosed)?;
            shared.finish_product(descriptor, registration, loaded)
        })))
    }

    /// Add a selected text box at the default text position.
    pub fn add_text(&self, content: &str, size: Option<f64>) -> Result<LayerId, SketchError> {
        let layer = self.shared.annotations.text(content, size);
        let id = self.shared.lock_scene()?.add_annotation(layer, true);
        log::debug!("Text layer {} added", id);
        self.schedule_redraw();
        Ok(id)
    }

    /// Add a measurement marker labelled `label`.
    pub fn add_measurement(&self, label: &str) -> Result<LayerId, SketchError> {
        let layer = self.shared.annotations.measurement(label);
        let id = self.shared.lock_scene()?.add_annotation(layer, false);
        log::debug!("Measurement layer {} added", id);
        self.schedule_redraw();
        Ok(id)
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn select(&self, id: LayerId) -> Result<(), SketchError> {
        self.shared.lock_scene()?.select(id)?;
        self.schedule_redraw();
        Ok(())
    }

    /// Select the top-most selectable layer under `point`.
    pub fn select_at(&self, point: Point) -> Result<Option<LayerId>, SketchError> {
        let hit = self.shared.lock_scene()?.select_at(&point);
        self.schedule_redraw();
        Ok(hit)
    }

    pub fn clear_selection(&self) -> Result<(), SketchError> {
        self.shared.lock_scene()?.clear_selection();
        self.schedule_redraw();
        Ok(())
    }

    /// Resize the active layer, honouring its scale locks.
    pub fn scale_active(&self, scale_x: f64, scale_y: f64) -> Result<Option<LayerId>, SketchError> {
        let scaled = self.shared.lock_scene()?.scale_active(scale_x, scale_y);
        if scaled.is_some() {
            self.schedule_redraw();
        }
        Ok(scaled)
    }

    pub fn move_active(&self, left: f64, top: f64) -> Result<Option<LayerId>, SketchError> {
        let moved = self.shared.lock_scene()?.move_active(left, top);
        if moved.is_some() {
            self.schedule_redraw();
        }
        Ok(moved)
    }

    /// Remove the active layer. Without a selection this does nothing.
    pub fn remove_active(&self) -> Result<Option<LayerId>, SketchError> {
        let removed = self.shared.lock_scene()?.remove_active();
        let Some(mut layer) = removed else {
            return Ok(None);
        };
        let id = layer.id;
        log::info!("Removed {:?} layer {}", layer.kind(), id);
        layer.fire_removed();
        self.schedule_redraw();
        Ok(Some(id))
    }

    // ── Rendering ────────────────────────────────────────────────────

    pub fn schedule_redraw(&self) {
        self.shared.schedule_redraw();
    }

    /// Display list of the current scene.
    pub fn render_frame(&self) -> Result<RenderFrame, SketchError> {
        self.shared.build_frame()
    }

    /// Encode the current scene. `format` is a short name or MIME type.
    pub fn export_bytes(&self, format: &str) -> Result<Vec<u8>, SketchError> {
        let format: RasterFormat = format.parse()?;
        let frame = self.render_frame()?;
        let image = self.shared.rasterizer.render(&frame);
        Ok(format.encode(&image)?)
    }

    /// Encode the current scene as a `data:` URL.
    pub fn export_raster(&self, format: &str) -> Result<String, SketchError> {
        let format: RasterFormat = format.parse()?;
        let frame = self.render_frame()?;
        let image = self.shared.rasterizer.render(&frame);
        Ok(format.to_data_url(&image)?)
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Run `f` against the scene under the lock.
    pub fn with_scene<R>(&self, f: impl FnOnce(&Scene) -> R) -> Result<R, SketchError> {
        let scene = self.shared.lock_scene()?;
        Ok(f(&scene))
    }

    pub fn layer_count(&self) -> Result<usize, SketchError> {
        self.with_scene(|scene| scene.layer_count())
    }

    pub fn product_count(&self) -> Result<usize, SketchError> {
        self.with_scene(|scene| scene.registry().product_count())
    }

    pub fn product_state(&self, id: &str) -> Result<Option<ProductState>, SketchError> {
        self.with_scene(|scene| scene.registry().state(id))
    }

    pub fn active(&self) -> Result<Option<LayerId>, SketchError> {
        self.with_scene(|scene| scene.active())
    }

    /// Redraw passes completed so far.
    pub fn redraw_count(&self) -> u64 {
        self.shared.redraw.passes()
    }

    pub fn redraw_pending(&self) -> bool {
        self.shared.redraw.is_pending()
    }

    /// Display list produced by the most recent redraw pass.
    pub fn last_frame(&self) -> Option<RenderFrame> {
        self.shared.frame.lock().ok().and_then(|slot| slot.clone())
    }
}
