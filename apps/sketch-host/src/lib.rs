//! # Sketch Host
//!
//! The public face of the editor. [`SceneManager`] accepts placement requests
//! from a host, drives image loading, keeps the scene consistent, coalesces
//! redraws and reports product lifecycle events through a [`Notifier`].
//!
//! [`Notifier`]: sketch_core::Notifier

pub mod error;
pub mod manager;
pub mod notify;
pub mod redraw;
pub mod script;

pub use error::SketchError;
pub use manager::{LoadTask, SceneManager, SceneManagerBuilder};
pub use notify::{drain_events, BroadcastNotifier, FanoutNotifier, LogNotifier};
pub use redraw::RedrawScheduler;
pub use script::{LoadOutcome, SceneScript};
