//! # Sketch I/O
//!
//! Everything that touches the outside world on behalf of the scene: image
//! loading from data URIs, files and HTTP, user-facing load diagnostics, and
//! JSON settings files.

pub mod loader;
pub mod config;
pub mod error;

pub use config::{load_settings, save_settings};
pub use error::{ConfigError, LoadError};
pub use loader::{
    load_failure_message, Diagnostics, ImageFetcher, ImageLoader, LogDiagnostics, ReportingLoader,
};
