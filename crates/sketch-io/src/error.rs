use std::path::PathBuf;

use thiserror::Error;

/// Why an image could not be turned into an [`ImageHandle`](sketch_core::ImageHandle).
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {uri}: {source}")]
    Decode {
        uri: String,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("malformed data URI: {0}")]
    InvalidDataUri(String),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("HTTP request for {uri} failed: {message}")]
    Http { uri: String, message: String },

    #[error("load task failed: {0}")]
    Task(String),
}

/// Errors reading settings files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: sketch_core::SceneError,
    },
}
