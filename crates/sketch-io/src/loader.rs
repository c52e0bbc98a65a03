//! Asynchronous image acquisition.
//!
//! [`ImageFetcher`] resolves `data:` URIs, `file://` URIs and plain paths
//! (plus `http(s)://` with the `http` feature) into decoded RGBA images.
//! [`ReportingLoader`] wraps any loader and surfaces every failure through a
//! [`Diagnostics`] sink.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use sketch_core::ImageHandle;

use crate::error::LoadError;

/// Resolves a resource locator into a decoded image.
///
/// Calls are independent: no caching, retry, timeout or deduplication.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, uri: &str) -> Result<ImageHandle, LoadError>;
}

#[async_trait]
impl<T: ImageLoader + ?Sized> ImageLoader for Arc<T> {
    async fn load(&self, uri: &str) -> Result<ImageHandle, LoadError> {
        (**self).load(uri).await
    }
}

// ── Sources ──────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Source<'a> {
    Data(&'a str),
    File(PathBuf),
    Http,
}

fn classify(uri: &str) -> Result<Source<'_>, LoadError> {
    if let Some(rest) = uri.strip_prefix("data:") {
        return Ok(Source::Data(rest));
    }
    if let Some(path) = uri.strip_prefix("file://") {
        return Ok(Source::File(PathBuf::from(path)));
    }
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Ok(Source::Http);
    }
    match uri.split_once("://") {
        Some((scheme, _)) => Err(LoadError::UnsupportedScheme(scheme.to_string())),
        None => Ok(Source::File(PathBuf::from(uri))),
    }
}

/// Decode the payload of a `data:<mime>;base64,<payload>` URI (without the
/// `data:` prefix).
fn decode_data_uri(rest: &str) -> Result<Vec<u8>, LoadError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::InvalidDataUri("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(LoadError::InvalidDataUri(format!(
            "expected a base64 payload, got '{}'",
            header
        )));
    }
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

async fn decode_image(uri: &str, bytes: Vec<u8>) -> Result<ImageHandle, LoadError> {
    let decoded = tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes).map(|decoded| decoded.to_rgba8())
    })
    .await
    .map_err(|e| LoadError::Task(e.to_string()))?;

    let pixels = decoded.map_err(|source| LoadError::Decode {
        uri: uri.to_string(),
        source,
    })?;
    log::debug!("Decoded {} ({}x{})", uri, pixels.width(), pixels.height());
    Ok(ImageHandle::new(uri, pixels))
}

// ── Fetcher ──────────────────────────────────────────────────────────

/// The default loader for data URIs, files and (optionally) HTTP.
#[derive(Debug, Clone, Default)]
pub struct ImageFetcher {
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl ImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read(&self, uri: &str) -> Result<Vec<u8>, LoadError> {
        match classify(uri)? {
            Source::Data(rest) => decode_data_uri(rest),
            Source::File(path) => tokio::fs::read(&path).await.map_err(|source| LoadError::Io {
                uri: uri.to_string(),
                source,
            }),
            Source::Http => self.fetch(uri).await,
        }
    }

    #[cfg(feature = "http")]
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, LoadError> {
        let http_err = |e: reqwest::Error| LoadError::Http {
            uri: uri.to_string(),
            message: e.to_string(),
        };
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?;
        let body = response.bytes().await.map_err(http_err)?;
        Ok(body.to_vec())
    }

    #[cfg(not(feature = "http"))]
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, LoadError> {
        let scheme = uri.split_once("://").map_or(uri, |(scheme, _)| scheme);
        Err(LoadError::UnsupportedScheme(scheme.to_string()))
    }
}

#[async_trait]
impl ImageLoader for ImageFetcher {
    async fn load(&self, uri: &str) -> Result<ImageHandle, LoadError> {
        let bytes = self.read(uri).await?;
        decode_image(uri, bytes).await
    }
}

// ── Diagnostics ──────────────────────────────────────────────────────

/// Receives user-facing failure messages.
pub trait Diagnostics: Send + Sync {
    fn report(&self, message: &str);
}

/// Writes diagnostics to the log at `error` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// The message shown when `uri` could not be loaded.
pub fn load_failure_message(uri: &str) -> String {
    format!("Error loading image:{}", uri)
}

/// Reports every failed load of the wrapped loader, then passes the error on.
pub struct ReportingLoader<L> {
    inner: L,
    diagnostics: Arc<dyn Diagnostics>,
}

impl<L: ImageLoader> ReportingLoader<L> {
    pub fn new(inner: L, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { inner, diagnostics }
    }
}

#[async_trait]
impl<L: ImageLoader> ImageLoader for ReportingLoader<L> {
    async fn load(&self, uri: &str) -> Result<ImageHandle, LoadError> {
        let result = self.inner.load(uri).await;
        if let Err(e) = &result {
            log::warn!("Load of {} failed: {}", uri, e);
            self.diagnostics.report(&load_failure_message(uri));
        }
        result
    }
}
