//! Configuration types for the rasterise-and-publish pipeline.
//!
//! Per-invocation behaviour is controlled through [`PipelineConfig`], built
//! via its [`PipelineConfigBuilder`]. The object-store credential lives in a
//! separate [`StoreConfig`] because it is read exactly once at process start
//! and a missing value is a startup failure, not a per-document one.

use crate::error::Pdf2BlobError;
use crate::progress::{NoopObserver, Observer};
use std::fmt;
use std::sync::Arc;

/// The only declared content type the coordinator will rasterise.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Per-image ceiling: 5 MiB.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Render scale applied to PDF points (72 pt/inch → 216 DPI at 3.0).
pub const DEFAULT_SCALE: f32 = 3.0;

pub const DEFAULT_CONTAINER: &str = "processed-invoices";

pub const DEFAULT_BLOB_PREFIX: &str = "image";

/// Environment variable holding the object-store connection string.
pub const CONNECTION_STRING_VAR: &str = "BLOB_CONNECTION_STRING";

/// Configuration for one rasterise → gate → publish run.
///
/// # Example
/// ```rust
/// use pdf2blob::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .scale(2.0)
///     .blob_prefix("invoice")
///     .build()
///     .unwrap();
/// assert_eq!(config.container, "processed-invoices");
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Scale factor applied to each page's size in PDF points. Default: 3.0.
    pub scale: f32,

    /// Largest admissible PNG, in bytes. Default: 5 MiB.
    ///
    /// A page rendering to exactly this many bytes is admitted.
    pub max_image_bytes: usize,

    /// Target container. Must already exist. Default: `processed-invoices`.
    pub container: String,

    /// First component of every blob name. Default: `image`.
    pub blob_prefix: String,

    /// Number of uploads allowed in flight at once. Default: 1.
    ///
    /// Locators are always reported in page order regardless of this value.
    pub upload_concurrency: usize,

    /// Receives stage and page events. Default: no-op.
    pub observer: Observer,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            container: DEFAULT_CONTAINER.to_string(),
            blob_prefix: DEFAULT_BLOB_PREFIX.to_string(),
            upload_concurrency: 1,
            observer: Arc::new(NoopObserver),
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("scale", &self.scale)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("container", &self.container)
            .field("blob_prefix", &self.blob_prefix)
            .field("upload_concurrency", &self.upload_concurrency)
            .field("observer", &"<dyn PipelineObserver>")
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale.clamp(0.1, 10.0);
        self
    }

    pub fn max_image_bytes(mut self, bytes: usize) -> Self {
        self.config.max_image_bytes = bytes;
        self
    }

    pub fn container(mut self, name: impl Into<String>) -> Self {
        self.config.container = name.into();
        self
    }

    pub fn blob_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.blob_prefix = prefix.into();
        self
    }

    pub fn upload_concurrency(mut self, n: usize) -> Self {
        self.config.upload_concurrency = n.max(1);
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = observer;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Pdf2BlobError> {
        let c = &self.config;
        if !c.scale.is_finite() || c.scale <= 0.0 {
            return Err(Pdf2BlobError::InvalidConfig(format!(
                "Scale must be a positive number, got {}",
                c.scale
            )));
        }
        if c.max_image_bytes == 0 {
            return Err(Pdf2BlobError::InvalidConfig(
                "Image size limit must be at least 1 byte".into(),
            ));
        }
        if !is_valid_container_name(&c.container) {
            return Err(Pdf2BlobError::InvalidConfig(format!(
                "Container name '{}' must be 3–63 lowercase letters, digits or single hyphens",
                c.container
            )));
        }
        if c.blob_prefix.is_empty()
            || !c
                .blob_prefix
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        {
            return Err(Pdf2BlobError::InvalidConfig(format!(
                "Blob prefix '{}' may only contain ASCII letters, digits, '-', '_' and '.'",
                c.blob_prefix
            )));
        }
        Ok(self.config)
    }
}

/// Container naming rules of the blob service.
fn is_valid_container_name(name: &str) -> bool {
    let len_ok = (3..=63).contains(&name.len());
    let chars_ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    len_ok
        && chars_ok
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
}

/// Object-store credential, read once at process start.
#[derive(Clone)]
pub struct StoreConfig {
    pub connection_string: String,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The connection string embeds the account key.
        f.debug_struct("StoreConfig")
            .field("connection_string", &"<redacted>")
            .finish()
    }
}

impl StoreConfig {
    /// Read [`CONNECTION_STRING_VAR`] from the process environment.
    pub fn from_env() -> Result<Self, Pdf2BlobError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the credential through an arbitrary lookup (used by tests to
    /// avoid mutating the process environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Pdf2BlobError> {
        match lookup(CONNECTION_STRING_VAR) {
            Some(value) if !value.trim().is_empty() => Ok(Self {
                connection_string: value.trim().to_string(),
            }),
            _ => Err(Pdf2BlobError::MissingConnectionString {
                var: CONNECTION_STRING_VAR,
            }),
        }
    }
}

/// `true` when a declared content type names a PDF.
///
/// MIME parameters and letter case are ignored, so
/// `Application/PDF; charset=binary` is accepted.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false)
}
