//! Error types for the pdf2blob library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`Pdf2BlobError`] — **Fatal / startup**: the process cannot serve
//!   invocations at all (missing connection string, pdfium not loadable,
//!   invalid configuration) or the harness could not even obtain the input
//!   bytes. Returned as `Err(Pdf2BlobError)` from constructors and input
//!   helpers.
//!
//! * [`PipelineError`] — **Per-invocation**: one document failed in exactly
//!   one stage (conversion, size gate, upload). The coordinator catches it,
//!   logs it, and wraps it into [`crate::output::Outcome::Failed`]. The kind
//!   is a closed set so callers can branch on [`PipelineError::kind`] rather
//!   than parse messages.
//!
//! * [`StoreError`] — a single object-store call failed. Always surfaced
//!   wrapped in [`PipelineError::Upload`].

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: configuration, engine binding and input resolution.
#[derive(Debug, Error)]
pub enum Pdf2BlobError {
    // ── Configuration ─────────────────────────────────────────────────────
    /// `BLOB_CONNECTION_STRING` is not set.
    #[error(
        "Object store connection string is missing.\n\
         Set {var} (or add it to a .env file) before starting."
    )]
    MissingConnectionString { var: &'static str },

    /// The connection string could not be parsed into endpoint + credentials.
    #[error("Invalid object store connection string: {0}")]
    InvalidConnectionString(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding ────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
         Install libpdfium on the library search path, or set \
         PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── Input ─────────────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Discriminant of [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    Conversion,
    SizeLimitExceeded,
    Upload,
}

/// A failure of one invocation in one pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The buffer is not a parseable PDF, or a page could not be rendered
    /// or encoded.
    #[error("Error converting PDF to images: {detail}")]
    Conversion {
        detail: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A rendered page is larger than the per-image ceiling. Nothing has been
    /// uploaded when this is returned.
    #[error(
        "At least one image exceeds the limit ({} MB): page {page} is {size_bytes} bytes. \
         Uploading cancelled.",
        .limit_bytes / (1024 * 1024)
    )]
    SizeLimitExceeded {
        /// 1-based page number of the first offending page.
        page: usize,
        size_bytes: usize,
        limit_bytes: usize,
    },

    /// An object-store write failed. Blobs listed in `uploaded` were written
    /// before the failure and remain in the container.
    #[error("Failed to upload '{blob_name}' (page {page}): {source}")]
    Upload {
        blob_name: String,
        /// 1-based page number.
        page: usize,
        #[source]
        source: StoreError,
        uploaded: Vec<String>,
    },
}

impl PipelineError {
    /// Conversion failure without an underlying error value.
    pub fn conversion(detail: impl Into<String>) -> Self {
        PipelineError::Conversion {
            detail: detail.into(),
            source: None,
        }
    }

    /// Conversion failure wrapping its cause.
    pub fn conversion_from<E>(detail: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PipelineError::Conversion {
            detail: detail.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> PipelineErrorKind {
        match self {
            PipelineError::Conversion { .. } => PipelineErrorKind::Conversion,
            PipelineError::SizeLimitExceeded { .. } => PipelineErrorKind::SizeLimitExceeded,
            PipelineError::Upload { .. } => PipelineErrorKind::Upload,
        }
    }
}

/// A single object-store call failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The Azure client failed: transport error, non-success status, or a
    /// blob name that does not form a valid object URL.
    #[error("object store request failed: {0}")]
    Azure(#[from] azure_core::Error),

    /// The service answered with a non-success status.
    #[error("object store returned HTTP {status}: {detail}")]
    Rejected { status: u16, detail: String },
}
