//! # pdf2blob
//!
//! Rasterise an uploaded PDF page by page and publish the page images to an
//! object store, returning one public URL per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (bytes + declared content type)
//!  │
//!  ├─ 1. Validate  only `application/pdf` is processed; anything else is a quiet stop
//!  ├─ 2. Render    rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode    PNG per page
//!  ├─ 4. Gate      every PNG must be ≤ 5 MiB, else nothing is uploaded
//!  ├─ 5. Publish   one `image/png` object per page in the target container
//!  └─ 6. Report    `{"imageUrls": [...]}` or `{"error": "..."}`
//! ```
//!
//! The size check is all-or-nothing: the page stream is drained and every
//! page checked before the first upload starts. Uploads themselves are not
//! transactional; if one fails, pages already written stay in the container
//! and are named in the error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2blob::{Coordinator, PdfDocument, PipelineConfig, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads BLOB_CONNECTION_STRING.
//!     let store = StoreConfig::from_env()?;
//!     let coordinator = Coordinator::connect(&store, PipelineConfig::default()).await?;
//!
//!     let bytes = std::fs::read("invoice.pdf")?;
//!     let document = PdfDocument::new(bytes, "application/pdf");
//!
//!     if let Some(outcome) = coordinator.process(document).await {
//!         println!("{}", serde_json::to_string(&outcome)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2blob` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy + serde_json) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2blob = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDFium
//!
//! The pdfium shared library is loaded at runtime: from `PDFIUM_LIB_PATH`
//! when set, otherwise from the platform library search path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod coordinator;
pub mod document;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, StoreConfig};
pub use coordinator::{Coordinator, PipelineState};
pub use document::{PageImage, PdfDocument};
pub use engine::PdfiumLibrary;
pub use error::{Pdf2BlobError, PipelineError, PipelineErrorKind, StoreError};
pub use output::Outcome;
pub use pipeline::gate::{AdmittedBatch, SizeGate};
pub use pipeline::publish::{BlobName, NamingScheme, Publisher};
pub use pipeline::render::{PdfiumRasterizer, RenderedPages, Rasterizer};
pub use progress::{NoopObserver, PipelineObserver};
pub use storage::{AzureBlobStore, BlobStore, MemoryBlobStore};
