//! The coordinator: one uploaded document in, one reported outcome out.
//!
//! ```text
//! Idle → ValidatingInput ─(not a PDF)──────────────────────────▶ Skipped
//!                        → Converting ─(ConversionError)──────▶ Failed
//!                                     → SizeChecking ─(over)──▶ Failed
//!                                                    → Publishing ─(upload)─▶ Failed
//!                                                                 → Done
//! ```
//!
//! Every stage error is caught here, logged once, and returned as
//! [`Outcome::Failed`]. A wrong content type is not an error: it is logged
//! at INFO and yields no outcome at all.

use crate::config::{is_pdf_content_type, PipelineConfig, StoreConfig};
use crate::document::PdfDocument;
use crate::engine::PdfiumLibrary;
use crate::error::{Pdf2BlobError, PipelineError};
use crate::output::Outcome;
use crate::pipeline::gate::SizeGate;
use crate::pipeline::publish::{NamingScheme, Publisher};
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::storage::{AzureBlobStore, BlobStore};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Where a document currently is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    ValidatingInput,
    Converting,
    SizeChecking,
    Publishing,
    /// Every page uploaded.
    Done,
    /// A stage failed; terminal.
    Failed,
    /// Declared content type was not a PDF; terminal, no outcome.
    Skipped,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::Failed | PipelineState::Skipped
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Drives Rasterizer → SizeGate → Publisher for one document at a time.
///
/// Holds no per-document state, so one instance can serve concurrent
/// invocations behind an `Arc`.
pub struct Coordinator {
    rasterizer: Arc<dyn Rasterizer>,
    gate: SizeGate,
    publisher: Publisher,
    naming: NamingScheme,
    config: PipelineConfig,
}

impl Coordinator {
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        store: Arc<dyn BlobStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            rasterizer,
            gate: SizeGate::new(config.max_image_bytes),
            publisher: Publisher::new(store, config.upload_concurrency),
            naming: NamingScheme::new(config.blob_prefix.clone()),
            config,
        }
    }

    /// Production wiring: pdfium located from the environment, Azure Blob
    /// Storage from `store`, container from `config`.
    ///
    /// # Errors
    /// Startup failures only: an unparseable connection string or a pdfium
    /// library that cannot be loaded.
    pub async fn connect(store: &StoreConfig, config: PipelineConfig) -> Result<Self, Pdf2BlobError> {
        let blob_store = AzureBlobStore::from_config(store, config.container.clone())?;
        let library = PdfiumLibrary::from_env();
        library.verify().await?;
        Ok(Self::new(
            Arc::new(PdfiumRasterizer::new(library)),
            Arc::new(blob_store),
            config,
        ))
    }

    /// Replace the naming scheme (e.g. a fixed timestamp for reproducible names).
    pub fn with_naming(mut self, naming: NamingScheme) -> Self {
        self.naming = naming;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one uploaded document and report the result to the log.
    ///
    /// Returns `None` when the declared content type is not a PDF.
    pub async fn process(&self, document: PdfDocument) -> Option<Outcome> {
        let start = Instant::now();
        self.enter(PipelineState::Idle);
        self.enter(PipelineState::ValidatingInput);

        if !is_pdf_content_type(document.content_type()) {
            debug!("Declared content type: {:?}", document.content_type());
            info!("Invalid file format. Only PDF files are accepted.");
            self.enter(PipelineState::Skipped);
            return None;
        }

        let outcome = match self.run(document).await {
            Ok(image_urls) => {
                self.enter(PipelineState::Done);
                info!("Public URLs for uploaded images:");
                for (i, url) in image_urls.iter().enumerate() {
                    info!("Image {}: {}", i + 1, url);
                }
                Outcome::Published { image_urls }
            }
            Err(e) => {
                self.enter(PipelineState::Failed);
                error!("Error processing PDF: {}", e);
                Outcome::Failed(e)
            }
        };

        debug!("Invocation finished in {}ms", start.elapsed().as_millis());
        Some(outcome)
    }

    async fn run(&self, document: PdfDocument) -> Result<Vec<String>, PipelineError> {
        let observer = self.config.observer.as_ref();

        self.enter(PipelineState::Converting);
        let rendered = self
            .rasterizer
            .rasterize(document.into_bytes(), self.config.scale)
            .await?;
        info!("Converting {} pages at scale {}", rendered.page_count, self.config.scale);
        observer.on_document_opened(rendered.page_count);

        self.enter(PipelineState::SizeChecking);
        let batch = self.gate.evaluate(rendered, observer).await?;

        self.enter(PipelineState::Publishing);
        self.publisher.publish(batch, &self.naming, observer).await
    }

    fn enter(&self, state: PipelineState) {
        debug!("Pipeline state → {}", state);
        self.config.observer.on_state_change(state);
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("gate", &self.gate)
            .field("publisher", &self.publisher)
            .field("naming", &self.naming)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
