//! PDF rasterisation: render every page to a PNG via pdfium.
//!
//! ## Why a channel?
//!
//! pdfium is not async-safe and a `PdfDocument` borrows the `Pdfium`
//! instance that opened it, so the whole render loop runs on one
//! `spawn_blocking` thread. Pages are handed to the async side through a
//! bounded channel of capacity 1, which makes the output a lazy, single-pass
//! sequence: a page is rendered only once the previous one has been taken,
//! and dropping the stream stops the worker at its next send.
//!
//! Failure to open the document is reported before the stream is returned,
//! so callers see "not a PDF" as an error from [`Rasterizer::rasterize`]
//! rather than as a first stream item.

use crate::document::PageImage;
use crate::engine::PdfiumLibrary;
use crate::error::PipelineError;
use crate::pipeline::encode::encode_png;
use async_trait::async_trait;
use futures::stream;
use pdfium_render::prelude::PdfRenderConfig;
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info};

/// A single-pass stream of rendered pages, in page order.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageImage, PipelineError>> + Send>>;

/// Output of a successful [`Rasterizer::rasterize`] call.
pub struct RenderedPages {
    /// Number of pages the engine reported when opening the document.
    pub page_count: usize,
    /// Page images, produced on demand.
    pub pages: PageStream,
}

impl RenderedPages {
    /// Wrap already-rendered images (pre-rendered documents, test doubles).
    pub fn from_images(images: Vec<PageImage>) -> Self {
        Self {
            page_count: images.len(),
            pages: Box::pin(stream::iter(images.into_iter().map(Ok))),
        }
    }
}

impl std::fmt::Debug for RenderedPages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedPages")
            .field("page_count", &self.page_count)
            .finish_non_exhaustive()
    }
}

/// Converts PDF bytes into page images.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Open `pdf` and return its pages rendered at `scale`.
    ///
    /// # Errors
    /// [`PipelineError::Conversion`] when the bytes are not a parseable PDF
    /// or the engine is unavailable.
    async fn rasterize(&self, pdf: Vec<u8>, scale: f32) -> Result<RenderedPages, PipelineError>;
}

/// [`Rasterizer`] backed by the pdfium library.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    library: PdfiumLibrary,
}

impl PdfiumRasterizer {
    pub fn new(library: PdfiumLibrary) -> Self {
        Self { library }
    }
}

#[async_trait]
impl Rasterizer for PdfiumRasterizer {
    async fn rasterize(&self, pdf: Vec<u8>, scale: f32) -> Result<RenderedPages, PipelineError> {
        let (opened_tx, opened_rx) = oneshot::channel();
        let (page_tx, page_rx) = mpsc::channel(1);
        let library = self.library.clone();

        tokio::task::spawn_blocking(move || {
            render_blocking(&library, pdf, scale, opened_tx, page_tx)
        });

        let page_count = opened_rx.await.map_err(|_| {
            PipelineError::conversion("render worker stopped before the document was opened")
        })??;

        Ok(RenderedPages {
            page_count,
            pages: Box::pin(ReceiverStream::new(page_rx)),
        })
    }
}

/// Blocking render loop. Runs on a `spawn_blocking` thread.
fn render_blocking(
    library: &PdfiumLibrary,
    pdf: Vec<u8>,
    scale: f32,
    opened: oneshot::Sender<Result<usize, PipelineError>>,
    pages_tx: mpsc::Sender<Result<PageImage, PipelineError>>,
) {
    let pdfium = match library.bind() {
        Ok(p) => p,
        Err(e) => {
            let _ = opened.send(Err(PipelineError::conversion_from(
                "PDF engine unavailable",
                e,
            )));
            return;
        }
    };

    let input_len = pdf.len();
    let document = match pdfium.load_pdf_from_byte_vec(pdf, None) {
        Ok(d) => d,
        Err(e) => {
            let _ = opened.send(Err(PipelineError::conversion(format!(
                "document could not be opened ({} bytes): {:?}",
                input_len, e
            ))));
            return;
        }
    };

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    if opened.send(Ok(total_pages)).is_err() {
        debug!("Rasterisation abandoned before the first page");
        return;
    }

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

    for (index, page) in pages.iter().enumerate() {
        let item = page
            .render_with_config(&render_config)
            .map_err(|e| {
                PipelineError::conversion(format!("page {} could not be rendered: {:?}", index + 1, e))
            })
            .and_then(|bitmap| {
                let image = bitmap.as_image();
                debug!(
                    "Rendered page {} → {}x{} px",
                    index + 1,
                    image.width(),
                    image.height()
                );
                encode_png(&image).map_err(|e| {
                    PipelineError::conversion_from(
                        format!("page {} could not be encoded as PNG", index + 1),
                        e,
                    )
                })
            })
            .map(|png| PageImage::new(index, png));

        let failed = item.is_err();
        if pages_tx.blocking_send(item).is_err() {
            debug!("Page consumer dropped after page {}; stopping", index + 1);
            return;
        }
        if failed {
            return;
        }
    }
}
