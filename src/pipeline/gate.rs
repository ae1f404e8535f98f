//! Size gate: admit or reject a whole document before anything is uploaded.
//!
//! The rasteriser's output is single-pass, so the gate is also the place
//! where the sequence is materialised: it drains the stream into an ordered
//! buffer while checking each page, and on success hands that buffer over
//! as an [`AdmittedBatch`]. The publisher only accepts an `AdmittedBatch`,
//! and only this module can construct one, so uploads cannot start before
//! every page has passed.

use crate::document::PageImage;
use crate::error::PipelineError;
use crate::pipeline::render::RenderedPages;
use crate::progress::PipelineObserver;
use futures::StreamExt;
use tracing::{debug, info};

/// Page images that all passed the size ceiling, in page order.
#[derive(Debug)]
pub struct AdmittedBatch {
    pages: Vec<PageImage>,
}

impl AdmittedBatch {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[PageImage] {
        &self.pages
    }

    pub fn total_bytes(&self) -> usize {
        self.pages.iter().map(PageImage::size_bytes).sum()
    }

    pub(crate) fn into_pages(self) -> Vec<PageImage> {
        self.pages
    }
}

/// Rejects any batch containing an image larger than `max_bytes`.
#[derive(Debug, Clone, Copy)]
pub struct SizeGate {
    max_bytes: usize,
}

impl SizeGate {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check one image against the ceiling. Equal to the ceiling is allowed.
    pub fn check(&self, image: &PageImage) -> Result<(), PipelineError> {
        if image.size_bytes() > self.max_bytes {
            return Err(PipelineError::SizeLimitExceeded {
                page: image.page_num(),
                size_bytes: image.size_bytes(),
                limit_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Drain `rendered` and admit it only if every page passes.
    ///
    /// Stops at the first oversize page; the remaining pages are never
    /// rendered. A conversion failure reported mid-stream fails the batch
    /// with that error.
    pub async fn evaluate(
        &self,
        rendered: RenderedPages,
        observer: &dyn PipelineObserver,
    ) -> Result<AdmittedBatch, PipelineError> {
        let RenderedPages {
            page_count,
            mut pages,
        } = rendered;
        let mut admitted = Vec::with_capacity(page_count);

        while let Some(item) = pages.next().await {
            let image = item?;
            if image.index != admitted.len() {
                return Err(PipelineError::conversion(format!(
                    "pages arrived out of order: expected index {}, got {}",
                    admitted.len(),
                    image.index
                )));
            }
            observer.on_page_rendered(image.page_num(), image.size_bytes());
            self.check(&image)?;
            debug!(
                "Page {} admitted: {} bytes (limit {})",
                image.page_num(),
                image.size_bytes(),
                self.max_bytes
            );
            admitted.push(image);
        }

        let batch = AdmittedBatch { pages: admitted };
        info!(
            "Size check passed: {} pages, {} bytes total",
            batch.len(),
            batch.total_bytes()
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineErrorKind;
    use crate::progress::NoopObserver;

    const MIB: usize = 1024 * 1024;

    fn page(index: usize, len: usize) -> PageImage {
        PageImage::new(index, vec![0u8; len])
    }

    #[test]
    fn boundary_is_inclusive() {
        let gate = SizeGate::new(5 * MIB);
        assert!(gate.check(&page(0, 5 * MIB)).is_ok());
        let err = gate.check(&page(0, 5 * MIB + 1)).unwrap_err();
        assert_eq!(err.kind(), PipelineErrorKind::SizeLimitExceeded);
    }

    #[test]
    fn admits_all_small_pages_in_order() {
        let gate = SizeGate::new(5 * MIB);
        let rendered =
            RenderedPages::from_images(vec![page(0, MIB), page(1, 2 * MIB), page(2, MIB)]);
        let batch = tokio_test::block_on(gate.evaluate(rendered, &NoopObserver)).unwrap();
        let indices: Vec<_> = batch.pages().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(batch.total_bytes(), 4 * MIB);
    }

    #[test]
    fn rejects_whole_batch_on_one_oversize_page() {
        let gate = SizeGate::new(5 * MIB);
        let rendered = RenderedPages::from_images(vec![page(0, MIB), page(1, 6 * MIB)]);
        let err = tokio_test::block_on(gate.evaluate(rendered, &NoopObserver)).unwrap_err();
        match err {
            PipelineError::SizeLimitExceeded {
                page, size_bytes, ..
            } => {
                assert_eq!(page, 2);
                assert_eq!(size_bytes, 6 * MIB);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_document_is_admitted() {
        let gate = SizeGate::new(5 * MIB);
        let batch = tokio_test::block_on(
            gate.evaluate(RenderedPages::from_images(vec![]), &NoopObserver),
        )
        .unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn mid_stream_conversion_error_fails_the_batch() {
        let gate = SizeGate::new(5 * MIB);
        let rendered = RenderedPages {
            page_count: 2,
            pages: Box::pin(futures::stream::iter(vec![
                Ok(page(0, 10)),
                Err(PipelineError::conversion("page 2 could not be rendered")),
            ])),
        };
        let err = tokio_test::block_on(gate.evaluate(rendered, &NoopObserver)).unwrap_err();
        assert_eq!(err.kind(), PipelineErrorKind::Conversion);
    }

    #[test]
    fn out_of_order_pages_are_rejected() {
        let gate = SizeGate::new(5 * MIB);
        let rendered = RenderedPages::from_images(vec![page(1, 10), page(0, 10)]);
        let err = tokio_test::block_on(gate.evaluate(rendered, &NoopObserver)).unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }
}
