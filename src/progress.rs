//! Observer trait for per-stage and per-page pipeline events.
//!
//! Inject an [`Arc<dyn PipelineObserver>`] via
//! [`crate::config::PipelineConfigBuilder::observer`] to receive events as
//! the coordinator moves through its states. The CLI uses this to drive a
//! terminal progress bar; a host could forward the same events to metrics.
//!
//! # Example
//!
//! ```rust
//! use pdf2blob::{PipelineConfig, PipelineObserver};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     uploaded: AtomicUsize,
//! }
//!
//! impl PipelineObserver for CountingObserver {
//!     fn on_page_uploaded(&self, page_num: usize, locator: &str) {
//!         self.uploaded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num} → {locator}");
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { uploaded: AtomicUsize::new(0) });
//! let config = PipelineConfig::builder()
//!     .observer(observer as Arc<dyn PipelineObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::coordinator::PipelineState;
use std::sync::Arc;

/// Called by the coordinator as a document moves through the pipeline.
///
/// All methods have no-op defaults. Events arrive in page order, even when
/// several uploads are in flight.
pub trait PipelineObserver: Send + Sync {
    /// The coordinator entered `state`.
    fn on_state_change(&self, state: PipelineState) {
        let _ = state;
    }

    /// The engine opened the document and reported its page count.
    fn on_document_opened(&self, page_count: usize) {
        let _ = page_count;
    }

    /// A page was rendered and PNG-encoded.
    ///
    /// * `page_num`   — 1-indexed page number
    /// * `size_bytes` — PNG length, as seen by the size gate
    fn on_page_rendered(&self, page_num: usize, size_bytes: usize) {
        let _ = (page_num, size_bytes);
    }

    /// A page image was written to the object store.
    fn on_page_uploaded(&self, page_num: usize, locator: &str) {
        let _ = (page_num, locator);
    }
}

/// Default observer.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Type stored in [`crate::config::PipelineConfig`].
pub type Observer = Arc<dyn PipelineObserver>;
