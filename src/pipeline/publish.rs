//! Publication: upload an admitted batch and collect one locator per page.
//!
//! Uploads are independent object writes; the store offers no multi-object
//! commit. If one fails, the objects written before or alongside it stay in the
//! container. They are not deleted, but their names are carried in
//! [`PipelineError::Upload`] and logged so they can be found.

use crate::error::{PipelineError, StoreError};
use crate::pipeline::encode::PNG_CONTENT_TYPE;
use crate::pipeline::gate::AdmittedBatch;
use crate::progress::PipelineObserver;
use crate::storage::BlobStore;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Object name of one page: `<prefix>-page<index>-<timestampMillis>.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobName(String);

impl BlobName {
    pub fn new(prefix: &str, index: usize, timestamp_millis: i64) -> Self {
        BlobName(format!("{prefix}-page{index}-{timestamp_millis}.png"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clock {
    /// Wall clock, read when each upload starts.
    Now,
    Fixed(i64),
}

/// Derives a [`BlobName`] for each page.
#[derive(Debug, Clone)]
pub struct NamingScheme {
    prefix: String,
    clock: Clock,
}

impl NamingScheme {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            clock: Clock::Now,
        }
    }

    /// Every name uses `timestamp_millis`; names depend only on the index.
    pub fn with_fixed_timestamp(prefix: impl Into<String>, timestamp_millis: i64) -> Self {
        Self {
            prefix: prefix.into(),
            clock: Clock::Fixed(timestamp_millis),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name_for(&self, index: usize) -> BlobName {
        let ts = match self.clock {
            Clock::Now => Utc::now().timestamp_millis(),
            Clock::Fixed(ts) => ts,
        };
        BlobName::new(&self.prefix, index, ts)
    }
}

/// Uploads admitted pages to a [`BlobStore`].
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn BlobStore>,
    concurrency: usize,
}

impl Publisher {
    pub fn new(store: Arc<dyn BlobStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Upload every page of `batch` and return the locators in page order.
    ///
    /// With `concurrency == 1` pages go up strictly one after another. With
    /// more, up to `concurrency` uploads are in flight and results are still
    /// yielded in page order. After the first failure no further upload is
    /// started; those already in flight are awaited so that every object
    /// actually written is listed in [`PipelineError::Upload`].
    pub async fn publish(
        &self,
        batch: AdmittedBatch,
        naming: &NamingScheme,
        observer: &dyn PipelineObserver,
    ) -> Result<Vec<String>, PipelineError> {
        let total = batch.len();
        let store = self.store.as_ref();
        info!(
            "Uploading {} pages to container '{}'",
            total,
            store.container()
        );

        let halted = AtomicBool::new(false);
        let halted = &halted;
        let mut uploads = stream::iter(batch.into_pages())
            .map(|page| {
                let index = page.index;
                async move {
                    if halted.load(Ordering::Acquire) {
                        return (index, None);
                    }
                    let name = naming.name_for(index);
                    let result = store.put(name.as_str(), page.png, PNG_CONTENT_TYPE).await;
                    if result.is_err() {
                        halted.store(true, Ordering::Release);
                    }
                    (index, Some((name, result)))
                }
            })
            .buffered(self.concurrency);

        let mut locators = Vec::with_capacity(total);
        let mut uploaded: Vec<String> = Vec::with_capacity(total);
        let mut failure: Option<(usize, BlobName, StoreError)> = None;

        while let Some((index, attempt)) = uploads.next().await {
            let Some((name, result)) = attempt else {
                continue;
            };
            match result {
                Ok(locator) => {
                    debug!("Uploaded page {}/{} as {}", index + 1, total, name);
                    uploaded.push(name.into_string());
                    if failure.is_none() {
                        observer.on_page_uploaded(index + 1, &locator);
                        locators.push(locator);
                    }
                }
                Err(source) => {
                    if failure.is_none() {
                        failure = Some((index, name, source));
                    } else {
                        warn!("Upload of {} also failed: {}", name, source);
                    }
                }
            }
        }

        let Some((index, name, source)) = failure else {
            return Ok(locators);
        };
        if !uploaded.is_empty() {
            warn!(
                "{} object(s) already written remain in '{}': {}",
                uploaded.len(),
                store.container(),
                uploaded.join(", ")
            );
        }
        Err(PipelineError::Upload {
            blob_name: name.into_string(),
            page: index + 1,
            source,
            uploaded,
        })
    }
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("container", &self.store.container())
            .field("concurrency", &self.concurrency)
            .finish()
    }
}
