//! Pipeline stages for rasterise-and-publish.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the coordinator only sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ gate ──▶ publish
//! (bytes +   (pdfium,   (size     (object
//!  type)      PNG)       ceiling)  store)
//! ```
//!
//! 1. [`input`]   — read a local file or download a URL, recording the
//!    declared content type
//! 2. [`render`]  — rasterise pages on a blocking thread; yields a lazy,
//!    single-pass page stream
//! 3. [`encode`]  — PNG-encode each rendered bitmap
//! 4. [`gate`]    — drain the stream, reject the whole batch if any page is
//!    over the ceiling, otherwise hand over an [`gate::AdmittedBatch`]
//! 5. [`publish`] — upload an admitted batch, one object per page, and
//!    collect locators in page order

pub mod encode;
pub mod gate;
pub mod input;
pub mod publish;
pub mod render;
