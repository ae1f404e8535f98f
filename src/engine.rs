//! Locating and binding the pdfium shared library.
//!
//! The library is resolved once at process start ([`PdfiumLibrary::from_env`]
//! followed by [`PdfiumLibrary::verify`]) so a missing engine is a startup
//! failure rather than a per-document conversion error. Rendering threads
//! then bind through the same [`PdfiumLibrary`] value.

use crate::error::Pdf2BlobError;
use pdfium_render::prelude::Pdfium;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Overrides the library search with an explicit file.
pub const PDFIUM_LIB_PATH_VAR: &str = "PDFIUM_LIB_PATH";

/// Where the pdfium dynamic library is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfiumLibrary {
    /// The platform's library search path (`LD_LIBRARY_PATH`, `DYLD_LIBRARY_PATH`, …).
    System,
    /// An explicit library file.
    Path(PathBuf),
}

impl PdfiumLibrary {
    /// `PDFIUM_LIB_PATH` when set and non-empty, else the system library.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(PDFIUM_LIB_PATH_VAR) {
            Some(p) if !p.trim().is_empty() => PdfiumLibrary::Path(PathBuf::from(p.trim())),
            _ => PdfiumLibrary::System,
        }
    }

    /// Load the library and initialise a [`Pdfium`] instance.
    ///
    /// Blocking: call from `spawn_blocking` or a synchronous context.
    pub fn bind(&self) -> Result<Pdfium, Pdf2BlobError> {
        let bindings = match self {
            PdfiumLibrary::System => Pdfium::bind_to_system_library(),
            PdfiumLibrary::Path(path) => {
                if !path.exists() {
                    return Err(Pdf2BlobError::PdfiumBindingFailed(format!(
                        "{} points to '{}', which does not exist",
                        PDFIUM_LIB_PATH_VAR,
                        path.display()
                    )));
                }
                Pdfium::bind_to_library(path)
            }
        }
        .map_err(|e| Pdf2BlobError::PdfiumBindingFailed(format!("{} ({:?})", self, e)))?;

        debug!("Bound pdfium from {}", self);
        Ok(Pdfium::new(bindings))
    }

    /// Bind once and drop the instance, surfacing problems at startup.
    pub async fn verify(&self) -> Result<(), Pdf2BlobError> {
        let library = self.clone();
        tokio::task::spawn_blocking(move || library.bind().map(drop))
            .await
            .map_err(|e| Pdf2BlobError::Internal(format!("pdfium probe panicked: {e}")))??;
        info!("PDF engine ready ({})", self);
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            PdfiumLibrary::System => None,
            PdfiumLibrary::Path(p) => Some(p),
        }
    }
}

impl std::fmt::Display for PdfiumLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfiumLibrary::System => f.write_str("system library"),
            PdfiumLibrary::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_prefers_explicit_path() {
        let lib = PdfiumLibrary::from_lookup(|k| {
            (k == PDFIUM_LIB_PATH_VAR).then(|| "/opt/pdfium/libpdfium.so".to_string())
        });
        assert_eq!(
            lib.path(),
            Some(Path::new("/opt/pdfium/libpdfium.so"))
        );
    }

    #[test]
    fn blank_path_falls_back_to_system() {
        assert_eq!(
            PdfiumLibrary::from_lookup(|_| Some("  ".into())),
            PdfiumLibrary::System
        );
        assert_eq!(PdfiumLibrary::from_lookup(|_| None), PdfiumLibrary::System);
    }

    #[test]
    fn missing_file_is_a_binding_error() {
        let lib = PdfiumLibrary::Path(PathBuf::from("/definitely/not/libpdfium.so"));
        let err = lib.bind().err().expect("binding must fail");
        assert!(matches!(err, Pdf2BlobError::PdfiumBindingFailed(_)));
        assert!(err.to_string().contains("/definitely/not/libpdfium.so"));
    }
}
