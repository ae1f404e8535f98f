//! Input resolution: turn a user-supplied path or URL into a [`PdfDocument`].
//!
//! This is the trigger side of the pipeline. It never judges the bytes; it
//! only records what content type the upload was *declared* as, which is
//! what the coordinator checks:
//!
//! - URL: the `Content-Type` response header
//! - local file: guessed from the file extension
//!
//! An explicit override replaces either.

use crate::document::PdfDocument;
use crate::error::Pdf2BlobError;
use reqwest::header::CONTENT_TYPE;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Content type recorded when nothing better is known.
pub const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to its bytes and declared content type.
pub async fn resolve_input(
    input: &str,
    content_type: Option<&str>,
    timeout_secs: u64,
) -> Result<PdfDocument, Pdf2BlobError> {
    if is_url(input) {
        download_url(input, content_type, timeout_secs).await
    } else {
        read_local(Path::new(input), content_type).await
    }
}

/// Content type a local file would be uploaded with, judged by extension.
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(UNKNOWN_CONTENT_TYPE)
        .to_string()
}

async fn read_local(path: &Path, content_type: Option<&str>) -> Result<PdfDocument, Pdf2BlobError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pdf2BlobError::PermissionDenied {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::NotFound => Pdf2BlobError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => Pdf2BlobError::Internal(format!("reading '{}': {}", path.display(), e)),
    })?;

    let declared = content_type
        .map(str::to_string)
        .unwrap_or_else(|| guess_content_type(path));
    debug!(
        "Read {} bytes from {} (declared {})",
        bytes.len(),
        path.display(),
        declared
    );
    Ok(PdfDocument::new(bytes, declared))
}

async fn download_url(
    url: &str,
    content_type: Option<&str>,
    timeout_secs: u64,
) -> Result<PdfDocument, Pdf2BlobError> {
    info!("Downloading input from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2BlobError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2BlobError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2BlobError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2BlobError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let declared = match content_type {
        Some(ct) => ct.to_string(),
        None => response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(UNKNOWN_CONTENT_TYPE)
            .to_string(),
    };

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2BlobError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes (declared {})", bytes.len(), declared);
    Ok(PdfDocument::new(bytes.to_vec(), declared))
}

/// Display name of an input, for log lines.
pub fn display_name(input: &str) -> String {
    if is_url(input) {
        input.to_string()
    } else {
        PathBuf::from(input)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn guesses_from_extension() {
        assert_eq!(guess_content_type(Path::new("invoice.pdf")), "application/pdf");
        assert_eq!(guess_content_type(Path::new("scan.PNG")), "image/png");
        assert_eq!(guess_content_type(Path::new("README")), UNKNOWN_CONTENT_TYPE);
    }

    #[test]
    fn display_name_strips_directories() {
        assert_eq!(display_name("/var/uploads/inv-42.pdf"), "inv-42.pdf");
        assert_eq!(display_name("https://x.test/a.pdf"), "https://x.test/a.pdf");
    }

    #[tokio::test]
    async fn reads_local_file_with_guessed_type() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.4 test").unwrap();

        let doc = resolve_input(tmp.path().to_str().unwrap(), None, 5)
            .await
            .unwrap();
        assert_eq!(doc.content_type(), "application/pdf");
        assert_eq!(doc.bytes(), b"%PDF-1.4 test");
    }

    #[tokio::test]
    async fn override_replaces_guess() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF").unwrap();

        let doc = resolve_input(tmp.path().to_str().unwrap(), Some("image/png"), 5)
            .await
            .unwrap();
        assert_eq!(doc.content_type(), "image/png");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = resolve_input("/definitely/not/a/real/file.pdf", None, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2BlobError::FileNotFound { .. }));
    }
}
