//! In-memory documents flowing through the pipeline.

use std::fmt;

/// An uploaded file as handed over by the trigger: raw bytes plus the
/// content type it was declared with. Owned by one invocation.
#[derive(Clone)]
pub struct PdfDocument {
    bytes: Vec<u8>,
    content_type: String,
}

impl PdfDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hand the bytes to the rasteriser; the document is not needed after.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfDocument")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// One rendered page: PNG bytes and the zero-based page index.
#[derive(Clone, PartialEq, Eq)]
pub struct PageImage {
    pub index: usize,
    pub png: Vec<u8>,
}

impl PageImage {
    pub fn new(index: usize, png: Vec<u8>) -> Self {
        Self { index, png }
    }

    /// Byte length compared against the size ceiling.
    pub fn size_bytes(&self) -> usize {
        self.png.len()
    }

    /// 1-based page number for display.
    pub fn page_num(&self) -> usize {
        self.index + 1
    }
}

impl fmt::Debug for PageImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageImage")
            .field("index", &self.index)
            .field("size_bytes", &self.png.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_image_reports_size_and_page_number() {
        let img = PageImage::new(2, vec![0u8; 17]);
        assert_eq!(img.size_bytes(), 17);
        assert_eq!(img.page_num(), 3);
        assert_eq!(format!("{img:?}"), "PageImage { index: 2, size_bytes: 17 }");
    }

    #[test]
    fn pdf_document_debug_hides_bytes() {
        let doc = PdfDocument::new(b"%PDF-1.7".to_vec(), "application/pdf");
        assert_eq!(doc.len(), 8);
        assert!(!doc.is_empty());
        let dbg = format!("{doc:?}");
        assert!(dbg.contains("len: 8"));
        assert!(!dbg.contains("%PDF"));
        assert_eq!(doc.into_bytes(), b"%PDF-1.7".to_vec());
    }
}
